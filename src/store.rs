use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use tracing::debug;

use crate::error::{DashError, Result};
use crate::model::{Order, OrderStatus, Product, ProductId, Supplier, SupplierId};

/// Contact fields used when a supplier is first seen
#[derive(Debug, Clone)]
pub struct SupplierDefaults {
    pub contact_email: String,
    pub phone_number: String,
    pub address: String,
}

impl Default for SupplierDefaults {
    fn default() -> Self {
        Self {
            contact_email: "supplier@example.com".to_string(),
            phone_number: "000-000-0000".to_string(),
            address: "123 Supplier St".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: i64,
    pub customer_city: String,
    pub customer_country: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// One validated import row, ready to apply
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub supplier_name: String,
    pub product: NewProduct,
    pub order: Option<NewOrder>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub suppliers_created: usize,
    pub products_created: usize,
    pub orders_created: usize,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StoreCounts {
    pub suppliers: usize,
    pub products: usize,
    pub orders: usize,
}

#[derive(Default)]
struct Tables {
    suppliers: Vec<Supplier>,
    supplier_by_name: HashMap<String, SupplierId>,
    products: Vec<Product>,
    product_by_sku: HashMap<String, ProductId>,
    orders: Vec<Order>,
    order_ids: HashSet<i64>,
    /// Positions in `orders`, grouped by owning supplier
    orders_by_supplier: HashMap<SupplierId, Vec<usize>>,
}

impl Tables {
    fn get_or_create_supplier(&mut self, name: &str, defaults: &SupplierDefaults) -> (SupplierId, bool) {
        if let Some(&id) = self.supplier_by_name.get(name) {
            return (id, false);
        }
        let id = self.suppliers.len() as SupplierId;
        self.suppliers.push(Supplier {
            id,
            name: name.to_string(),
            contact_email: defaults.contact_email.clone(),
            phone_number: defaults.phone_number.clone(),
            address: defaults.address.clone(),
        });
        self.supplier_by_name.insert(name.to_string(), id);
        (id, true)
    }

    fn get_or_create_product(&mut self, new: &NewProduct, supplier_id: SupplierId) -> Result<(ProductId, bool)> {
        if let Some(&id) = self.product_by_sku.get(&new.sku) {
            return Ok((id, false));
        }
        if supplier_id as usize >= self.suppliers.len() {
            return Err(DashError::UnknownSupplier(supplier_id));
        }
        let id = self.products.len() as ProductId;
        self.products.push(Product {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            sku: new.sku.clone(),
            category: new.category.clone(),
            supplier_id,
        });
        self.product_by_sku.insert(new.sku.clone(), id);
        Ok((id, true))
    }

    fn insert_order_if_absent(&mut self, product_id: ProductId, new: &NewOrder) -> Result<bool> {
        if self.order_ids.contains(&new.order_id) {
            return Ok(false);
        }
        let supplier_id = self
            .products
            .get(product_id as usize)
            .map(|p| p.supplier_id)
            .ok_or(DashError::DanglingOrder(product_id, new.order_id))?;

        let pos = self.orders.len();
        self.orders.push(Order {
            order_id: new.order_id,
            product_id,
            customer_city: new.customer_city.clone(),
            customer_country: new.customer_country.clone(),
            order_date: new.order_date,
            status: new.status,
        });
        self.order_ids.insert(new.order_id);
        self.orders_by_supplier.entry(supplier_id).or_default().push(pos);
        Ok(true)
    }
}

/// In-process relational store: Supplier → Product → Order.
///
/// 書き込みのたびに snapshot version が進む。派生データのキャッシュはこの値をキーにする。
pub struct Store {
    tables: RwLock<Tables>,
    version: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            version: AtomicU64::new(0),
        }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn bump(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get_or_create_supplier(&self, name: &str, defaults: &SupplierDefaults) -> (SupplierId, bool) {
        let mut tables = self.tables.write();
        let result = tables.get_or_create_supplier(name, defaults);
        if result.1 {
            self.bump();
        }
        result
    }

    pub fn get_or_create_product(&self, new: &NewProduct, supplier_id: SupplierId) -> Result<(ProductId, bool)> {
        let mut tables = self.tables.write();
        let result = tables.get_or_create_product(new, supplier_id)?;
        if result.1 {
            self.bump();
        }
        Ok(result)
    }

    pub fn insert_order_if_absent(&self, product_id: ProductId, new: &NewOrder) -> Result<bool> {
        let mut tables = self.tables.write();
        let inserted = tables.insert_order_if_absent(product_id, new)?;
        if inserted {
            self.bump();
        }
        Ok(inserted)
    }

    /// Apply a validated batch under a single write lock.
    /// The version moves at most once per batch.
    pub fn apply(&self, rows: &[BatchRow], defaults: &SupplierDefaults) -> Result<ApplyOutcome> {
        let mut tables = self.tables.write();
        let mut outcome = ApplyOutcome::default();

        for row in rows {
            let (supplier_id, created) = tables.get_or_create_supplier(&row.supplier_name, defaults);
            if created {
                debug!("New supplier created: {}", row.supplier_name);
                outcome.suppliers_created += 1;
            }

            let (product_id, created) = tables.get_or_create_product(&row.product, supplier_id)?;
            if created {
                outcome.products_created += 1;
            }

            if let Some(ref order) = row.order {
                if tables.insert_order_if_absent(product_id, order)? {
                    outcome.orders_created += 1;
                }
            }
        }

        let changed = outcome.suppliers_created + outcome.products_created + outcome.orders_created > 0;
        outcome.version = if changed { self.bump() } else { self.version() };
        Ok(outcome)
    }

    pub fn counts(&self) -> StoreCounts {
        let tables = self.tables.read();
        StoreCounts {
            suppliers: tables.suppliers.len(),
            products: tables.products.len(),
            orders: tables.orders.len(),
        }
    }

    /// Consistent read view; holds the read lock until dropped
    pub fn read(&self) -> StoreView<'_> {
        let tables = self.tables.read();
        StoreView {
            version: self.version(),
            tables,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StoreView<'a> {
    version: u64,
    tables: RwLockReadGuard<'a, Tables>,
}

impl<'a> StoreView<'a> {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.tables.suppliers
    }

    pub fn products(&self) -> &[Product] {
        &self.tables.products
    }

    pub fn orders(&self) -> &[Order] {
        &self.tables.orders
    }

    pub fn supplier(&self, id: SupplierId) -> Option<&Supplier> {
        self.tables.suppliers.get(id as usize)
    }
}

/// Order history lookup consumed by the reliability scorer
pub trait OrderHistory {
    /// Every supplier, in insertion order
    fn supplier_names(&self) -> Vec<(SupplierId, String)>;

    /// Timestamps of all orders whose product belongs to `supplier`, ascending
    fn order_timestamps(&self, supplier: SupplierId) -> Result<Vec<DateTime<Utc>>>;
}

impl<'a> OrderHistory for StoreView<'a> {
    fn supplier_names(&self) -> Vec<(SupplierId, String)> {
        self.tables
            .suppliers
            .iter()
            .map(|s| (s.id, s.name.clone()))
            .collect()
    }

    fn order_timestamps(&self, supplier: SupplierId) -> Result<Vec<DateTime<Utc>>> {
        if supplier as usize >= self.tables.suppliers.len() {
            return Err(DashError::UnknownSupplier(supplier));
        }
        let Some(positions) = self.tables.orders_by_supplier.get(&supplier) else {
            return Ok(Vec::new());
        };

        let mut stamps = Vec::with_capacity(positions.len());
        for &pos in positions {
            let order = &self.tables.orders[pos];
            match self.tables.products.get(order.product_id as usize) {
                Some(product) if product.supplier_id == supplier => stamps.push(order.order_date),
                _ => return Err(DashError::DanglingOrder(order.product_id, order.order_id)),
            }
        }
        stamps.sort_unstable();
        Ok(stamps)
    }
}
