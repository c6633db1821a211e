use chrono::{DateTime, Utc};
use serde::Serialize;

pub type SupplierId = u64;
pub type ProductId = u64;

#[derive(Debug, Clone, Serialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Stock keeping unit, unique across products
    pub sku: String,
    pub category: String,
    pub supplier_id: SupplierId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Map a dataset status label onto the four tracked states.
    /// Unrecognized labels fall back to pending.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "IN_PROGRESS" | "PROCESSING" | "PENDING_PAYMENT" | "PAYMENT_REVIEW" => OrderStatus::InProgress,
            "SHIPPED" => OrderStatus::Shipped,
            "DELIVERED" | "COMPLETE" | "CLOSED" => OrderStatus::Delivered,
            _ => OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_id: i64,
    pub product_id: ProductId,
    pub customer_city: String,
    pub customer_country: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}
