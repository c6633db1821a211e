use std::collections::HashMap;
use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::Encoding;
use crate::error::{DashError, Result};
use crate::model::OrderStatus;
use crate::store::{BatchRow, NewOrder, NewProduct, Store, SupplierDefaults};

const COL_PRODUCT_NAME: &str = "Product Name";
const COL_PRODUCT_ID: &str = "Product Card Id";
const COL_DESCRIPTION: &str = "Product Description";
const COL_CATEGORY: &str = "Category Name";
const COL_ORDER_ID: &str = "Order Id";
const COL_CITY: &str = "Order City";
const COL_COUNTRY: &str = "Order Country";
const COL_ORDER_DATE: &str = "order date (DateOrders)";
const COL_STATUS: &str = "Order Status";

const NO_DESCRIPTION: &str = "No description available";
const UNKNOWN_CATEGORY: &str = "Unknown";

const DATE_FORMATS: &[&str] = &["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub rows_read: usize,
    pub suppliers_created: usize,
    pub products_created: usize,
    pub orders_created: usize,
    pub version: u64,
}

/// Header name → column position
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &[String]) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.index.get(column).copied().ok_or_else(|| DashError::MissingColumn {
            column: column.to_string(),
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

/// DataCo のCSVを読み込んでステージングする。1行でも壊れていたら全体を破棄。
pub struct CsvImporter {
    encoding: Encoding,
    defaults: SupplierDefaults,
}

impl CsvImporter {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            defaults: SupplierDefaults::default(),
        }
    }

    /// Parse and validate every row without touching the store
    pub fn stage<R: Read>(&self, reader: R) -> Result<Vec<BatchRow>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .byte_headers()?
            .iter()
            .map(|f| self.decode(f, 1))
            .collect::<Result<Vec<String>>>()?;
        let columns = Columns::new(&headers);

        let name_col = columns.require(COL_PRODUCT_NAME)?;
        let sku_col = columns.require(COL_PRODUCT_ID)?;
        let description_col = columns.optional(COL_DESCRIPTION);
        let category_col = columns.optional(COL_CATEGORY);
        let order_col = columns.optional(COL_ORDER_ID);
        let city_col = columns.optional(COL_CITY);
        let country_col = columns.optional(COL_COUNTRY);
        let date_col = columns.optional(COL_ORDER_DATE);
        let status_col = columns.optional(COL_STATUS);

        let mut rows = Vec::new();
        for (i, record) in rdr.byte_records().enumerate() {
            let record = record?;
            // Row numbers count the header as row 1
            let row = i + 2;
            let field = |col: Option<usize>| -> Result<String> {
                match col.and_then(|c| record.get(c)) {
                    Some(f) => Ok(self.decode(f, row)?.trim().to_string()),
                    None => Ok(String::new()),
                }
            };

            let product_name = field(Some(name_col))?;
            if product_name.is_empty() {
                return Err(DashError::import(row, format!("empty '{}'", COL_PRODUCT_NAME)));
            }
            let sku = field(Some(sku_col))?;
            if sku.is_empty() {
                return Err(DashError::import(row, format!("empty '{}'", COL_PRODUCT_ID)));
            }

            let supplier_name = supplier_name(&product_name);
            let description = non_empty_or(field(description_col)?, NO_DESCRIPTION);
            let category = non_empty_or(field(category_col)?, UNKNOWN_CATEGORY);

            let order_id = field(order_col)?;
            let order = if order_id.is_empty() {
                None
            } else {
                let order_id: i64 = order_id
                    .parse()
                    .map_err(|_| DashError::import(row, format!("invalid order id '{}'", order_id)))?;
                let raw_date = field(date_col)?;
                let order_date = parse_timestamp(&raw_date)
                    .ok_or_else(|| DashError::import(row, format!("invalid order date '{}'", raw_date)))?;
                Some(NewOrder {
                    order_id,
                    customer_city: field(city_col)?,
                    customer_country: field(country_col)?,
                    order_date,
                    status: OrderStatus::from_label(&field(status_col)?),
                })
            };

            rows.push(BatchRow {
                supplier_name,
                product: NewProduct {
                    sku,
                    name: product_name,
                    description,
                    category,
                },
                order,
            });
        }

        Ok(rows)
    }

    /// Stage then apply atomically
    pub fn import<R: Read>(&self, reader: R, store: &Store) -> Result<ImportReport> {
        let rows = self.stage(reader)?;
        let outcome = store.apply(&rows, &self.defaults)?;
        let report = ImportReport {
            rows_read: rows.len(),
            suppliers_created: outcome.suppliers_created,
            products_created: outcome.products_created,
            orders_created: outcome.orders_created,
            version: outcome.version,
        };
        info!(
            "📦 Import complete: {} rows, {} new suppliers, {} new products, {} new orders (version {})",
            report.rows_read, report.suppliers_created, report.products_created, report.orders_created, report.version
        );
        Ok(report)
    }

    /// Undecodable bytes reject the row; they are never replaced
    fn decode(&self, bytes: &[u8], row: usize) -> Result<String> {
        match self.encoding {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| DashError::import(row, format!("invalid UTF-8 at byte {}", e.valid_up_to()))),
            // Latin-1 bytes map 1:1 onto U+0000..U+00FF
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Supplier is the product name up to the first comma
pub fn supplier_name(product_name: &str) -> String {
    product_name
        .split(',')
        .next()
        .unwrap_or(product_name)
        .trim()
        .to_string()
}

/// Accepts the DataCo `m/d/Y H:M` layout, ISO-like layouts, bare dates and RFC 3339.
/// Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in DATE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use crate::store::OrderHistory;

    const SAMPLE: &str = "\
Order Id,Product Card Id,Product Name,Product Description,Category Name,Order City,Order Country,order date (DateOrders),Order Status
77202,1360,\"Smart watch , black\",,Sporting Goods,Bikaner,India,1/31/2018 22:56,COMPLETE
75939,1360,\"Smart watch , black\",,Sporting Goods,Bikaner,India,1/13/2018 12:27,PENDING
75939,365,Perfect Fitness Perfect Rip Deck,Deck for abs,Cleats,Townsville,Australia,1/13/2018 12:06,CLOSED
,1014,O'Brien Men's Neoprene Life Vest,,,,,,
";

    #[test]
    fn test_supplier_name_before_comma() {
        assert_eq!(supplier_name("Smart watch , black"), "Smart watch");
        assert_eq!(supplier_name("Field & Stream Sportsman 16 Gun Fire Safe"), "Field & Stream Sportsman 16 Gun Fire Safe");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let ts = parse_timestamp("1/31/2018 22:56").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour(), ts.minute()), (2018, 1, 31, 22, 56));
        assert!(parse_timestamp("2018-01-31 22:56:10").is_some());
        assert!(parse_timestamp("2018-01-31").is_some());
        let ts = parse_timestamp("2018-01-31T22:56:00+09:00").unwrap();
        assert_eq!(ts.hour(), 13);
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_stage_sample() {
        let rows = CsvImporter::new(Encoding::Utf8).stage(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].supplier_name, "Smart watch");
        assert_eq!(rows[0].product.description, NO_DESCRIPTION);
        assert_eq!(rows[0].product.category, "Sporting Goods");
        assert_eq!(rows[0].order.as_ref().unwrap().status, OrderStatus::Delivered);
        assert_eq!(rows[1].order.as_ref().unwrap().status, OrderStatus::Pending);
        assert_eq!(rows[2].product.description, "Deck for abs");
        assert!(rows[3].order.is_none());
        assert_eq!(rows[3].product.category, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_import_applies_get_or_create() {
        let store = Store::new();
        let report = CsvImporter::new(Encoding::Utf8).import(SAMPLE.as_bytes(), &store).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.suppliers_created, 3);
        assert_eq!(report.products_created, 3);
        // Order 75939 appears twice; the first row wins
        assert_eq!(report.orders_created, 2);
        assert_eq!(report.version, 1);

        let view = store.read();
        assert_eq!(view.order_timestamps(0).unwrap().len(), 2);
        assert!(view.order_timestamps(1).unwrap().is_empty());
        assert!(view.order_timestamps(2).unwrap().is_empty());
    }

    #[test]
    fn test_latin1_decoding() {
        let mut data = b"Product Name,Product Card Id\n".to_vec();
        data.extend_from_slice(b"Caf\xe9 Mug,12\n");
        let rows = CsvImporter::new(Encoding::Latin1).stage(data.as_slice()).unwrap();
        assert_eq!(rows[0].product.name, "Café Mug");
    }

    #[test]
    fn test_invalid_utf8_rejects_whole_file() {
        // Two suppliers that would collapse into one if bytes were replaced
        let mut data = b"Order Id,Product Card Id,Product Name,order date (DateOrders)\n".to_vec();
        data.extend_from_slice(b"1,10,\"Caf\xe9, Mug\",1/2/2018 10:00\n");
        data.extend_from_slice(b"2,11,\"Caf\xe8, Cup\",1/3/2018 10:00\n");

        let store = Store::new();
        let err = CsvImporter::new(Encoding::Utf8).import(data.as_slice(), &store).unwrap_err();
        assert!(matches!(err, DashError::Import { row: 2, .. }));
        assert!(err.to_string().contains("invalid UTF-8"));
        assert_eq!(store.counts().suppliers, 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_invalid_utf8_header_reports_row_one() {
        let data = b"Product Name,Product Card Id,Caf\xe9\nMug,10,x\n";
        let err = CsvImporter::new(Encoding::Utf8).stage(&data[..]).unwrap_err();
        assert!(matches!(err, DashError::Import { row: 1, .. }));
    }

    #[test]
    fn test_missing_required_column() {
        let err = CsvImporter::new(Encoding::Utf8)
            .stage("Product Name,Category Name\nMug,Kitchen\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, DashError::MissingColumn { ref column } if column == COL_PRODUCT_ID));
    }

    #[test]
    fn test_bad_date_rejects_whole_file() {
        let data = "\
Order Id,Product Card Id,Product Name,order date (DateOrders)
1,10,Mug,1/2/2018 10:00
2,11,Cup,not a date
";
        let store = Store::new();
        let err = CsvImporter::new(Encoding::Utf8).import(data.as_bytes(), &store).unwrap_err();
        assert!(matches!(err, DashError::Import { row: 3, .. }));
        assert_eq!(store.counts().suppliers, 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_bad_order_id() {
        let data = "Order Id,Product Card Id,Product Name,order date (DateOrders)\nx1,10,Mug,1/2/2018 10:00\n";
        let err = CsvImporter::new(Encoding::Utf8).stage(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid order id"));
    }
}
