//! Product and inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product tracked in the store's inventory
///
/// `quantity_in_stock` is the single source of truth for available
/// inventory and is mutated only by the order lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub product_name: String,
    /// Reference/list price, used as the cost basis when computing profit
    pub price: Decimal,
    /// Last recorded sale price, written by the order engine
    pub sell_price: Option<Decimal>,
    pub quantity_in_stock: i32,
    /// Unit or package size label (e.g., "500g", "1L")
    pub volume: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
