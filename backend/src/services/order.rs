//! Order lifecycle service
//!
//! Creates, edits, and deletes orders while keeping product stock levels
//! reconciled. Every mutation runs inside a single database transaction;
//! product rows are read with row locks so concurrent mutations of the same
//! product serialize instead of overselling.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_price, validate_quantity};

/// Order service for managing the order lifecycle and stock reconciliation
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// One requested product line
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity_ordered: i32,
    pub price_each: Decimal,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub order_date: Option<DateTime<Utc>>,
    /// Status name; defaults to "pending"
    pub status: Option<String>,
    pub note: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Input for updating an order
///
/// Any subset of the fields may be supplied. A non-empty `items` list
/// replaces the whole item set, which is only allowed while the order is
/// pending.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub items: Option<Vec<OrderItemInput>>,
}

/// Order row joined with the customer's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderWithCustomer {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub profit: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item joined with product details for responses
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_ordered: i32,
    pub price_each: Decimal,
    /// The product's current reference price
    pub original_price: Decimal,
    pub subtotal: Decimal,
}

/// Full order response with items
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderWithCustomer,
    pub items: Vec<OrderItemView>,
}

/// Filters for listing orders
#[derive(Debug, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    /// Orders containing any of these products
    pub product_ids: Vec<Uuid>,
}

/// Row for the item view query
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_item_id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    product_name: String,
    quantity_ordered: i32,
    price_each: Decimal,
    original_price: Decimal,
}

/// Product row read under lock during a mutation
#[derive(Debug, sqlx::FromRow)]
struct LockedProduct {
    product_id: Uuid,
    product_name: String,
    price: Decimal,
    quantity_in_stock: i32,
}

/// Merge duplicate product lines before validation
///
/// Quantities for the same product sum; the last occurrence's price wins,
/// matching the last-sale-price rule. Order of first appearance is kept.
pub(crate) fn merge_order_items(items: &[OrderItemInput]) -> Vec<OrderItemInput> {
    let mut merged: Vec<OrderItemInput> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.product_id == item.product_id)
        {
            existing.quantity_ordered += item.quantity_ordered;
            existing.price_each = item.price_each;
        } else {
            merged.push(item.clone());
        }
    }
    merged
}

/// Compute (total_amount, profit) over priced lines
///
/// Each line carries the cost-at-sale read from the product at the moment
/// the line was priced.
pub(crate) fn order_totals(lines: &[(OrderItemInput, Decimal)]) -> (Decimal, Decimal) {
    let mut total = Decimal::ZERO;
    let mut profit = Decimal::ZERO;
    for (item, cost_at_sale) in lines {
        let quantity = Decimal::from(item.quantity_ordered);
        total += item.price_each * quantity;
        profit += (item.price_each - cost_at_sale) * quantity;
    }
    (total, profit)
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order, decrementing stock for every line
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<OrderWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Order items are required".to_string(),
                message_th: "กรุณาเพิ่มสินค้าอย่างน้อย 1 รายการ".to_string(),
            });
        }
        validate_items(&input.items)?;

        let status = match input.status.as_deref() {
            Some(s) => {
                OrderStatus::parse(s).ok_or_else(|| AppError::InvalidStatus(s.to_string()))?
            }
            None => OrderStatus::Pending,
        };
        let order_date = input.order_date.unwrap_or_else(Utc::now);

        // Validate customer exists
        let customer_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1)",
        )
        .bind(input.customer_id)
        .fetch_one(&self.db)
        .await?;

        if !customer_exists {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        let items = merge_order_items(&input.items);

        let mut tx = self.db.begin().await?;

        // Lock products, check stock, and capture cost-at-sale
        let priced = Self::price_items(&mut tx, &items).await?;
        let (total_amount, profit) = order_totals(&priced);

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (customer_id, order_date, status, total_amount, profit, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING order_id
            "#,
        )
        .bind(input.customer_id)
        .bind(order_date)
        .bind(status)
        .bind(total_amount)
        .bind(profit)
        .bind(&input.note)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_items(&mut tx, order_id, &priced).await?;

        tx.commit().await?;

        self.get_order(order_id).await
    }

    /// Update an order's status, customer, and/or item set
    pub async fn update_order(
        &self,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithCustomer> {
        let current = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, customer_id, order_date, status, total_amount, profit,
                   note, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let new_status = match input.status.as_deref() {
            Some(s) => {
                Some(OrderStatus::parse(s).ok_or_else(|| AppError::InvalidStatus(s.to_string()))?)
            }
            None => None,
        };

        match input.items {
            Some(ref items) if !items.is_empty() => {
                // Item replacement is only allowed before fulfillment
                if current.status != OrderStatus::Pending {
                    return Err(AppError::InvalidState(
                        "editing items is only allowed for pending orders".to_string(),
                    ));
                }
                validate_items(items)?;

                let status = new_status.unwrap_or(current.status);
                let customer_id = input.customer_id.unwrap_or(current.customer_id);
                self.replace_items(order_id, customer_id, input.customer_id.is_some(), status, items)
                    .await
            }
            _ => {
                if new_status.is_none() && input.customer_id.is_none() {
                    return Err(AppError::NoChanges);
                }

                if let Some(customer_id) = input.customer_id {
                    let exists = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1)",
                    )
                    .bind(customer_id)
                    .fetch_one(&self.db)
                    .await?;
                    if !exists {
                        return Err(AppError::NotFound("Customer".to_string()));
                    }
                }

                let status = new_status.unwrap_or(current.status);
                let customer_id = input.customer_id.unwrap_or(current.customer_id);

                sqlx::query(
                    "UPDATE orders SET status = $1, customer_id = $2, updated_at = now() WHERE order_id = $3",
                )
                .bind(status)
                .bind(customer_id)
                .bind(order_id)
                .execute(&self.db)
                .await?;

                self.get_order_summary(order_id).await
            }
        }
    }

    /// Delete an order, restoring stock for every line
    pub async fn delete_order(&self, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // Check the header directly so an order with no items still resolves
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE order_id = $1)",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Order".to_string()));
        }

        let items = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT product_id, quantity_ordered FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        // Restore stock
        for (product_id, quantity_ordered) in &items {
            sqlx::query(
                "UPDATE products SET quantity_in_stock = quantity_in_stock + $1, updated_at = now() WHERE product_id = $2",
            )
            .bind(quantity_ordered)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        // Delete items first, then the header
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get an order with customer name and item details
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderWithItems> {
        let order = self.get_order_summary(order_id).await?;

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.order_item_id, oi.order_id, oi.product_id, p.product_name,
                   oi.quantity_ordered, oi.price_each, p.price AS original_price
            FROM order_items oi
            JOIN products p ON p.product_id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| OrderItemView {
                order_item_id: r.order_item_id,
                order_id: r.order_id,
                product_id: r.product_id,
                product_name: r.product_name,
                quantity_ordered: r.quantity_ordered,
                price_each: r.price_each,
                original_price: r.original_price,
                subtotal: r.price_each * Decimal::from(r.quantity_ordered),
            })
            .collect();

        Ok(OrderWithItems { order, items })
    }

    /// List orders with optional filters, newest first
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<OrderWithCustomer>> {
        let product_ids: Option<Vec<Uuid>> = if filter.product_ids.is_empty() {
            None
        } else {
            Some(filter.product_ids.clone())
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM orders o
            WHERE ($1::uuid IS NULL OR o.customer_id = $1)
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::uuid[] IS NULL OR EXISTS (
                  SELECT 1 FROM order_items oi
                  WHERE oi.order_id = o.order_id AND oi.product_id = ANY($3)))
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.status)
        .bind(&product_ids)
        .fetch_one(&self.db)
        .await?;

        let orders = sqlx::query_as::<_, OrderWithCustomer>(
            r#"
            SELECT o.order_id, o.customer_id, c.fname || ' ' || c.lname AS customer_name,
                   o.order_date, o.status, o.total_amount, o.profit, o.note,
                   o.created_at, o.updated_at
            FROM orders o
            JOIN customers c ON c.customer_id = o.customer_id
            WHERE ($1::uuid IS NULL OR o.customer_id = $1)
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::uuid[] IS NULL OR EXISTS (
                  SELECT 1 FROM order_items oi
                  WHERE oi.order_id = o.order_id AND oi.product_id = ANY($3)))
            ORDER BY o.order_date DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.status)
        .bind(&product_ids)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Replace the whole item set of a pending order
    ///
    /// Stock restored from the old lines is visible to the stock checks for
    /// the new lines because everything happens in one transaction; a
    /// failure on any new line rolls the restoration back too.
    async fn replace_items(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        customer_changed: bool,
        status: OrderStatus,
        items: &[OrderItemInput],
    ) -> AppResult<OrderWithCustomer> {
        let mut tx = self.db.begin().await?;

        if customer_changed {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1)",
            )
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        // Undo the stock effect of the existing lines
        let existing = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT product_id, quantity_ordered FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity_ordered) in &existing {
            sqlx::query(
                "UPDATE products SET quantity_in_stock = quantity_in_stock + $1, updated_at = now() WHERE product_id = $2",
            )
            .bind(quantity_ordered)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        // Price and apply the replacement set against the restored stock
        let merged = merge_order_items(items);
        let priced = Self::price_items(&mut tx, &merged).await?;
        let (total_amount, profit) = order_totals(&priced);

        Self::insert_items(&mut tx, order_id, &priced).await?;

        sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $1, status = $2, total_amount = $3, profit = $4, updated_at = now()
            WHERE order_id = $5
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .bind(total_amount)
        .bind(profit)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_order_summary(order_id).await
    }

    /// Lock each line's product row, check stock, and capture cost-at-sale
    async fn price_items(
        tx: &mut Transaction<'_, Postgres>,
        items: &[OrderItemInput],
    ) -> AppResult<Vec<(OrderItemInput, Decimal)>> {
        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            let product = sqlx::query_as::<_, LockedProduct>(
                r#"
                SELECT product_id, product_name, price, quantity_in_stock
                FROM products
                WHERE product_id = $1
                FOR UPDATE
                "#,
            )
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;

            if item.quantity_ordered > product.quantity_in_stock {
                return Err(AppError::InsufficientStock {
                    product_id: product.product_id,
                    product_name: product.product_name,
                    available: product.quantity_in_stock,
                    requested: item.quantity_ordered,
                });
            }

            priced.push((item.clone(), product.price));
        }
        Ok(priced)
    }

    /// Insert line rows and decrement stock for each priced line
    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        lines: &[(OrderItemInput, Decimal)],
    ) -> AppResult<()> {
        for (item, _cost_at_sale) in lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity_ordered, price_each)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity_ordered)
            .bind(item.price_each)
            .execute(&mut **tx)
            .await?;

            sqlx::query(
                "UPDATE products SET quantity_in_stock = quantity_in_stock - $1, updated_at = now() WHERE product_id = $2",
            )
            .bind(item.quantity_ordered)
            .bind(item.product_id)
            .execute(&mut **tx)
            .await?;

            Self::record_last_sale_price(tx, item.product_id, item.price_each).await?;
        }
        Ok(())
    }

    /// Record the sold price on the product as its last sale price
    ///
    /// Kept separate from the stock arithmetic; the reference `price` column
    /// used for profit math is never touched here.
    async fn record_last_sale_price(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        price_each: Decimal,
    ) -> AppResult<()> {
        sqlx::query("UPDATE products SET sell_price = $1 WHERE product_id = $2")
            .bind(price_each)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Order header joined with the customer's name
    async fn get_order_summary(&self, order_id: Uuid) -> AppResult<OrderWithCustomer> {
        sqlx::query_as::<_, OrderWithCustomer>(
            r#"
            SELECT o.order_id, o.customer_id, c.fname || ' ' || c.lname AS customer_name,
                   o.order_date, o.status, o.total_amount, o.profit, o.note,
                   o.created_at, o.updated_at
            FROM orders o
            JOIN customers c ON c.customer_id = o.customer_id
            WHERE o.order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }
}

/// Validate line shapes before touching the store
fn validate_items(items: &[OrderItemInput]) -> AppResult<()> {
    for item in items {
        validate_quantity(item.quantity_ordered).map_err(|msg| AppError::Validation {
            field: "quantity_ordered".to_string(),
            message: msg.to_string(),
            message_th: "จำนวนสินค้าต้องเป็นค่าบวก".to_string(),
        })?;
        validate_price(item.price_each).map_err(|msg| AppError::Validation {
            field: "price_each".to_string(),
            message: msg.to_string(),
            message_th: "ราคาขายต้องไม่ติดลบ".to_string(),
        })?;
    }
    Ok(())
}
