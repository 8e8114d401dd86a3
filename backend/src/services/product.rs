//! Product and inventory record service
//!
//! Stock levels are only adjusted here through direct product edits; the
//! order lifecycle engine owns all order-driven stock movement.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Product;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_price, validate_product_name, validate_stock_level};

/// Product service for managing the store's catalog
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub product_name: String,
    pub price: Decimal,
    pub quantity_in_stock: Option<i32>,
    pub volume: Option<String>,
    pub description: Option<String>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub product_name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity_in_stock: Option<i32>,
    pub volume: Option<String>,
    pub description: Option<String>,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        let quantity_in_stock = input.quantity_in_stock.unwrap_or(0);
        validate_product_fields(&input.product_name, input.price, quantity_in_stock)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (product_name, price, quantity_in_stock, volume, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING product_id, product_name, price, sell_price, quantity_in_stock,
                      volume, description, created_at, updated_at
            "#,
        )
        .bind(&input.product_name)
        .bind(input.price)
        .bind(quantity_in_stock)
        .bind(&input.volume)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, product_name, price, sell_price, quantity_in_stock,
                   volume, description, created_at, updated_at
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Update a product
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let product_name = input.product_name.unwrap_or(existing.product_name);
        let price = input.price.unwrap_or(existing.price);
        let quantity_in_stock = input.quantity_in_stock.unwrap_or(existing.quantity_in_stock);
        let volume = input.volume.or(existing.volume);
        let description = input.description.or(existing.description);

        validate_product_fields(&product_name, price, quantity_in_stock)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET product_name = $1, price = $2, quantity_in_stock = $3, volume = $4,
                description = $5, updated_at = now()
            WHERE product_id = $6
            RETURNING product_id, product_name, price, sell_price, quantity_in_stock,
                      volume, description, created_at, updated_at
            "#,
        )
        .bind(&product_name)
        .bind(price)
        .bind(quantity_in_stock)
        .bind(&volume)
        .bind(&description)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product
    ///
    /// Products referenced by order items surface a constraint violation.
    pub async fn delete_product(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// List products ordered by name, with optional name search
    pub async fn list_products(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        let pattern = search.map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE ($1::text IS NULL OR product_name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, product_name, price, sell_price, quantity_in_stock,
                   volume, description, created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL OR product_name ILIKE $1)
            ORDER BY product_name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: products,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }
}

/// Field-level validation shared by create and update
fn validate_product_fields(product_name: &str, price: Decimal, quantity: i32) -> AppResult<()> {
    validate_product_name(product_name).map_err(|msg| AppError::Validation {
        field: "product_name".to_string(),
        message: msg.to_string(),
        message_th: "กรุณากรอกชื่อสินค้า (ไม่เกิน 100 ตัวอักษร)".to_string(),
    })?;
    validate_price(price).map_err(|msg| AppError::Validation {
        field: "price".to_string(),
        message: msg.to_string(),
        message_th: "ราคาต้องไม่ติดลบ".to_string(),
    })?;
    validate_stock_level(quantity).map_err(|msg| AppError::Validation {
        field: "quantity_in_stock".to_string(),
        message: msg.to_string(),
        message_th: "จำนวนคงคลังต้องไม่ติดลบ".to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_fields_valid() {
        assert!(validate_product_fields("น้ำปลา 700ml", Decimal::from(35), 20).is_ok());
        assert!(validate_product_fields("Rice 5kg", Decimal::ZERO, 0).is_ok());
    }

    #[test]
    fn test_validate_product_fields_invalid() {
        assert!(validate_product_fields("", Decimal::from(35), 20).is_err());
        assert!(validate_product_fields("Rice", Decimal::from(-1), 20).is_err());
        assert!(validate_product_fields("Rice", Decimal::from(35), -1).is_err());
    }
}
