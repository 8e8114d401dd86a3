//! Customer management service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Customer;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_email, validate_person_name, validate_thai_phone};

/// Customer service for managing the store's customer records
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub fname: String,
    pub lname: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        validate_customer_fields(&input.fname, &input.lname, &input.phone, input.email.as_deref())?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (fname, lname, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING customer_id, fname, lname, phone, email, address, created_at, updated_at
            "#,
        )
        .bind(&input.fname)
        .bind(&input.lname)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Get a customer by id
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, fname, lname, phone, email, address, created_at, updated_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// Update a customer
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<Customer> {
        let existing = self.get_customer(customer_id).await?;

        let fname = input.fname.unwrap_or(existing.fname);
        let lname = input.lname.unwrap_or(existing.lname);
        let phone = input.phone.unwrap_or(existing.phone);
        let email = input.email.or(existing.email);
        let address = input.address.or(existing.address);

        validate_customer_fields(&fname, &lname, &phone, email.as_deref())?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET fname = $1, lname = $2, phone = $3, email = $4, address = $5, updated_at = now()
            WHERE customer_id = $6
            RETURNING customer_id, fname, lname, phone, email, address, created_at, updated_at
            "#,
        )
        .bind(&fname)
        .bind(&lname)
        .bind(&phone)
        .bind(&email)
        .bind(&address)
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Delete a customer
    ///
    /// Customers referenced by orders surface a constraint violation.
    pub async fn delete_customer(&self, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        Ok(())
    }

    /// List customers, newest first, with optional name search
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Customer>> {
        let pattern = search.map(|s| format!("%{}%", s));

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM customers
            WHERE ($1::text IS NULL OR fname ILIKE $1 OR lname ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, fname, lname, phone, email, address, created_at, updated_at
            FROM customers
            WHERE ($1::text IS NULL OR fname ILIKE $1 OR lname ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: customers,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }
}

/// Field-level validation shared by create and update
fn validate_customer_fields(
    fname: &str,
    lname: &str,
    phone: &str,
    email: Option<&str>,
) -> AppResult<()> {
    validate_person_name(fname).map_err(|msg| AppError::Validation {
        field: "fname".to_string(),
        message: msg.to_string(),
        message_th: "กรุณากรอกชื่อ (ไม่เกิน 45 ตัวอักษร)".to_string(),
    })?;
    validate_person_name(lname).map_err(|msg| AppError::Validation {
        field: "lname".to_string(),
        message: msg.to_string(),
        message_th: "กรุณากรอกนามสกุล (ไม่เกิน 45 ตัวอักษร)".to_string(),
    })?;
    validate_thai_phone(phone).map_err(|msg| AppError::Validation {
        field: "phone".to_string(),
        message: msg.to_string(),
        message_th: "รูปแบบเบอร์โทรไม่ถูกต้อง".to_string(),
    })?;
    if let Some(email) = email {
        if !email.is_empty() {
            validate_email(email).map_err(|msg| AppError::Validation {
                field: "email".to_string(),
                message: msg.to_string(),
                message_th: "รูปแบบอีเมลไม่ถูกต้อง".to_string(),
            })?;
        }
    }
    Ok(())
}
