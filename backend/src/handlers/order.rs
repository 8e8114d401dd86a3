//! HTTP handlers for order management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::order::{
    CreateOrderInput, OrderFilter, OrderService, OrderWithCustomer, OrderWithItems,
    UpdateOrderInput,
};
use crate::AppState;
use shared::models::OrderStatus;
use shared::types::{PaginatedResponse, Pagination};

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    /// Comma-separated product ids; matches orders containing any of them
    pub product_ids: Option<String>,
}

/// List orders with pagination and optional filters
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<PaginatedResponse<OrderWithCustomer>>> {
    let status = match query.status.as_deref() {
        Some(s) => {
            Some(OrderStatus::parse(s).ok_or_else(|| AppError::InvalidStatus(s.to_string()))?)
        }
        None => None,
    };

    let product_ids = query
        .product_ids
        .as_deref()
        .map(parse_product_ids)
        .unwrap_or_default();

    let filter = OrderFilter {
        customer_id: query.customer_id,
        status,
        product_ids,
    };

    let service = OrderService::new(state.db);
    let pagination = Pagination::normalize(query.page, query.limit);
    let orders = service.list_orders(filter, pagination).await?;
    Ok(Json(orders))
}

/// Create an order with its items
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<OrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.create_order(input).await?;
    Ok(Json(order))
}

/// Get a single order with item details
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Update an order's status, customer, and/or item set
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderWithCustomer>> {
    let service = OrderService::new(state.db);
    let order = service.update_order(order_id, input).await?;
    Ok(Json(order))
}

/// Delete an order, restoring stock
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = OrderService::new(state.db);
    service.delete_order(order_id).await?;
    Ok(Json(()))
}

/// Parse a comma-separated id list, skipping malformed entries
fn parse_product_ids(raw: &str) -> Vec<Uuid> {
    raw.split(',')
        .filter_map(|s| Uuid::parse_str(s.trim()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!("{}, {},not-a-uuid,", a, b);
        assert_eq!(parse_product_ids(&raw), vec![a, b]);
    }

    #[test]
    fn test_parse_product_ids_empty() {
        assert!(parse_product_ids("").is_empty());
    }
}
