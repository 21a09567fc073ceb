use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ApiJson, PageWindow,
};
use crate::services::orders::{
    ChangeOwnerInput, CreateOrderInput, OrderDetail, OrderFilter, OrderSummary, OrderView,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Creates the router for order endpoints, including the per-order detail
/// records and products.
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/latest", get(latest_order))
        .route("/:id", get(get_order).delete(delete_order))
        .route("/:id/owner", put(change_owner))
        .route("/:id/summary", get(order_summary))
        .route("/:id/total-price", get(order_total_price))
        .merge(super::order_details::order_detail_routes())
        .merge(super::products::order_product_routes())
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct OrderListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    /// Order id, `ODR_` reference, or customer first / last name
    pub search: Option<String>,
    pub user_id: Option<i32>,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderTotalPrice {
    pub order_id: i32,
    #[schema(value_type = String, example = "300.00")]
    pub total_price: Decimal,
}

/// Create an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created", body = crate::ApiResponse<OrderView>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .create_order(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(order))
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders", body = crate::ApiResponse<crate::PaginatedResponse<OrderView>>),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let filter = OrderFilter {
        user_id: query.user_id,
        search: query.search,
    };
    let (orders, total) = state
        .services
        .orders
        .list_orders(filter, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(orders, total)))
}

/// Most recent order
#[utoipa::path(
    get,
    path = "/api/v1/orders/latest",
    responses(
        (status = 200, description = "Latest order", body = crate::ApiResponse<OrderView>),
        (status = 404, description = "No orders yet", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn latest_order(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .latest_order()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Order with all of its records and its total price
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = crate::ApiResponse<OrderDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Order and customer identity
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/summary",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order summary", body = crate::ApiResponse<OrderSummary>),
        (status = 404, description = "Order or identity missing", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn order_summary(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .orders
        .order_summary(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(summary))
}

/// Sum of the order's product prices
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/total-price",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Total price", body = crate::ApiResponse<OrderTotalPrice>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn order_total_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let total_price = state
        .services
        .orders
        .total_price(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderTotalPrice {
        order_id: id,
        total_price,
    }))
}

/// Reassign an order to another user
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/owner",
    params(("id" = i32, Path, description = "Order id")),
    request_body = ChangeOwnerInput,
    responses(
        (status = 200, description = "Owner changed", body = crate::ApiResponse<OrderView>),
        (status = 404, description = "Order or user not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn change_owner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<ChangeOwnerInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .change_owner(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Delete an order with everything attached to it
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .orders
        .delete_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
