use crate::entities::voucher::PaymentMethod;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ApiJson, PageWindow,
};
use crate::services::pricing::VoucherBalance;
use crate::services::vouchers::{
    CreateVoucherInput, UpdateVoucherInput, VoucherDetail, VoucherLineInput, VoucherLineView,
    VoucherSummary,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Creates the router for voucher endpoints
pub fn vouchers_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vouchers).post(create_voucher))
        .route(
            "/:id",
            get(get_voucher).put(update_voucher).delete(delete_voucher),
        )
        .route("/:id/balance", get(voucher_balance))
        .route("/:id/orders", post(link_order))
        .route("/:id/orders/:order_id", delete(unlink_order))
        .route("/:id/lines", post(add_line))
        .route("/:id/lines/:line_id", delete(remove_line))
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct VoucherListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    /// `CASH`, `CARD` or `IGC`
    #[param(value_type = Option<String>)]
    pub payment_method: Option<PaymentMethod>,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LinkOrderInput {
    pub order_id: i32,
}

/// Create a voucher, optionally covering some orders
#[utoipa::path(
    post,
    path = "/api/v1/vouchers",
    request_body = CreateVoucherInput,
    responses(
        (status = 201, description = "Voucher created", body = crate::ApiResponse<VoucherDetail>),
        (status = 400, description = "Unknown order ids", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn create_voucher(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateVoucherInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let voucher = state
        .services
        .vouchers
        .create_voucher(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(voucher))
}

/// List vouchers with their balances
#[utoipa::path(
    get,
    path = "/api/v1/vouchers",
    params(VoucherListQuery),
    responses(
        (status = 200, description = "Vouchers", body = crate::ApiResponse<crate::PaginatedResponse<VoucherSummary>>)
    ),
    tag = "Vouchers"
)]
pub async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<VoucherListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .vouchers
        .list_vouchers(query.payment_method, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

#[utoipa::path(
    get,
    path = "/api/v1/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher id")),
    responses(
        (status = 200, description = "Voucher with orders and lines", body = crate::ApiResponse<VoucherDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn get_voucher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .services
        .vouchers
        .get_voucher(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(voucher))
}

/// Change the payment method
#[utoipa::path(
    put,
    path = "/api/v1/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher id")),
    request_body = UpdateVoucherInput,
    responses(
        (status = 200, description = "Voucher updated", body = crate::ApiResponse<VoucherDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn update_voucher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<UpdateVoucherInput>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .services
        .vouchers
        .update_voucher(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(voucher))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vouchers/{id}",
    params(("id" = i32, Path, description = "Voucher id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn delete_voucher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .vouchers
        .delete_voucher(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Orders total, paid total and what is left to pay
#[utoipa::path(
    get,
    path = "/api/v1/vouchers/{id}/balance",
    params(("id" = i32, Path, description = "Voucher id")),
    responses(
        (status = 200, description = "Balance", body = crate::ApiResponse<VoucherBalance>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn voucher_balance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .services
        .vouchers
        .balance(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(balance))
}

#[utoipa::path(
    post,
    path = "/api/v1/vouchers/{id}/orders",
    params(("id" = i32, Path, description = "Voucher id")),
    request_body = LinkOrderInput,
    responses(
        (status = 200, description = "Order linked; new balance", body = crate::ApiResponse<VoucherBalance>),
        (status = 404, description = "Voucher or order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already linked", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn link_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<LinkOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .services
        .vouchers
        .link_order(id, payload.order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(balance))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vouchers/{id}/orders/{order_id}",
    params(
        ("id" = i32, Path, description = "Voucher id"),
        ("order_id" = i32, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Order unlinked; new balance", body = crate::ApiResponse<VoucherBalance>),
        (status = 404, description = "Order is not linked", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn unlink_order(
    State(state): State<AppState>,
    Path((id, order_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .services
        .vouchers
        .unlink_order(id, order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(balance))
}

/// Record an installment
#[utoipa::path(
    post,
    path = "/api/v1/vouchers/{id}/lines",
    params(("id" = i32, Path, description = "Voucher id")),
    request_body = VoucherLineInput,
    responses(
        (status = 201, description = "Line recorded", body = crate::ApiResponse<VoucherLineView>),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Voucher not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn add_line(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<VoucherLineInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let line = state
        .services
        .vouchers
        .add_line(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(line))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vouchers/{id}/lines/{line_id}",
    params(
        ("id" = i32, Path, description = "Voucher id"),
        ("line_id" = i32, Path, description = "Line id")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such line on this voucher", body = crate::errors::ErrorResponse)
    ),
    tag = "Vouchers"
)]
pub async fn remove_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .vouchers
        .remove_line(id, line_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
