use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ApiJson, PageWindow,
};
use crate::services::products::{ProductInput, ProductView, UpdateProductInput};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new().route("/", get(list_products)).route(
        "/:id",
        get(get_product).put(update_product).delete(delete_product),
    )
}

/// Products nested under an order, merged into the orders router
pub fn order_product_routes() -> Router<AppState> {
    Router::new().route("/:id/products", get(list_order_products).post(create_product))
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    pub order_id: Option<i32>,
}

fn default_page() -> u64 {
    1
}

/// Add a product to an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/products",
    params(("id" = i32, Path, description = "Order id")),
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<ProductView>),
        (status = 400, description = "Invalid price or unknown catalog row", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    ApiJson(payload): ApiJson<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .products
        .create_product(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

/// Products of an order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/products",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Products", body = crate::ApiResponse<Vec<ProductView>>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_order_products(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .products_for_order(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(products))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products", body = crate::ApiResponse<crate::PaginatedResponse<ProductView>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .products
        .list_products(query.order_id, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = crate::ApiResponse<ProductView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

/// Update price or catalog references
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = crate::ApiResponse<ProductView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<UpdateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let product = state
        .services
        .products
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
