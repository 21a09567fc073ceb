//! Identity, contact, institution and prescription of an order.
//!
//! Each record is addressed through its order (`/orders/{id}/identity`) and
//! edited inline with `PUT`, which creates the record when the order has none.
//! Search lists live under their own collection paths.

use crate::handlers::common::{
    map_service_error, no_content_response, saved_response, success_response, validate_input,
    ApiJson, PageWindow,
};
use crate::services::order_details::{
    ContactInput, ContactView, IdentityInput, IdentityView, InstitutionInput, InstitutionView,
    PrescriptionInput, PrescriptionView,
};
use crate::{errors::ApiError, AppState, ListQuery};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Per-order routes, merged into the orders router
pub fn order_detail_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:id/identity",
            get(get_identity).put(put_identity).delete(delete_identity),
        )
        .route(
            "/:id/contact",
            get(get_contact).put(put_contact).delete(delete_contact),
        )
        .route(
            "/:id/institution",
            get(get_institution)
                .put(put_institution)
                .delete(delete_institution),
        )
        .route(
            "/:id/prescription",
            get(get_prescription)
                .put(put_prescription)
                .delete(delete_prescription),
        )
}

pub fn identities_routes() -> Router<AppState> {
    Router::new().route("/", get(list_identities).post(super::public::create_identity))
}

pub fn contacts_routes() -> Router<AppState> {
    Router::new().route("/", get(list_contacts))
}

pub fn institutions_routes() -> Router<AppState> {
    Router::new().route("/", get(list_institutions))
}

pub fn prescriptions_routes() -> Router<AppState> {
    Router::new().route("/", get(list_prescriptions))
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct IdentityListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    /// First name, last name or order id
    pub search: Option<String>,
    pub order_id: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct PrescriptionListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    pub order_id: Option<i32>,
}

fn default_page() -> u64 {
    1
}

// ---- identity ----

/// Identity of an order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/identity",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Identity", body = crate::ApiResponse<IdentityView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn get_identity(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = state
        .services
        .order_details
        .get_identity(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(identity))
}

/// Create or replace the identity of an order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/identity",
    params(("id" = i32, Path, description = "Order id")),
    request_body = IdentityInput,
    responses(
        (status = 200, description = "Identity replaced", body = crate::ApiResponse<IdentityView>),
        (status = 201, description = "Identity created", body = crate::ApiResponse<IdentityView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn put_identity(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    ApiJson(payload): ApiJson<IdentityInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (identity, created) = state
        .services
        .order_details
        .upsert_identity(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(saved_response(identity, created))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/identity",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn delete_identity(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .order_details
        .delete_identity(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Search identities
#[utoipa::path(
    get,
    path = "/api/v1/identities",
    params(IdentityListQuery),
    responses(
        (status = 200, description = "Identities", body = crate::ApiResponse<crate::PaginatedResponse<IdentityView>>)
    ),
    tag = "Order details"
)]
pub async fn list_identities(
    State(state): State<AppState>,
    Query(query): Query<IdentityListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .order_details
        .list_identities(query.search, query.order_id, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

// ---- contact ----

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/contact",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Contact", body = crate::ApiResponse<ContactView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn get_contact(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = state
        .services
        .order_details
        .get_contact(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(contact))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/contact",
    params(("id" = i32, Path, description = "Order id")),
    request_body = ContactInput,
    responses(
        (status = 200, description = "Contact replaced", body = crate::ApiResponse<ContactView>),
        (status = 201, description = "Contact created", body = crate::ApiResponse<ContactView>),
        (status = 400, description = "Invalid phone number", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn put_contact(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    ApiJson(payload): ApiJson<ContactInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (contact, created) = state
        .services
        .order_details
        .upsert_contact(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(saved_response(contact, created))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/contact",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .order_details
        .delete_contact(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Search contacts by phone number
#[utoipa::path(
    get,
    path = "/api/v1/contacts",
    params(ListQuery),
    responses(
        (status = 200, description = "Contacts", body = crate::ApiResponse<crate::PaginatedResponse<ContactView>>)
    ),
    tag = "Order details"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .order_details
        .list_contacts(query.search, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

// ---- institution ----

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/institution",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Institution", body = crate::ApiResponse<InstitutionView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn get_institution(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let institution = state
        .services
        .order_details
        .get_institution(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(institution))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/institution",
    params(("id" = i32, Path, description = "Order id")),
    request_body = InstitutionInput,
    responses(
        (status = 200, description = "Institution replaced", body = crate::ApiResponse<InstitutionView>),
        (status = 201, description = "Institution created", body = crate::ApiResponse<InstitutionView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn put_institution(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    ApiJson(payload): ApiJson<InstitutionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (institution, created) = state
        .services
        .order_details
        .upsert_institution(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(saved_response(institution, created))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/institution",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn delete_institution(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .order_details
        .delete_institution(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Search institutions by title or address
#[utoipa::path(
    get,
    path = "/api/v1/institutions",
    params(ListQuery),
    responses(
        (status = 200, description = "Institutions", body = crate::ApiResponse<crate::PaginatedResponse<InstitutionView>>)
    ),
    tag = "Order details"
)]
pub async fn list_institutions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .order_details
        .list_institutions(query.search, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

// ---- prescription ----

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/prescription",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Prescription", body = crate::ApiResponse<PrescriptionView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn get_prescription(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let prescription = state
        .services
        .order_details
        .get_prescription(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(prescription))
}

/// Replace every measurement of an order's prescription
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/prescription",
    params(("id" = i32, Path, description = "Order id")),
    request_body = PrescriptionInput,
    responses(
        (status = 200, description = "Prescription replaced", body = crate::ApiResponse<PrescriptionView>),
        (status = 201, description = "Prescription created", body = crate::ApiResponse<PrescriptionView>),
        (status = 400, description = "Measurement out of range", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn put_prescription(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    ApiJson(payload): ApiJson<PrescriptionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (prescription, created) = state
        .services
        .order_details
        .upsert_prescription(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(saved_response(prescription, created))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/prescription",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Order details"
)]
pub async fn delete_prescription(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .order_details
        .delete_prescription(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Prescriptions, optionally for one order
#[utoipa::path(
    get,
    path = "/api/v1/prescriptions",
    params(PrescriptionListQuery),
    responses(
        (status = 200, description = "Prescriptions", body = crate::ApiResponse<crate::PaginatedResponse<PrescriptionView>>)
    ),
    tag = "Order details"
)]
pub async fn list_prescriptions(
    State(state): State<AppState>,
    Query(query): Query<PrescriptionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .order_details
        .list_prescriptions(query.order_id, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}
