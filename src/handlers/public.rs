//! Front-desk forms: the landing banner, standalone identity creation and the
//! tunnel submission.

use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, ApiJson,
};
use crate::services::order_details::{IdentityView, NewIdentityInput};
use crate::services::tunnel::{TunnelReceipt, TunnelSubmission};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub fn tunnel_routes() -> Router<AppState> {
    Router::new().route("/", post(submit_tunnel))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub docs: String,
}

/// Landing banner
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = crate::ApiResponse<Banner>)
    ),
    tag = "Public"
)]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    success_response(Banner {
        service: "optica-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        docs: "/swagger-ui".to_string(),
    })
}

/// Create the identity of an existing order
#[utoipa::path(
    post,
    path = "/api/v1/identities",
    request_body = NewIdentityInput,
    responses(
        (status = 201, description = "Identity created", body = crate::ApiResponse<IdentityView>),
        (status = 400, description = "Invalid names", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already has an identity", body = crate::errors::ErrorResponse)
    ),
    tag = "Public"
)]
pub async fn create_identity(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewIdentityInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (order_id, input) = payload.split();
    let identity = state
        .services
        .order_details
        .create_identity(order_id, input)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(identity))
}

/// Open an order with identity, contact, institution, prescription and one
/// product in a single all-or-nothing write
#[utoipa::path(
    post,
    path = "/api/v1/tunnel",
    request_body = TunnelSubmission,
    responses(
        (status = 201, description = "Everything stored", body = crate::ApiResponse<TunnelReceipt>),
        (status = 400, description = "Field errors across sub-forms; nothing stored", body = crate::errors::ErrorResponse)
    ),
    tag = "Public"
)]
pub async fn submit_tunnel(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TunnelSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .services
        .tunnel
        .submit(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(receipt))
}
