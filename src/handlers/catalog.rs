use crate::entities::glass_type::Distance;
use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ApiJson, PageWindow,
};
use crate::services::catalog::{
    FrameInput, FrameView, GlassTypeInput, GlassTypeView, LensInput, LensView,
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

pub fn frames_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_frames).post(create_frame))
        .route("/:id", get(get_frame).put(update_frame).delete(delete_frame))
}

pub fn glass_types_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_glass_types).post(create_glass_type))
        .route(
            "/:id",
            get(get_glass_type)
                .put(update_glass_type)
                .delete(delete_glass_type),
        )
}

pub fn lenses_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lenses).post(create_lens))
        .route("/:id", get(get_lens).put(update_lens).delete(delete_lens))
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct GlassTypeListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    /// `FAR`, `MEDIUM` or `NEAR`
    #[param(value_type = Option<String>)]
    pub distance: Option<Distance>,
}

fn default_page() -> u64 {
    1
}

// ---- frames ----

#[utoipa::path(
    get,
    path = "/api/v1/frames",
    params(ListQuery),
    responses(
        (status = 200, description = "Frames", body = crate::ApiResponse<crate::PaginatedResponse<FrameView>>)
    ),
    tag = "Catalog"
)]
pub async fn list_frames(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .catalog
        .list_frames(query.search, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

#[utoipa::path(
    post,
    path = "/api/v1/frames",
    request_body = FrameInput,
    responses(
        (status = 201, description = "Frame created", body = crate::ApiResponse<FrameView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_frame(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FrameInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let frame = state
        .services
        .catalog
        .create_frame(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(frame))
}

#[utoipa::path(
    get,
    path = "/api/v1/frames/{id}",
    params(("id" = i32, Path, description = "Frame id")),
    responses(
        (status = 200, description = "Frame", body = crate::ApiResponse<FrameView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_frame(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let frame = state
        .services
        .catalog
        .get_frame(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(frame))
}

#[utoipa::path(
    put,
    path = "/api/v1/frames/{id}",
    params(("id" = i32, Path, description = "Frame id")),
    request_body = FrameInput,
    responses(
        (status = 200, description = "Frame updated", body = crate::ApiResponse<FrameView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_frame(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<FrameInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let frame = state
        .services
        .catalog
        .update_frame(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(frame))
}

/// Delete an unreferenced frame
#[utoipa::path(
    delete,
    path = "/api/v1/frames/{id}",
    params(("id" = i32, Path, description = "Frame id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Frame is used by a product", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_frame(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_frame(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// ---- glass types ----

#[utoipa::path(
    get,
    path = "/api/v1/glass-types",
    params(GlassTypeListQuery),
    responses(
        (status = 200, description = "Glass types", body = crate::ApiResponse<crate::PaginatedResponse<GlassTypeView>>)
    ),
    tag = "Catalog"
)]
pub async fn list_glass_types(
    State(state): State<AppState>,
    Query(query): Query<GlassTypeListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .catalog
        .list_glass_types(query.distance, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

#[utoipa::path(
    post,
    path = "/api/v1/glass-types",
    request_body = GlassTypeInput,
    responses(
        (status = 201, description = "Glass type created", body = crate::ApiResponse<GlassTypeView>)
    ),
    tag = "Catalog"
)]
pub async fn create_glass_type(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GlassTypeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let glass_type = state
        .services
        .catalog
        .create_glass_type(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(glass_type))
}

#[utoipa::path(
    get,
    path = "/api/v1/glass-types/{id}",
    params(("id" = i32, Path, description = "Glass type id")),
    responses(
        (status = 200, description = "Glass type", body = crate::ApiResponse<GlassTypeView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_glass_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let glass_type = state
        .services
        .catalog
        .get_glass_type(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(glass_type))
}

#[utoipa::path(
    put,
    path = "/api/v1/glass-types/{id}",
    params(("id" = i32, Path, description = "Glass type id")),
    request_body = GlassTypeInput,
    responses(
        (status = 200, description = "Glass type updated", body = crate::ApiResponse<GlassTypeView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_glass_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<GlassTypeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let glass_type = state
        .services
        .catalog
        .update_glass_type(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(glass_type))
}

#[utoipa::path(
    delete,
    path = "/api/v1/glass-types/{id}",
    params(("id" = i32, Path, description = "Glass type id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Glass type is used by a product", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_glass_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_glass_type(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// ---- lenses ----

#[utoipa::path(
    get,
    path = "/api/v1/lenses",
    params(ListQuery),
    responses(
        (status = 200, description = "Lenses", body = crate::ApiResponse<crate::PaginatedResponse<LensView>>)
    ),
    tag = "Catalog"
)]
pub async fn list_lenses(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (items, total) = state
        .services
        .catalog
        .list_lenses(query.search, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(window.respond(items, total)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lenses",
    request_body = LensInput,
    responses(
        (status = 201, description = "Lens created", body = crate::ApiResponse<LensView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_lens(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LensInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let lens = state
        .services
        .catalog
        .create_lens(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(lens))
}

#[utoipa::path(
    get,
    path = "/api/v1/lenses/{id}",
    params(("id" = i32, Path, description = "Lens id")),
    responses(
        (status = 200, description = "Lens", body = crate::ApiResponse<LensView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_lens(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let lens = state
        .services
        .catalog
        .get_lens(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lens))
}

#[utoipa::path(
    put,
    path = "/api/v1/lenses/{id}",
    params(("id" = i32, Path, description = "Lens id")),
    request_body = LensInput,
    responses(
        (status = 200, description = "Lens updated", body = crate::ApiResponse<LensView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_lens(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<LensInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let lens = state
        .services
        .catalog
        .update_lens(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lens))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lenses/{id}",
    params(("id" = i32, Path, description = "Lens id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Lens is used by a product", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_lens(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .delete_lens(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
