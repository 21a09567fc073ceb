use crate::handlers::common::{
    created_response, map_service_error, success_response, validate_input, ApiJson, PageWindow,
};
use crate::services::users::{CreateUserInput, UserView};
use crate::{errors::ApiError, AppState, ListQuery};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Creates the router for user endpoints
pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserInput,
    responses(
        (status = 201, description = "User created", body = crate::ApiResponse<UserView>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let user = state
        .services
        .users
        .create_user(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(UserView::from(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListQuery),
    responses(
        (status = 200, description = "Users", body = crate::ApiResponse<crate::PaginatedResponse<UserView>>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = PageWindow::resolve(query.page, query.limit, &state.config)?;
    let (users, total) = state
        .services
        .users
        .list_users(query.search, window.limit, window.offset())
        .await
        .map_err(map_service_error)?;
    let items = users.into_iter().map(UserView::from).collect();
    Ok(success_response(window.respond(items, total)))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = crate::ApiResponse<UserView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .services
        .users
        .get_user(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserView::from(user)))
}
