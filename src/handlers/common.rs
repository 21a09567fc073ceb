use crate::config::AppConfig;
use crate::errors::{ApiError, ServiceError};
use crate::validation::FieldErrors;
use crate::{ApiResponse, PaginatedResponse};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// 201 when the upsert inserted a record, 200 when it replaced one
pub fn saved_response<T: Serialize>(data: T, created: bool) -> Response {
    if created {
        created_response(data)
    } else {
        success_response(data)
    }
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// JSON body extractor whose rejections render as [`ErrorResponse`](crate::errors::ErrorResponse).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(FieldErrors::from(e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Resolved pagination window for a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Validates the 1-based `page` and clamps `limit` to the configured bounds.
    pub fn resolve(page: u64, limit: Option<u64>, config: &AppConfig) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::BadRequest {
                message: "page must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            page,
            limit: config.page_size(limit),
        })
    }

    /// Calculate zero-based offset for pagination
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn respond<T>(&self, items: Vec<T>, total: u64) -> PaginatedResponse<T> {
        PaginatedResponse::new(items, total, self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(PageWindow::resolve(0, None, &config()).is_err());
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let window = PageWindow::resolve(3, Some(10), &config()).unwrap();
        assert_eq!(window.offset(), 20);
        let clamped = PageWindow::resolve(1, Some(10_000), &config()).unwrap();
        assert_eq!(clamped.limit, 100);
    }

    #[tokio::test]
    async fn wrong_typed_bodies_are_bad_requests() {
        #[derive(Debug, serde::Deserialize)]
        struct Eye {
            #[allow(dead_code)]
            axis: Option<i32>,
        }

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"axis": "ninety"}"#))
            .unwrap();
        let err = ApiJson::<Eye>::from_request(request, &()).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["error"], "Bad Request");
        assert!(payload["message"].as_str().unwrap().contains("axis"));
    }

    #[test]
    fn responses_are_wrapped_in_the_envelope() {
        let response = created_response(serde_json::json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(saved_response((), false).status(), StatusCode::OK);
        assert_eq!(no_content_response().status(), StatusCode::NO_CONTENT);
    }
}
