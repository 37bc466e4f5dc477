#[cfg(feature = "ssr")]
use crate::error::AppError;
#[cfg(feature = "ssr")]
use axum::http::StatusCode;
#[cfg(feature = "ssr")]
use axum::response::{IntoResponse, Response};

/// API-specific error wrapper that converts AppError into HTTP responses.
///
/// The body is always `{"error": ...}`. Server-side failures add `details`
/// with the underlying cause, and debug builds also add `stack` with the
/// full error chain.
#[cfg(feature = "ssr")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while accessing the document store".to_string(),
                Some(msg.clone()),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(msg.clone()),
            ),
        };

        let mut body = serde_json::json!({
            "error": message
        });

        if let Some(details) = details {
            body["details"] = serde_json::Value::String(details);
            if cfg!(debug_assertions) {
                body["stack"] = serde_json::Value::String(format!("{:?}", self));
            }
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "ssr"))]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_client_errors_have_no_details() {
        let body = body_json(AppError::NotFound("Document not found".into()).into_response()).await;
        assert_eq!(body["error"], "Document not found");
        assert!(body.get("details").is_none());
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_database_error_carries_details() {
        let body = body_json(AppError::Database("connection refused".into()).into_response()).await;
        assert_eq!(body["details"], "connection refused");
        assert!(body["error"].as_str().unwrap().contains("document store"));
    }
}
