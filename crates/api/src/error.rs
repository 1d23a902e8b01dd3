use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    /// 400, invalid input.
    BadRequest(String),
    /// 502, an upstream page or service failed.
    BadGateway(String),
    /// 500
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl ApiError {
    /// Reports `err` and wraps it as a 502 with `prefix` in the message.
    pub fn upstream(prefix: &str, err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::warn!(error = %err, "{prefix}");
        Self::BadGateway(format!("{prefix}: {err:#}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match self {
            Self::BadRequest(msg) => ("bad_request", msg),
            Self::BadGateway(msg) => ("bad_gateway", msg),
            Self::Internal(msg) => ("internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_keeps_context_chain() {
        let err = anyhow::anyhow!("HTTP 403").context("article request failed");
        let api = ApiError::upstream("Failed to fetch article", err);
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        match api {
            ApiError::BadGateway(msg) => {
                assert_eq!(msg, "Failed to fetch article: article request failed: HTTP 403")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
