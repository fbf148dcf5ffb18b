use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::Configuration(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::ConfigurationError, Some(msg))
            }
            AppError::Upstream(_) => error_resp(
                StatusCode::BAD_GATEWAY,
                ErrorCode::UpstreamError,
                Some("Payment processor request failed".into()),
            ),
            AppError::PaymentVerificationFailed(msg) => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::PaymentVerificationFailed,
                Some(msg),
            ),
            AppError::InvalidSignature => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidSignature, None)
            }
            AppError::SubscriptionRequired => error_resp(
                StatusCode::FORBIDDEN,
                ErrorCode::SubscriptionRequired,
                Some("Active subscription required".into()),
            ),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn errors_map_to_documented_statuses() {
        assert_eq!(status_of(AppError::Configuration("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::Upstream("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(AppError::PaymentVerificationFailed("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::SubscriptionRequired), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::Database("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
