use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::ports::EntropyError;

/// Credential lifecycle error variants. All but `Unavailable` are expected outcomes.
#[derive(Debug, thiserror::Error)]
pub enum OtpAuthError {
    #[error("invalid email address")]
    InvalidAddress,
    #[error("missing otp or device id")]
    MissingInput,
    #[error("invalid otp code")]
    InvalidCode,
    #[error("otp already used")]
    AlreadyUsed,
    #[error("otp expired")]
    Expired,
    #[error("failed to deliver otp")]
    DeliveryFailed,
    #[error("credential source unavailable")]
    Unavailable(#[from] EntropyError),
}

impl OtpAuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::MissingInput => "MISSING_INPUT",
            Self::InvalidCode => "INVALID_CODE",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::Expired => "EXPIRED",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl IntoResponse for OtpAuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidAddress | Self::MissingInput => StatusCode::BAD_REQUEST,
            Self::InvalidCode | Self::AlreadyUsed | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        // TraceLayer already records every status; only the fatal case carries a cause
        // worth logging.
        if let Self::Unavailable(ref e) = self {
            tracing::error!(error = %e, kind = "UNAVAILABLE", "credential source unavailable");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
