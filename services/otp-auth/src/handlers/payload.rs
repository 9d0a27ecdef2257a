use axum::body::{Body, to_bytes};
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::OtpAuthError;

/// Portal forms send a handful of short fields.
const BODY_LIMIT: usize = 16 * 1024;

/// POST body read as JSON or as an urlencoded form, chosen by `Content-Type`.
///
/// An empty body yields `T::default()`, so absent fields reach the core and come back as
/// its own errors. An unreadable body is `MissingInput`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = OtpAuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = is_form(&req);
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, BODY_LIMIT).await.map_err(|e| {
            debug!(error = %e, "request body unreadable");
            OtpAuthError::MissingInput
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let parsed = if form {
            Form::<T>::from_request(Request::from_parts(parts, Body::from(bytes)), state)
                .await
                .map(|Form(value)| value)
                .map_err(|e| e.body_text())
        } else {
            Json::<T>::from_bytes(&bytes)
                .map(|Json(value)| value)
                .map_err(|e| e.body_text())
        };
        parsed.map(Self).map_err(|reason| {
            debug!(reason = %reason, "request body rejected");
            OtpAuthError::MissingInput
        })
    }
}
