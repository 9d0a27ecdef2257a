use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::error::OtpAuthError;
use crate::handlers::payload::Payload;
use crate::state::AppState;
use crate::usecase::check_auth::CheckAuthInput;

// ── GET|POST /api/check_auth ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct CheckAuthRequest {
    #[serde(default, alias = "device_id")]
    pub mac: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

impl CheckAuthResponse {
    fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            email: None,
            expires_in_secs: None,
        }
    }
}

/// Always answers in the `CheckAuthResponse` shape; a missing device id is a 400 with
/// `authenticated: false`.
fn check<N, A>(state: &AppState<N, A>, req: CheckAuthRequest) -> Response
where
    N: Notifier,
    A: NetworkAuthorizer,
{
    match state.core.check_auth(CheckAuthInput {
        device_id: req.mac,
        token: req.token,
    }) {
        Ok(out) => Json(CheckAuthResponse {
            authenticated: out.authenticated,
            email: out.address,
            expires_in_secs: out.expires_in_secs,
        })
        .into_response(),
        Err(OtpAuthError::MissingInput) => {
            (StatusCode::BAD_REQUEST, Json(CheckAuthResponse::unauthenticated())).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn check_auth_query<N, A>(
    State(state): State<AppState<N, A>>,
    Query(query): Query<CheckAuthRequest>,
) -> Response
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    check(&state, query)
}

pub async fn check_auth<N, A>(
    State(state): State<AppState<N, A>>,
    body: Result<Payload<CheckAuthRequest>, OtpAuthError>,
) -> Response
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    let req = body.map(|Payload(req)| req).unwrap_or_default();
    check(&state, req)
}
