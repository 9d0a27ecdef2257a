use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::error::OtpAuthError;
use crate::handlers::caller::CallerAddress;
use crate::handlers::payload::Payload;
use crate::state::AppState;
use crate::usecase::request_otp::RequestOtpInput;
use crate::usecase::verify_otp::VerifyOtpInput;

// ── POST /api/request_otp ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct RequestOtpResponse {
    pub message: &'static str,
    pub validity_secs: u64,
}

pub async fn request_otp<N, A>(
    State(state): State<AppState<N, A>>,
    Payload(body): Payload<RequestOtpRequest>,
) -> Result<Json<RequestOtpResponse>, OtpAuthError>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    let out = state
        .core
        .request_otp(RequestOtpInput { email: body.email })
        .await?;
    Ok(Json(RequestOtpResponse {
        message: "otp sent to your email",
        validity_secs: out.validity_secs,
    }))
}

// ── POST|GET /api/verify_otp ─────────────────────────────────────────────────

/// Field names follow the captive-portal page: `otp` and `mac`.
#[derive(Deserialize, Default)]
pub struct VerifyOtpRequest {
    #[serde(default, alias = "code")]
    pub otp: Option<String>,
    #[serde(default, alias = "device_id")]
    pub mac: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub expires_in_secs: u64,
    pub router_granted: bool,
}

async fn verify<N, A>(
    state: AppState<N, A>,
    caller: CallerAddress,
    req: VerifyOtpRequest,
) -> Result<Json<VerifyOtpResponse>, OtpAuthError>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    let out = state
        .core
        .verify_otp(VerifyOtpInput {
            code: req.otp,
            device_id: req.mac,
            caller_address: caller.0,
        })
        .await?;
    Ok(Json(VerifyOtpResponse {
        token: out.token,
        expires_in_secs: out.expires_in_secs,
        router_granted: out.router_granted,
    }))
}

pub async fn verify_otp<N, A>(
    State(state): State<AppState<N, A>>,
    caller: CallerAddress,
    Payload(body): Payload<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpAuthError>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    verify(state, caller, body).await
}

pub async fn verify_otp_query<N, A>(
    State(state): State<AppState<N, A>>,
    caller: CallerAddress,
    Query(query): Query<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpAuthError>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    verify(state, caller, query).await
}
