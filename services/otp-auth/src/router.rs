use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tower_http::trace::TraceLayer;

use portal_core::health::health_routes;
use portal_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::handlers::{
    otp::{request_otp, verify_otp, verify_otp_query},
    session::{check_auth, check_auth_query},
    stats::{dashboard, stats},
};
use crate::state::AppState;
use crate::usecase::CredentialCore;

pub const SERVICE_NAME: &str = "otp-auth";

pub fn build_router<N, A>(core: Arc<CredentialCore<N, A>>) -> Router
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    Router::new()
        .merge(health_routes(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
        // OTP
        .route("/api/request_otp", post(request_otp::<N, A>))
        .route(
            "/api/verify_otp",
            post(verify_otp::<N, A>).get(verify_otp_query::<N, A>),
        )
        // Session
        .route(
            "/api/check_auth",
            get(check_auth_query::<N, A>).post(check_auth::<N, A>),
        )
        // Query facade
        .route("/api/stats", get(stats::<N, A>))
        .route("/api/dashboard", get(dashboard::<N, A>))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(AppState::new(core))
}
