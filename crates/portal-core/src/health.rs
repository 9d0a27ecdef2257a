use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Body of both probes. Every portal service keeps its state in memory, so once the
/// listener answers it is also ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// `GET /healthz` and `GET /readyz` for a service, mergeable into its router.
pub fn health_routes<S>(service: &'static str, version: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let report = ProbeReport {
        status: "ok",
        service,
        version,
    };
    Router::new()
        .route("/healthz", get(move || async move { Json(report) }))
        .route("/readyz", get(move || async move { Json(report) }))
}
