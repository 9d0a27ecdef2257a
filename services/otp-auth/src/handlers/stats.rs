use axum::{Json, extract::State};

use crate::domain::ports::{NetworkAuthorizer, Notifier};
use crate::state::AppState;
use crate::usecase::stats::{Dashboard, Stats};

// ── GET /api/stats ───────────────────────────────────────────────────────────

pub async fn stats<N, A>(State(state): State<AppState<N, A>>) -> Json<Stats>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    Json(state.core.stats())
}

// ── GET /api/dashboard ───────────────────────────────────────────────────────

pub async fn dashboard<N, A>(State(state): State<AppState<N, A>>) -> Json<Dashboard>
where
    N: Notifier + 'static,
    A: NetworkAuthorizer + 'static,
{
    Json(state.core.dashboard())
}
