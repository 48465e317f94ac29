use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// GET /health: liveness probe with scheduler counters.
///
/// `status` is `degraded` when the reminder table cannot be read or some
/// stored reminders cannot be scheduled (their ids are listed under `faults`).
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let faults: Vec<i64> = state.scheduler.faults().into_iter().map(|id| id.0).collect();
    let reminders = match state.scheduler.store().count() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(error = %e, "health: cannot count reminders");
            None
        }
    };
    let status = if reminders.is_some() && faults.is_empty() {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "armed_jobs": state.scheduler.armed_count(),
        "reminders": reminders,
        "faults": faults,
    }))
}
