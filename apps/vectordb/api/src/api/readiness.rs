//! Readiness probe backed by a real Milvus round trip.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{ReadinessCheckFuture, run_readiness_checks};
use serde_json::Value;

/// 200 with `milvus_version` when Milvus answers, 500 otherwise.
///
/// Milvus REST has no version endpoint, so `milvus_version` is the API
/// generation (`rest-v2`) rather than a server build number.
pub async fn readiness_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, ReadinessCheckFuture<'_>)> = vec![(
        "milvus_version",
        Box::pin(async {
            state
                .service
                .server_version()
                .await
                .map(Value::String)
                .map_err(|e| format!("Milvus check failed: {}", e))
        }),
    )];

    run_readiness_checks(state.config.app, checks)
        .await
        .into_response()
}
