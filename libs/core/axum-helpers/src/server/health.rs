use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use core_config::AppInfo;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use utoipa::ToSchema;

/// Liveness banner served at `/`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Body of the `/readiness` probe.
///
/// Successful checks contribute their value under the check's name, so a check
/// named `milvus_version` surfaces as a top-level `milvus_version` field.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub services_ready: bool,
    pub timestamp: String,
    pub version: String,
    /// One field per passing check, keyed by check name
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// A boxed readiness check yielding a value to report, or an error string
pub type ReadinessCheckFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'a>>;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Runs readiness checks concurrently.
///
/// All checks passing yields 200 with `status: "ready"`. Any failure yields
/// 500 with `status: "error"` and no per-check values.
///
/// # Example
/// ```ignore
/// let checks: Vec<(&str, ReadinessCheckFuture)> = vec![
///     ("milvus_version", Box::pin(async {
///         index.server_version().await.map(Value::from).map_err(|e| e.to_string())
///     })),
/// ];
/// run_readiness_checks(app_info!(), checks).await
/// ```
pub async fn run_readiness_checks(
    app: AppInfo,
    checks: Vec<(&str, ReadinessCheckFuture<'_>)>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let names: Vec<_> = checks.iter().map(|(name, _)| *name).collect();
    let futures: Vec<_> = checks.into_iter().map(|(_, check)| check).collect();
    let results = join_all(futures).await;

    let mut extra = Map::new();
    let mut all_ready = true;

    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) => {
                extra.insert(name.to_string(), value);
            }
            Err(e) => {
                tracing::error!("Readiness check failed: {} error: {}", name, e);
                all_ready = false;
            }
        }
    }

    if all_ready {
        let body = ReadinessResponse {
            status: "ready".to_string(),
            services_ready: true,
            timestamp: now_rfc3339(),
            version: app.version.to_string(),
            extra,
        };
        (StatusCode::OK, Json(body))
    } else {
        let body = ReadinessResponse {
            status: "error".to_string(),
            services_ready: false,
            timestamp: now_rfc3339(),
            version: app.version.to_string(),
            extra: Map::new(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
    }
}

#[derive(Clone)]
struct RootState {
    message: &'static str,
    app: AppInfo,
}

async fn root_handler(State(state): State<RootState>) -> Response {
    let body = RootResponse {
        message: state.message.to_string(),
        version: state.app.version.to_string(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Router serving the `/` banner with the given message and app version.
pub fn root_router(message: &'static str, app: AppInfo) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .with_state(RootState { message, app })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const APP: AppInfo = AppInfo {
        name: "test-app",
        version: "9.9.9",
    };

    #[tokio::test]
    async fn test_all_checks_pass() {
        let checks: Vec<(&str, ReadinessCheckFuture)> = vec![(
            "milvus_version",
            Box::pin(async { Ok(Value::from("v2")) }),
        )];

        let (status, Json(body)) = run_readiness_checks(APP, checks).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert!(body.services_ready);
        assert_eq!(body.version, "9.9.9");
        assert_eq!(body.extra.get("milvus_version"), Some(&Value::from("v2")));
    }

    #[tokio::test]
    async fn test_failed_check_reports_error() {
        let checks: Vec<(&str, ReadinessCheckFuture)> = vec![
            ("ok", Box::pin(async { Ok(Value::Bool(true)) })),
            ("broken", Box::pin(async { Err("connection refused".to_string()) })),
        ];

        let (status, Json(body)) = run_readiness_checks(APP, checks).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status, "error");
        assert!(!body.services_ready);
        assert!(body.extra.is_empty());
    }

    #[test]
    fn test_readiness_extra_is_flattened() {
        let mut extra = Map::new();
        extra.insert("milvus_version".into(), Value::from("v2"));
        let body = ReadinessResponse {
            status: "ready".into(),
            services_ready: true,
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            version: "1.0.0".into(),
            extra,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["milvus_version"], "v2");
        assert!(json.get("extra").is_none());
    }

    #[tokio::test]
    async fn test_root_router() {
        let router = root_router("service is running", APP);

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: RootResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, "service is running");
        assert_eq!(body.version, "9.9.9");
    }
}
