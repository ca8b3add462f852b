use axum::Router;

pub mod readiness;

/// Creates the API routes without the `/api/v1` prefix.
/// The prefix is added by the `create_router` helper.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest("/vectordb", domain_vector::router(state.service.clone()))
}

/// Router with the `/readiness` endpoint, which calls Milvus.
///
/// Has state applied so it can be merged with the stateless app router.
pub fn readiness_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/readiness", get(readiness::readiness_handler))
        .with_state(state)
}
