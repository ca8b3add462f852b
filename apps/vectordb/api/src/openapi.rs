//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the VectorDB API
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "VectorDB API",
        version = "0.1.0",
        description = "Semantic search over data-dictionary columns stored in Milvus"
    ),
    servers(
        (url = "/api/v1", description = "API base path")
    ),
    nest(
        (path = "/vectordb", api = domain_vector::VectorApiDoc)
    )
)]
pub struct ApiDoc;
