//! Server infrastructure module.
//!
//! This module provides:
//! - Application setup with OpenAPI documentation
//! - Root banner and readiness probe helpers
//! - Graceful shutdown coordination
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{RouterOptions, create_production_app, create_router, root_router};
//! use core_config::{server::ServerConfig, app_info};
//!
//! let router = create_router::<ApiDoc>(api_routes, RouterOptions::new("/api/v1")).await?;
//! let app = router.merge(root_router("service is running", app_info!()));
//!
//! create_production_app(app, &ServerConfig::default(), Duration::from_secs(30), async {}).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{RouterOptions, create_production_app, create_router};
pub use health::{
    ReadinessCheckFuture, ReadinessResponse, RootResponse, root_router, run_readiness_checks,
};
pub use shutdown::ShutdownCoordinator;
