use core_config::{AppInfo, FromEnv, app_info, env_optional, server::ServerConfig};
use domain_vector::VectorDbSettings;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration
/// Composes shared config components from `core_config` and `domain_vector`
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    /// `LOG_LEVEL`, overridden by `RUST_LOG`
    pub log_level: Option<String>,
    /// Comma-separated origins; permissive CORS when unset
    pub cors_allowed_origin: Option<String>,
    pub vectordb: VectorDbSettings,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let vectordb = VectorDbSettings::from_env()?; // Required - lists every missing variable
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8000

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            log_level: env_optional("LOG_LEVEL"),
            cors_allowed_origin: env_optional("CORS_ALLOWED_ORIGIN"),
            vectordb,
        })
    }
}
