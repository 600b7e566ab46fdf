use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use validator::Validate;

use crate::errors::ServiceError;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u64 = 20;
const DEFAULT_CATALOG_FALLBACK_PAGES: u64 = 5;
const CONFIG_DIR: &str = "config";

/// Fixed key the persisted cart lives under; every view of the same profile
/// directory reads and writes this one file.
pub const CART_STORAGE_KEY: &str = "comercia.cart.json";

/// Application configuration with validation.
///
/// Values are layered: built-in defaults, then `config/default.toml`, then
/// `config/{environment}.toml`, then `COMERCIA_*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the Comercia backend, e.g. `https://api.comercia.app/v1`.
    #[validate(url)]
    pub api_base_url: String,

    /// Bearer token forwarded on every request. Session management itself is
    /// handled elsewhere; the pipeline only carries the credential.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout applied by the HTTP client. No stage implements
    /// its own retry loop on top of this.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory the persisted cart file is kept in.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,

    /// Page size for order/product listings.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Cap on full-catalog pages fetched when a server-side product search
    /// returns nothing and we fall back to filtering client-side.
    #[serde(default = "default_catalog_fallback_pages")]
    pub catalog_fallback_pages: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_catalog_fallback_pages() -> u64 {
    DEFAULT_CATALOG_FALLBACK_PAGES
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    std::env::var("COMERCIA_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string())
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from(".comercia")
}

impl AppConfig {
    /// Loads configuration from the conventional `config/` directory plus the
    /// `COMERCIA_*` environment.
    pub fn load() -> Result<Self, ServiceError> {
        Self::load_from(Path::new(CONFIG_DIR))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ServiceError> {
        let environment = default_environment();

        let builder = Config::builder()
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?
            .set_default("catalog_fallback_pages", DEFAULT_CATALOG_FALLBACK_PAGES)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default("environment", environment.clone())?
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&environment)).required(false))
            .add_source(Environment::with_prefix("COMERCIA"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %config.environment,
            api_base_url = %config.api_base_url,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Full path of the persisted cart file.
    pub fn cart_storage_path(&self) -> PathBuf {
        self.profile_dir.join(CART_STORAGE_KEY)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}
