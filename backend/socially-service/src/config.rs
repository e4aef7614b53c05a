/// Configuration management for socially-service
///
/// Everything comes from environment variables (optionally seeded from a
/// `.env` file by `main`). Pool tuning is delegated to `db_pool::DbConfig`.
use db_pool::env_utils::{non_empty_env, parse_env_with_default};
use db_pool::DbConfig;

const SERVICE_NAME: &str = "socially-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database pool configuration
    pub database: DbConfig,
    /// Identity provider token verification
    pub identity: IdentityConfig,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// HTTP worker threads; `None` lets actix pick one per core
    pub workers: Option<usize>,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

/// Identity provider settings
///
/// The public key itself is read by `crypto_core::jwt::load_validation_key`.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    /// Expected `iss` claim, if the provider sets one
    pub issuer: Option<String>,
    /// Clock skew tolerated when checking `exp`
    pub leeway_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("SOCIALLY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_with_default("SOCIALLY_PORT", 8080),
                workers: db_pool::env_utils::parse_env_optional::<usize>("HTTP_WORKERS")
                    .filter(|w| *w > 0),
            },
            cors: {
                let allowed_origins = match non_empty_env("CORS_ALLOWED_ORIGINS") {
                    Some(value) => value,
                    None if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    None => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.split(',').any(|o| o.trim() == "*") {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DbConfig::from_env(SERVICE_NAME)?,
            identity: IdentityConfig {
                issuer: non_empty_env("IDENTITY_JWT_ISSUER"),
                leeway_secs: parse_env_with_default("IDENTITY_JWT_LEEWAY_SECS", 30),
            },
        })
    }
}
