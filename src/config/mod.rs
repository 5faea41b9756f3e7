use crate::util::env::{get_bool_from_env_or, get_env_or, get_vec_from_env_or, load_dotenv};
use anyhow::{bail, Result};
use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub mod db;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,

    pub http: HTTPConfig,
    pub db: DBConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct HTTPConfig {
    pub ip: String,
    pub port: u16,
    pub cors: CORSConfig,
}

#[derive(Debug, Clone)]
pub struct DBConfig {
    pub url: String,
    pub pool_size: u32,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone)]
pub struct CORSConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: u64,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_requests: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        load_dotenv();

        Ok(AppConfig {
            app_name: get_env_or("APP_NAME", "Quill".to_string())?,
            app_version: get_env_or("APP_VERSION", env!("CARGO_PKG_VERSION").to_string())?,

            http: HTTPConfig::from_env()?,
            db: DBConfig::from_env()?,
            log: LogConfig::from_env()?,
        })
    }
}

impl HTTPConfig {
    pub fn from_env() -> Result<Self> {
        Ok(HTTPConfig {
            ip: get_env_or("HTTP_IP", "127.0.0.1".to_string())?,
            port: get_env_or("HTTP_PORT", 8000)?,
            cors: CORSConfig::from_env()?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl DBConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DBConfig {
            url: get_env_or("DATABASE_URL", "sqlite:quill.db".to_string())?,
            pool_size: get_env_or("DATABASE_POOL_SIZE", 5)?,
            auto_migrate: get_bool_from_env_or("DATABASE_AUTO_MIGRATE", true)?,
        })
    }
}

impl CORSConfig {
    pub fn from_env() -> Result<Self> {
        let cors = CORSConfig {
            allowed_origins: get_vec_from_env_or("CORS_ALLOWED_ORIGINS", vec![])?,
            allowed_methods: get_vec_from_env_or(
                "CORS_ALLOWED_METHODS",
                strs_to_strings(&["GET", "POST", "PUT", "DELETE", "OPTIONS"]),
            )?,
            allowed_headers: get_vec_from_env_or(
                "CORS_ALLOWED_HEADERS",
                strs_to_strings(&["Content-Type", "Authorization"]),
            )?,
            allow_credentials: get_bool_from_env_or("CORS_ALLOW_CREDENTIALS", false)?,
            max_age: get_env_or("CORS_MAX_AGE", 86400)?,
        };
        cors.check()?;

        Ok(cors)
    }

    /// Browsers refuse credentialed responses carrying a wildcard, and
    /// tower-http panics when asked to build such a layer.
    pub fn check(&self) -> Result<()> {
        if !self.allow_credentials {
            return Ok(());
        }

        let lists = [
            ("CORS_ALLOWED_ORIGINS", &self.allowed_origins),
            ("CORS_ALLOWED_METHODS", &self.allowed_methods),
            ("CORS_ALLOWED_HEADERS", &self.allowed_headers),
        ];
        for (key, values) in lists {
            if is_wildcard(values) {
                bail!("{} can not contain `*` when CORS_ALLOW_CREDENTIALS is true", key);
            }
        }
        Ok(())
    }

    pub fn into_layer(self) -> Result<CorsLayer> {
        self.check()?;

        let mut cors = CorsLayer::new();

        cors = if is_wildcard(&self.allowed_origins) {
            cors.allow_origin(Any)
        } else {
            cors.allow_origin(AllowOrigin::list(convert_vec("origin", &self.allowed_origins)))
        };

        cors = if is_wildcard(&self.allowed_methods) {
            cors.allow_methods(Any)
        } else {
            cors.allow_methods(AllowMethods::list(convert_vec("method", &self.allowed_methods)))
        };

        cors = if is_wildcard(&self.allowed_headers) {
            cors.allow_headers(Any)
        } else {
            cors.allow_headers(AllowHeaders::list(convert_vec("header", &self.allowed_headers)))
        };

        Ok(cors
            .allow_credentials(self.allow_credentials)
            .max_age(Duration::from_secs(self.max_age)))
    }
}

impl LogConfig {
    pub fn from_env() -> Result<Self> {
        Ok(LogConfig {
            log_requests: get_bool_from_env_or("LOG_REQUESTS", false)?,
        })
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

fn strs_to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// Entries that do not parse are skipped, so one typo does not take the server down.
fn convert_vec<T: FromStr>(what: &str, values: &[String]) -> Vec<T>
where
    <T as FromStr>::Err: Debug,
{
    values
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS {} {:?}: {:?}", what, s, e);
                None
            }
        })
        .collect()
}
