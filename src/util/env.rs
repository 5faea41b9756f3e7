use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

static LOAD_ENV: OnceLock<()> = OnceLock::new();

/// Loads environment variables from `.env` files, once per process.
///
/// Later files only fill in variables that are still unset, so the real
/// environment always wins. Order:
/// 1. `.env`
/// 2. `.env.dev` (debug builds) or `.env.prod` (release builds)
/// 3. `.env.local`
pub fn load_dotenv() {
    LOAD_ENV.get_or_init(|| {
        dotenv().ok();

        let env_file = if cfg!(debug_assertions) { ".env.dev" } else { ".env.prod" };
        if Path::new(env_file).exists() {
            dotenvy::from_filename(env_file).ok();
        }

        if Path::new(".env.local").exists() {
            dotenvy::from_filename(".env.local").ok();
        }
    });
}

/// Reads `key` and parses it into `T`, falling back to `default` when unset.
pub fn get_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("Failed to parse {} env var: {:?}", key, val)),
        Err(_) => Ok(default),
    }
}

/// Reads a comma separated list from `key`, falling back to `default` when unset.
/// Empty items are dropped, so `""` yields an empty list.
pub fn get_vec_from_env_or<T>(key: &str, default: Vec<T>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    match env::var(key) {
        Ok(val) => val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<T>().map_err(|e| {
                    let err: anyhow::Error = e.into();
                    err.context(format!("Failed to parse {} env var", key))
                })
            })
            .collect(),
        Err(_) => Ok(default),
    }
}

/// Reads a `bool` from `key`.
/// Accepts `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`, case-insensitively.
pub fn get_bool_from_env_or(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(value) => parse_bool(&value)
            .ok_or_else(|| anyhow!("Failed to parse {} env var as `bool`", key)),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
