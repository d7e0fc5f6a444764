use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://deadlines.db?mode=rwc";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8081";
const DEFAULT_JWT_TTL_SECS: u64 = 60 * 60;
pub const MAX_JWT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    /// Browser origins allowed to call the API. An entry of the form
    /// `*.example.com` admits any subdomain of `example.com`.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let host: IpAddr = lookup("HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("HOST is not an IP address: {}", e)))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("PORT is invalid: {}", e)))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET is not set".to_string()))?;

        let jwt_ttl_secs = match lookup("JWT_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_JWT_TTL_SECS).contains(secs))
                .ok_or_else(|| AppError::Config(format!("JWT_TTL_SECS is invalid: {:?}", raw)))?,
            None => DEFAULT_JWT_TTL_SECS,
        };

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            bind_addr: SocketAddr::new(host, port),
            jwt_secret,
            jwt_ttl: Duration::from_secs(jwt_ttl_secs),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.jwt_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.cors_origins, ["http://localhost:8081"]);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("JWT_TTL_SECS", "120"),
            ("CORS_ORIGINS", " https://app.example.com/ ,*.vercel.app,, "),
        ]))
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.jwt_ttl, Duration::from_secs(120));
        assert_eq!(cfg.cors_origins, ["https://app.example.com", "*.vercel.app"]);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let at_cap = MAX_JWT_TTL_SECS.to_string();
        let cfg = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret"), ("JWT_TTL_SECS", at_cap.as_str())])).unwrap();
        assert_eq!(cfg.jwt_ttl, Duration::from_secs(MAX_JWT_TTL_SECS));

        let over = (MAX_JWT_TTL_SECS + 1).to_string();
        for value in [over.as_str(), "18446744073709551615"] {
            let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret"), ("JWT_TTL_SECS", value)]));
            assert!(matches!(result, Err(AppError::Config(_))), "JWT_TTL_SECS={value}");
        }
    }

    #[test]
    fn malformed_numbers_are_errors() {
        for (key, value) in [("PORT", "http"), ("JWT_TTL_SECS", "0"), ("HOST", "localhost")] {
            let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret"), (key, value)]));
            assert!(matches!(result, Err(AppError::Config(_))), "{key}={value}");
        }
    }
}
