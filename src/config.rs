/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth/JWKS 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::services::auth::verifier::{VerifierPolicy, is_asymmetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCacheBackend {
    Memory,
    Valkey,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_jwks_url: String,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub auth_allowed_algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,

    pub jwks_cache_ttl: Duration,
    pub jwks_fetch_timeout: Duration,
    pub key_cache_backend: KeyCacheBackend,
    pub valkey_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup (env, map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = match non_empty("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_jwks_url =
            non_empty("AUTH_JWKS_URL").ok_or(ConfigError::Missing("AUTH_JWKS_URL"))?;

        let auth_issuer = non_empty("AUTH_ISSUER");
        let auth_audience = non_empty("AUTH_AUDIENCE");

        let auth_allowed_algorithms = parse_algorithms(
            non_empty("AUTH_ALLOWED_ALGORITHMS")
                .as_deref()
                .unwrap_or("RS256"),
        )?;

        let access_token_leeway_seconds =
            parse_u64(&non_empty, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let jwks_cache_ttl =
            Duration::from_secs(parse_u64(&non_empty, "JWKS_CACHE_TTL_SECONDS", 600)?);

        let jwks_fetch_timeout =
            Duration::from_secs(parse_u64(&non_empty, "JWKS_FETCH_TIMEOUT_SECONDS", 5)?);
        if jwks_fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("JWKS_FETCH_TIMEOUT_SECONDS"));
        }

        let key_cache_backend = match non_empty("KEY_CACHE_BACKEND")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("memory") => KeyCacheBackend::Memory,
            Some("valkey") | Some("redis") => KeyCacheBackend::Valkey,
            Some(_) => return Err(ConfigError::Invalid("KEY_CACHE_BACKEND")),
        };

        let valkey_url = non_empty("VALKEY_URL");
        if key_cache_backend == KeyCacheBackend::Valkey && valkey_url.is_none() {
            return Err(ConfigError::Missing("VALKEY_URL"));
        }

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth_jwks_url,
            auth_issuer,
            auth_audience,
            auth_allowed_algorithms,
            access_token_leeway_seconds,
            jwks_cache_ttl,
            jwks_fetch_timeout,
            key_cache_backend,
            valkey_url,
        })
    }

    pub fn verifier_policy(&self) -> VerifierPolicy {
        VerifierPolicy {
            allowed_algorithms: self.auth_allowed_algorithms.clone(),
            issuer: self.auth_issuer.clone(),
            audience: self.auth_audience.clone(),
            leeway_seconds: self.access_token_leeway_seconds,
        }
    }
}

fn parse_u64(
    non_empty: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match non_empty(key) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

// Comma-separated JWS names. Symmetric (HS*) algorithms are refused: keys
// come from a public key set.
fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name)
            .map_err(|_| ConfigError::Invalid("AUTH_ALLOWED_ALGORITHMS"))?;
        if !is_asymmetric(alg) {
            return Err(ConfigError::Invalid("AUTH_ALLOWED_ALGORITHMS"));
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALLOWED_ALGORITHMS"));
    }

    Ok(algorithms)
}
