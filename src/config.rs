// src/config.rs

use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// 15 MiB, the largest decoded PDF accepted for a free quiz.
pub const DEFAULT_MAX_PDF_BYTES: usize = 15 * 1024 * 1024;

/// Runtime configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_pdf_bytes: usize,
    pub body_limit_bytes: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let mongodb_uri = env::var("MONGODB_URI").expect("MONGODB_URI must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Self {
            mongodb_uri,
            mongodb_db: env::var("MONGODB_DB").unwrap_or_else(|_| "chem_institute".to_string()),
            jwt_secret,
            jwt_expiration: parsed_or("JWT_EXPIRATION", 86_400),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            admin_username: non_empty("ADMIN_USERNAME"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            port: parsed_or("PORT", 5000),
            cors_origins,
            max_pdf_bytes: parsed_or("MAX_PDF_BYTES", DEFAULT_MAX_PDF_BYTES),
            body_limit_bytes: parsed_or("BODY_LIMIT_BYTES", 50 * 1024 * 1024),
            cache_ttl_secs: parsed_or("CACHE_TTL_SECS", 300),
            cache_max_entries: parsed_or("CACHE_MAX_ENTRIES", 256),
        }
    }
}

impl Default for Config {
    /// Local development values. `from_env` is used by the server binary.
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "chem_institute".to_string(),
            jwt_secret: "change-me".to_string(),
            jwt_expiration: 86_400,
            rust_log: "info".to_string(),
            admin_username: None,
            admin_password: None,
            port: 5000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            body_limit_bytes: 50 * 1024 * 1024,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
        }
    }
}
