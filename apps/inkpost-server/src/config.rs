//! Application configuration loaded from environment variables.

use std::env;

use inkpost_infra::JwtConfig;
use inkpost_infra::database::DatabaseConfig;
#[cfg(feature = "rate-limit")]
use inkpost_infra::RateLimitConfig;

use crate::middleware::auth::SessionConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations at startup.
    pub run_migrations: bool,
    /// URL prefix banner images are served from.
    pub media_url: String,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    /// Throttle on `X-Forwarded-For` instead of the peer address.
    pub trust_proxy_headers: bool,
    #[cfg(feature = "rate-limit")]
    pub login_rate_limit: RateLimitConfig,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 100),
            min_connections: parse_or("DB_MIN_CONNECTIONS", 10),
        });

        let mut media_url = env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database,
            run_migrations: flag("RUN_MIGRATIONS"),
            media_url,
            jwt: JwtConfig::from_env(),
            session: SessionConfig {
                cookie_secure: flag("SESSION_COOKIE_SECURE"),
            },
            trust_proxy_headers: flag("TRUST_PROXY_HEADERS"),
            #[cfg(feature = "rate-limit")]
            login_rate_limit: RateLimitConfig::from_env("LOGIN_RATE_LIMIT"),
        }
    }
}
