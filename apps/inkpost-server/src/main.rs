//! # Inkpost Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[cfg(feature = "rate-limit")]
use inkpost_core::ports::RateLimiter;
use inkpost_core::ports::TokenService;
use inkpost_infra::JwtTokenService;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;
mod views;

use config::AppConfig;
use middleware::rate_limit::ClientKeyConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

/// Largest accepted form body; post bodies are free text.
const FORM_LIMIT_BYTES: usize = 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting Inkpost on {}:{}", config.host, config.port);

    let state = AppState::new(&config).await;
    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

    #[cfg(feature = "rate-limit")]
    let login_limiter = login_rate_limiter(&config);
    let client_key = ClientKeyConfig {
        trust_proxy_headers: config.trust_proxy_headers,
    };

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::FormConfig::default().limit(FORM_LIMIT_BYTES))
            .app_data(client_key);

        #[cfg(feature = "rate-limit")]
        let app = match &login_limiter {
            Some(limiter) => app.app_data(web::Data::new(limiter.clone())),
            None => app,
        };

        app.wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(feature = "rate-limit")]
fn login_rate_limiter(config: &AppConfig) -> Option<Arc<dyn RateLimiter>> {
    use inkpost_infra::InMemoryRateLimiter;

    match InMemoryRateLimiter::new(config.login_rate_limit.clone()) {
        Ok(limiter) => {
            tracing::info!(
                max_requests = config.login_rate_limit.max_requests,
                window_secs = config.login_rate_limit.window.as_secs(),
                "Login throttling enabled"
            );
            let limiter: Arc<dyn RateLimiter> = Arc::new(limiter);
            Some(limiter)
        }
        Err(e) => {
            tracing::error!("Invalid login rate limit config: {}. Throttling disabled.", e);
            None
        }
    }
}
