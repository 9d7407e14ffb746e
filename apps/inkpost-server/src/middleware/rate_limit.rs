//! Rate limiting middleware.
//!
//! The limiter is looked up from app data (`web::Data<Arc<dyn RateLimiter>>`);
//! when none is registered every request passes.
//!
//! Clients are keyed by the socket peer address. `Forwarded` and
//! `X-Forwarded-For` are client-controlled, so they are only honoured when a
//! [`ClientKeyConfig`] with `trust_proxy_headers` is registered.

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use inkpost_core::ports::RateLimiter;

use crate::middleware::error::AppError;

/// How the throttle key is derived from a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientKeyConfig {
    /// Key on the proxy-reported client address. Only safe behind a proxy
    /// that overwrites these headers.
    pub trust_proxy_headers: bool,
}

fn client_key(req: &ServiceRequest, config: ClientKeyConfig) -> String {
    if config.trust_proxy_headers {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return addr.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware factory, keyed by client IP.
#[derive(Clone, Default)]
pub struct RateLimitMiddleware {
    method: Option<Method>,
}

impl RateLimitMiddleware {
    /// Limit only requests with this method (e.g. form submissions).
    pub fn only(method: Method) -> Self {
        Self {
            method: Some(method),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            method: self.method.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    method: Option<Method>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let applies = self.method.as_ref().is_none_or(|m| req.method() == m);
        let limiter = applies
            .then(|| req.app_data::<web::Data<Arc<dyn RateLimiter>>>())
            .flatten()
            .map(|data| data.get_ref().clone());
        let key_config = req
            .app_data::<ClientKeyConfig>()
            .copied()
            .unwrap_or_default();

        Box::pin(async move {
            if let Some(limiter) = limiter {
                let key = client_key(&req, key_config);

                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        tracing::warn!(client = %key, path = %req.path(), "Rate limit exceeded");

                        let response = AppError::TooManyRequests {
                            // round up so clients never retry early
                            retry_after_secs: result.reset_after.as_secs()
                                + u64::from(result.reset_after.subsec_nanos() > 0),
                        }
                        .error_response();

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
