use crate::error::AppError;
use actix_web::http::Method;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};

const WINDOW_SECS: i64 = 60;

/// 共享限流档位：认证接口最严，写接口次之，读接口最宽
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateTier {
    Auth,
    Write,
    Read,
}

impl RateTier {
    fn for_request(method: &Method, path: &str) -> Self {
        if path.starts_with("/api/v1/auth/") {
            RateTier::Auth
        } else if method == Method::GET {
            RateTier::Read
        } else {
            RateTier::Write
        }
    }

    fn limit_per_window(self) -> u32 {
        match self {
            RateTier::Auth => 10,
            RateTier::Write => 60,
            RateTier::Read => 120,
        }
    }

    fn name(self) -> &'static str {
        match self {
            RateTier::Auth => "auth",
            RateTier::Write => "write",
            RateTier::Read => "read",
        }
    }
}

#[derive(Debug)]
struct Window {
    started_at: i64,
    count: u32,
}

/// 固定窗口计数。窗口滚动后重新计数；返回本次请求是否放行。
fn admit(window: &mut Window, now: i64, limit: u32) -> bool {
    if now - window.started_at >= WINDOW_SECS {
        window.started_at = now;
        window.count = 0;
    }
    if window.count >= limit {
        return false;
    }
    window.count += 1;
    true
}

#[derive(Default)]
pub struct RateLimiterState {
    windows: Mutex<HashMap<(String, &'static str), Window>>,
}

impl RateLimiterState {
    fn check(&self, client: &str, tier: RateTier) -> bool {
        let now = Utc::now().timestamp();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows
            .entry((client.to_string(), tier.name()))
            .or_insert(Window {
                started_at: now,
                count: 0,
            });
        admit(window, now, tier.limit_per_window())
    }
}

/// 所有 worker 共享同一份计数状态（`Clone` 只复制 `Arc`）
#[derive(Clone)]
pub struct RateLimitMiddleware {
    state: Arc<RateLimiterState>,
}

impl RateLimitMiddleware {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RateLimiterState::default()),
        }
    }
}

impl Default for RateLimitMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            state: self.state.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    state: Arc<RateLimiterState>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let tier = RateTier::for_request(req.method(), req.path());

        if !self.state.check(&client, tier) {
            log::warn!("Rate limit hit: {client} on {} tier", tier.name());
            let error = AppError::TooManyRequests;
            return Box::pin(async move { Err(error.into()) });
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_selection() {
        assert_eq!(
            RateTier::for_request(&Method::POST, "/api/v1/auth/login"),
            RateTier::Auth
        );
        assert_eq!(
            RateTier::for_request(&Method::GET, "/api/v1/events"),
            RateTier::Read
        );
        assert_eq!(
            RateTier::for_request(&Method::POST, "/api/v1/orders/checkout"),
            RateTier::Write
        );
    }

    #[test]
    fn test_window_admits_up_to_limit() {
        let mut window = Window {
            started_at: 1000,
            count: 0,
        };
        for _ in 0..5 {
            assert!(admit(&mut window, 1000, 5));
        }
        assert!(!admit(&mut window, 1030, 5));
    }

    #[test]
    fn test_window_resets_after_rollover() {
        let mut window = Window {
            started_at: 1000,
            count: 5,
        };
        assert!(!admit(&mut window, 1059, 5));
        assert!(admit(&mut window, 1060, 5));
        assert_eq!(window.count, 1);
    }

    #[test]
    fn test_state_tracks_clients_separately() {
        let state = RateLimiterState::default();
        for _ in 0..10 {
            assert!(state.check("1.2.3.4", RateTier::Auth));
        }
        assert!(!state.check("1.2.3.4", RateTier::Auth));
        // 另一个客户端不受影响
        assert!(state.check("5.6.7.8", RateTier::Auth));
    }
}
