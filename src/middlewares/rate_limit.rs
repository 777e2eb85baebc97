use crate::error::AppError;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};

// 超过该条目数时在检查路径上顺带清理过期窗口
const PRUNE_THRESHOLD: usize = 4096;

/// 固定窗口限流：按 (IP, 窗口序号) 计数，过期窗口惰性清理
struct FixedWindowLimiter {
    counters: HashMap<String, (i64, u32)>,
    limit: u32,
    window_secs: i64,
}

impl FixedWindowLimiter {
    fn new(limit: u32, window_secs: i64) -> Self {
        Self {
            counters: HashMap::new(),
            limit,
            window_secs,
        }
    }

    fn check(&mut self, key: &str, now: i64) -> bool {
        let window = now / self.window_secs;

        if self.counters.len() > PRUNE_THRESHOLD {
            self.counters.retain(|_, (w, _)| *w == window);
        }

        let entry = self.counters.entry(key.to_string()).or_insert((window, 0));
        if entry.0 != window {
            *entry = (window, 0);
        }

        if entry.1 >= self.limit {
            return false;
        }
        entry.1 += 1;
        true
    }
}

/// 计数器在所有 worker 间共享，构造一次后 clone 进 App 工厂
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<Mutex<FixedWindowLimiter>>,
}

impl RateLimitMiddleware {
    /// 默认：每 IP 每分钟 100 次
    pub fn new() -> Self {
        Self::with_limit(100, 60)
    }

    pub fn with_limit(limit: u32, window_secs: i64) -> Self {
        Self {
            limiter: Arc::new(Mutex::new(FixedWindowLimiter::new(limit, window_secs))),
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
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<Mutex<FixedWindowLimiter>>,
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
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let allowed = match self.limiter.lock() {
            Ok(mut limiter) => limiter.check(&ip, Utc::now().timestamp()),
            Err(_) => true, // 锁中毒时放行，不让限流器拖垮服务
        };

        if !allowed {
            log::warn!("Rate limit exceeded for {ip}");
            return Box::pin(async move { Err(AppError::RateLimited.into()) });
        }

        Box::pin(self.service.call(req))
    }
}
