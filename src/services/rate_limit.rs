use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use std::{future::Future, pin::Pin};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use tower::{Layer, Service};

use crate::error::ApiError;

pub type KeyedRateLimiter = Arc<RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>>;

/// General-purpose limiter: `max` requests per client IP within `window`.
pub fn create_rate_limiter(max: u32, window: Duration) -> KeyedRateLimiter {
    let quota = Quota::with_period(window / max.max(1))
        .unwrap_or_else(|| Quota::per_minute(NonZeroU32::new(1).unwrap()))
        .allow_burst(NonZeroU32::new(max.max(1)).unwrap());
    Arc::new(RateLimiter::keyed(quota))
}

/// Client address: first hop of X-Forwarded-For when present (the original
/// runs behind a trusted proxy), else the socket peer.
fn client_ip(request: &Request<Body>) -> IpAddr {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next().and_then(|s| s.trim().parse().ok()) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

// =============================================================================
// GENERAL LIMITER LAYER
// =============================================================================

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: KeyedRateLimiter,
}

impl RateLimitLayer {
    pub fn new(limiter: KeyedRateLimiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: KeyedRateLimiter,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = client_ip(&request);
            if limiter.check_key(&ip).is_err() {
                return Ok(ApiError::RateLimited.into_response());
            }
            inner.call(request).await
        })
    }
}

// =============================================================================
// AUTH LIMITER LAYER
// =============================================================================

/// Fixed-window failure counter for the authentication endpoints. Only
/// responses with status >= 400 consume quota, so legitimate repeated logins
/// are never throttled while brute-force guessing is.
pub struct AuthFailureTracker {
    window: Duration,
    max_failures: u32,
    entries: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl AuthFailureTracker {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            window,
            max_failures,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// True when the address has exhausted its failure budget for the
    /// current window.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&ip) {
            Some((start, count)) => {
                if start.elapsed() > self.window {
                    entries.remove(&ip);
                    false
                } else {
                    *count >= self.max_failures
                }
            }
            None => false,
        }
    }

    pub fn record_failure(&self, ip: IpAddr) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(ip).or_insert((Instant::now(), 0));
        if entry.0.elapsed() > self.window {
            *entry = (Instant::now(), 0);
        }
        entry.1 += 1;
    }
}

#[derive(Clone)]
pub struct AuthRateLimitLayer {
    tracker: Arc<AuthFailureTracker>,
}

impl AuthRateLimitLayer {
    pub fn new(tracker: Arc<AuthFailureTracker>) -> Self {
        Self { tracker }
    }
}

impl<S> Layer<S> for AuthRateLimitLayer {
    type Service = AuthRateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthRateLimitService {
            inner,
            tracker: self.tracker.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthRateLimitService<S> {
    inner: S,
    tracker: Arc<AuthFailureTracker>,
}

impl<S> Service<Request<Body>> for AuthRateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let tracker = self.tracker.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = client_ip(&request);
            if tracker.is_blocked(ip) {
                return Ok((
                    StatusCode::TOO_MANY_REQUESTS,
                    axum::Json(serde_json::json!({
                        "success": false,
                        "error": "Too many authentication attempts, please try again later"
                    })),
                )
                    .into_response());
            }

            let response = inner.call(request).await?;

            // Successful requests are free; only failed attempts accumulate.
            if response.status().as_u16() >= 400 {
                tracker.record_failure(ip);
            }

            Ok(response)
        })
    }
}
