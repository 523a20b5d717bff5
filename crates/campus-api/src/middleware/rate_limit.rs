//! 인증 엔드포인트용 요청 제한.
//!
//! 클라이언트 IP마다 토큰 버킷을 두고, 비밀번호 대입 시도를 막기 위해
//! 로그인/가입/토큰 갱신 라우트에만 적용합니다.

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use campus_core::config::RateLimitSettings;
use metrics::counter;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::ApiErrorResponse;

/// 요청 제한 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 순간적으로 추가 허용되는 요청 수
    pub burst_size: u32,
    /// 이 시간 동안 요청이 없던 버킷은 정리됩니다
    pub idle_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 30,
            burst_size: 5,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: requests_per_minute / 6,
            ..Default::default()
        }
    }

    /// 버스트 없는 설정.
    pub fn strict(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: 0,
            ..Default::default()
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self::new(settings.requests_per_minute)
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    capacity: f64,
    /// 초당 보충량
    refill_rate: f64,
    last_seen: Instant,
}

impl Bucket {
    fn new(config: &RateLimitConfig) -> Self {
        let refill_rate = f64::from(config.requests_per_minute) / 60.0;
        let capacity = refill_rate + f64::from(config.burst_size);
        Self {
            tokens: capacity,
            capacity,
            refill_rate,
            last_seen: Instant::now(),
        }
    }

    fn take(&mut self) -> Result<(), u64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_seen).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else if self.refill_rate > 0.0 {
            Err(((1.0 - self.tokens) / self.refill_rate).ceil() as u64)
        } else {
            Err(60)
        }
    }
}

/// IP별 요청 제한기.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, Bucket>>>,
}

/// 요청 제한 확인 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 요청 허용 여부 확인.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| Bucket::new(&self.config));

        match bucket.take() {
            Ok(()) => RateLimitResult::Allowed,
            Err(retry_after) => RateLimitResult::Limited { retry_after },
        }
    }

    /// 유휴 버킷 정리.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let idle = self.config.idle_timeout;
        self.buckets
            .write()
            .await
            .retain(|_, bucket| now.duration_since(bucket.last_seen) < idle);
    }

    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// 주기적으로 유휴 버킷을 정리하는 백그라운드 태스크 시작.
    pub fn spawn_cleanup(&self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        let period = self.config.idle_timeout;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => limiter.cleanup().await,
                }
            }
        })
    }
}

/// 요청 제한 미들웨어 상태.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: RateLimiter,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// 요청 제한 미들웨어.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request);

    match state.limiter.check(ip).await {
        RateLimitResult::Allowed => {
            counter!("rate_limit_requests_total", "status" => "allowed").increment(1);
            next.run(request).await
        }
        RateLimitResult::Limited { retry_after } => {
            counter!("rate_limit_requests_total", "status" => "limited").increment(1);
            tracing::warn!(client_ip = %ip, retry_after, "인증 요청 제한 초과");

            let body = ApiErrorResponse::with_details(
                "RATE_LIMITED",
                "요청이 너무 많습니다. 잠시 후 다시 시도하세요",
                serde_json::json!({ "retry_after": retry_after }),
            );
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// 클라이언트 IP 추출.
///
/// 프록시 헤더(X-Forwarded-For, X-Real-IP)를 우선 확인하고, 없으면 루프백 주소로
/// 묶습니다.
fn extract_client_ip(request: &Request) -> IpAddr {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn config(requests_per_minute: u32, burst_size: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute,
            burst_size,
            idle_timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_limits_after_burst() {
        let limiter = RateLimiter::new(config(60, 5));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        // 초당 1 + 버스트 5
        for i in 0..6 {
            assert_eq!(
                limiter.check(ip).await,
                RateLimitResult::Allowed,
                "request {i} should pass"
            );
        }
        assert!(matches!(
            limiter.check(ip).await,
            RateLimitResult::Limited { retry_after: 1 }
        ));
    }

    #[tokio::test]
    async fn test_buckets_are_per_ip() {
        let limiter = RateLimiter::new(config(60, 0));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert_eq!(limiter.check(a).await, RateLimitResult::Allowed);
        assert!(matches!(limiter.check(a).await, RateLimitResult::Limited { .. }));
        assert_eq!(limiter.check(b).await, RateLimitResult::Allowed);
        assert_eq!(limiter.tracked_ips().await, 2);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_buckets() {
        let limiter = RateLimiter::new(RateLimitConfig {
            idle_timeout: Duration::from_millis(10),
            ..config(60, 0)
        });
        let _ = limiter.check("10.0.0.1".parse().unwrap()).await;
        assert_eq!(limiter.tracked_ips().await, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_ips().await, 0);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = RateLimitSettings {
            enabled: true,
            requests_per_minute: 120,
        };
        let config = RateLimitConfig::from(&settings);
        assert_eq!(config.requests_per_minute, 120);
        assert_eq!(config.burst_size, 20);
        assert_eq!(RateLimitConfig::strict(10).burst_size, 0);
    }

    #[test]
    fn test_extract_client_ip() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request), "203.0.113.7".parse::<IpAddr>().unwrap());

        let request = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request), "198.51.100.2".parse::<IpAddr>().unwrap());

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&request), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
