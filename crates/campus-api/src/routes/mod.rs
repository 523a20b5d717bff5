//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/auth` - 가입/로그인/로그아웃/세션
//! - `/api/v1/profile`, `/api/v1/profiles/{uid}` - 프로필
//! - `/api/v1/access`, `/api/v1/roles` - 접근 평가와 역할 디렉터리
//! - `/api/v1/navigation` - 역할별 사이드바
//! - `/dashboard`, `/app/{*path}`, `/unauthorized` - 가드를 거친 페이지

pub mod access;
pub mod auth;
pub mod health;
pub mod navigation;
pub mod pages;
pub mod profile;

pub use access::{access_router, AccessQuery, AccessResponse, RoleSummary, RolesResponse};
pub use auth::{
    credential_router, session_router, AuthResponse, RefreshRequest, SessionResponse,
    SignInRequest, SignUpRequest,
};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use navigation::{navigation_router, NavigationResponse};
pub use pages::{pages_router, PageQuery, PageView, UnauthorizedView};
pub use profile::profile_router;

use axum::{middleware, Router};
use std::sync::Arc;

use crate::middleware::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// `rate_limit`이 주어지면 가입/로그인/재발급 경로에만 요청 제한을 적용합니다.
pub fn create_api_router(rate_limit: Option<RateLimitState>) -> Router<Arc<AppState>> {
    let mut credentials = credential_router();
    if let Some(limit) = rate_limit {
        credentials =
            credentials.layer(middleware::from_fn_with_state(limit, rate_limit_middleware));
    }

    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/auth", credentials.merge(session_router()))
        .nest(
            "/api/v1",
            profile_router()
                .merge(access_router())
                .merge(navigation_router()),
        )
        // 페이지
        .merge(pages_router())
}
