//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use campus_core::navigation::{NavGroup, NavLink};
use campus_core::{Feature, Profile, ProfilePatch, Role, Session, SessionUser};

use crate::auth::TokenPair;
use crate::error::ApiErrorResponse;
use crate::routes::{
    AccessResponse, AuthResponse, ComponentHealth, ComponentStatus, HealthResponse,
    NavigationResponse, PageView, RefreshRequest, RoleSummary, RolesResponse, SessionResponse,
    SignInRequest, SignUpRequest, UnauthorizedView,
};

// ==================== 보안 스키마 ====================

/// `bearer_auth` 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// Campus API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus API",
        version = "0.1.0",
        description = r#"
# Campus 역할 기반 교육 플랫폼 API

## 주요 기능

- **인증**: 가입, 로그인, 토큰 재발급, 로그아웃
- **세션**: 프로필 기반 역할 확정 (기본 역할 student)
- **접근 제어**: 역할별 기능 허용 여부
- **내비게이션**: 역할별 사이드바와 대시보드
- **페이지 가드**: 로그인/권한에 따른 리다이렉트

## 인증

대부분의 엔드포인트는 JWT Bearer 토큰 인증이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 가입/로그인/세션"),
        (name = "profiles", description = "프로필 - 조회 및 역할 변경"),
        (name = "access", description = "접근 제어 - 역할별 기능 평가"),
        (name = "navigation", description = "내비게이션 - 역할별 사이드바"),
        (name = "pages", description = "페이지 - 대시보드 이동과 라우트 가드")
    ),
    modifiers(&SecurityAddon),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== Domain =====
            Role,
            Feature,
            Profile,
            ProfilePatch,
            Session,
            SessionUser,
            NavGroup,
            NavLink,

            // ===== Auth =====
            SignUpRequest,
            SignInRequest,
            RefreshRequest,
            TokenPair,
            AuthResponse,
            SessionResponse,

            // ===== Access / Navigation =====
            AccessResponse,
            RoleSummary,
            RolesResponse,
            NavigationResponse,

            // ===== Pages =====
            PageView,
            UnauthorizedView,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::sign_up,
        crate::routes::auth::sign_in,
        crate::routes::auth::refresh,
        crate::routes::auth::sign_out,
        crate::routes::auth::current_session,

        // ===== Profiles =====
        crate::routes::profile::get_own_profile,
        crate::routes::profile::update_profile,

        // ===== Access =====
        crate::routes::access::check_access,
        crate::routes::access::list_roles,

        // ===== Navigation =====
        crate::routes::navigation::get_navigation,

        // ===== Pages =====
        crate::routes::pages::dashboard_root,
        crate::routes::pages::guarded_page,
        crate::routes::pages::unauthorized_page,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
