//! 페이지 라우트.
//!
//! 웹 클라이언트의 화면 전환을 서버에서 판정합니다. 리다이렉트 체인(대시보드 루트 →
//! 역할 대시보드 → 가드 판정 → ...)은 한 요청 안에서 끝까지 따라가고, 응답은
//! 최종 목적지로 가는 `303 See Other` 하나입니다. 체인 전체가 하나의 리다이렉트
//! 기록을 공유하므로 순환은 `/unauthorized`로 끊깁니다.
//!
//! `Location` 매핑:
//! - 보호 페이지 `/quizzes/new` → `/app/quizzes/new`
//! - `/login`은 클라이언트 라우트이므로 그대로
//! - `/unauthorized`, `/dashboard`는 이 라우터가 직접 제공
//!
//! - `GET /dashboard` - 역할 대시보드로 이동
//! - `GET /app/{*path}` - 라우트 가드를 거친 페이지 뷰
//! - `GET /unauthorized` - 권한 없음 페이지 (가드 없음)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use campus_core::navigation::{
    compose_sidebar, default_base_links, page_for, NavGroup, DASHBOARD_ROOT, LOGIN_ROUTE,
    UNAUTHORIZED_ROUTE,
};
use campus_core::{Feature, Session};
use campus_session::{
    DashboardRouter, DashboardView, GuardState, GuardView, RecordingNavigator, RouteGuard,
    RouterContext, MAX_REDIRECT_HOPS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Claims, OptionalJwtAuth};
use crate::error::{api_error, ApiErrorResponse};
use crate::metrics::{record_dashboard_redirect, record_guard_decision};
use crate::state::AppState;

/// 가드를 통과한 페이지 뷰
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageView {
    pub path: String,
    pub title: String,
    pub feature: Feature,
    pub role: String,
    pub sidebar: Vec<NavGroup>,
}

/// 권한 없음 페이지
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnauthorizedView {
    pub path: String,
    pub message: String,
}

/// 페이지 쿼리
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 권한이 없을 때 이동할 경로 (기본값 `/dashboard`)
    #[serde(default)]
    pub fallback: Option<String>,
}

/// 요청 토큰으로 세션 확정. 토큰이 없으면 로그아웃 세션입니다.
async fn session_for(state: &AppState, claims: Option<&Claims>) -> Session {
    match claims {
        Some(claims) => state.resolve_session(&claims.identity()).await,
        None => Session::signed_out(),
    }
}

fn router_context() -> RouterContext {
    RouterContext::new(Arc::new(RecordingNavigator::new()))
}

/// 리다이렉트 체인을 끝까지 따라가 최종 목적지를 구합니다.
///
/// 대시보드 루트는 역할 대시보드로, 보호 페이지는 가드 판정으로 이어집니다.
/// 렌더링되는 페이지, 로그인, 권한 없음, 그 밖의 경로에서 멈춥니다.
fn follow_chain(ctx: &RouterContext, session: &Session, start: String) -> String {
    let mut location = start;
    // 홉 한도를 넘기 전에 리다이렉트 기록이 체인을 끊음
    for _ in 0..=MAX_REDIRECT_HOPS + 1 {
        let next = if location == DASHBOARD_ROOT {
            match DashboardRouter::new(ctx.clone()).activate(session) {
                DashboardView::Redirecting { to } => to,
                DashboardView::Loading => return location,
            }
        } else if let Some(page) = page_for(&location) {
            let mut guard = RouteGuard::new(page.feature, ctx.clone()).at(page.path);
            match (guard.evaluate(session), guard.state()) {
                (GuardView::Nothing, GuardState::Redirecting { to }) => to.clone(),
                _ => return location,
            }
        } else {
            return location;
        };
        location = next;
    }
    UNAUTHORIZED_ROUTE.to_string()
}

/// 애플리케이션 경로를 `Location` 헤더 값으로 변환.
fn location_for(path: &str) -> String {
    match page_for(path) {
        Some(page) => format!("/app{}", page.path),
        None => path.to_string(),
    }
}

/// 대체 경로로 쓸 수 있는지 확인. 알려진 페이지나 고정 라우트만 허용합니다.
fn is_routable(path: &str) -> bool {
    matches!(path, DASHBOARD_ROOT | LOGIN_ROUTE | UNAUTHORIZED_ROUTE) || page_for(path).is_some()
}

fn guard_outcome(destination: &str) -> &'static str {
    match destination {
        LOGIN_ROUTE => "login",
        UNAUTHORIZED_ROUTE => "unauthorized",
        _ => "fallback",
    }
}

/// 대시보드 루트.
///
/// 로그인 상태면 역할 대시보드로, 아니면 로그인 페이지로 보냅니다. 역할 대시보드에
/// 접근할 수 없는 세션(인식되지 않은 역할 등)은 권한 없음 페이지로 갑니다.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 303, description = "역할 대시보드, 로그인 또는 권한 없음 페이지로 이동")),
    tag = "pages"
)]
pub async fn dashboard_root(
    State(state): State<Arc<AppState>>,
    OptionalJwtAuth(claims): OptionalJwtAuth,
) -> Response {
    let session = session_for(&state, claims.as_ref()).await;
    if session.loading {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let destination = follow_chain(&router_context(), &session, DASHBOARD_ROOT.to_string());
    if session.is_authenticated() {
        record_dashboard_redirect(session.role.as_str());
    }
    Redirect::to(&location_for(&destination)).into_response()
}

/// 가드를 거친 페이지 조회.
#[utoipa::path(
    get,
    path = "/app/{path}",
    params(
        ("path" = String, Path, description = "애플리케이션 경로 (예: quizzes/new)"),
        PageQuery
    ),
    responses(
        (status = 200, description = "접근 허용", body = PageView),
        (status = 303, description = "로그인, 대체 경로 또는 권한 없음 페이지로 이동"),
        (status = 404, description = "알 수 없는 페이지", body = ApiErrorResponse)
    ),
    tag = "pages"
)]
pub async fn guarded_page(
    State(state): State<Arc<AppState>>,
    OptionalJwtAuth(claims): OptionalJwtAuth,
    Path(path): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let path = format!("/{}", path.trim_start_matches('/'));
    if path == UNAUTHORIZED_ROUTE {
        return unauthorized_page().await.into_response();
    }

    let Some(page) = page_for(&path) else {
        return api_error(
            StatusCode::NOT_FOUND,
            "PAGE_NOT_FOUND",
            format!("알 수 없는 페이지: {path}"),
        )
        .into_response();
    };

    let session = session_for(&state, claims.as_ref()).await;
    let ctx = router_context();
    let mut guard = RouteGuard::new(page.feature, ctx.clone()).at(page.path);
    if let Some(fallback) = query.fallback.filter(|f| is_routable(f)) {
        guard = guard.with_fallback(fallback);
    }

    match guard.evaluate(&session) {
        GuardView::Children => {
            record_guard_decision(page.feature.as_str(), "authorized");
            Json(PageView {
                path: page.path.to_string(),
                title: page.title.to_string(),
                feature: page.feature,
                role: session.role.to_string(),
                sidebar: compose_sidebar(&session.role, &default_base_links()),
            })
            .into_response()
        }
        GuardView::Nothing => match guard.state() {
            GuardState::Redirecting { to } => {
                record_guard_decision(page.feature.as_str(), guard_outcome(to));
                let destination = follow_chain(&ctx, &session, to.clone());
                Redirect::to(&location_for(&destination)).into_response()
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
        GuardView::Loading => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// 권한 없음 페이지.
#[utoipa::path(
    get,
    path = "/unauthorized",
    responses((status = 403, description = "권한 없음", body = UnauthorizedView)),
    tag = "pages"
)]
pub async fn unauthorized_page() -> (StatusCode, Json<UnauthorizedView>) {
    (
        StatusCode::FORBIDDEN,
        Json(UnauthorizedView {
            path: UNAUTHORIZED_ROUTE.to_string(),
            message: "이 페이지에 접근할 권한이 없습니다".to_string(),
        }),
    )
}

pub fn pages_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard_root))
        .route("/unauthorized", get(unauthorized_page))
        .route("/app/{*path}", get(guarded_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    use campus_core::{resolve_session, Identity, Profile};

    fn session_as(role: &str) -> Session {
        let identity = Identity::new("u-1", "user@school.test");
        resolve_session::<String>(
            &identity,
            Ok(Some(Profile::new("u-1", "user@school.test").with_role(role))),
        )
    }

    #[test]
    fn test_follow_chain_reaches_role_dashboard() {
        let destination = follow_chain(
            &router_context(),
            &session_as("teacher"),
            DASHBOARD_ROOT.to_string(),
        );
        assert_eq!(destination, "/dashboard/teacher");

        // 거부된 페이지의 기본 대체 경로는 대시보드 루트를 거쳐 역할 대시보드로
        let destination = follow_chain(
            &router_context(),
            &session_as("student"),
            "/quizzes/new".to_string(),
        );
        assert_eq!(destination, "/dashboard/student");
    }

    #[test]
    fn test_follow_chain_cuts_cycle_for_unrecognized_role() {
        let district = session_as("district");
        let ctx = router_context();
        assert_eq!(
            follow_chain(&ctx, &district, DASHBOARD_ROOT.to_string()),
            UNAUTHORIZED_ROUTE
        );
        assert_eq!(
            follow_chain(&router_context(), &district, "/dashboard/student".to_string()),
            UNAUTHORIZED_ROUTE
        );
    }

    #[test]
    fn test_follow_chain_stops_at_terminal_routes() {
        let signed_out = Session::signed_out();
        assert_eq!(
            follow_chain(&router_context(), &signed_out, "/grades".to_string()),
            LOGIN_ROUTE
        );
        assert_eq!(
            follow_chain(&router_context(), &signed_out, UNAUTHORIZED_ROUTE.to_string()),
            UNAUTHORIZED_ROUTE
        );
    }

    #[test]
    fn test_location_for() {
        assert_eq!(location_for("/dashboard/parent"), "/app/dashboard/parent");
        assert_eq!(location_for(LOGIN_ROUTE), LOGIN_ROUTE);
        assert_eq!(location_for(UNAUTHORIZED_ROUTE), UNAUTHORIZED_ROUTE);
    }

    #[test]
    fn test_is_routable() {
        assert!(is_routable("/courses"));
        assert!(is_routable(DASHBOARD_ROOT));
        assert!(!is_routable("/nowhere"));
        assert!(!is_routable("https://example.com"));
    }

    #[test]
    fn test_guard_outcome_labels() {
        assert_eq!(guard_outcome(LOGIN_ROUTE), "login");
        assert_eq!(guard_outcome(UNAUTHORIZED_ROUTE), "unauthorized");
        assert_eq!(guard_outcome("/dashboard"), "fallback");
    }
}
