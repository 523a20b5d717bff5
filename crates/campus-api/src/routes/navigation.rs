//! 사이드바 내비게이션 라우트.
//!
//! 사이드바 그룹과 함께 메시지를 보낼 수 있는 역할(`chat` 기능 기준)을 돌려줍니다.

use axum::{routing::get, Json, Router};
use campus_core::contacts::ContactList;
use campus_core::navigation::{
    compose_sidebar, dashboard_route_for_claim, default_base_links, NavGroup,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::CurrentSession;
use crate::state::AppState;

/// 내비게이션 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NavigationResponse {
    pub role: String,
    pub dashboard: String,
    pub groups: Vec<NavGroup>,
    /// 연락처 목록에 나타날 수 있는 역할
    pub messageable_roles: Vec<String>,
}

/// 현재 역할의 사이드바.
#[utoipa::path(
    get,
    path = "/api/v1/navigation",
    responses(
        (status = 200, description = "사이드바 그룹", body = NavigationResponse),
        (status = 401, description = "인증 필요")
    ),
    security(("bearer_auth" = [])),
    tag = "navigation"
)]
pub async fn get_navigation(current: CurrentSession) -> Json<NavigationResponse> {
    let role = &current.session.role;
    Json(NavigationResponse {
        role: role.to_string(),
        dashboard: dashboard_route_for_claim(role).to_string(),
        groups: compose_sidebar(role, &default_base_links()),
        messageable_roles: ContactList::for_viewer(role)
            .messageable_roles()
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    })
}

pub fn navigation_router() -> Router<Arc<AppState>> {
    Router::new().route("/navigation", get(get_navigation))
}
