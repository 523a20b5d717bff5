//! 접근 평가 API 라우트
//!
//! - `GET /api/v1/access?feature=...` - 내 역할로 기능 접근 평가
//! - `GET /api/v1/access?feature=...&role=...` - 임의 역할 문자열로 평가 (인증 불필요)
//! - `GET /api/v1/roles` - 역할 디렉터리

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use campus_core::navigation::dashboard_route;
use campus_core::{has_access, has_access_claim, Feature, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{JwtAuthError, OptionalJwtAuth};
use crate::error::{from_jwt_auth_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 접근 평가 쿼리
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AccessQuery {
    /// 기능 식별자 (예: `create-quiz`)
    pub feature: String,
    /// 평가할 역할 문자열. 없으면 요청자의 역할로 평가합니다.
    #[serde(default)]
    pub role: Option<String>,
}

/// 접근 평가 결과
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    pub role: String,
    pub feature: String,
    pub allowed: bool,
}

/// 역할 요약
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub role: Role,
    pub label: String,
    pub dashboard: String,
    pub features: Vec<Feature>,
}

/// 역할 디렉터리 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    pub roles: Vec<RoleSummary>,
    pub total: usize,
}

/// 기능 접근 평가.
///
/// 알 수 없는 기능이나 역할은 에러가 아니라 `allowed = false`입니다.
#[utoipa::path(
    get,
    path = "/api/v1/access",
    params(AccessQuery),
    responses(
        (status = 200, description = "평가 결과", body = AccessResponse),
        (status = 401, description = "role 없이 인증 없이 요청", body = ApiErrorResponse)
    ),
    tag = "access"
)]
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    OptionalJwtAuth(claims): OptionalJwtAuth,
    Query(query): Query<AccessQuery>,
) -> ApiResult<Json<AccessResponse>> {
    if let Some(role) = query.role {
        let allowed = has_access(&role, &query.feature);
        return Ok(Json(AccessResponse {
            role,
            feature: query.feature,
            allowed,
        }));
    }

    let claims = claims.ok_or_else(|| from_jwt_auth_error(&JwtAuthError::MissingToken))?;
    let session = state.resolve_session(&claims.identity()).await;
    let allowed = Feature::parse(&query.feature)
        .map(|feature| has_access_claim(&session.role, feature))
        .unwrap_or(false);

    Ok(Json(AccessResponse {
        role: session.role.to_string(),
        feature: query.feature,
        allowed,
    }))
}

/// 역할 디렉터리 조회.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses((status = 200, description = "역할 목록", body = RolesResponse)),
    tag = "access"
)]
pub async fn list_roles(State(state): State<Arc<AppState>>) -> Json<RolesResponse> {
    let roles: Vec<RoleSummary> = Role::ALL
        .iter()
        .map(|role| RoleSummary {
            role: *role,
            label: role.label().to_string(),
            dashboard: dashboard_route(*role).to_string(),
            features: state.directory.features_for(*role).iter().copied().collect(),
        })
        .collect();

    Json(RolesResponse {
        total: roles.len(),
        roles,
    })
}

pub fn access_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/access", get(check_access))
        .route("/roles", get(list_roles))
}
