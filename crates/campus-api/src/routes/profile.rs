//! 프로필 API 라우트
//!
//! - `GET /api/v1/profile` - 내 프로필
//! - `PATCH /api/v1/profiles/{uid}` - 프로필 부분 수정 (`manage-users` 필요)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use campus_core::{Feature, Profile, ProfilePatch, Role};
use std::sync::Arc;
use tracing::info;

use crate::auth::{require_feature, CurrentSession};
use crate::error::{api_error, from_jwt_auth_error, from_store_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 내 프로필 조회.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "프로필 조회 성공", body = Profile),
        (status = 401, description = "인증 필요"),
        (status = 404, description = "프로필 레코드 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> ApiResult<Json<Profile>> {
    let uid = &current.claims.sub;
    match state.profiles.fetch(uid).await {
        Ok(Some(profile)) => Ok(Json(profile)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "PROFILE_NOT_FOUND",
            format!("프로필을 찾을 수 없습니다: {uid}"),
        )),
        Err(e) => Err(from_store_error(&e)),
    }
}

/// 프로필 부분 수정.
///
/// 역할 변경은 이 경로로만 이뤄집니다. 역할 값은 정규 역할 문자열로 저장됩니다.
#[utoipa::path(
    patch,
    path = "/api/v1/profiles/{uid}",
    params(("uid" = String, Path, description = "사용자 uid")),
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "수정 성공", body = Profile),
        (status = 400, description = "빈 수정 요청 또는 알 수 없는 역할", body = ApiErrorResponse),
        (status = 403, description = "권한 부족"),
        (status = 404, description = "프로필 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "profiles"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Path(uid): Path<String>,
    Json(mut changes): Json<ProfilePatch>,
) -> ApiResult<Json<Profile>> {
    require_feature(Feature::ManageUsers, &current.session)
        .map_err(|e| from_jwt_auth_error(&e))?;

    if changes.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "EMPTY_PATCH",
            "변경할 항목이 없습니다",
        ));
    }

    if let Some(raw) = changes.role.as_deref() {
        let role = Role::parse(raw).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "UNKNOWN_ROLE",
                format!("알 수 없는 역할: {raw}"),
            )
        })?;
        changes.role = Some(role.as_str().to_string());
    }

    let new_role = changes.role.clone();
    let profile = state
        .profiles
        .update(&uid, changes)
        .await
        .map_err(|e| from_store_error(&e))?;

    info!(
        uid = %uid,
        by = %current.claims.sub,
        role = ?new_role,
        "프로필 수정"
    );
    Ok(Json(profile))
}

pub fn profile_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_own_profile))
        .route("/profiles/{uid}", patch(update_profile))
}
