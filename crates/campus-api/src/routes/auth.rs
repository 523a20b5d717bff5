//! 인증 API 라우트
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/auth/sign-up` - 가입 (student 프로필 생성) 후 토큰 발급
//! - `POST /api/v1/auth/sign-in` - 로그인 후 토큰 발급
//! - `POST /api/v1/auth/refresh` - Refresh Token으로 토큰 재발급
//! - `POST /api/v1/auth/sign-out` - 현재 세션의 토큰 쌍 폐기
//! - `GET /api/v1/auth/session` - 현재 세션 (역할, 대시보드, 기능 목록)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use campus_core::navigation::dashboard_route_for_claim;
use campus_core::{Feature, Identity, Profile, Session};
use campus_session::password::validate_password_strength;
use campus_session::{AuthError, NewAccount};
use serde::{Deserialize, Serialize};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{
    create_session_token_pair, create_token_pair, decode_refresh_token, CurrentSession, JwtAuth,
    TokenPair,
};
use crate::error::{api_error, from_auth_error, from_jwt_error, ApiErrorResponse, ApiResult};
use crate::metrics::record_sign_in_failure;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 가입 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

/// 로그인 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 토큰 재발급 요청
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 토큰과 세션 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub tokens: TokenPair,
    pub session: Session,
}

/// 현재 세션 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session: Session,
    /// 역할 대시보드 경로
    pub dashboard: String,
    /// 역할이 접근할 수 있는 기능
    pub features: Vec<Feature>,
}

// ================================================================================================
// Helpers
// ================================================================================================

fn validation_error(errors: validator::ValidationErrors) -> (StatusCode, Json<ApiErrorResponse>) {
    let details = serde_json::to_value(&errors).unwrap_or_default();
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            "입력값이 올바르지 않습니다",
            details,
        )),
    )
}

/// 토큰 발급. `sid`가 있으면 기존 세션을 이어갑니다.
async fn issue_tokens(
    state: &AppState,
    identity: &Identity,
    sid: Option<&str>,
) -> ApiResult<AuthResponse> {
    let access_minutes = state.auth_config.access_token_minutes;
    let refresh_days = state.auth_config.refresh_token_days;
    let tokens = match sid {
        Some(sid) => create_session_token_pair(
            identity,
            sid,
            state.jwt_secret(),
            access_minutes,
            refresh_days,
        ),
        None => create_token_pair(identity, state.jwt_secret(), access_minutes, refresh_days),
    }
    .map_err(|e| from_jwt_error(&e))?;
    let session = state.resolve_session(identity).await;
    Ok(AuthResponse { tokens, session })
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 가입.
///
/// 계정 생성 후 student 역할 프로필을 만듭니다. 프로필 생성에 실패해도 계정은
/// 유지되고 세션은 기본 역할로 동작합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "가입 성공", body = AuthResponse),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse),
        (status = 409, description = "이미 사용 중인 이메일", body = ApiErrorResponse),
        (status = 429, description = "요청 제한 초과", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    request.validate().map_err(validation_error)?;
    validate_password_strength(&request.password, state.auth_config.min_password_length)
        .map_err(|reason| from_auth_error(&AuthError::WeakPassword(reason)))?;

    let mut account = NewAccount::new(request.email, request.password);
    if let Some(name) = request.display_name {
        account = account.with_display_name(name);
    }
    let display_name = account.display_name.clone();

    let identity = state.auth.sign_up(account).await.map_err(|e| {
        warn!(error = %e, "가입 실패");
        from_auth_error(&e)
    })?;

    let mut profile = Profile::new(identity.uid.clone(), identity.email.clone());
    profile.display_name = display_name;
    if let Err(e) = state.profiles.create(profile).await {
        tracing::error!(uid = %identity.uid, error = %e, "가입 후 프로필 생성 실패");
    }

    info!(uid = %identity.uid, "가입 완료");
    let response = issue_tokens(&state, &identity, None).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// 로그인.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AuthResponse),
        (status = 401, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse),
        (status = 429, description = "요청 제한 초과", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Json<AuthResponse>> {
    request.validate().map_err(validation_error)?;

    let identity = state
        .auth
        .sign_in(&request.email, &request.password)
        .await
        .map_err(|e| {
            record_sign_in_failure(e.code());
            warn!(code = e.code(), "로그인 실패");
            from_auth_error(&e)
        })?;

    info!(uid = %identity.uid, "로그인");
    Ok(Json(issue_tokens(&state, &identity, None).await?))
}

/// 토큰 재발급.
///
/// 사용한 Refresh Token은 폐기되고 새 토큰 쌍은 같은 세션 ID를 유지합니다.
/// 같은 Refresh Token으로 동시에 요청하면 하나만 성공합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "재발급 성공", body = AuthResponse),
        (status = 401, description = "유효하지 않거나 폐기된 토큰", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let data = decode_refresh_token(&request.refresh_token, state.jwt_secret())
        .map_err(|e| from_jwt_error(&e))?;
    let claims = data.claims;

    if state.is_revoked(&claims.sid).await || !state.revoke_token(&claims.jti, claims.exp).await {
        warn!(uid = %claims.sub, "폐기된 Refresh Token 사용");
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "TOKEN_REVOKED",
            "폐기된 토큰입니다",
        ));
    }

    Ok(Json(
        issue_tokens(&state, &claims.identity(), Some(&claims.sid)).await?,
    ))
}

/// 로그아웃.
///
/// 현재 Access Token과 세션 ID를 폐기합니다. 같은 세션의 Refresh Token으로는
/// 더 이상 재발급할 수 없습니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    responses(
        (status = 204, description = "로그아웃 완료"),
        (status = 401, description = "인증 필요")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn sign_out(State(state): State<Arc<AppState>>, JwtAuth(claims): JwtAuth) -> StatusCode {
    // 세션의 어떤 Refresh Token도 이 시각 이후에는 만료됨
    let session_expires_at =
        (Utc::now() + Duration::days(state.auth_config.refresh_token_days)).timestamp();
    state.revoke_token(&claims.jti, claims.exp).await;
    state.revoke_token(&claims.sid, session_expires_at).await;
    info!(uid = %claims.sub, "로그아웃");
    StatusCode::NO_CONTENT
}

/// 현재 세션.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    responses(
        (status = 200, description = "세션 조회 성공", body = SessionResponse),
        (status = 401, description = "인증 필요")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Json<SessionResponse> {
    let role = &current.session.role;
    let features: Vec<Feature> = role
        .role()
        .map(|r| state.directory.features_for(r).iter().copied().collect())
        .unwrap_or_default();

    Json(SessionResponse {
        dashboard: dashboard_route_for_claim(role).to_string(),
        features,
        session: current.session,
    })
}

/// 요청 제한이 적용되는 인증 라우터 (가입, 로그인, 재발급).
pub fn credential_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/refresh", post(refresh))
}

/// 인증된 세션 라우터.
pub fn session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sign-out", post(sign_out))
        .route("/session", get(current_session))
}
