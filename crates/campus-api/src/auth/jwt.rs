//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 생성/검증 로직.
//!
//! 토큰에는 역할을 싣지 않습니다. 역할은 요청마다 프로필 저장소에서 다시
//! 확인하므로 관리자가 역할을 바꾸면 다음 요청부터 반영됩니다.
//!
//! 한 번의 로그인에서 나온 Access/Refresh Token은 같은 세션 ID(`sid`)를 가집니다.
//! 재발급은 `sid`를 유지하고, 로그아웃은 `sid`를 폐기해 토큰 쌍 전체를 무효화합니다.

use campus_core::Identity;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use utoipa::ToSchema;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 uid
    pub sub: String,
    /// 로그인 이메일
    pub email: String,
    /// 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    /// 세션 ID - 같은 로그인에서 발급된 토큰이 공유합니다
    pub sid: String,
}

impl Claims {
    /// 인증된 신원으로 Claims 생성.
    ///
    /// # Arguments
    ///
    /// * `identity` - 인증 협력자가 확인한 신원
    /// * `expires_in_minutes` - 만료 시간 (분)
    pub fn new(identity: &Identity, expires_in_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            sid: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// 기존 세션에 묶인 토큰으로 변경.
    pub fn with_session(mut self, sid: impl Into<String>) -> Self {
        self.sid = sid.into();
        self
    }

    /// 토큰이 만료되었는지 확인.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// 토큰 주체의 신원.
    pub fn identity(&self) -> Identity {
        Identity {
            uid: self.sub.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Refresh Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub sid: String,
    /// 항상 "refresh"
    pub token_type: String,
}

impl RefreshClaims {
    pub fn new(identity: &Identity, expires_in_days: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(expires_in_days)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            sid: uuid::Uuid::new_v4().to_string(),
            token_type: "refresh".to_string(),
        }
    }

    pub fn with_session(mut self, sid: impl Into<String>) -> Self {
        self.sid = sid.into();
        self
    }

    pub fn identity(&self) -> Identity {
        Identity {
            uid: self.sub.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

/// JWT 토큰 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("토큰 디코딩 실패")]
    DecodingError,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("잘못된 토큰 형식")]
    InvalidToken,
}

fn encode_claims<T: Serialize>(claims: &T, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::from)
}

fn decode_claims<T: DeserializeOwned>(token: &str, secret: &str) -> Result<TokenData<T>, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidToken,
        _ => JwtError::DecodingError,
    })
}

/// Access Token 생성.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode_claims(claims, secret)
}

/// Refresh Token 생성.
pub fn create_refresh_token(claims: &RefreshClaims, secret: &str) -> Result<String, JwtError> {
    encode_claims(claims, secret)
}

/// 새 세션의 Access Token + Refresh Token 쌍 생성.
///
/// # Arguments
///
/// * `identity` - 토큰 주체
/// * `secret` - JWT 비밀 키
/// * `access_expires_minutes` - Access Token 만료 시간 (분)
/// * `refresh_expires_days` - Refresh Token 만료 시간 (일)
pub fn create_token_pair(
    identity: &Identity,
    secret: &str,
    access_expires_minutes: i64,
    refresh_expires_days: i64,
) -> Result<TokenPair, JwtError> {
    let sid = uuid::Uuid::new_v4().to_string();
    create_session_token_pair(
        identity,
        &sid,
        secret,
        access_expires_minutes,
        refresh_expires_days,
    )
}

/// 기존 세션 ID로 토큰 쌍 생성 (재발급).
pub fn create_session_token_pair(
    identity: &Identity,
    sid: &str,
    secret: &str,
    access_expires_minutes: i64,
    refresh_expires_days: i64,
) -> Result<TokenPair, JwtError> {
    let access_claims = Claims::new(identity, access_expires_minutes).with_session(sid);
    let refresh_claims = RefreshClaims::new(identity, refresh_expires_days).with_session(sid);

    Ok(TokenPair {
        access_token: create_token(&access_claims, secret)?,
        refresh_token: create_refresh_token(&refresh_claims, secret)?,
        expires_in: access_expires_minutes * 60,
        token_type: "Bearer".to_string(),
    })
}

/// Access Token 디코딩 및 검증.
pub fn decode_token(token: &str, secret: &str) -> Result<TokenData<Claims>, JwtError> {
    decode_claims(token, secret)
}

/// Refresh Token 디코딩 및 검증.
///
/// `token_type`이 "refresh"가 아니면 `InvalidToken`.
pub fn decode_refresh_token(
    token: &str,
    secret: &str,
) -> Result<TokenData<RefreshClaims>, JwtError> {
    let data = decode_claims::<RefreshClaims>(token, secret)?;
    if data.claims.token_type != "refresh" {
        return Err(JwtError::InvalidToken);
    }
    Ok(data)
}
