//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 기능 단위 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체 (역할은 포함하지 않음)
//! - [`JwtAuth`]: Bearer 토큰 검증 추출기
//! - [`CurrentSession`]: 토큰 주체의 역할까지 확정한 세션 추출기
//! - [`require_feature`]: 기능 접근 확인
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn manage_users(current: CurrentSession) -> Result<Json<()>, JwtAuthError> {
//!     require_feature(Feature::ManageUsers, &current.session)?;
//!     Ok(Json(()))
//! }
//! ```

mod jwt;
mod middleware;

pub use jwt::{
    create_session_token_pair, create_token, create_token_pair, decode_refresh_token,
    decode_token, Claims, JwtError, RefreshClaims, TokenPair,
};
pub use middleware::{require_feature, CurrentSession, JwtAuth, JwtAuthError, OptionalJwtAuth};
