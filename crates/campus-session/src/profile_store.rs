//! 프로필 저장소 계약.
//!
//! 신원 키(uid)로 프로필 문서를 조회/부분 업데이트하는 키-값 저장소입니다.

use async_trait::async_trait;
use campus_core::{Profile, ProfilePatch};

/// 프로필 저장소 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("프로필을 찾을 수 없습니다: {0}")]
    NotFound(String),
    #[error("이미 존재하는 프로필입니다: {0}")]
    AlreadyExists(String),
    #[error("저장소 연결 실패: {0}")]
    Unavailable(String),
    #[error("저장소 에러: {0}")]
    Backend(String),
}

/// 프로필 저장소 협력자.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 프로필 조회. 레코드가 없으면 `Ok(None)`.
    async fn fetch(&self, uid: &str) -> Result<Option<Profile>, StoreError>;

    /// 부분 업데이트. 업데이트된 프로필을 반환합니다.
    async fn update(&self, uid: &str, patch: ProfilePatch) -> Result<Profile, StoreError>;

    /// 새 프로필 생성.
    async fn create(&self, profile: Profile) -> Result<Profile, StoreError>;
}
