//! 캠퍼스 코어 에러 타입.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum CampusError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 알 수 없는 역할
    #[error("알 수 없는 역할: {0}")]
    UnknownRole(String),

    /// 알 수 없는 기능
    #[error("알 수 없는 기능: {0}")]
    UnknownFeature(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 권한 없음
    #[error("권한 없음: {0}")]
    Forbidden(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

pub type CampusResult<T> = Result<T, CampusError>;

impl CampusError {
    /// 호출자 입력 문제로 인한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CampusError::UnknownRole(_)
                | CampusError::UnknownFeature(_)
                | CampusError::InvalidInput(_)
                | CampusError::NotFound(_)
                | CampusError::Forbidden(_)
        )
    }
}

impl From<config::ConfigError> for CampusError {
    fn from(err: config::ConfigError) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        CampusError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(CampusError::UnknownRole("district".into()).is_client_error());
        assert!(!CampusError::Internal("boom".into()).is_client_error());
        assert!(!CampusError::Config("missing".into()).is_client_error());
    }

    #[test]
    fn test_display() {
        let err = CampusError::UnknownFeature("launch-rockets".into());
        assert_eq!(err.to_string(), "알 수 없는 기능: launch-rockets");
    }
}
