//! # Campus Core
//!
//! 역할 기반 교육 플랫폼의 핵심 모델을 제공합니다:
//! - 역할, 기능, 세션 도메인 타입
//! - 역할 디렉터리와 접근 평가기
//! - 라우트 테이블과 역할별 사이드바 구성
//! - 메시지 연락처 목록 상태
//! - 설정 관리와 로깅 인프라

pub mod access;
pub mod config;
pub mod contacts;
pub mod domain;
pub mod error;
pub mod logging;
pub mod navigation;

pub use access::{has_access, has_access_claim, RoleDirectory};
pub use config::AppConfig;
pub use domain::*;
pub use error::{CampusError, CampusResult};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
