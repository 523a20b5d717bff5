//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 역할 디렉터리 조회 (역할, 기능, 페이지)
//! - 역할 문자열 기준 접근 평가, 대시보드, 사이드바 출력
//! - 설정 파일 점검

pub mod commands;

pub use commands::*;
