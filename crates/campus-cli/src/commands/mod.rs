//! CLI 명령어 구현 모듈.

pub mod check_config;
pub mod directory;
pub mod evaluate;
pub mod output;

pub use output::OutputFormat;
