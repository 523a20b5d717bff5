//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.

pub mod profiles;

pub use profiles::{PgProfileStore, ProfileRecord, ProfileRepository};
