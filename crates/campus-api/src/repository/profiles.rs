//! Profile Repository
//!
//! `profiles` 테이블 연산과 [`ProfileStore`] 구현을 담당합니다.

use async_trait::async_trait;
use campus_core::{Profile, ProfilePatch};
use campus_session::{ProfileStore, StoreError};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

// ================================================================================================
// Types
// ================================================================================================

/// 프로필 레코드
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRecord {
    pub uid: String,
    pub email: String,
    #[sqlx(default)]
    pub display_name: Option<String>,
    #[sqlx(default)]
    pub role: Option<String>,
    #[sqlx(default)]
    pub school: Option<String>,
    #[sqlx(default)]
    pub grade_level: Option<String>,
    pub linked_students: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        Profile {
            uid: record.uid,
            email: record.email,
            display_name: record.display_name,
            role: record.role,
            school: record.school,
            grade_level: record.grade_level,
            linked_students: record.linked_students,
        }
    }
}

// ================================================================================================
// Repository
// ================================================================================================

/// Profile Repository
pub struct ProfileRepository;

impl ProfileRepository {
    /// uid로 프로필 조회
    pub async fn find_by_uid(
        pool: &PgPool,
        uid: &str,
    ) -> Result<Option<ProfileRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles WHERE uid = $1")
            .bind(uid)
            .fetch_optional(pool)
            .await
    }

    /// 프로필 생성
    pub async fn insert(pool: &PgPool, profile: &Profile) -> Result<ProfileRecord, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>(
            r#"
            INSERT INTO profiles (uid, email, display_name, role, school, grade_level, linked_students)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&profile.uid)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.role)
        .bind(&profile.school)
        .bind(&profile.grade_level)
        .bind(&profile.linked_students)
        .fetch_one(pool)
        .await
    }

    /// 부분 업데이트 (NULL 필드는 유지)
    pub async fn update(
        pool: &PgPool,
        uid: &str,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>(
            r#"
            UPDATE profiles
            SET display_name = COALESCE($2, display_name),
                role = COALESCE($3, role),
                school = COALESCE($4, school),
                grade_level = COALESCE($5, grade_level),
                linked_students = COALESCE($6, linked_students),
                updated_at = NOW()
            WHERE uid = $1
            RETURNING *
            "#,
        )
        .bind(uid)
        .bind(&patch.display_name)
        .bind(&patch.role)
        .bind(&patch.school)
        .bind(&patch.grade_level)
        .bind(&patch.linked_students)
        .fetch_optional(pool)
        .await
    }
}

// ================================================================================================
// ProfileStore
// ================================================================================================

/// Postgres 기반 프로필 저장소.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::AlreadyExists(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch(&self, uid: &str) -> Result<Option<Profile>, StoreError> {
        let record = ProfileRepository::find_by_uid(&self.pool, uid)
            .await
            .map_err(store_error)?;
        Ok(record.map(Profile::from))
    }

    async fn update(&self, uid: &str, patch: ProfilePatch) -> Result<Profile, StoreError> {
        ProfileRepository::update(&self.pool, uid, &patch)
            .await
            .map_err(store_error)?
            .map(Profile::from)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn create(&self, profile: Profile) -> Result<Profile, StoreError> {
        let record = ProfileRepository::insert(&self.pool, &profile)
            .await
            .map_err(store_error)?;
        tracing::debug!(uid = %record.uid, "프로필 생성");
        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_into_profile() {
        let now = Utc::now();
        let record = ProfileRecord {
            uid: "p-1".to_string(),
            email: "jung@school.test".to_string(),
            display_name: Some("Jung".to_string()),
            role: Some("parent".to_string()),
            school: None,
            grade_level: None,
            linked_students: vec!["s-1".to_string(), "s-2".to_string()],
            created_at: now,
            updated_at: now,
        };

        let profile = Profile::from(record);
        assert_eq!(profile.uid, "p-1");
        assert_eq!(profile.role.as_deref(), Some("parent"));
        assert_eq!(profile.linked_students.len(), 2);
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }
}
