//! 애플리케이션 공유 상태.
//!
//! 모든 라우트 핸들러가 `Arc<AppState>`로 공유합니다.

use campus_core::config::AuthConfig;
use campus_core::{resolve_session, Identity, RoleDirectory, Session};
use campus_session::{AuthProvider, ProfileStore};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// 애플리케이션 상태.
#[derive(Clone)]
pub struct AppState {
    /// 인증 협력자
    pub auth: Arc<dyn AuthProvider>,
    /// 프로필 저장소 (Postgres 또는 메모리)
    pub profiles: Arc<dyn ProfileStore>,
    /// 토큰 발급 설정
    pub auth_config: AuthConfig,
    /// 역할 디렉터리
    pub directory: &'static RoleDirectory,
    /// 폐기된 토큰/세션 ID와 만료 시각 (Unix timestamp)
    revoked_tokens: Arc<RwLock<HashMap<String, i64>>>,
    /// 데이터베이스 연결 풀 (설정된 경우)
    pub db_pool: Option<PgPool>,
    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,
    /// 애플리케이션 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            auth,
            profiles,
            auth_config,
            directory: RoleDirectory::global(),
            revoked_tokens: Arc::new(RwLock::new(HashMap::new())),
            db_pool: None,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 데이터베이스 연결 설정.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    pub fn jwt_secret(&self) -> &str {
        self.auth_config.jwt_secret.expose_secret()
    }

    /// 토큰 ID 또는 세션 ID 폐기.
    ///
    /// `expires_at` 이후에는 토큰 자체가 만료되므로 정리 대상이 됩니다.
    /// 이미 폐기된 ID면 `false`를 반환합니다.
    pub async fn revoke_token(&self, id: &str, expires_at: i64) -> bool {
        let mut revoked = self.revoked_tokens.write().await;
        if revoked.contains_key(id) {
            return false;
        }
        revoked.insert(id.to_string(), expires_at);
        true
    }

    pub async fn is_revoked(&self, id: &str) -> bool {
        self.revoked_tokens.read().await.contains_key(id)
    }

    /// 만료 시각이 지난 폐기 항목 정리. 제거한 항목 수를 반환합니다.
    pub async fn purge_expired_revocations(&self, now: i64) -> usize {
        let mut revoked = self.revoked_tokens.write().await;
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at >= now);
        before - revoked.len()
    }

    /// 주기적으로 만료된 폐기 항목을 정리하는 백그라운드 태스크 시작.
    pub fn spawn_revocation_cleanup(
        self: &Arc<Self>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = state.purge_expired_revocations(Utc::now().timestamp()).await;
                        if purged > 0 {
                            tracing::debug!(purged, "만료된 폐기 토큰 정리");
                        }
                    }
                }
            }
        })
    }

    /// 신원의 프로필을 조회해 세션 확정.
    ///
    /// 세션 프로바이더와 같은 규칙을 따릅니다: 레코드가 없거나 조회에 실패하면
    /// 기본 역할(student)입니다.
    pub async fn resolve_session(&self, identity: &Identity) -> Session {
        let lookup = self.profiles.fetch(&identity.uid).await;
        resolve_session(identity, lookup)
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        if let Some(pool) = &self.db_pool {
            sqlx::query("SELECT 1").execute(pool).await.is_ok()
        } else {
            false
        }
    }
}

/// 테스트용 상태 생성.
///
/// 메모리 인증 협력자와 메모리 프로필 저장소를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use campus_session::{InMemoryAuthProvider, InMemoryProfileStore};

    create_test_state_with(
        Arc::new(InMemoryAuthProvider::new()),
        Arc::new(InMemoryProfileStore::new()),
    )
}

/// 주어진 협력자로 테스트용 상태 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with(
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
) -> AppState {
    AppState::new(auth, profiles, AuthConfig::default())
}
