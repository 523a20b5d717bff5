//! 메모리 기반 협력자 구현.
//!
//! 로컬 개발과 테스트에서 외부 인증/문서 저장소 대신 사용합니다.
//! 장애 주입 훅으로 네트워크 실패, 지연, 응답 없음 상황을 재현할 수 있습니다.

use async_trait::async_trait;
use campus_core::{Identity, Profile, ProfilePatch};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use validator::Validate;

use crate::auth::{AuthError, AuthEvent, AuthProvider, AuthSubscription, NewAccount};
use crate::password::{hash_password, validate_password_strength, verify_password};
use crate::profile_store::{ProfileStore, StoreError};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

// ==================== 인증 ====================

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

/// 메모리 기반 인증 협력자.
///
/// 브라우저 클라이언트 SDK처럼 "현재 로그인된 사용자" 하나를 보관하고,
/// 변경될 때마다 구독자에게 알림을 보냅니다.
pub struct InMemoryAuthProvider {
    /// 소문자 이메일 → 계정
    accounts: RwLock<HashMap<String, Account>>,
    current: watch::Sender<Option<Identity>>,
    events: broadcast::Sender<AuthEvent>,
    min_password_length: usize,
    offline: AtomicBool,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (current, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current,
            events,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            offline: AtomicBool::new(false),
        }
    }

    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    /// 로그인 상태를 바꾸지 않고 계정만 등록합니다.
    pub async fn register(&self, account: NewAccount) -> Result<Identity, AuthError> {
        self.ensure_online()?;

        if account.validate().is_err() {
            return Err(AuthError::InvalidEmail);
        }
        validate_password_strength(&account.password, self.min_password_length)
            .map_err(AuthError::WeakPassword)?;

        let key = account.email.trim().to_lowercase();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }

        let password_hash =
            hash_password(&account.password).map_err(|e| AuthError::Internal(e.to_string()))?;
        let mut identity = Identity::new(uuid::Uuid::new_v4().to_string(), key.clone());
        identity.display_name = account.display_name;

        accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    /// 네트워크 장애 상태 전환. 장애 중에는 로그인/가입/로그아웃이 실패합니다.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// 임의의 알림을 구독자에게 전달합니다. 로그인/로그아웃 알림은 현재 상태도 바꿉니다.
    pub fn emit(&self, event: AuthEvent) {
        match &event {
            AuthEvent::SignedIn(identity) => {
                self.current.send_replace(Some(identity.clone()));
            }
            AuthEvent::SignedOut => {
                self.current.send_replace(None);
            }
            AuthEvent::Error(_) => {}
        }
        // 구독자가 없으면 전송 실패는 정상
        let _ = self.events.send(event);
    }

    fn ensure_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthError::Network("인증 서버에 연결할 수 없습니다".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    fn subscribe(&self) -> AuthSubscription {
        // 수신기를 먼저 만들어 현재 상태 조회와 구독 사이의 알림을 놓치지 않음
        let receiver = self.events.subscribe();
        let initial = AuthEvent::from_identity(self.current.borrow().clone());
        AuthSubscription::new(initial, receiver)
    }

    fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    async fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.ensure_online()?;

        let key = email.trim().to_lowercase();
        let account = self
            .accounts
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        tracing::debug!(uid = %account.identity.uid, "로그인 성공");
        self.emit(AuthEvent::SignedIn(account.identity.clone()));
        Ok(account.identity)
    }

    async fn sign_up(&self, account: NewAccount) -> Result<Identity, AuthError> {
        let identity = self.register(account).await?;
        tracing::debug!(uid = %identity.uid, "계정 생성");
        self.emit(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.ensure_online()?;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }
}

// ==================== 프로필 저장소 ====================

/// 프로필 조회 동작 (장애 주입용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchBehavior {
    /// 정상 응답
    #[default]
    Normal,
    /// 항상 실패
    Fail,
    /// 지정 시간 후 응답
    Delay(Duration),
    /// 응답하지 않음
    Hang,
}

/// 메모리 기반 프로필 저장소.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
    behavior: Mutex<FetchBehavior>,
    fetch_count: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 프로필 목록으로 생성.
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.uid.clone(), p)).collect();
        Self {
            profiles: RwLock::new(map),
            ..Default::default()
        }
    }

    pub async fn set_fetch_behavior(&self, behavior: FetchBehavior) {
        *self.behavior.lock().await = behavior;
    }

    /// 지금까지 시작된 조회 수.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch(&self, uid: &str) -> Result<Option<Profile>, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let behavior = *self.behavior.lock().await;
        match behavior {
            FetchBehavior::Normal => {}
            FetchBehavior::Fail => {
                return Err(StoreError::Unavailable("프로필 저장소 응답 없음".to_string()))
            }
            FetchBehavior::Delay(delay) => tokio::time::sleep(delay).await,
            FetchBehavior::Hang => std::future::pending::<()>().await,
        }

        Ok(self.profiles.read().await.get(uid).cloned())
    }

    async fn update(&self, uid: &str, patch: ProfilePatch) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        profile.apply(patch);
        Ok(profile.clone())
    }

    async fn create(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.uid) {
            return Err(StoreError::AlreadyExists(profile.uid));
        }
        profiles.insert(profile.uid.clone(), profile.clone());
        Ok(profile)
    }
}
