//! 세션 프로바이더.
//!
//! 인증 협력자의 상태 변경을 구독하고, 로그인 신원마다 프로필을 조회해
//! 세션을 확정합니다. 세션 상태의 유일한 소유자이며 다른 컴포넌트는
//! [`SessionHandle`]로 읽기만 합니다.
//!
//! # 순서 보장
//!
//! - 로그인 알림을 받으면 프로필 조회 전에 `loading = true`를 게시하고,
//!   조회가 끝나거나 실패한 뒤에만 `loading = false`를 게시합니다.
//! - 조회 중에 새 알림이 오면 이전 조회 결과는 버리고 새 알림을 처리합니다.
//! - 언마운트 이후에는 어떤 결과도 게시하지 않습니다.
//!
//! 프로필 조회에는 타임아웃이 없습니다. 응답하지 않는 조회는 `loading = true`를
//! 계속 유지합니다.

use campus_core::{resolve_session, Identity, Session};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthEvent, AuthProvider, AuthSubscription};
use crate::profile_store::ProfileStore;

/// 세션 읽기 전용 핸들.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    receiver: watch::Receiver<Session>,
}

impl SessionHandle {
    /// 현재 세션 스냅샷.
    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    /// 다음 변경까지 대기. 프로바이더가 종료되면 `None`.
    pub async fn changed(&mut self) -> Option<Session> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// 조건을 만족하는 세션이 게시될 때까지 대기.
    ///
    /// 현재 값이 이미 조건을 만족하면 바로 반환합니다. 조건을 만족하지 못한 채
    /// 프로바이더가 종료되면 `None`.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&Session) -> bool) -> Option<Session> {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|session| session.clone())
    }

    /// 로딩이 끝난 세션이 게시될 때까지 대기.
    pub async fn wait_until_resolved(&mut self) -> Option<Session> {
        self.wait_for(Session::is_resolved).await
    }
}

/// 세션 프로바이더.
///
/// 마운트된 인스턴스 하나당 인증 구독은 정확히 하나입니다.
pub struct SessionProvider {
    state: watch::Receiver<Session>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionProvider {
    /// 인증 구독을 시작하고 백그라운드 태스크를 띄웁니다.
    ///
    /// Tokio 런타임 안에서 호출해야 합니다.
    pub fn mount(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (sender, state) = watch::channel(Session::initial());
        let shutdown = CancellationToken::new();
        let subscription = auth.subscribe();

        let worker = Worker {
            subscription,
            profiles,
            state: sender,
            shutdown: shutdown.clone(),
            open: true,
        };
        let task = tokio::spawn(worker.run());

        tracing::debug!("세션 프로바이더 마운트");
        Self {
            state,
            shutdown,
            task: Some(task),
        }
    }

    /// 읽기 전용 핸들 발급.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            receiver: self.state.clone(),
        }
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// 구독을 해제하고 태스크 종료를 기다립니다.
    ///
    /// 진행 중인 프로필 조회 결과는 버려집니다.
    pub async fn unmount(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "세션 프로바이더 태스크 비정상 종료");
            }
        }
        tracing::debug!("세션 프로바이더 언마운트");
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// 프로필 조회 결과.
enum Fetch {
    Resolved(Session),
    Superseded(AuthEvent),
    Cancelled,
}

struct Worker {
    subscription: AuthSubscription,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<Session>,
    shutdown: CancellationToken,
    /// 인증 협력자 알림 스트림이 열려 있는지
    open: bool,
}

impl Worker {
    async fn run(mut self) {
        let mut pending: Option<AuthEvent> = None;

        loop {
            let event = match pending.take() {
                Some(event) => event,
                None => {
                    if !self.open {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break,
                        next = self.subscription.next() => match next {
                            Some(event) => event,
                            None => {
                                self.on_closed();
                                // 처리 중인 조회가 없으므로 아직 로딩이면 로그아웃으로 확정
                                if self.state.borrow().loading {
                                    self.state.send_replace(Session::signed_out());
                                }
                                break;
                            }
                        },
                    }
                }
            };

            match event {
                AuthEvent::SignedIn(identity) => {
                    self.state.send_modify(|session| session.loading = true);
                    match self.fetch(&identity).await {
                        Fetch::Resolved(session) => {
                            tracing::info!(
                                uid = %identity.uid,
                                role = %session.role,
                                "세션 확인 완료"
                            );
                            self.state.send_replace(session);
                        }
                        Fetch::Superseded(newer) => {
                            tracing::debug!(uid = %identity.uid, "새 인증 알림 도착, 이전 프로필 조회 폐기");
                            pending = Some(newer);
                        }
                        Fetch::Cancelled => break,
                    }
                }
                AuthEvent::SignedOut => {
                    tracing::info!("로그아웃 상태");
                    self.state.send_replace(Session::signed_out());
                }
                AuthEvent::Error(message) => {
                    tracing::error!(error = %message, "인증 구독 에러, 로그아웃 상태로 전환");
                    self.state.send_replace(Session::signed_out());
                }
            }
        }
    }

    /// 프로필 조회. 새 알림이나 종료 신호가 오면 결과를 기다리지 않습니다.
    async fn fetch(&mut self, identity: &Identity) -> Fetch {
        let profiles = Arc::clone(&self.profiles);
        let lookup = profiles.fetch(&identity.uid);
        tokio::pin!(lookup);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Fetch::Cancelled,
                result = &mut lookup => return Fetch::Resolved(resolve_session(identity, result)),
                next = self.subscription.next(), if self.open => match next {
                    Some(event) => return Fetch::Superseded(event),
                    None => self.on_closed(),
                },
            }
        }
    }

    fn on_closed(&mut self) {
        self.open = false;
        tracing::warn!("인증 협력자 알림 스트림 종료");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FetchBehavior, InMemoryAuthProvider, InMemoryProfileStore};
    use campus_core::{Profile, Role, RoleClaim};

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let provider = SessionProvider::mount(auth.clone(), profiles);

        // 단일 스레드 런타임: 워커는 아직 실행되지 않음
        let first = provider.handle().current();
        assert_eq!(first, Session::initial());
        assert!(first.loading);
        assert!(first.user.is_none());

        provider.unmount().await;
        assert_eq!(auth.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_holds_while_profile_fetch_hangs() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.emit(AuthEvent::SignedIn(Identity::new("u-1", "park@school.test")));
        let profiles = Arc::new(InMemoryProfileStore::new());
        profiles.set_fetch_behavior(FetchBehavior::Hang).await;

        let provider = SessionProvider::mount(auth, profiles);
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;

        let session = provider.current();
        assert!(session.loading);
        assert!(!session.is_authenticated());
        provider.unmount().await;
    }

    #[tokio::test]
    async fn test_signed_out_resolves() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let provider = SessionProvider::mount(auth, Arc::new(InMemoryProfileStore::new()));

        let session = provider.handle().wait_until_resolved().await.unwrap();
        assert_eq!(session, Session::signed_out());
        provider.unmount().await;
    }

    #[tokio::test]
    async fn test_existing_identity_loads_profile() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let identity = Identity::new("u-1", "park@school.test");
        auth.emit(AuthEvent::SignedIn(identity.clone()));
        let profiles = Arc::new(InMemoryProfileStore::with_profiles([Profile::new(
            "u-1",
            "park@school.test",
        )
        .with_role("teacher")]));

        let provider = SessionProvider::mount(auth, profiles);
        let session = provider.handle().wait_until_resolved().await.unwrap();
        assert_eq!(session.role, RoleClaim::Known(Role::Teacher));
        assert_eq!(session.uid(), Some("u-1"));
        provider.unmount().await;
    }
}
