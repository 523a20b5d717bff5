//! 인증 협력자 계약.
//!
//! 인증 서비스는 외부 시스템입니다. 이 모듈은 세션 계층이 소비하는 계약만
//! 정의합니다:
//! - 상태 변경 구독 (push 방식)
//! - 이메일/비밀번호 로그인, 가입, 로그아웃

use async_trait::async_trait;
use campus_core::Identity;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use validator::Validate;

/// 인증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("이메일 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,
    #[error("이미 사용 중인 이메일입니다")]
    EmailInUse,
    #[error("비밀번호가 너무 약합니다: {0}")]
    WeakPassword(String),
    #[error("잘못된 이메일 형식입니다")]
    InvalidEmail,
    #[error("네트워크 에러: {0}")]
    Network(String),
    #[error("인증 서비스 내부 에러: {0}")]
    Internal(String),
}

impl AuthError {
    /// 클라이언트 표시용 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailInUse => "EMAIL_IN_USE",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::Network(_) => "NETWORK_ERROR",
            AuthError::Internal(_) => "AUTH_INTERNAL",
        }
    }
}

/// 인증 상태 변경 알림.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// 로그인된 신원
    SignedIn(Identity),
    /// 로그아웃 또는 세션 없음
    SignedOut,
    /// 구독 에러
    Error(String),
}

impl AuthEvent {
    pub fn from_identity(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => AuthEvent::SignedIn(identity),
            None => AuthEvent::SignedOut,
        }
    }
}

/// 가입 요청.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// 인증 상태 구독.
///
/// 첫 [`next`](Self::next) 호출은 구독 시점의 현재 상태를 돌려주고, 이후에는
/// 상태 변경 알림을 순서대로 돌려줍니다. 값이 drop되면 리스너가 해제됩니다.
#[derive(Debug)]
pub struct AuthSubscription {
    initial: Option<AuthEvent>,
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    pub fn new(initial: AuthEvent, receiver: broadcast::Receiver<AuthEvent>) -> Self {
        Self {
            initial: Some(initial),
            receiver,
        }
    }

    /// 다음 알림 대기. 협력자가 종료되면 `None`.
    ///
    /// 수신이 밀려 알림이 유실되면 남은 알림부터 이어서 받습니다.
    /// 알림은 각각 전체 상태를 담고 있으므로 마지막 알림만으로 충분합니다.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "인증 알림 수신 지연, 누락된 알림 건너뜀");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// 인증 협력자.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// 상태 변경 구독.
    fn subscribe(&self) -> AuthSubscription;

    /// 현재 활성 구독 수.
    fn listener_count(&self) -> usize;

    /// 현재 로그인된 신원.
    async fn current_identity(&self) -> Option<Identity>;

    /// 이메일/비밀번호 로그인.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// 가입. 성공하면 새 계정으로 로그인된 상태가 됩니다.
    async fn sign_up(&self, account: NewAccount) -> Result<Identity, AuthError>;

    /// 로그아웃.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_yields_initial_state_first() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = AuthSubscription::new(AuthEvent::SignedOut, rx);
        tx.send(AuthEvent::SignedIn(Identity::new("u-1", "a@b.test")))
            .unwrap();

        assert_eq!(sub.next().await, Some(AuthEvent::SignedOut));
        assert!(matches!(sub.next().await, Some(AuthEvent::SignedIn(_))));

        drop(tx);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_subscription_skips_lagged_events() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = AuthSubscription::new(AuthEvent::SignedOut, rx);
        for i in 0..4 {
            tx.send(AuthEvent::Error(format!("e{}", i))).unwrap();
        }

        assert_eq!(sub.next().await, Some(AuthEvent::SignedOut));
        assert_eq!(sub.next().await, Some(AuthEvent::Error("e2".to_string())));
        assert_eq!(sub.next().await, Some(AuthEvent::Error("e3".to_string())));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(AuthError::Network("down".into()).code(), "NETWORK_ERROR");
    }
}
