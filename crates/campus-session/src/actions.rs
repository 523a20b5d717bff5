//! 로그인/가입/로그아웃 처리와 일시 알림.
//!
//! 인증 협력자의 에러는 이 경계에서 [`Notice`]로 바뀌어 게시되며 호출자에게
//! 전파되지 않습니다. 세션 상태는 건드리지 않습니다 (세션은 프로바이더가
//! 인증 알림을 받아 갱신).

use campus_core::{Identity, Profile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::auth::{AuthError, AuthProvider, NewAccount};
use crate::profile_store::ProfileStore;

const NOTICE_CHANNEL_CAPACITY: usize = 32;

/// 알림 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// 사용자에게 잠시 보여줄 알림.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// 알림 채널.
#[derive(Debug, Clone)]
pub struct Notices {
    sender: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// 알림 게시. 구독자가 없으면 버려집니다.
    pub fn publish(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

/// 사용자 표시용 인증 에러 문구.
pub fn auth_error_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::InvalidCredentials => "Invalid email or password.",
        AuthError::EmailInUse => "An account with this email already exists.",
        AuthError::WeakPassword(_) => "Password is too weak.",
        AuthError::InvalidEmail => "Please enter a valid email address.",
        AuthError::Network(_) => "Network error. Please try again.",
        AuthError::Internal(_) => "Something went wrong. Please try again.",
    }
}

/// 인증 액션 처리기.
#[derive(Clone)]
pub struct AuthActions {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    notices: Notices,
}

impl AuthActions {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        notices: Notices,
    ) -> Self {
        Self {
            auth,
            profiles,
            notices,
        }
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// 로그인. 실패하면 에러 알림을 게시하고 `None`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Option<Identity> {
        match self.auth.sign_in(email, password).await {
            Ok(identity) => {
                self.notices.publish(Notice::success("Signed in successfully."));
                Some(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "로그인 실패");
                self.notices.publish(Notice::error(auth_error_message(&e)));
                None
            }
        }
    }

    /// 가입 후 기본 역할(student) 프로필 생성.
    ///
    /// 프로필 생성에 실패해도 계정은 유지됩니다. 세션은 기본 역할로 동작합니다.
    pub async fn sign_up(&self, account: NewAccount) -> Option<Identity> {
        let display_name = account.display_name.clone();
        let identity = match self.auth.sign_up(account).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "가입 실패");
                self.notices.publish(Notice::error(auth_error_message(&e)));
                return None;
            }
        };

        let mut profile = Profile::new(identity.uid.clone(), identity.email.clone());
        profile.display_name = display_name;

        match self.profiles.create(profile).await {
            Ok(_) => {
                self.notices.publish(Notice::success("Account created."));
            }
            Err(e) => {
                tracing::error!(uid = %identity.uid, error = %e, "가입 후 프로필 생성 실패");
                self.notices.publish(Notice::error(
                    "Account created, but your profile could not be saved.",
                ));
            }
        }
        Some(identity)
    }

    /// 로그아웃. 실패하면 에러 알림을 게시하고 `false`.
    pub async fn sign_out(&self) -> bool {
        match self.auth.sign_out().await {
            Ok(()) => {
                self.notices.publish(Notice::info("Signed out."));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "로그아웃 실패");
                self.notices.publish(Notice::error(auth_error_message(&e)));
                false
            }
        }
    }
}
