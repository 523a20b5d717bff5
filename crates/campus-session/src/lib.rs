//! # Campus Session
//!
//! 세션 상태와 역할 기반 라우팅을 제공합니다:
//! - 인증/프로필 협력자 계약과 메모리 구현
//! - 세션 프로바이더 (인증 구독, 프로필 조회, 로딩 플래그)
//! - 라우트 가드와 대시보드 라우터 (리다이렉트 순환 방지 포함)
//! - 로그인/가입/로그아웃 액션과 일시 알림

pub mod actions;
pub mod auth;
pub mod dashboard;
pub mod guard;
pub mod memory;
pub mod navigator;
pub mod password;
pub mod profile_store;
pub mod provider;
pub mod redirect;

pub use actions::{AuthActions, Notice, NoticeLevel, Notices};
pub use auth::{AuthError, AuthEvent, AuthProvider, AuthSubscription, NewAccount};
pub use dashboard::{DashboardRouter, DashboardView};
pub use guard::{GuardState, GuardView, RouteGuard};
pub use memory::{FetchBehavior, InMemoryAuthProvider, InMemoryProfileStore};
pub use navigator::{Navigator, RecordingNavigator};
pub use profile_store::{ProfileStore, StoreError};
pub use provider::{SessionHandle, SessionProvider};
pub use redirect::{RedirectHistory, RouterContext, MAX_REDIRECT_HOPS};
