//! 라우트 가드.
//!
//! 보호 페이지를 감싸 세션 상태에 따라 로딩 표시, 로그인 이동, 대체 경로 이동,
//! 자식 렌더링 중 하나를 결정합니다.
//!
//! ```text
//! Unknown ──evaluate──▶ Checking ──resolved──▶ Authorized
//!                          │                       │
//!                          └──────────────▶ Redirecting { to }
//! ```

use campus_core::navigation::{DASHBOARD_ROOT, LOGIN_ROUTE, PAGES};
use campus_core::{Feature, RoleClaim, Session};

use crate::redirect::RouterContext;

/// 가드 상태.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuardState {
    /// 아직 평가하지 않음
    #[default]
    Unknown,
    /// 세션 확인 중
    Checking,
    /// 접근 허용
    Authorized,
    /// 다른 경로로 이동 중
    Redirecting { to: String },
}

/// 가드가 그려야 할 내용.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// 로딩 표시
    Loading,
    /// 보호된 자식 렌더링
    Children,
    /// 아무것도 그리지 않음 (이동 중)
    Nothing,
}

/// 마지막 이동을 결정한 입력값.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Inputs {
    uid: Option<String>,
    role: RoleClaim,
    feature: Feature,
    fallback: String,
}

/// 라우트 가드.
pub struct RouteGuard {
    required: Feature,
    fallback: String,
    current_path: String,
    ctx: RouterContext,
    state: GuardState,
    last_navigation: Option<(Inputs, String)>,
}

impl RouteGuard {
    /// 보호할 기능으로 가드 생성.
    ///
    /// 현재 경로는 해당 기능을 요구하는 첫 페이지 경로, 대체 경로는 대시보드 루트가
    /// 기본값입니다.
    pub fn new(required: Feature, ctx: RouterContext) -> Self {
        let current_path = PAGES
            .iter()
            .find(|page| page.feature == required)
            .map(|page| page.path)
            .unwrap_or("/");
        Self {
            required,
            fallback: DASHBOARD_ROOT.to_string(),
            current_path: current_path.to_string(),
            ctx,
            state: GuardState::Unknown,
            last_navigation: None,
        }
    }

    /// 권한이 없을 때 이동할 경로.
    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback = path.into();
        self
    }

    /// 가드가 위치한 경로.
    pub fn at(mut self, current_path: impl Into<String>) -> Self {
        self.current_path = current_path.into();
        self
    }

    pub fn set_required_feature(&mut self, feature: Feature) {
        self.required = feature;
    }

    pub fn set_fallback(&mut self, path: impl Into<String>) {
        self.fallback = path.into();
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn required_feature(&self) -> Feature {
        self.required
    }

    /// 세션으로 가드 평가.
    ///
    /// 로딩 중에는 이동하지 않습니다. 입력(사용자, 역할, 기능, 대체 경로)이
    /// 직전 이동 때와 같으면 다시 이동하지 않습니다.
    pub fn evaluate(&mut self, session: &Session) -> GuardView {
        if session.loading {
            self.state = GuardState::Checking;
            return GuardView::Loading;
        }

        let inputs = Inputs {
            uid: session.uid().map(str::to_string),
            role: session.role.clone(),
            feature: self.required,
            fallback: self.fallback.clone(),
        };

        let target = if session.user.is_none() {
            Some(LOGIN_ROUTE.to_string())
        } else if !self.ctx.directory().allows_claim(&session.role, self.required) {
            tracing::debug!(
                role = %session.role,
                feature = %self.required,
                fallback = %self.fallback,
                "기능 접근 거부"
            );
            Some(self.fallback.clone())
        } else {
            None
        };

        match target {
            None => {
                if self.state != GuardState::Authorized {
                    self.ctx.settle();
                }
                self.state = GuardState::Authorized;
                self.last_navigation = None;
                GuardView::Children
            }
            Some(target) => {
                let destination = match &self.last_navigation {
                    Some((last, destination)) if *last == inputs => destination.clone(),
                    _ => {
                        let destination = self.ctx.redirect(&self.current_path, &target);
                        self.last_navigation = Some((inputs, destination.clone()));
                        destination
                    }
                };
                self.state = GuardState::Redirecting { to: destination };
                GuardView::Nothing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::RecordingNavigator;
    use campus_core::navigation::UNAUTHORIZED_ROUTE;
    use campus_core::{Identity, Profile, Role, RoleDirectory};
    use std::sync::Arc;

    fn session_as(role: &str) -> Session {
        let identity = Identity::new("u-1", "user@school.test");
        campus_core::resolve_session::<String>(
            &identity,
            Ok(Some(Profile::new("u-1", "user@school.test").with_role(role))),
        )
    }

    fn guard(feature: Feature) -> (RouteGuard, RecordingNavigator) {
        let nav = RecordingNavigator::new();
        let ctx = RouterContext::new(Arc::new(nav.clone()));
        (RouteGuard::new(feature, ctx), nav)
    }

    #[test]
    fn test_loading_never_navigates() {
        let (mut guard, nav) = guard(Feature::CreateQuiz);
        assert_eq!(guard.state(), &GuardState::Unknown);

        let mut loading = session_as("student");
        loading.loading = true;
        for _ in 0..3 {
            assert_eq!(guard.evaluate(&loading), GuardView::Loading);
        }
        assert_eq!(guard.evaluate(&Session::initial()), GuardView::Loading);
        assert_eq!(guard.state(), &GuardState::Checking);
        assert_eq!(nav.count(), 0);
    }

    #[test]
    fn test_signed_out_redirects_to_login_once() {
        let (mut guard, nav) = guard(Feature::ViewGrades);
        let out = Session::signed_out();

        assert_eq!(guard.evaluate(&out), GuardView::Nothing);
        assert_eq!(guard.evaluate(&out), GuardView::Nothing);
        assert_eq!(nav.calls(), vec![LOGIN_ROUTE]);
        assert_eq!(
            guard.state(),
            &GuardState::Redirecting {
                to: LOGIN_ROUTE.to_string()
            }
        );
    }

    #[test]
    fn test_unauthorized_redirects_to_fallback() {
        let (guard, nav) = guard(Feature::CreateQuiz);
        let mut guard = guard.with_fallback("/courses");
        let student = session_as("student");

        assert_eq!(guard.evaluate(&student), GuardView::Nothing);
        assert_eq!(guard.evaluate(&student), GuardView::Nothing);
        assert_eq!(nav.calls(), vec!["/courses"]);
    }

    #[test]
    fn test_default_fallback_is_dashboard_root() {
        let (mut guard, nav) = guard(Feature::ManageUsers);
        guard.evaluate(&session_as("teacher"));
        assert_eq!(nav.calls(), vec![DASHBOARD_ROOT]);
    }

    #[test]
    fn test_authorized_renders_children_without_navigation() {
        let (mut guard, nav) = guard(Feature::CreateQuiz);
        let teacher = session_as("teacher");
        assert_eq!(guard.evaluate(&teacher), GuardView::Children);
        assert_eq!(guard.evaluate(&teacher), GuardView::Children);
        assert_eq!(guard.state(), &GuardState::Authorized);
        assert_eq!(nav.count(), 0);
    }

    #[test]
    fn test_unrecognized_role_is_denied() {
        let (mut guard, nav) = guard(Feature::StudentDashboard);
        assert_eq!(guard.evaluate(&session_as("district")), GuardView::Nothing);
        assert_eq!(nav.calls(), vec![DASHBOARD_ROOT]);
    }

    #[test]
    fn test_changed_inputs_reevaluate() {
        let (mut guard, nav) = guard(Feature::CreateQuiz);
        let student = session_as("student");

        guard.evaluate(&student);
        guard.set_fallback("/courses");
        guard.evaluate(&student);
        assert_eq!(nav.calls(), vec![DASHBOARD_ROOT, "/courses"]);

        guard.set_required_feature(Feature::TakeQuiz);
        assert_eq!(guard.evaluate(&student), GuardView::Children);
        assert_eq!(nav.count(), 2);
    }

    #[test]
    fn test_reload_with_same_inputs_does_not_renavigate() {
        let (mut guard, nav) = guard(Feature::CreateQuiz);
        let student = session_as("student");

        guard.evaluate(&student);
        guard.evaluate(&student.reloading());
        guard.evaluate(&student);
        assert_eq!(nav.count(), 1);
    }

    #[test]
    fn test_fallback_to_current_path_is_cut() {
        let (guard, nav) = guard(Feature::CreateQuiz);
        let mut guard = guard.at("/quizzes/new").with_fallback("/quizzes/new");

        guard.evaluate(&session_as("parent"));
        assert_eq!(nav.calls(), vec![UNAUTHORIZED_ROUTE]);
    }

    #[test]
    fn test_custom_directory() {
        let nav = RecordingNavigator::new();
        let directory = RoleDirectory::from_entries([(Role::Parent, [Feature::CreateQuiz])]);
        let ctx = RouterContext::with_directory(Arc::new(nav.clone()), directory);
        let mut guard = RouteGuard::new(Feature::CreateQuiz, ctx);

        assert_eq!(guard.evaluate(&session_as("parent")), GuardView::Children);
        assert_eq!(nav.count(), 0);
    }
}
