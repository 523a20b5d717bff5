//! 대시보드 라우터.
//!
//! 대시보드 루트에 도착하면 세션 역할에 맞는 대시보드로 한 번만 보냅니다.

use campus_core::navigation::{dashboard_route_for_claim, DASHBOARD_ROOT, LOGIN_ROUTE};
use campus_core::Session;

use crate::redirect::RouterContext;

/// 대시보드 라우터가 그려야 할 내용.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// 로딩 표시
    Loading,
    /// 이동 중
    Redirecting { to: String },
}

/// 대시보드 루트 라우터.
pub struct DashboardRouter {
    ctx: RouterContext,
    /// 마지막으로 이동시킨 (uid, 요청 경로, 실제 목적지)
    last: Option<(Option<String>, &'static str, String)>,
}

impl DashboardRouter {
    pub fn new(ctx: RouterContext) -> Self {
        Self { ctx, last: None }
    }

    /// 대시보드 루트 활성화.
    ///
    /// 확인된 세션 하나당 이동은 한 번뿐입니다. 역할이 없거나 인식되지 않으면
    /// 기본(학생) 대시보드로 보냅니다.
    pub fn activate(&mut self, session: &Session) -> DashboardView {
        if session.loading {
            return DashboardView::Loading;
        }

        let target = match session.user {
            None => LOGIN_ROUTE,
            Some(_) => dashboard_route_for_claim(&session.role),
        };
        let uid = session.uid().map(str::to_string);

        if let Some((last_uid, last_target, destination)) = &self.last {
            if *last_uid == uid && *last_target == target {
                return DashboardView::Redirecting {
                    to: destination.clone(),
                };
            }
        }

        let destination = self.ctx.redirect(DASHBOARD_ROOT, target);
        tracing::debug!(uid = ?uid, role = %session.role, to = %destination, "대시보드 이동");
        self.last = Some((uid, target, destination.clone()));
        DashboardView::Redirecting { to: destination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{GuardState, GuardView, RouteGuard};
    use crate::navigator::RecordingNavigator;
    use campus_core::navigation::UNAUTHORIZED_ROUTE;
    use campus_core::{resolve_session, Feature, Identity, Profile, Role, RoleDirectory};
    use std::sync::Arc;

    fn session_as(uid: &str, role: Option<&str>) -> Session {
        let identity = Identity::new(uid, format!("{}@school.test", uid));
        let mut profile = Profile::new(uid, identity.email.clone());
        profile.role = role.map(str::to_string);
        resolve_session::<String>(&identity, Ok(Some(profile)))
    }

    fn router() -> (DashboardRouter, RecordingNavigator) {
        let nav = RecordingNavigator::new();
        let ctx = RouterContext::new(Arc::new(nav.clone()));
        (DashboardRouter::new(ctx), nav)
    }

    #[test]
    fn test_loading_takes_no_action() {
        let (mut router, nav) = router();
        assert_eq!(router.activate(&Session::initial()), DashboardView::Loading);
        assert_eq!(nav.count(), 0);
    }

    #[test]
    fn test_signed_out_goes_to_login() {
        let (mut router, nav) = router();
        router.activate(&Session::signed_out());
        assert_eq!(nav.calls(), vec![LOGIN_ROUTE]);
    }

    #[test]
    fn test_role_routes() {
        for (role, expected) in [
            (Some("parent"), "/dashboard/parent"),
            (Some("teacher"), "/dashboard/teacher"),
            (Some("admin"), "/dashboard/admin"),
            (Some("social_worker"), "/dashboard/counselor"),
            (Some("district"), "/dashboard/student"),
            (None, "/dashboard/student"),
        ] {
            let (mut router, nav) = router();
            router.activate(&session_as("u-1", role));
            assert_eq!(nav.calls(), vec![expected], "role {:?}", role);
        }
    }

    #[test]
    fn test_one_navigation_per_resolved_session() {
        let (mut router, nav) = router();
        let parent = session_as("u-1", Some("parent"));
        router.activate(&parent);
        router.activate(&parent);
        router.activate(&parent.reloading());
        router.activate(&parent);
        assert_eq!(nav.count(), 1);

        router.activate(&session_as("u-2", Some("teacher")));
        assert_eq!(nav.calls(), vec!["/dashboard/parent", "/dashboard/teacher"]);
    }

    #[test]
    fn test_misconfigured_directory_cannot_loop() {
        let nav = RecordingNavigator::new();
        // 교사가 자기 대시보드에 접근할 수 없는 잘못된 설정
        let directory = RoleDirectory::from_entries([(Role::Teacher, [Feature::Chat])]);
        let ctx = RouterContext::with_directory(Arc::new(nav.clone()), directory);
        let mut router = DashboardRouter::new(ctx.clone());
        let mut guard = RouteGuard::new(Feature::TeacherDashboard, ctx).at("/dashboard/teacher");
        let teacher = session_as("u-1", Some("teacher"));

        router.activate(&teacher);
        // 가드가 대시보드 루트로 돌려보내면 순환이므로 권한 없음 페이지로 끊음
        assert_eq!(guard.evaluate(&teacher), GuardView::Nothing);
        assert_eq!(
            guard.state(),
            &GuardState::Redirecting {
                to: UNAUTHORIZED_ROUTE.to_string()
            }
        );
        assert_eq!(nav.calls(), vec!["/dashboard/teacher", UNAUTHORIZED_ROUTE]);
    }
}
