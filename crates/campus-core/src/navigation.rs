//! 라우트 테이블과 사이드바 구성.
//!
//! - 고정 라우트 (로그인, 대시보드 루트, 권한 없음)
//! - 역할 → 대시보드 라우트 테이블
//! - 페이지 → 보호 기능 테이블
//! - 역할별 사이드바 링크 그룹

use serde::{Deserialize, Serialize};

use crate::domain::{Feature, Role, RoleClaim};

/// 로그인 라우트.
pub const LOGIN_ROUTE: &str = "/login";
/// 대시보드 루트 (역할별 대시보드로 전달).
pub const DASHBOARD_ROOT: &str = "/dashboard";
/// 리다이렉트 순환 시 도달하는 종단 라우트. 가드를 적용하지 않습니다.
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

/// 역할별 대시보드 라우트.
pub fn dashboard_route(role: Role) -> &'static str {
    match role {
        Role::Student => "/dashboard/student",
        Role::Teacher => "/dashboard/teacher",
        Role::Parent => "/dashboard/parent",
        Role::Admin => "/dashboard/admin",
        Role::Counselor | Role::SocialWorker => "/dashboard/counselor",
    }
}

/// 세션 역할 값의 대시보드 라우트. 인식되지 않은 역할은 기본(학생) 대시보드입니다.
pub fn dashboard_route_for_claim(claim: &RoleClaim) -> &'static str {
    dashboard_route(claim.role().unwrap_or(Role::DEFAULT))
}

/// 역할 문자열의 대시보드 라우트. 누락/미인식 역할은 기본(학생) 대시보드입니다.
pub fn dashboard_route_for_str(role: Option<&str>) -> &'static str {
    dashboard_route(role.and_then(Role::parse).unwrap_or(Role::DEFAULT))
}

/// 애플리케이션 페이지와 해당 페이지를 보호하는 기능.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRoute {
    pub path: &'static str,
    pub title: &'static str,
    pub feature: Feature,
}

/// 보호 페이지 테이블.
#[rustfmt::skip]
pub const PAGES: &[PageRoute] = &[
    PageRoute { path: "/dashboard/student", title: "Student Dashboard", feature: Feature::StudentDashboard },
    PageRoute { path: "/dashboard/teacher", title: "Teacher Dashboard", feature: Feature::TeacherDashboard },
    PageRoute { path: "/dashboard/parent", title: "Parent Dashboard", feature: Feature::ParentDashboard },
    PageRoute { path: "/dashboard/admin", title: "District Admin Dashboard", feature: Feature::AdminDashboard },
    PageRoute { path: "/dashboard/counselor", title: "Student Support Dashboard", feature: Feature::CounselorDashboard },
    PageRoute { path: "/courses", title: "Courses", feature: Feature::BrowseCourses },
    PageRoute { path: "/grades", title: "Grades", feature: Feature::ViewGrades },
    PageRoute { path: "/quizzes", title: "Quizzes", feature: Feature::TakeQuiz },
    PageRoute { path: "/quizzes/new", title: "Create Quiz", feature: Feature::CreateQuiz },
    PageRoute { path: "/lessons/new", title: "Create Lesson", feature: Feature::CreateLesson },
    PageRoute { path: "/classes", title: "My Classes", feature: Feature::ManageClasses },
    PageRoute { path: "/children", title: "My Children", feature: Feature::ViewChildProgress },
    PageRoute { path: "/wellbeing/assessment", title: "Wellbeing Check-in", feature: Feature::MentalHealthAssessment },
    PageRoute { path: "/wellbeing/reviews", title: "Assessment Reviews", feature: Feature::ReviewAssessments },
    PageRoute { path: "/classroom/live", title: "Live Classroom", feature: Feature::LiveClassroom },
    PageRoute { path: "/messages", title: "Messages", feature: Feature::Chat },
    PageRoute { path: "/admin/users", title: "User Management", feature: Feature::ManageUsers },
    PageRoute { path: "/district", title: "District Overview", feature: Feature::DistrictOverview },
    PageRoute { path: "/reports", title: "Reports", feature: Feature::ViewReports },
];

/// 경로로 페이지 조회. 끝의 `/`는 무시합니다.
pub fn page_for(path: &str) -> Option<&'static PageRoute> {
    let normalized = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    PAGES.iter().find(|page| page.path == normalized)
}

/// 사이드바 링크.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

impl NavLink {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
        }
    }
}

/// 사이드바 링크 그룹.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct NavGroup {
    pub id: String,
    pub title: String,
    pub links: Vec<NavLink>,
}

/// 역할 조건부 그룹 정의.
struct RoleGroup {
    id: &'static str,
    title: &'static str,
    roles: &'static [Role],
    links: &'static [(&'static str, &'static str)],
}

// 선언 순서가 곧 출력 순서
const ROLE_GROUPS: &[RoleGroup] = &[
    RoleGroup {
        id: "learning",
        title: "Learning",
        roles: &[Role::Student],
        links: &[
            ("/courses", "Courses"),
            ("/quizzes", "Quizzes"),
            ("/grades", "Grades"),
            ("/classroom/live", "Live Classroom"),
            ("/wellbeing/assessment", "Wellbeing Check-in"),
        ],
    },
    RoleGroup {
        id: "teaching",
        title: "Teaching",
        roles: &[Role::Teacher],
        links: &[
            ("/classes", "My Classes"),
            ("/quizzes/new", "Create Quiz"),
            ("/lessons/new", "Create Lesson"),
            ("/classroom/live", "Live Classroom"),
            ("/reports", "Reports"),
        ],
    },
    RoleGroup {
        id: "family",
        title: "Family",
        roles: &[Role::Parent],
        links: &[("/children", "My Children"), ("/grades", "Grades")],
    },
    RoleGroup {
        id: "student-support",
        title: "Student Support",
        roles: &[Role::Counselor, Role::SocialWorker],
        links: &[("/wellbeing/reviews", "Assessment Reviews")],
    },
    RoleGroup {
        id: "administration",
        title: "Administration",
        roles: &[Role::Admin],
        links: &[
            ("/admin/users", "User Management"),
            ("/district", "District Overview"),
            ("/reports", "Reports"),
        ],
    },
];

/// 모든 역할에 항상 포함되는 기본 링크.
pub fn default_base_links() -> Vec<NavLink> {
    vec![
        NavLink::new(DASHBOARD_ROOT, "Dashboard"),
        NavLink::new("/messages", "Messages"),
    ]
}

/// 역할에 맞는 사이드바 그룹 목록 구성.
///
/// 기본 그룹이 항상 첫 번째이며, 역할 그룹은 선언 순서대로 조건이 맞을 때만
/// 추가됩니다. 인식되지 않은 역할은 기본 그룹만 받습니다.
pub fn compose_sidebar(claim: &RoleClaim, base: &[NavLink]) -> Vec<NavGroup> {
    let mut groups = vec![NavGroup {
        id: "base".to_string(),
        title: "General".to_string(),
        links: base.to_vec(),
    }];

    let Some(role) = claim.role() else {
        return groups;
    };

    groups.extend(
        ROLE_GROUPS
            .iter()
            .filter(|group| group.roles.contains(&role))
            .map(|group| NavGroup {
                id: group.id.to_string(),
                title: group.title.to_string(),
                links: group
                    .links
                    .iter()
                    .map(|(href, label)| NavLink::new(*href, *label))
                    .collect(),
            }),
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleDirectory;
    use proptest::prelude::*;

    #[test]
    fn test_dashboard_routes() {
        assert_eq!(dashboard_route(Role::Parent), "/dashboard/parent");
        assert_eq!(dashboard_route(Role::SocialWorker), "/dashboard/counselor");
        assert_eq!(dashboard_route_for_str(Some("parent")), "/dashboard/parent");
        assert_eq!(dashboard_route_for_str(Some("district")), "/dashboard/student");
        assert_eq!(dashboard_route_for_str(None), "/dashboard/student");
        assert_eq!(
            dashboard_route_for_claim(&RoleClaim::Unrecognized("x".into())),
            "/dashboard/student"
        );
    }

    #[test]
    fn test_page_lookup() {
        assert_eq!(page_for("/quizzes/new").map(|p| p.feature), Some(Feature::CreateQuiz));
        assert_eq!(page_for("/grades/").map(|p| p.feature), Some(Feature::ViewGrades));
        assert!(page_for("/nowhere").is_none());
        assert!(page_for(UNAUTHORIZED_ROUTE).is_none());
        assert!(page_for(LOGIN_ROUTE).is_none());
    }

    #[test]
    fn test_sidebar_base_first() {
        let groups = compose_sidebar(&RoleClaim::Known(Role::Teacher), &default_base_links());
        assert_eq!(groups[0].id, "base");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].id, "teaching");
    }

    #[test]
    fn test_sidebar_support_staff_share_group() {
        let base = default_base_links();
        let counselor = compose_sidebar(&RoleClaim::Known(Role::Counselor), &base);
        let social = compose_sidebar(&RoleClaim::Known(Role::SocialWorker), &base);
        assert_eq!(counselor, social);
        assert_eq!(counselor[1].id, "student-support");
    }

    #[test]
    fn test_sidebar_unrecognized_gets_base_only() {
        let groups = compose_sidebar(
            &RoleClaim::Unrecognized("district".into()),
            &default_base_links(),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].links, default_base_links());
    }

    proptest! {
        #[test]
        fn prop_role_group_links_are_accessible(role in prop::sample::select(Role::ALL.to_vec())) {
            let dir = RoleDirectory::global();
            let groups = compose_sidebar(&RoleClaim::Known(role), &[]);
            for group in groups.iter().skip(1) {
                for link in &group.links {
                    let page = page_for(&link.href);
                    prop_assert!(page.is_some(), "missing page for {}", link.href);
                    prop_assert!(dir.allows(role, page.unwrap().feature));
                }
            }
        }

        #[test]
        fn prop_sidebar_is_deterministic(role in prop::sample::select(Role::ALL.to_vec())) {
            let base = default_base_links();
            let claim = RoleClaim::Known(role);
            prop_assert_eq!(compose_sidebar(&claim, &base), compose_sidebar(&claim, &base));
        }
    }
}
