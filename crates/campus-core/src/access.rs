//! 역할 디렉터리와 접근 평가기.
//!
//! 모든 인가 판단은 [`RoleDirectory::allows`] 한 경로를 거칩니다.
//! 디렉터리는 정적 설정이며 프로세스 수명 동안 변경되지 않습니다.
//!
//! # 사용 예시
//!
//! ```
//! use campus_core::access::has_access;
//!
//! assert!(has_access("teacher", "create-quiz"));
//! assert!(!has_access("student", "create-quiz"));
//! assert!(!has_access("district", "view-grades"));
//! ```

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Feature, Role, RoleClaim};
use crate::navigation::{dashboard_route, page_for};

static STANDARD_DIRECTORY: Lazy<RoleDirectory> = Lazy::new(RoleDirectory::standard);

/// 역할 → 기능 집합 매핑.
///
/// 열거형의 모든 역할은 (비어 있을 수도 있는) 항목을 가집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDirectory {
    entries: BTreeMap<Role, BTreeSet<Feature>>,
}

impl RoleDirectory {
    /// 표준 디렉터리 생성.
    pub fn standard() -> Self {
        let entries = Role::ALL
            .iter()
            .map(|role| (*role, standard_features(*role).iter().copied().collect()))
            .collect();
        Self { entries }
    }

    /// 사용자 정의 항목으로 디렉터리 생성.
    ///
    /// 누락된 역할은 빈 집합으로 채워 모든 역할이 항목을 갖도록 합니다.
    pub fn from_entries<I, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Role, F)>,
        F: IntoIterator<Item = Feature>,
    {
        let mut map: BTreeMap<Role, BTreeSet<Feature>> =
            Role::ALL.iter().map(|r| (*r, BTreeSet::new())).collect();
        for (role, features) in entries {
            map.entry(role).or_default().extend(features);
        }
        Self { entries: map }
    }

    /// 프로세스 전역 표준 디렉터리.
    pub fn global() -> &'static RoleDirectory {
        &STANDARD_DIRECTORY
    }

    /// 역할이 기능에 접근할 수 있는지 확인.
    pub fn allows(&self, role: Role, feature: Feature) -> bool {
        self.entries
            .get(&role)
            .is_some_and(|features| features.contains(&feature))
    }

    /// 세션 역할 값으로 확인. 인식되지 않은 역할은 항상 거부합니다.
    pub fn allows_claim(&self, claim: &RoleClaim, feature: Feature) -> bool {
        claim.role().is_some_and(|role| self.allows(role, feature))
    }

    /// 역할에 허용된 기능 집합.
    pub fn features_for(&self, role: Role) -> &BTreeSet<Feature> {
        static EMPTY: BTreeSet<Feature> = BTreeSet::new();
        self.entries.get(&role).unwrap_or(&EMPTY)
    }

    /// 기능에 접근 가능한 역할 목록 (선언 순서).
    pub fn roles_with(&self, feature: Feature) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| self.allows(*role, feature))
            .collect()
    }

    /// 자기 대시보드에 접근할 수 없는 역할 목록.
    ///
    /// 대시보드 라우터가 보낸 페이지에서 가드가 다시 대시보드 루트로 돌려보내면
    /// 리다이렉트 순환이 생기므로, 표준 디렉터리에서는 항상 비어 있어야 합니다.
    pub fn validate_dashboards(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| match page_for(dashboard_route(*role)) {
                Some(page) => !self.allows(*role, page.feature),
                None => true,
            })
            .collect()
    }
}

impl Default for RoleDirectory {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_features(role: Role) -> &'static [Feature] {
    match role {
        Role::Student => &[
            Feature::StudentDashboard,
            Feature::BrowseCourses,
            Feature::ViewGrades,
            Feature::TakeQuiz,
            Feature::MentalHealthAssessment,
            Feature::LiveClassroom,
            Feature::Chat,
        ],
        Role::Teacher => &[
            Feature::TeacherDashboard,
            Feature::BrowseCourses,
            Feature::ViewGrades,
            Feature::CreateQuiz,
            Feature::CreateLesson,
            Feature::ManageClasses,
            Feature::LiveClassroom,
            Feature::Chat,
            Feature::ViewReports,
        ],
        Role::Parent => &[
            Feature::ParentDashboard,
            Feature::ViewGrades,
            Feature::ViewChildProgress,
            Feature::Chat,
        ],
        Role::Admin => &[
            Feature::AdminDashboard,
            Feature::BrowseCourses,
            Feature::ManageUsers,
            Feature::DistrictOverview,
            Feature::ViewReports,
            Feature::Chat,
        ],
        Role::Counselor => &[
            Feature::CounselorDashboard,
            Feature::ReviewAssessments,
            Feature::ViewReports,
            Feature::Chat,
        ],
        Role::SocialWorker => &[
            Feature::CounselorDashboard,
            Feature::ReviewAssessments,
            Feature::Chat,
        ],
    }
}

/// 문자열 역할/기능 쌍에 대한 접근 평가.
///
/// 알 수 없는 역할이나 기능은 예외 없이 `false`입니다.
pub fn has_access(role: &str, feature: &str) -> bool {
    match (Role::parse(role), Feature::parse(feature)) {
        (Some(role), Some(feature)) => RoleDirectory::global().allows(role, feature),
        _ => false,
    }
}

/// 세션 역할 값에 대한 접근 평가.
pub fn has_access_claim(claim: &RoleClaim, feature: Feature) -> bool {
    RoleDirectory::global().allows_claim(claim, feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_role_has_entry() {
        let dir = RoleDirectory::standard();
        for role in Role::ALL {
            assert!(dir.entries.contains_key(&role));
        }
    }

    #[test]
    fn test_role_permissions() {
        assert!(has_access("teacher", "create-quiz"));
        assert!(has_access("teacher", "create-lesson"));
        assert!(!has_access("student", "create-quiz"));
        assert!(has_access("parent", "view-child-progress"));
        assert!(!has_access("parent", "manage-users"));
        assert!(has_access("admin", "manage-users"));
        assert!(has_access("social_worker", "review-assessments"));
        assert!(!has_access("social_worker", "view-reports"));
    }

    #[test]
    fn test_unknown_inputs_deny() {
        assert!(!has_access("district", "view-grades"));
        assert!(!has_access("", ""));
        assert!(!has_access("teacher", "launch-rockets"));
    }

    #[test]
    fn test_unrecognized_claim_is_denied_everything() {
        let claim = RoleClaim::Unrecognized("principal".to_string());
        for feature in Feature::ALL {
            assert!(!has_access_claim(&claim, feature));
        }
    }

    #[test]
    fn test_from_entries_fills_missing_roles() {
        let dir = RoleDirectory::from_entries([(Role::Teacher, [Feature::Chat])]);
        assert!(dir.allows(Role::Teacher, Feature::Chat));
        assert!(dir.features_for(Role::Parent).is_empty());
        assert!(!dir.allows(Role::Parent, Feature::Chat));
    }

    #[test]
    fn test_roles_with_feature() {
        let dir = RoleDirectory::standard();
        assert_eq!(
            dir.roles_with(Feature::ReviewAssessments),
            vec![Role::Counselor, Role::SocialWorker]
        );
        assert_eq!(dir.roles_with(Feature::Chat).len(), Role::ALL.len());
    }

    #[test]
    fn test_standard_dashboards_are_reachable() {
        assert!(RoleDirectory::standard().validate_dashboards().is_empty());
    }

    #[test]
    fn test_misconfigured_dashboard_is_reported() {
        let dir = RoleDirectory::from_entries([(Role::Teacher, [Feature::Chat])]);
        let broken = dir.validate_dashboards();
        assert!(broken.contains(&Role::Teacher));
        assert!(broken.contains(&Role::Student));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn any_feature() -> impl Strategy<Value = Feature> {
        prop::sample::select(Feature::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_access_matches_configured_set(role in any_role(), feature in any_feature()) {
            let dir = RoleDirectory::global();
            let configured = dir.features_for(role).contains(&feature);
            prop_assert_eq!(dir.allows(role, feature), configured);
            prop_assert_eq!(has_access(role.as_str(), feature.as_str()), configured);
        }

        #[test]
        fn prop_access_is_stable(role in any_role(), feature in any_feature()) {
            let first = has_access(role.as_str(), feature.as_str());
            let second = has_access(role.as_str(), feature.as_str());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unknown_role_strings_deny(raw in "[a-z_]{1,16}", feature in any_feature()) {
            prop_assume!(Role::parse(&raw).is_none());
            prop_assert!(!has_access(&raw, feature.as_str()));
        }
    }
}
