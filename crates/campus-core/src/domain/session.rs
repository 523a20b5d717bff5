//! 세션 및 프로필 모델.
//!
//! 세션은 "누가 로그인했고 어떤 역할인가"에 대한 단일 정보원입니다.
//! 역할 확인 경로는 [`resolve_session`] 하나뿐이며, 세션 프로바이더와
//! HTTP 서버가 모두 이 함수를 사용합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::RoleClaim;

/// 인증 협력자가 보고하는 로그인 신원.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Identity {
    /// 신원 키 (프로필 레코드 키)
    pub uid: String,
    /// 로그인 이메일
    pub email: String,
    /// 인증 협력자가 보유한 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// 저장된 사용자 프로필 레코드.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Profile {
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 역할 문자열. 저장소에는 검증 전 값이 그대로 들어 있을 수 있습니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    /// 학부모 계정에 연결된 학생 uid 목록
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_students: Vec<String>,
}

impl Profile {
    /// 기본 역할(student)로 새 프로필 생성.
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            role: Some(super::Role::DEFAULT.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// 부분 업데이트 적용. `None` 필드는 기존 값을 유지합니다.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(name) = patch.display_name {
            self.display_name = Some(name);
        }
        if let Some(role) = patch.role {
            self.role = Some(role);
        }
        if let Some(school) = patch.school {
            self.school = Some(school);
        }
        if let Some(grade) = patch.grade_level {
            self.grade_level = Some(grade);
        }
        if let Some(students) = patch.linked_students {
            self.linked_students = students;
        }
    }
}

/// 프로필 부분 업데이트.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ProfilePatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub linked_students: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ProfilePatch::default()
    }
}

/// 세션의 로그인 사용자 (신원 + 프로필 병합 결과).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub role: RoleClaim,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_students: Vec<String>,
}

impl SessionUser {
    /// 프로필 없이 신원만으로 생성 (기본 역할).
    pub fn bare(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            role: RoleClaim::default(),
            school: None,
            grade_level: None,
            linked_students: Vec::new(),
        }
    }

    /// 신원에 프로필 필드를 병합.
    pub fn merged(identity: &Identity, profile: Profile) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: profile.display_name.or_else(|| identity.display_name.clone()),
            role: RoleClaim::from_profile(profile.role.as_deref()),
            school: profile.school,
            grade_level: profile.grade_level,
            linked_students: profile.linked_students,
        }
    }
}

/// 현재 인증/인가 상태.
///
/// 생성 시 `{user: None, loading: true}`로 시작합니다. `loading`이 true인 동안
/// `user == None`을 로그아웃으로 해석하면 안 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Session {
    pub user: Option<SessionUser>,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub role: RoleClaim,
    pub loading: bool,
}

impl Session {
    /// 애플리케이션 시작 시점의 세션.
    pub fn initial() -> Self {
        Self {
            user: None,
            role: RoleClaim::default(),
            loading: true,
        }
    }

    /// 로그아웃(또는 세션 없음) 상태.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            role: RoleClaim::default(),
            loading: false,
        }
    }

    /// 확인 완료된 로그인 세션.
    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            role: user.role.clone(),
            user: Some(user),
            loading: false,
        }
    }

    /// 같은 사용자 정보를 유지한 채 로딩 상태로 전환.
    pub fn reloading(&self) -> Self {
        Self {
            loading: true,
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.user.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        !self.loading
    }

    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

/// 신원과 프로필 조회 결과로 세션을 확정합니다.
///
/// - 조회 성공: 프로필 필드를 병합
/// - 프로필 없음: 신원만으로 세션 구성 (기본 역할)
/// - 조회 실패: 에러를 로컬 로그로 남기고 신원만으로 세션 구성 (기본 역할)
///
/// 인식되지 않은 역할 문자열은 정합성 점검 대상으로 경고 로그를 남깁니다.
pub fn resolve_session<E: fmt::Display>(
    identity: &Identity,
    lookup: Result<Option<Profile>, E>,
) -> Session {
    let user = match lookup {
        Ok(Some(profile)) => SessionUser::merged(identity, profile),
        Ok(None) => {
            tracing::debug!(uid = %identity.uid, "프로필 레코드 없음, 기본 역할 사용");
            SessionUser::bare(identity)
        }
        Err(e) => {
            tracing::error!(uid = %identity.uid, error = %e, "프로필 조회 실패, 기본 역할로 계속");
            SessionUser::bare(identity)
        }
    };

    if let RoleClaim::Unrecognized(raw) = &user.role {
        tracing::warn!(
            uid = %user.uid,
            role = %raw,
            "알 수 없는 역할 문자열 - 역할 목록 정합성 확인 필요"
        );
    }

    Session::signed_in(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn identity() -> Identity {
        Identity::new("u-1", "kim@school.test").with_display_name("Kim")
    }

    #[test]
    fn test_initial_and_signed_out() {
        let initial = Session::initial();
        assert!(initial.loading);
        assert!(initial.user.is_none());
        assert!(!initial.is_authenticated());

        let out = Session::signed_out();
        assert!(!out.loading);
        assert!(out.user.is_none());
        assert_eq!(out.role, RoleClaim::Known(Role::Student));
    }

    #[test]
    fn test_resolve_with_profile_merges_role() {
        let profile = Profile::new("u-1", "kim@school.test")
            .with_role("teacher")
            .with_display_name("Ms. Kim");
        let session = resolve_session::<String>(&identity(), Ok(Some(profile)));

        assert!(!session.loading);
        assert_eq!(session.role, RoleClaim::Known(Role::Teacher));
        let user = session.user.unwrap();
        assert_eq!(user.uid, "u-1");
        assert_eq!(user.display_name.as_deref(), Some("Ms. Kim"));
    }

    #[test]
    fn test_resolve_with_failure_uses_bare_identity() {
        let session = resolve_session(&identity(), Err("connection reset"));

        assert!(!session.loading);
        assert_eq!(session.role, RoleClaim::Known(Role::Student));
        let user = session.user.unwrap();
        assert_eq!(user.uid, "u-1");
        assert_eq!(user.display_name.as_deref(), Some("Kim"));
    }

    #[test]
    fn test_resolve_missing_profile_defaults_to_student() {
        let session = resolve_session::<String>(&identity(), Ok(None));
        assert_eq!(session.role, RoleClaim::Known(Role::Student));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_resolve_keeps_unrecognized_role() {
        let profile = Profile::new("u-1", "kim@school.test").with_role("district");
        let session = resolve_session::<String>(&identity(), Ok(Some(profile)));
        assert_eq!(session.role, RoleClaim::Unrecognized("district".to_string()));
    }

    #[test]
    fn test_profile_apply_patch() {
        let mut profile = Profile::new("u-2", "lee@school.test").with_display_name("Lee");
        profile.apply(ProfilePatch {
            role: Some("parent".to_string()),
            linked_students: Some(vec!["u-9".to_string()]),
            ..Default::default()
        });

        assert_eq!(profile.role.as_deref(), Some("parent"));
        assert_eq!(profile.display_name.as_deref(), Some("Lee"));
        assert_eq!(profile.linked_students, vec!["u-9".to_string()]);
        assert!(ProfilePatch::default().is_empty());
    }
}
