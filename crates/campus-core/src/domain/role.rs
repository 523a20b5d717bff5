//! 사용자 역할.
//!
//! 모든 컴포넌트가 공유하는 단일 역할 열거형과, 프로필 레코드에서 읽어 온
//! 역할 문자열을 그대로 보존하는 [`RoleClaim`]을 정의합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 사용자 역할.
///
/// 역할은 기능 접근 범위와 기본 대시보드를 결정합니다.
/// 프로필 레코드의 관리자 업데이트로만 변경됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 학생
    Student,
    /// 교사
    Teacher,
    /// 학부모
    Parent,
    /// 교육청(district) 관리자
    Admin,
    /// 상담교사
    Counselor,
    /// 사회복지사
    SocialWorker,
}

impl Role {
    /// 역할을 확인할 수 없을 때 사용하는 기본 역할.
    pub const DEFAULT: Role = Role::Student;

    /// 선언 순서대로 나열한 전체 역할.
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Teacher,
        Role::Parent,
        Role::Admin,
        Role::Counselor,
        Role::SocialWorker,
    ];

    /// 문자열에서 역할 파싱.
    ///
    /// 대소문자를 구분하지 않으며 `social-worker`도 허용합니다.
    /// UI 문구에만 등장하는 `district` 같은 값은 `None`입니다.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "parent" => Some(Role::Parent),
            "admin" => Some(Role::Admin),
            "counselor" => Some(Role::Counselor),
            "social_worker" | "social-worker" => Some(Role::SocialWorker),
            _ => None,
        }
    }

    /// 저장 형식 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Admin => "admin",
            Role::Counselor => "counselor",
            Role::SocialWorker => "social_worker",
        }
    }

    /// 화면 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::Admin => "District Admin",
            Role::Counselor => "Counselor",
            Role::SocialWorker => "Social Worker",
        }
    }

    /// 학생 지원 인력(상담교사, 사회복지사) 여부.
    pub fn is_support_staff(&self) -> bool {
        matches!(self, Role::Counselor | Role::SocialWorker)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 세션이 보유하는 역할 값.
///
/// 프로필 레코드의 역할 문자열이 알려진 역할이 아니면 다른 역할로 바꾸지 않고
/// `Unrecognized`로 보존합니다. 접근 평가에서는 항상 거부됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleClaim {
    /// 정규 역할
    Known(Role),
    /// 정규 열거형에 없는 역할 문자열 (정합성 확인 필요)
    Unrecognized(String),
}

impl RoleClaim {
    /// 프로필의 역할 필드에서 생성.
    ///
    /// 값이 없거나 비어 있으면 기본 역할(student)입니다.
    pub fn from_profile(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => RoleClaim::Known(Role::DEFAULT),
            Some(s) => match Role::parse(s) {
                Some(role) => RoleClaim::Known(role),
                None => RoleClaim::Unrecognized(s.to_string()),
            },
        }
    }

    /// 정규 역할 반환 (인식되지 않은 경우 `None`).
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Unrecognized(_) => None,
        }
    }

    /// 원본 문자열 반환.
    pub fn as_str(&self) -> &str {
        match self {
            RoleClaim::Known(role) => role.as_str(),
            RoleClaim::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, RoleClaim::Known(_))
    }
}

impl Default for RoleClaim {
    fn default() -> Self {
        RoleClaim::Known(Role::DEFAULT)
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl From<String> for RoleClaim {
    fn from(raw: String) -> Self {
        RoleClaim::from_profile(Some(&raw))
    }
}

impl From<RoleClaim> for String {
    fn from(claim: RoleClaim) -> Self {
        claim.as_str().to_string()
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
