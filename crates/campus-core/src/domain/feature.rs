//! 보호 대상 기능 식별자.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 역할별로 접근이 제한되는 기능(또는 라우트).
///
/// 유효한 기능 집합은 빌드 시점에 고정됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// 학생 대시보드
    StudentDashboard,
    /// 교사 대시보드
    TeacherDashboard,
    /// 학부모 대시보드
    ParentDashboard,
    /// 교육청 관리자 대시보드
    AdminDashboard,
    /// 상담/복지 대시보드
    CounselorDashboard,
    /// 강좌 둘러보기
    BrowseCourses,
    /// 성적 조회
    ViewGrades,
    /// 퀴즈 응시
    TakeQuiz,
    /// 퀴즈 작성
    CreateQuiz,
    /// 수업 자료 작성
    CreateLesson,
    /// 학급 관리
    ManageClasses,
    /// 자녀 학습 현황 조회
    ViewChildProgress,
    /// 마음건강 자가진단 작성
    MentalHealthAssessment,
    /// 자가진단 결과 검토
    ReviewAssessments,
    /// 실시간 교실
    LiveClassroom,
    /// 메시지
    Chat,
    /// 사용자 관리
    ManageUsers,
    /// 교육청 현황
    DistrictOverview,
    /// 리포트 조회
    ViewReports,
}

impl Feature {
    /// 전체 기능 목록.
    pub const ALL: [Feature; 19] = [
        Feature::StudentDashboard,
        Feature::TeacherDashboard,
        Feature::ParentDashboard,
        Feature::AdminDashboard,
        Feature::CounselorDashboard,
        Feature::BrowseCourses,
        Feature::ViewGrades,
        Feature::TakeQuiz,
        Feature::CreateQuiz,
        Feature::CreateLesson,
        Feature::ManageClasses,
        Feature::ViewChildProgress,
        Feature::MentalHealthAssessment,
        Feature::ReviewAssessments,
        Feature::LiveClassroom,
        Feature::Chat,
        Feature::ManageUsers,
        Feature::DistrictOverview,
        Feature::ViewReports,
    ];

    /// 식별자 문자열 (예: `"view-grades"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::StudentDashboard => "student-dashboard",
            Feature::TeacherDashboard => "teacher-dashboard",
            Feature::ParentDashboard => "parent-dashboard",
            Feature::AdminDashboard => "admin-dashboard",
            Feature::CounselorDashboard => "counselor-dashboard",
            Feature::BrowseCourses => "browse-courses",
            Feature::ViewGrades => "view-grades",
            Feature::TakeQuiz => "take-quiz",
            Feature::CreateQuiz => "create-quiz",
            Feature::CreateLesson => "create-lesson",
            Feature::ManageClasses => "manage-classes",
            Feature::ViewChildProgress => "view-child-progress",
            Feature::MentalHealthAssessment => "mental-health-assessment",
            Feature::ReviewAssessments => "review-assessments",
            Feature::LiveClassroom => "live-classroom",
            Feature::Chat => "chat",
            Feature::ManageUsers => "manage-users",
            Feature::DistrictOverview => "district-overview",
            Feature::ViewReports => "view-reports",
        }
    }

    /// 식별자 문자열에서 파싱. 알 수 없는 값은 `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Feature::ALL.iter().copied().find(|f| f.as_str() == s)
    }

    /// 기능 설명.
    pub fn description(&self) -> &'static str {
        match self {
            Feature::StudentDashboard => "학생 대시보드",
            Feature::TeacherDashboard => "교사 대시보드",
            Feature::ParentDashboard => "학부모 대시보드",
            Feature::AdminDashboard => "교육청 관리자 대시보드",
            Feature::CounselorDashboard => "상담/복지 대시보드",
            Feature::BrowseCourses => "강좌 둘러보기",
            Feature::ViewGrades => "성적 조회",
            Feature::TakeQuiz => "퀴즈 응시",
            Feature::CreateQuiz => "퀴즈 작성",
            Feature::CreateLesson => "수업 자료 작성",
            Feature::ManageClasses => "학급 관리",
            Feature::ViewChildProgress => "자녀 학습 현황 조회",
            Feature::MentalHealthAssessment => "마음건강 자가진단",
            Feature::ReviewAssessments => "자가진단 결과 검토",
            Feature::LiveClassroom => "실시간 교실",
            Feature::Chat => "메시지",
            Feature::ManageUsers => "사용자 관리",
            Feature::DistrictOverview => "교육청 현황",
            Feature::ViewReports => "리포트 조회",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
