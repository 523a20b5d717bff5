//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증/라우팅 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설치하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러입니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 인증/라우팅 메트릭
// ============================================================================

/// 라우트 가드 판정 카운터 (`authorized`, `login`, `fallback`, `unauthorized`).
pub fn record_guard_decision(feature: &str, outcome: &'static str) {
    counter!(
        "campus_guard_decisions_total",
        "feature" => feature.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// 로그인 실패 카운터.
pub fn record_sign_in_failure(code: &'static str) {
    counter!("campus_sign_in_failures_total", "code" => code).increment(1);
}

/// 대시보드 리다이렉트 카운터.
pub fn record_dashboard_redirect(role: &str) {
    counter!("campus_dashboard_redirects_total", "role" => role.to_string()).increment(1);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 경로에서 사용자 식별자 구간을 정규화합니다.
///
/// 예: `/api/v1/profiles/123e4567-e89b-12d3-a456-426614174000` → `/api/v1/profiles/:uid`
pub fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut previous = "";

    for segment in path.split('/') {
        let is_uuid = segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
        let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

        if is_uuid || is_numeric || (previous == "profiles" && !segment.is_empty()) {
            normalized.push(":uid");
        } else {
            normalized.push(segment);
        }
        previous = segment;
    }
    normalized.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/profiles/123e4567-e89b-12d3-a456-426614174000";
        assert_eq!(normalize_path(path), "/api/v1/profiles/:uid");
    }

    #[test]
    fn test_normalize_path_profile_uid() {
        assert_eq!(normalize_path("/api/v1/profiles/t-1"), "/api/v1/profiles/:uid");
        assert_eq!(normalize_path("/api/v1/profile"), "/api/v1/profile");
    }

    #[test]
    fn test_normalize_path_static() {
        assert_eq!(normalize_path("/app/quizzes/new"), "/app/quizzes/new");
        assert_eq!(normalize_path("/health"), "/health");
    }
}
