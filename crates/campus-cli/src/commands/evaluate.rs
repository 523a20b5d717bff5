//! 역할 문자열 기준 평가 (접근, 대시보드, 사이드바).
//!
//! 역할 인자는 프로필 레코드의 값처럼 다룹니다. 알 수 없는 역할은 에러가 아니라
//! 접근 거부와 기본 대시보드로 평가됩니다.

use anyhow::{Context, Result};
use campus_core::navigation::{
    compose_sidebar, dashboard_route_for_claim, default_base_links, NavGroup,
};
use campus_core::{has_access, Feature, RoleClaim};
use serde::Serialize;
use tracing::warn;

use super::output::{write_output, OutputFormat};

/// 접근 평가 결과.
#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub role: String,
    pub feature: String,
    pub allowed: bool,
    /// 역할이 정규 역할이 아닌 경우
    pub recognized_role: bool,
    pub known_feature: bool,
}

pub fn evaluate_access(role: &str, feature: &str) -> AccessReport {
    let claim = RoleClaim::from_profile(Some(role));
    AccessReport {
        role: role.to_string(),
        feature: feature.to_string(),
        allowed: has_access(role, feature),
        recognized_role: claim.is_recognized(),
        known_feature: Feature::parse(feature).is_some(),
    }
}

/// 접근 평가 출력. 허용 여부를 반환합니다.
pub fn print_access(role: &str, feature: &str, json: bool) -> Result<bool> {
    let report = evaluate_access(role, feature);
    if !report.recognized_role {
        warn!(role, "알 수 없는 역할 (접근 거부로 평가)");
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?
        );
    } else {
        let verdict = if report.allowed { "ALLOWED" } else { "DENIED" };
        println!("{} {} -> {}", report.role, report.feature, verdict);
        if !report.known_feature {
            println!("  (unknown feature)");
        }
    }
    Ok(report.allowed)
}

/// 역할 대시보드 경로 출력. 값이 없거나 알 수 없는 역할은 학생 대시보드입니다.
pub fn print_dashboard(role: Option<&str>) -> &'static str {
    let route = dashboard_route_for_claim(&RoleClaim::from_profile(role));
    println!("{}", route);
    route
}

pub fn sidebar_for(role: &str) -> Vec<NavGroup> {
    compose_sidebar(&RoleClaim::from_profile(Some(role)), &default_base_links())
}

/// 사이드바 출력.
pub fn print_sidebar(role: &str, format: OutputFormat, output: Option<&str>) -> Result<usize> {
    let groups = sidebar_for(role);
    let content = match format {
        OutputFormat::Table => {
            let mut out = String::new();
            for group in &groups {
                out.push_str(&format!("[{}] {}\n", group.id, group.title));
                for link in &group.links {
                    out.push_str(&format!("  {:<24} {}\n", link.href, link.label));
                }
            }
            out
        }
        OutputFormat::Csv => {
            let mut out = String::from("group,href,label\n");
            for group in &groups {
                for link in &group.links {
                    out.push_str(&format!("{},{},{}\n", group.id, link.href, link.label));
                }
            }
            out
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&groups).context("Failed to serialize to JSON")?
        }
    };
    write_output(&content, output)?;
    Ok(groups.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_access() {
        let report = evaluate_access("Teacher", "create-quiz");
        assert!(report.allowed);
        assert!(report.recognized_role);

        let report = evaluate_access("district", "district-overview");
        assert!(!report.allowed);
        assert!(!report.recognized_role);

        let report = evaluate_access("admin", "teleport");
        assert!(!report.allowed);
        assert!(!report.known_feature);
    }

    #[test]
    fn test_sidebar_for_support_roles_share_group() {
        let counselor: Vec<String> = sidebar_for("counselor").into_iter().map(|g| g.id).collect();
        let worker: Vec<String> = sidebar_for("social_worker").into_iter().map(|g| g.id).collect();
        assert_eq!(counselor, vec!["base", "student-support"]);
        assert_eq!(counselor, worker);
    }

    #[test]
    fn test_sidebar_for_unrecognized_role_is_base_only() {
        let groups = sidebar_for("principal");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "base");
    }
}
