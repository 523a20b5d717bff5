//! 역할 디렉터리 조회 (역할, 기능, 페이지 목록).

use anyhow::{Context, Result};
use campus_core::navigation::{dashboard_route, PAGES};
use campus_core::{Feature, Role, RoleDirectory};
use serde::Serialize;

use super::output::{escape_csv, truncate, write_output, OutputFormat};

/// 역할 요약 행.
#[derive(Debug, Clone, Serialize)]
pub struct RoleRow {
    pub role: &'static str,
    pub label: &'static str,
    pub dashboard: &'static str,
    pub features: Vec<&'static str>,
}

/// 기능 행. 기능을 가진 역할 목록 포함.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    pub feature: &'static str,
    pub description: &'static str,
    pub roles: Vec<&'static str>,
}

/// 페이지 행.
#[derive(Debug, Clone, Serialize)]
pub struct PageRow {
    pub path: &'static str,
    pub title: &'static str,
    pub feature: &'static str,
    pub roles: Vec<&'static str>,
}

pub fn role_rows(directory: &RoleDirectory) -> Vec<RoleRow> {
    Role::ALL
        .iter()
        .map(|role| RoleRow {
            role: role.as_str(),
            label: role.label(),
            dashboard: dashboard_route(*role),
            features: directory
                .features_for(*role)
                .iter()
                .map(Feature::as_str)
                .collect(),
        })
        .collect()
}

/// 기능 목록. `role`이 주어지면 해당 역할이 가진 기능만.
pub fn feature_rows(directory: &RoleDirectory, role: Option<Role>) -> Vec<FeatureRow> {
    Feature::ALL
        .iter()
        .filter(|feature| role.map_or(true, |r| directory.allows(r, **feature)))
        .map(|feature| FeatureRow {
            feature: feature.as_str(),
            description: feature.description(),
            roles: roles_str(directory, *feature),
        })
        .collect()
}

pub fn page_rows(directory: &RoleDirectory) -> Vec<PageRow> {
    PAGES
        .iter()
        .map(|page| PageRow {
            path: page.path,
            title: page.title,
            feature: page.feature.as_str(),
            roles: roles_str(directory, page.feature),
        })
        .collect()
}

fn roles_str(directory: &RoleDirectory, feature: Feature) -> Vec<&'static str> {
    directory
        .roles_with(feature)
        .iter()
        .map(Role::as_str)
        .collect()
}

/// 역할 목록 출력.
pub fn list_roles(format: OutputFormat, output: Option<&str>) -> Result<usize> {
    let rows = role_rows(RoleDirectory::global());
    let content = match format {
        OutputFormat::Table => {
            let mut out = format!(
                "{:<15} {:<28} {:<22} {:<8}\n",
                "ROLE", "LABEL", "DASHBOARD", "FEATURES"
            );
            out.push_str(&"-".repeat(76));
            out.push('\n');
            for row in &rows {
                out.push_str(&format!(
                    "{:<15} {:<28} {:<22} {:<8}\n",
                    row.role,
                    truncate(row.label, 28),
                    row.dashboard,
                    row.features.len()
                ));
            }
            out.push_str(&format!("\nTotal: {} roles", rows.len()));
            out
        }
        OutputFormat::Csv => {
            let mut out = String::from("role,label,dashboard,features\n");
            for row in &rows {
                out.push_str(&format!(
                    "{},{},{},{}\n",
                    row.role,
                    escape_csv(row.label),
                    row.dashboard,
                    row.features.join(";")
                ));
            }
            out
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&rows).context("Failed to serialize to JSON")?
        }
    };
    write_output(&content, output)?;
    Ok(rows.len())
}

/// 기능 목록 출력.
pub fn list_features(
    role: Option<Role>,
    format: OutputFormat,
    output: Option<&str>,
) -> Result<usize> {
    let rows = feature_rows(RoleDirectory::global(), role);
    let content = match format {
        OutputFormat::Table => {
            let mut out = format!("{:<26} {:<40} {}\n", "FEATURE", "DESCRIPTION", "ROLES");
            out.push_str(&"-".repeat(100));
            out.push('\n');
            for row in &rows {
                out.push_str(&format!(
                    "{:<26} {:<40} {}\n",
                    row.feature,
                    truncate(row.description, 40),
                    row.roles.join(", ")
                ));
            }
            out.push_str(&format!("\nTotal: {} features", rows.len()));
            out
        }
        OutputFormat::Csv => {
            let mut out = String::from("feature,description,roles\n");
            for row in &rows {
                out.push_str(&format!(
                    "{},{},{}\n",
                    row.feature,
                    escape_csv(row.description),
                    row.roles.join(";")
                ));
            }
            out
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&rows).context("Failed to serialize to JSON")?
        }
    };
    write_output(&content, output)?;
    Ok(rows.len())
}

/// 페이지 목록 출력.
pub fn list_pages(format: OutputFormat, output: Option<&str>) -> Result<usize> {
    let rows = page_rows(RoleDirectory::global());
    let content = match format {
        OutputFormat::Table => {
            let mut out = format!(
                "{:<24} {:<28} {:<26} {}\n",
                "PATH", "TITLE", "FEATURE", "ROLES"
            );
            out.push_str(&"-".repeat(110));
            out.push('\n');
            for row in &rows {
                out.push_str(&format!(
                    "{:<24} {:<28} {:<26} {}\n",
                    row.path,
                    truncate(row.title, 28),
                    row.feature,
                    row.roles.join(", ")
                ));
            }
            out.push_str(&format!("\nTotal: {} pages", rows.len()));
            out
        }
        OutputFormat::Csv => {
            let mut out = String::from("path,title,feature,roles\n");
            for row in &rows {
                out.push_str(&format!(
                    "{},{},{},{}\n",
                    row.path,
                    escape_csv(row.title),
                    row.feature,
                    row.roles.join(";")
                ));
            }
            out
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(&rows).context("Failed to serialize to JSON")?
        }
    };
    write_output(&content, output)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_rows_cover_every_role() {
        let rows = role_rows(&RoleDirectory::standard());
        assert_eq!(rows.len(), Role::ALL.len());
        let worker = rows.iter().find(|r| r.role == "social_worker").unwrap();
        assert_eq!(worker.dashboard, "/dashboard/counselor");
    }

    #[test]
    fn test_feature_rows_filtered_by_role() {
        let directory = RoleDirectory::standard();
        let all = feature_rows(&directory, None);
        assert_eq!(all.len(), Feature::ALL.len());

        let teacher = feature_rows(&directory, Some(Role::Teacher));
        assert!(teacher.iter().any(|r| r.feature == "create-quiz"));
        assert!(!teacher.iter().any(|r| r.feature == "manage-users"));
    }

    #[test]
    fn test_page_rows_list_allowed_roles() {
        let rows = page_rows(&RoleDirectory::standard());
        let quiz = rows.iter().find(|r| r.path == "/quizzes/new").unwrap();
        assert_eq!(quiz.feature, "create-quiz");
        assert!(quiz.roles.contains(&"teacher"));
        assert!(!quiz.roles.contains(&"student"));
    }
}
