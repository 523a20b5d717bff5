//! 설정 파일 점검.

use anyhow::{Context, Result};
use campus_core::{AppConfig, RoleDirectory};

/// 점검 결과.
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 로드된 설정 검사.
pub fn inspect(config: &AppConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    if config.server.bind_address().parse::<std::net::SocketAddr>().is_err() {
        report.errors.push(format!(
            "server: invalid bind address {}",
            config.server.bind_address()
        ));
    }
    if config.server.request_timeout_secs == 0 {
        report.errors.push("server: request_timeout_secs must be > 0".to_string());
    }

    if config.auth.uses_development_secret() {
        report
            .warnings
            .push("auth: jwt_secret is the development default".to_string());
    }
    if config.auth.access_token_minutes <= 0 || config.auth.refresh_token_days <= 0 {
        report
            .errors
            .push("auth: token lifetimes must be positive".to_string());
    }
    if config.auth.min_password_length < 6 {
        report.warnings.push(format!(
            "auth: min_password_length {} is below 6",
            config.auth.min_password_length
        ));
    }

    if config.rate_limit.enabled && config.rate_limit.requests_per_minute == 0 {
        report
            .errors
            .push("rate_limit: requests_per_minute must be > 0 when enabled".to_string());
    }

    if config.database.url.is_none() && std::env::var("DATABASE_URL").is_err() {
        report
            .warnings
            .push("database: no url configured, profiles will be kept in memory".to_string());
    }

    let broken = RoleDirectory::global().validate_dashboards();
    if !broken.is_empty() {
        let roles: Vec<&str> = broken.iter().map(|r| r.as_str()).collect();
        report.errors.push(format!(
            "role directory: dashboard not reachable for {}",
            roles.join(", ")
        ));
    }

    report
}

/// 설정 파일을 로드하고 점검 결과를 출력합니다.
pub fn check_config(path: &str) -> Result<bool> {
    let config = AppConfig::load(path).with_context(|| format!("Failed to load config: {}", path))?;
    let report = inspect(&config);

    println!("Config: {}", path);
    println!("  server   {}", config.server.bind_address());
    println!(
        "  logging  level={} format={}",
        config.logging.level, config.logging.format
    );
    println!(
        "  auth     access={}m refresh={}d min_password={}",
        config.auth.access_token_minutes,
        config.auth.refresh_token_days,
        config.auth.min_password_length
    );
    println!(
        "  rate     enabled={} rpm={}",
        config.rate_limit.enabled, config.rate_limit.requests_per_minute
    );

    for warning in &report.warnings {
        println!("WARN  {}", warning);
    }
    for error in &report.errors {
        println!("ERROR {}", error);
    }
    if report.is_ok() {
        println!("OK");
    }

    Ok(report.is_ok())
}
