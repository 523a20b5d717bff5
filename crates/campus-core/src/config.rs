//! 설정 관리.
//!
//! 기본값 → TOML 파일 → `CAMPUS__` 접두사 환경 변수 순으로 설정을 겹쳐 로드합니다.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 인증 엔드포인트 요청 제한
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록 (비어 있으면 모두 허용)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: default_request_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 프로필은 메모리 저장소에 보관됩니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 연결 URL
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT 서명 키
    #[serde(deserialize_with = "deserialize_secret", skip_serializing)]
    pub jwt_secret: SecretString,
    /// Access Token 만료 (분)
    pub access_token_minutes: i64,
    /// Refresh Token 만료 (일)
    pub refresh_token_days: i64,
    /// 최소 비밀번호 길이
    pub min_password_length: usize,
}

const DEV_JWT_SECRET: &str = "development-secret-key-change-in-production";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(DEV_JWT_SECRET.into()),
            access_token_minutes: 60,
            refresh_token_days: 14,
            min_password_length: 8,
        }
    }
}

impl Clone for AuthConfig {
    fn clone(&self) -> Self {
        Self {
            jwt_secret: SecretString::new(self.jwt_secret.expose_secret().into()),
            access_token_minutes: self.access_token_minutes,
            refresh_token_days: self.refresh_token_days,
            min_password_length: self.min_password_length,
        }
    }
}

impl AuthConfig {
    /// 개발용 기본 서명 키를 그대로 쓰고 있는지 확인.
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == DEV_JWT_SECRET
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::new(raw.into()))
}

/// 요청 제한 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// IP당 분당 최대 요청 수
    pub requests_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 30,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert!(config.database.url.is_none());
        assert!(config.auth.uses_development_secret());
        assert_eq!(config.rate_limit.requests_per_minute, 30);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_token_minutes, 60);
    }

    #[test]
    fn test_auth_secret_deserializes_and_redacts() {
        let toml_src = r#"
            jwt_secret = "s3cret"
            access_token_minutes = 15
            refresh_token_days = 7
            min_password_length = 10
        "#;
        let parsed: AuthConfig = config::Config::builder()
            .add_source(config::File::from_str(toml_src, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.jwt_secret.expose_secret(), "s3cret");
        assert!(!parsed.uses_development_secret());
        assert!(!format!("{:?}", parsed).contains("s3cret"));

        let cloned = parsed.clone();
        assert_eq!(cloned.jwt_secret.expose_secret(), "s3cret");
    }
}
