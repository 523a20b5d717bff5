//! Campus CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 역할 디렉터리
//! campus roles
//! campus features --role teacher -f json
//!
//! # 접근 평가 (거부 시 종료 코드 1)
//! campus access teacher create-quiz
//!
//! # 대시보드와 사이드바
//! campus dashboard social_worker
//! campus sidebar parent
//!
//! # 설정 점검
//! campus check-config -c config/default.toml
//! ```

use clap::{Parser, Subcommand};
use tracing::info;

use campus_cli::commands::{check_config, directory, evaluate, OutputFormat};
use campus_core::{init_logging_from_env, Role};

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Campus CLI - 역할 기반 접근 제어 점검 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 역할 목록 (라벨, 대시보드, 기능 수)
    Roles {
        /// 출력 형식 (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 기능 목록과 기능을 가진 역할
    Features {
        /// 이 역할이 가진 기능만 표시
        #[arg(short, long)]
        role: Option<String>,

        /// 출력 형식 (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 페이지 목록과 보호 기능
    Pages {
        /// 출력 형식 (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 역할의 기능 접근 평가
    Access {
        /// 역할 문자열 (예: teacher, social_worker)
        role: String,

        /// 기능 식별자 (예: create-quiz)
        feature: String,

        /// JSON 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// 역할 대시보드 경로
    Dashboard {
        /// 역할 문자열 (없으면 기본 역할)
        role: Option<String>,
    },

    /// 역할 사이드바
    Sidebar {
        /// 역할 문자열
        role: String,

        /// 출력 형식 (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 출력 파일 경로
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 설정 파일 점검
    CheckConfig {
        /// 설정 파일
        #[arg(short, long, default_value = "config/default.toml")]
        config: String,
    },
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_logging_from_env().map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Roles { format, output } => {
            let format = OutputFormat::parse(&format)?;
            let count = directory::list_roles(format, output.as_deref())?;
            info!("Listed {} roles", count);
        }

        Commands::Features {
            role,
            format,
            output,
        } => {
            let role = role
                .map(|r| {
                    Role::parse(&r).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid role: {}. Supported: student, teacher, parent, admin, counselor, social_worker",
                            r
                        )
                    })
                })
                .transpose()?;
            let format = OutputFormat::parse(&format)?;
            let count = directory::list_features(role, format, output.as_deref())?;
            info!("Listed {} features", count);
        }

        Commands::Pages { format, output } => {
            let format = OutputFormat::parse(&format)?;
            directory::list_pages(format, output.as_deref())?;
        }

        Commands::Access {
            role,
            feature,
            json,
        } => {
            if !evaluate::print_access(&role, &feature, json)? {
                std::process::exit(1);
            }
        }

        Commands::Dashboard { role } => {
            evaluate::print_dashboard(role.as_deref());
        }

        Commands::Sidebar {
            role,
            format,
            output,
        } => {
            let format = OutputFormat::parse(&format)?;
            evaluate::print_sidebar(&role, format, output.as_deref())?;
        }

        Commands::CheckConfig { config } => {
            if !check_config::check_config(&config)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
