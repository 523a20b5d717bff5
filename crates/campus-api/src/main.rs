//! Campus API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 인증, 세션, 접근 평가, 내비게이션, 페이지 가드 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use campus_api::metrics::setup_metrics_recorder;
use campus_api::middleware::{metrics_layer, RateLimitConfig, RateLimitState};
use campus_api::openapi::swagger_ui_router;
use campus_api::repository::PgProfileStore;
use campus_api::routes::create_api_router;
use campus_api::state::AppState;
use campus_core::config::{DatabaseConfig, ServerConfig};
use campus_core::{init_logging, AppConfig, LogConfig};
use campus_session::{InMemoryAuthProvider, InMemoryProfileStore, ProfileStore};

/// 만료된 폐기 토큰 정리 주기.
const REVOCATION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Postgres 연결.
///
/// `DATABASE_URL` 환경변수가 설정 파일보다 우선합니다. 둘 다 없으면 `None`입니다.
async fn connect_database(config: &DatabaseConfig) -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.url.clone())?;

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(&url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return None;
        }
    };

    if let Err(e) = sqlx::migrate!("../../migrations").run(&pool).await {
        error!("Failed to run migrations: {}", e);
        return None;
    }

    info!("Connected to Postgres successfully");
    Some(pool)
}

/// 애플리케이션 상태 생성.
///
/// 데이터베이스가 없으면 프로필은 메모리에 보관됩니다.
async fn create_app_state(config: &AppConfig) -> AppState {
    let auth = Arc::new(
        InMemoryAuthProvider::new().with_min_password_length(config.auth.min_password_length),
    );

    match connect_database(&config.database).await {
        Some(pool) => {
            let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool.clone()));
            AppState::new(auth, profiles, config.auth.clone()).with_db_pool(pool)
        }
        None => {
            warn!("DATABASE_URL not set or unreachable, using in-memory profile store");
            AppState::new(
                auth,
                Arc::new(InMemoryProfileStore::new()),
                config.auth.clone(),
            )
        }
    }
}

/// CORS 레이어 생성.
///
/// `server.cors_origins`가 비어 있으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("CORS origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 자격 증명 포함 허용 (origin 목록이 있을 때만)
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    rate_limit: Option<RateLimitState>,
    server: &ServerConfig,
) -> Router {
    // 메트릭 라우터 (별도 상태, Rate Limit 제외)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router(rate_limit).with_state(state);

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer(server))
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use campus_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        return Ok(true);
    }

    Ok(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("설정 로드 실패")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))?;

    info!("Starting Campus API server...");

    if config.auth.uses_development_secret() {
        warn!("CAMPUS__AUTH__JWT_SECRET not set, using default (INSECURE for development only)");
    }

    let metrics_handle = setup_metrics_recorder().context("메트릭 레코더 설치 실패")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = config.server.bind_address().parse().with_context(|| {
        format!(
            "소켓 주소 설정이 유효하지 않습니다: {}",
            config.server.bind_address()
        )
    })?;

    let state = Arc::new(create_app_state(&config).await);
    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        "Application state initialized"
    );

    // 전역 종료 토큰 (백그라운드 태스크 종료 전파)
    let shutdown_token = CancellationToken::new();
    state.spawn_revocation_cleanup(REVOCATION_CLEANUP_INTERVAL, shutdown_token.clone());

    let rate_limit = if config.rate_limit.enabled {
        let limit = RateLimitState::new(RateLimitConfig::from(&config.rate_limit));
        limit.limiter().spawn_cleanup(shutdown_token.clone());
        info!(
            requests_per_minute = config.rate_limit.requests_per_minute,
            "Rate limiting configured for credential routes"
        );
        Some(limit)
    } else {
        info!("Rate limiting DISABLED");
        None
    };

    let app = create_router(state, metrics_handle, rate_limit, &config.server);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
        _ = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
