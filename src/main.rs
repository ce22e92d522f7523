//! LendHub Backend Server
//!
//! HTTP backend for the peer-to-peer item-lending platform: item registry,
//! loan requests, the loan lifecycle with payments and reviews, push
//! notifications, and scheduled housekeeping.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::{routing::get, Json, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use lendhub_server::auth::AuthService;
use lendhub_server::config::Config;
use lendhub_server::item::ItemService;
use lendhub_server::loan::LoanService;
use lendhub_server::notification::NotificationService;
use lendhub_server::payment::PaymentService;
use lendhub_server::request::LoanRequestService;
use lendhub_server::state::AppState;
use lendhub_server::tasks::{self, Housekeeper};
use lendhub_server::{db, middleware, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    // Initialize database connection pool and schema
    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;

    db::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    // Initialize services
    let item_service = Arc::new(ItemService::new(db_pool.clone()));
    let request_service = Arc::new(LoanRequestService::new(db_pool.clone()));
    let payment_service = Arc::new(PaymentService::new(
        config.payment_api_url.clone(),
        config.payment_secret_key.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(
        db_pool.clone(),
        config.push_gateway_url.clone(),
    ));
    let loan_service = Arc::new(LoanService::new(
        db_pool.clone(),
        payment_service.clone(),
        notification_service.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(config.jwt_secret.clone()));
    let housekeeper = Housekeeper::new(request_service.clone(), loan_service.clone());

    // Create shared app state
    let app_state = AppState::new(
        item_service,
        request_service,
        loan_service,
        payment_service,
        notification_service,
        auth_service,
        housekeeper.clone(),
    );

    // Start the housekeeping scheduler; the handle keeps the jobs alive.
    let _scheduler = tasks::start_scheduler(housekeeper)
        .await
        .context("Failed to start housekeeping scheduler")?;

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::item_routes())
        .merge(routes::loan_request_routes())
        .merge(routes::loan_routes())
        .merge(routes::payment_routes())
        .merge(routes::notification_routes())
        .merge(routes::task_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server encountered an error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "LendHub API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed_origins) = config.cors_allowed_origins.as_deref() else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
