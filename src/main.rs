// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{routing::get, Router};
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::crm_repository::CrmRepository;
use crate::application::dashboard_service::DashboardService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::infrastructure::cache::QueryCache;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::memory_repository::MemoryRepository;
use crate::infrastructure::postgres_repository::{create_pool, PostgresRepository};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,crm_dashboard=debug")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn CrmRepository> = match &app_config.database.url {
        Some(url) => {
            let pool = create_pool(url, &app_config.database).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!("No database URL configured, serving an empty in-memory repository");
            Arc::new(MemoryRepository::new())
        }
    };

    // Create services (application layer)
    let dashboard_service =
        DashboardService::new(repository, app_config.dashboard.word_cloud_limit);
    let streaming_service = StreamingDashboardService::new(
        dashboard_service.clone(),
        app_config.dashboard.stream_channel_capacity,
    );
    let cache = Arc::new(QueryCache::new(
        Duration::from_secs(app_config.cache.ttl_secs),
        Duration::from_secs(app_config.cache.stale_secs),
        app_config.cache.max_entries,
    ));

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        streaming_service,
        cache,
    });

    // Build router (presentation layer)
    // Compression is applied in the response builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(handlers::health_check))
        .route(
            "/api/dashboard/revenue-by-lead-source",
            get(handlers::revenue_by_lead_source),
        )
        .route("/api/dashboard/wordcloud", get(handlers::word_cloud))
        .route("/api/dashboard/pipeline-by-stage", get(handlers::pipeline_by_stage))
        .route("/api/dashboard/payment-status", get(handlers::payment_status))
        .route("/api/dashboard/year-over-year", get(handlers::year_over_year))
        .route("/api/dashboard/loan-by-bank", get(handlers::loan_by_bank))
        .route("/api/dashboard/quick-access", get(handlers::quick_access))
        .route("/api/dashboard/:role", get(handlers::get_dashboard))
        .route("/api/dashboard/:role/stream", get(handlers::stream_dashboard))
        .route(
            "/api/sales-team-performance",
            get(handlers::sales_team_performance),
        )
        .route("/api/projects", get(handlers::list_projects))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = app_config.bind_address();
    tracing::info!("Starting crm-dashboard service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
