use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use topup_gateway::api::{create_router, AppState};
use topup_gateway::config::Settings;
use topup_gateway::observability::{
    init_logging, init_metrics, mask_sensitive, HealthChecker, LogConfig, LogFormat,
};
use topup_gateway::provider::{HttpProviderGateway, SignatureVerifier};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    // Initialize logging
    init_logging(&LogConfig {
        level: settings.application.log_level.clone(),
        format: LogFormat::from(settings.application.log_format.as_str()),
        ..Default::default()
    });
    info!("Configuration loaded");
    info!(
        "Provider endpoint {} (api key {})",
        settings.provider.base_url,
        mask_sensitive(&settings.provider.api_key, 4)
    );

    // Initialize metrics
    let metrics_handle = init_metrics();

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(settings.database.connect_timeout_secs))
        .connect(&settings.database.url)
        .await?;
    info!("Database connection established");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    // Wire up shared state
    let verifier = SignatureVerifier::new(settings.provider.private_key.as_bytes());
    let provider = Arc::new(HttpProviderGateway::new(&settings.provider)?);
    let health_checker = Arc::new(HealthChecker::new(pool.clone()));

    let state = AppState::new(pool, verifier, provider, settings.topup.clone())
        .with_metrics(metrics_handle)
        .with_health_checker(health_checker);
    let router = create_router(state);

    let addr = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
