use std::net::SocketAddr;
use topup_gateway::config::Settings;
use topup_gateway::observability::{init_logging, LogConfig, LogFormat};
use topup_gateway::relay::{create_relay_router, RelayState};
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

    let state = RelayState::new(&settings.relay)?;
    let router = create_relay_router(state);

    let addr = format!("{}:{}", settings.application.host, settings.relay.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Relay listening on {}, forwarding to {}",
        addr, settings.relay.destination_url
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
