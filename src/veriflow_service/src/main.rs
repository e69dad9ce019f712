use color_eyre::eyre::Result;
use tokio::net::TcpListener;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use veriflow_adapters::config::VeriflowSettings;
use veriflow_service::{VeriflowService, build_state};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let settings = VeriflowSettings::load()?;
    let state = build_state(&settings).await?;

    let listener = TcpListener::bind(&settings.application.address).await?;
    tracing::info!(base_url = %settings.application.base_url, "Starting Veriflow");

    VeriflowService::new(state, &settings.auth.callback_path)
        .run_standalone(listener, settings.application.allowed_origins.clone())
        .await?;

    Ok(())
}

pub fn init_tracing() -> Result<()> {
    let fmt_layer = fmt::layer().compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
