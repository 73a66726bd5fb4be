//! The relay toolhost binary: serves the tool registry over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use relay_server::toolhost_router;
use relay_settings::{load_settings, load_settings_from_path};
use relay_tools::ReqwestHttp;
use relay_tools::registry::standard_registry;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Tool backend for the relay gateway.
#[derive(Debug, Parser)]
#[command(name = "relay-toolhost", version, about)]
struct Args {
    /// Listen port (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file path (default: ~/.relay/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = match &args.settings {
        Some(path) => load_settings_from_path(path)?,
        None => load_settings()?,
    };
    settings.validate();
    let port = args.port.unwrap_or(settings.server.toolhost_port);

    // Web search degrades to a failure outcome without a key; weather
    // needs none.
    let serper_api_key = std::env::var(&settings.tools.serper_api_key_env).ok();
    if serper_api_key.is_none() {
        warn!(
            env = %settings.tools.serper_api_key_env,
            "serper API key not set; web_search calls will fail"
        );
    }

    let http = Arc::new(ReqwestHttp::new(Duration::from_secs(
        settings.tools.call_timeout_secs,
    )));
    let registry = Arc::new(standard_registry(http, serper_api_key));
    info!(tools = ?registry.names(), "tool registry ready");

    let app = toolhost_router(registry).layer(TraceLayer::new_for_http());
    let addr = format!("{}:{port}", settings.server.host);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "relay toolhost listening");
    axum::serve(listener, app).await?;
    Ok(())
}
