//! The relay gateway binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use relay_llm::{ChatClient, ChatConfig};
use relay_runtime::{Orchestrator, SessionManager};
use relay_server::{AppState, metrics, router};
use relay_settings::{load_settings, load_settings_from_path};
use relay_tools::registry::standard_registry;
use relay_tools::{HttpDispatcher, ReqwestHttp};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// LLM-routed tool gateway.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
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
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    let api_key = std::env::var(&settings.reasoning.api_key_env).with_context(|| {
        format!(
            "reasoning API key not set (expected in ${})",
            settings.reasoning.api_key_env
        )
    })?;

    let metrics_handle = metrics::install_recorder()?;

    let reasoning = Arc::new(ChatClient::new(ChatConfig {
        base_url: settings.reasoning.base_url.clone(),
        model: settings.reasoning.model.clone(),
        api_key,
        timeout: Duration::from_secs(settings.reasoning.timeout_secs),
        routing_temperature: settings.reasoning.routing_temperature,
        synthesis_temperature: settings.reasoning.synthesis_temperature,
        max_answer_words: settings.reasoning.max_answer_words,
    }));

    // The gateway only needs the registry's metadata; execution happens in
    // the toolhost process.
    let call_timeout = Duration::from_secs(settings.tools.call_timeout_secs);
    let registry = standard_registry(Arc::new(ReqwestHttp::new(call_timeout)), None);
    let dispatcher = Arc::new(HttpDispatcher::new(
        reqwest::Client::new(),
        settings.tools.base_url.clone(),
        registry.names(),
    ));

    let manager = Arc::new(SessionManager::new(
        settings.sessions.max_concurrent,
        Duration::from_secs(settings.sessions.eviction_grace_secs),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        reasoning,
        dispatcher,
        registry.descriptors(),
        call_timeout,
    ));

    spawn_sweeper(
        Arc::clone(&manager),
        Duration::from_secs(settings.sessions.sweep_interval_secs),
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState {
        settings: Arc::new(settings),
        manager,
        orchestrator,
        http: reqwest::Client::new(),
        metrics: metrics_handle,
    };
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "relay gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Periodically evict terminal sessions past their grace period.
fn spawn_sweeper(manager: Arc<SessionManager>, interval: Duration) {
    drop(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            let _ = ticker.tick().await;
            let evicted = manager.sweep();
            if evicted > 0 {
                info!(evicted, "swept terminal sessions");
            }
        }
    }));
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to listen for shutdown signal");
    }
}
