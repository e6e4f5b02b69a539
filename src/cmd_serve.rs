//! `serve` subcommand: HTTP task API.

use std::sync::Arc;

use mailhands_api::{ApiConfig, ApiServer, AppState};
use mailhands_config::Config;
use mailhands_core::{PatternIntentParser, TaskRegistry};
use tracing::{info, warn};

use crate::engine::Engine;

/// Run the API until Ctrl-C, then release the browser.
pub(crate) async fn handle_serve(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut api_config = ApiConfig::from(&config.server);
    if let Some(host) = host {
        api_config.host = host;
    }
    if let Some(port) = port {
        api_config.port = port;
    }

    let engine = Engine::from_config(&config)?;
    let registry = TaskRegistry::new(engine.coordinator.clone(), engine.diagnostics.clone());
    let state = Arc::new(AppState::new(
        Arc::new(registry),
        Arc::new(PatternIntentParser::new()),
    ));

    info!("Starting MailHands API v{}", env!("CARGO_PKG_VERSION"));
    info!("  POST /email/send            - queue a send task");
    info!("  GET  /email/status/{{id}}     - task status");
    info!("  GET  /email/tasks           - list tasks");
    info!("  GET  /ws/task/{{id}}          - live task updates");

    let server = ApiServer::new(api_config, state);
    let result = server.run_until(shutdown_signal()).await;

    info!("Shutting down...");
    engine.shutdown().await;
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
