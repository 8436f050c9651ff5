//! Startup helpers for the chat memory server.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::OllamaProbe;
use crate::memory::core::config::MemoryConfig;
use crate::memory::core::errors::MemoryResult;
use crate::server::{self, AppState};

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "CHAT_MEMORY_PORT";

/// How long startup waits for Ollama before continuing without it.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Run the server until ctrl-c.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting chat memory v{}", env!("CARGO_PKG_VERSION"));

    let config = match MemoryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(initialize(&config)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, port, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Validate config, probe Ollama and build application state.
///
/// An unreachable Ollama is logged, not fatal: chat requests will fail with
/// a gateway error until it comes up.
///
/// # Errors
/// Returns an error if configuration is invalid or state creation fails.
pub async fn initialize(config: &MemoryConfig) -> MemoryResult<Arc<AppState>> {
    config.validate()?;
    tracing::info!(
        backend = ?config.storage.backend,
        path = %config.storage.sqlite_path.display(),
        model = %config.llm.model,
        max_messages = config.window.max_messages,
        retention = ?config.window.retention,
        "memory configuration"
    );

    let probe = OllamaProbe::new(&config.llm.base_url)?;
    match probe.wait_until_ready(PROBE_TIMEOUT).await {
        Ok(version) => tracing::info!("Ollama {version} reachable at {}", config.llm.base_url),
        Err(e) => tracing::warn!("Ollama not reachable at {}: {e}", config.llm.base_url),
    }

    AppState::new(config).await
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
