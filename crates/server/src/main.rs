//! Sales Coach Server Entry Point

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sales_coach_config::{load_settings, ConfigError, Settings};
use sales_coach_server::{create_router, init_metrics, AppState};

const ENV_VAR: &str = "SALES_COACH_ENV";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var(ENV_VAR).ok();
    let (config, load_error) = read_settings(env.as_deref());

    // Logging follows the settings, so a load failure is reported afterwards
    init_tracing(&config);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Configuration files unusable, running on built-in defaults");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        profile = env.as_deref().unwrap_or("default"),
        provider = config.llm.provider.as_str(),
        "Sales coach starting"
    );

    if config.observability.metrics_enabled && init_metrics().is_some() {
        tracing::debug!("Prometheus recorder installed");
    }

    let state = AppState::new(config.clone())
        .context("failed to initialize application state")?
        .with_env(env);
    tracing::info!(
        gateway = state.engine.gateway_name(),
        knowledge_categories = state.knowledge.categories().len(),
        action_templates = state.action_plans.list_templates().len(),
        max_sessions = config.server.max_sessions,
        "Engine ready"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Accepting connections");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let signal = shutdown_requested().await;
            tracing::info!(signal, "Draining in-flight requests");
        })
        .await
        .context("server error")?;

    tracing::info!("Stopped");
    Ok(())
}

/// Layered settings for `env`, or defaults plus the reason they were needed
fn read_settings(env: Option<&str>) -> (Settings, Option<ConfigError>) {
    match load_settings(env) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

/// Resolves with the name of the first shutdown signal received
async fn shutdown_requested() -> &'static str {
    tokio::select! {
        name = interrupt() => name,
        name = terminate() => name,
    }
}

async fn interrupt() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(e) => {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending().await
        },
    }
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
            "SIGTERM"
        },
        Err(e) => {
            tracing::error!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending().await
        },
    }
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending().await
}

fn init_tracing(config: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "sales_coach={},tower_http=debug",
            config.observability.log_level
        ))
    });

    let output = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry().with(filter).with(output).init();
}
