//! Trivia Arena - Unified CLI
//!
//! Live multiplayer trivia server reachable over MCP stdio or HTTP.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;
use trivia_arena::{JsonQuestionBank, ServerConfig, SessionRegistry, TriviaServer};

const DEFAULT_LOG_FILTER: &str = "info,trivia_arena=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // The log filter lives in the config, so loading it logs through a
    // provisional subscriber that only honours RUST_LOG.
    let mut config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        ServerConfig::load_or_default(&cli.config)
    })?;
    if let Some(dir) = cli.question_dir {
        config = config.with_question_dir(dir);
    }

    init_tracing(&config);
    debug!(?config, "Tracing initialised");

    match cli.command {
        Command::Server => run_mcp_server(config).await,
        Command::Http { port, host } => run_http_server(config.with_bind(host, port)).await,
    }
}

fn env_filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Subscriber used while the config itself is being read.
fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(DEFAULT_LOG_FILTER))
        .with_writer(std::io::stderr)
        .finish()
}

/// Logs go to stderr; stdout carries the MCP stream in stdio mode.
fn init_tracing(config: &ServerConfig) {
    let fallback = config
        .log_filter()
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(&fallback))
        .with_writer(std::io::stderr)
        .init();
}

#[instrument(skip(config), fields(question_dir = %config.question_dir().display()))]
fn build_registry(config: &ServerConfig) -> SessionRegistry {
    let bank = Arc::new(JsonQuestionBank::new(config.question_dir().clone()));
    SessionRegistry::new(bank, config.answer_window())
}

/// Run the MCP trivia server (stdio mode)
async fn run_mcp_server(config: ServerConfig) -> Result<()> {
    info!("Starting Trivia Arena MCP server");

    let server = TriviaServer::with_registry(build_registry(&config));

    info!("Server ready - connect via MCP protocol");
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

/// Run the HTTP trivia server
async fn run_http_server(config: ServerConfig) -> Result<()> {
    use axum::{Router, body::Body, http::Request};
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager,
        tower::{StreamableHttpServerConfig, StreamableHttpService},
    };
    use tower::ServiceBuilder;

    info!(host = %config.host(), port = *config.port(), "Starting Trivia Arena MCP server on HTTP");

    let session_manager = Arc::new(LocalSessionManager::default());

    // One registry shared by every MCP session
    let registry = build_registry(&config);

    let mut http_config = StreamableHttpServerConfig::default();
    http_config.stateful_mode = true;
    debug!(?http_config, "HTTP service configuration");

    let http_service = StreamableHttpService::new(
        move || {
            debug!("Creating TriviaServer instance with shared registry");
            Ok(TriviaServer::with_registry(registry.clone()))
        },
        session_manager,
        http_config,
    );

    let app = Router::new().fallback_service(
        ServiceBuilder::new()
            .map_request(|req: Request<Body>| {
                debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
                req
            })
            .service(tower::service_fn(move |req: Request<Body>| {
                let mut service = http_service.clone();
                async move {
                    let uri = req.uri().clone();
                    let result = tower::Service::call(&mut service, req).await;
                    match &result {
                        Ok(resp) => debug!(status = ?resp.status(), uri = %uri, "Response sent"),
                        Err(e) => warn!(error = ?e, uri = %uri, "Request failed"),
                    }
                    result
                }
            })),
    );

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app).await?;

    Ok(())
}
