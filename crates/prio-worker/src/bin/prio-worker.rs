//! Binary entry point: a `worker` subcommand that loads configuration,
//! builds the coordination/queue stack selected by Cargo features, and
//! serves the HTTP API until a shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use prio_queue::QueueEngine;
use prio_worker::cli::{Cli, Command};
use prio_worker::{http, Config, Worker, WorkerError, WorkerResult};

#[cfg(all(feature = "postgres", feature = "zookeeper"))]
mod stack {
    pub use prio_coordination::zk::ZkClient as Client;
    pub use prio_queue::PostgresBackend as Backend;
}

#[cfg(not(all(feature = "postgres", feature = "zookeeper")))]
mod stack {
    pub use prio_coordination::InMemoryClient as Client;
    pub use prio_queue::MemoryBackend as Backend;
}

use stack::{Backend, Client};

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Worker { envfile } => {
            let runtime = tokio::runtime::Runtime::new().expect("failed to start the tokio runtime");
            if let Err(err) = runtime.block_on(run_worker(&envfile)) {
                tracing::error!(%err, "prio-worker exiting after an unrecoverable error");
                std::process::exit(1);
            }
        }
    }
}

async fn run_worker(envfile: &str) -> WorkerResult<()> {
    let config = Config::load(envfile)?;
    init_tracing(config.debug);

    tracing::info!(namespace = %config.namespace, "prio-worker starting");

    let client = Arc::new(build_client(&config).await?);
    let backend = build_backend(&config).await?;
    let engine = Arc::new(QueueEngine::new(backend));

    let worker_id = Uuid::new_v4().to_string();
    let worker = Worker::new(client, engine, config.namespace.clone(), worker_id);
    let supervisor = worker.start().await?;

    let app = http::router(Arc::clone(&worker));
    let addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {addr}: {err}"));
    tracing::info!(%addr, "HTTP surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|err| panic!("HTTP server error: {err}"));

    tracing::info!("shutdown signal received, resigning the elector");
    worker.shutdown();
    let _ = supervisor.await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(all(feature = "postgres", feature = "zookeeper"))]
async fn build_client(config: &Config) -> WorkerResult<Client> {
    let servers = config.zk_server_list().join(",");
    Client::connect(&servers).await.map_err(WorkerError::from)
}

#[cfg(not(all(feature = "postgres", feature = "zookeeper")))]
async fn build_client(_config: &Config) -> WorkerResult<Client> {
    Ok(Client::new())
}

#[cfg(all(feature = "postgres", feature = "zookeeper"))]
async fn build_backend(config: &Config) -> WorkerResult<Backend> {
    let dsn = config
        .database_dsn()
        .unwrap_or_else(|| panic!("PRIO_DB_DSN or PRIO_DB_HOST/.../PRIO_DB_DATABASE must be set"));
    let backend = Backend::connect(&dsn).await?;
    backend.migrate().await?;
    Ok(backend)
}

#[cfg(not(all(feature = "postgres", feature = "zookeeper")))]
async fn build_backend(_config: &Config) -> WorkerResult<Backend> {
    Ok(Backend::new())
}
