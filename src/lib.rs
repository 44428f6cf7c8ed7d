//! PR Reviewer - reviewer assignment and rotation service.
//!
//! Tracks teams, users and pull requests, assigns reviewers when a PR is
//! opened, and hands reviews over to other teams when a team is deactivated.
//! The binary exposes everything over a JSON HTTP API backed by SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use config::AppConfig;
use db::SqliteStore;
use error::AppError;
use services::Services;

/// Open the database, start the server and block until a shutdown signal.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let pool = db::initialize_with(&config.database_path, config.db_max_connections).await?;
    let store = Arc::new(SqliteStore::new(pool));
    let services = Services::new(store.clone(), config.assignment_policy());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let handle = server::start_server(addr, services, config.request_timeout()).await?;

    server::shutdown_signal().await;
    handle.shutdown();
    handle.wait().await;

    store.pool().close().await;
    log::info!("[server] Shutdown complete");
    Ok(())
}
