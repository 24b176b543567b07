//! Storefront API Server Entry Point
//!
//! Reads configuration, selects the record store and starts the Axum HTTP
//! server.

use std::net::SocketAddr;
use std::sync::Arc;

use storefront_api::telemetry::{init_tracing, LoggingConfig};
use storefront_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbClient, DbConfig, StorageKind,
};
use storefront_storage::{InMemoryStore, RecordStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&LoggingConfig::default())?;

    let api_config = ApiConfig::from_env();
    let store: Arc<dyn RecordStore> = match api_config.storage {
        StorageKind::Memory => {
            tracing::info!("Using in-memory record store");
            Arc::new(InMemoryStore::new())
        }
        StorageKind::Postgres => {
            let db_config = DbConfig::from_env();
            tracing::info!(host = %db_config.host, dbname = %db_config.dbname, "Using PostgreSQL record store");
            let db = DbClient::from_config(&db_config)?;
            db.migrate().await?;
            Arc::new(db)
        }
    };

    let state = AppState::from_config(store, &api_config)?;
    let app = create_api_router(state, &api_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting storefront API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("STOREFRONT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("STOREFRONT_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::internal(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::internal(format!("Invalid bind address {}: {}", addr, e)))
}
