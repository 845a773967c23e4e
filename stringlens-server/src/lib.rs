// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

pub mod api;
pub mod config;
pub mod validation;

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use stringlens_storage::{LogRecordStore, LogStoreConfig, RecordStore};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{
    create_string, delete_string, filter_by_natural_language, get_statistics, get_string,
    health_check, list_strings, AppState,
};
use config::{LogFormat, LoggingConfig, ServerConfig, StorageConfig};

const DEFAULT_LOG_FILTER: &str = "stringlens_server=info,stringlens_storage=info,tower_http=info";

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .filter
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}

/// Open the record store described by `config`
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    if config.in_memory {
        tracing::warn!("Using in-memory store; records are lost on shutdown");
        return Ok(Arc::new(LogRecordStore::in_memory()));
    }

    tracing::info!("Opening record store at: {:?}", config.data_dir);
    let store = LogRecordStore::open_with_config(
        &config.data_dir,
        LogStoreConfig {
            compact_on_open: config.compact_on_open,
        },
    )?;
    tracing::info!("Record store loaded with {} strings", store.len());
    Ok(Arc::new(store))
}

/// API routes without middleware
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/strings", get(list_strings).post(create_string))
        .route("/strings/stats", get(get_statistics))
        .route(
            "/strings/filter-by-natural-language",
            get(filter_by_natural_language),
        )
        .route("/strings/:key", get(get_string).delete(delete_string))
}

/// Full application: routes, state, and HTTP middleware
pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
    api_routes()
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(if config.server.enable_cors {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        })
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until the listener fails. Call [`init_tracing`] first.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Stringlens Server");
    tracing::info!("Configuration: {:#?}", config);

    config.validate()?;

    let store = open_store(&config.storage)?;
    let state = AppState::new(store, config.limits.clone());
    let app = build_app(state, &config);

    let addr = config.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_persistent_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().join("data"),
            ..Default::default()
        };

        {
            let store = open_store(&config).unwrap();
            store
                .insert(stringlens_core::PropertyRecord::analyze_now("madam"))
                .unwrap();
        }

        assert!(dir.path().join("data").join("records.log").exists());
        let store = open_store(&config).unwrap();
        assert!(store.exists("madam").unwrap());
    }

    #[test]
    fn test_open_in_memory_store() {
        let config = StorageConfig {
            in_memory: true,
            ..Default::default()
        };
        let store = open_store(&config).unwrap();
        assert_eq!(store.aggregate_statistics().unwrap().count, 0);
    }
}
