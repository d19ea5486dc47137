//! FILENAME: app/src/lib.rs
// PURPOSE: Host process for a schema-driven editable grid.
// CONTEXT: Owns the shared AppState (grid store behind a mutex, lookup
// transport, configuration), loads the startup documents, and serves the
// JSON line protocol on stdin/stdout. Logging goes to the unified log file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use grid_engine::{GridStore, LookupOption, Row, Schema};

pub mod api_types;
pub mod commands;
pub mod config;
pub mod demo_endpoint;
pub mod error;
pub mod logging;
pub mod lookup;

pub use api_types::{EditResult, ExpressionCheck, GridSnapshot, RowsChangedEvent};
pub use commands::{execute, handle_line, Command, Response};
pub use config::AppConfig;
pub use error::AppError;
pub use lookup::{spawn_lookups, HttpLookup};

// ============================================================================
// STATE
// ============================================================================

pub struct AppState {
    pub store: Mutex<GridStore>,
    pub lookup: HttpLookup,
    pub config: AppConfig,
    /// Row collections published by the store's change listener.
    pub row_events: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<Row>>>,
}

pub fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    log_info!("SYS", "Creating AppState");
    let lookup = HttpLookup::new(config.lookup_base_url.as_deref(), config.lookup_timeout())?;

    let mut store = GridStore::new(Schema::default());
    store.set_user_role(config.user_role.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    store.subscribe(Box::new(move |rows| {
        // Receiver gone means the host is shutting down
        let _ = tx.send(rows.to_vec());
    }));

    Ok(AppState {
        store: Mutex::new(store),
        lookup,
        config,
        row_events: tokio::sync::Mutex::new(rx),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| AppError::Document {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the schema, rows and lookup options named in the configuration.
pub fn load_documents(state: &AppState) -> Result<(), AppError> {
    let config = &state.config;
    let schema = match &config.schema_path {
        Some(path) => {
            log_info!("SYS", "Loading schema from {:?}", path);
            let text = std::fs::read_to_string(path)?;
            Some(Schema::from_json_str(&text)?)
        }
        None => None,
    };
    let rows: Option<Vec<Row>> = config.data_path.as_deref().map(read_json).transpose()?;
    let options: Option<HashMap<String, Vec<LookupOption>>> =
        config.lookup_options_path.as_deref().map(read_json).transpose()?;

    let mut store = state.store.lock().map_err(|_| AppError::Poisoned)?;
    if let Some(schema) = schema {
        store.load_schema(schema);
    }
    if let Some(options) = options {
        store.set_lookup_options(options);
    }
    if let Some(rows) = rows {
        log_info!("SYS", "Loaded {} rows", rows.len());
        store.set_external_data(rows);
    }
    Ok(())
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Reads commands from stdin until EOF, one response line per command.
/// Row changes are written as `rows_changed` event lines as they happen.
pub async fn serve_stdio(state: Arc<AppState>) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut events = state.row_events.lock().await;

    loop {
        let out = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => handle_line(&state, &line),
                None => break,
            },
            Some(rows) = events.recv() => RowsChangedEvent::new(rows).to_line(),
        };
        stdout.write_all(out.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

pub fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    logging::init_log_file(&config.log_path)?;
    logging::install_facade(log::LevelFilter::Debug);
    log_info!("SYS", "Logging to {:?}", config.log_path);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let state = Arc::new(create_app_state(config)?);
        load_documents(&state)?;

        if let Some(addr) = state.config.demo_endpoint_addr.clone() {
            demo_endpoint::serve(&addr).await?;
        }

        log_info!("SYS", "Ready for commands on stdin");
        serve_stdio(state).await
    })?;

    log_info!("SYS", "Input closed, shutting down");
    let _ = logging::sort_log_file();
    Ok(())
}
