/*!
 * # Record Store
 *
 * All durable state sits behind [`RecordStore`], a row-level interface over
 * the two ledger tables: insert one row, select every row ordered by a
 * column, and upsert a row keyed on a conflict column. Rows are loosely
 * typed JSON objects; turning them into domain records is the caller's job.
 *
 * Three backends implement the trait:
 * - [`SqlRecordStore`]: sea-orm over SQLite or Postgres (the default)
 * - [`RestRecordStore`]: a PostgREST endpoint as exposed by hosted Postgres
 * - [`MemoryRecordStore`]: raw rows held in process, for tests and demos
 */

mod memory;
mod rest;
mod sql;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

pub use memory::MemoryRecordStore;
pub use rest::RestRecordStore;
pub use sql::SqlRecordStore;

/// One stored row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The logical tables of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    ProductionRecords,
    EmployeeWages,
}

/// Sort applied to a full-table select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            ascending: false,
        }
    }
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unknown column `{column}` in table {table}")]
    UnknownColumn { table: Table, column: String },
    #[error("row cannot be stored in {table}: {reason}")]
    InvalidRow { table: Table, reason: String },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Which backend serves the record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sql,
    Rest,
    Memory,
}

/// Row-level access to the ledger tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends one row. Store-assigned columns (the `id`) are filled in by the store.
    async fn insert(&self, table: Table, row: Row) -> Result<(), StoreError>;

    /// Returns every row of `table`, sorted by `order_by`.
    async fn select_all(&self, table: Table, order_by: OrderBy) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row`, or replaces the row whose `conflict_key` column holds the same value.
    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<(), StoreError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> StoreBackend;
}

/// Builds the record store selected by `config.store_backend`.
pub async fn from_config(config: &AppConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    info!(backend = %config.store_backend, "Initializing record store");

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Sql => {
            let pool = crate::db::establish_connection_from_app_config(config).await?;
            if config.auto_migrate {
                crate::db::run_migrations(&pool).await?;
            }
            Arc::new(SqlRecordStore::new(pool))
        }
        StoreBackend::Rest => {
            let base_url = config.rest_url.as_deref().ok_or_else(|| {
                StoreError::Unavailable("rest_url is not configured".to_string())
            })?;
            Arc::new(RestRecordStore::new(
                base_url,
                config.rest_api_key.clone(),
                std::time::Duration::from_secs(config.rest_timeout_secs),
            )?)
        }
        StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
    };

    Ok(store)
}
