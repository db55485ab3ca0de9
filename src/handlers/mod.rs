//! HTTP handlers for the ledger API.
//!
//! Every handler reads fresh data through [`crate::services::LedgerService`];
//! no state is cached between requests.

pub mod health;
pub mod production_records;
pub mod reports;
pub mod wages;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Treats an absent or whitespace-only query value as not given.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
