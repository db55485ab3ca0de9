//! Domain records for the production ledger and the typed boundary that
//! turns loosely-typed store rows and form input into them.

pub mod draft;
pub mod numbers;
pub mod production_record;
pub mod wage;
pub mod year_month;

use std::fmt;

pub use draft::{ProductionRecordDraft, WageDraft};
pub use numbers::{count_from_json, parse_count, CountError, MAX_COUNT};
pub use production_record::ProductionRecord;
pub use wage::{WageLookup, WageRecord};
pub use year_month::YearMonth;

/// A stored row whose contents cannot be represented as a typed record.
///
/// Raised instead of coercing bad values (for example a machine time of
/// `"abc"`) so corrupted rows never reach the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct DataIntegrityError {
    pub record_id: Option<i64>,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl DataIntegrityError {
    pub fn new(
        record_id: Option<i64>,
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record_id,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DataIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record_id {
            Some(id) => write!(f, "record {}", id)?,
            None => write!(f, "record without id")?,
        }
        write!(
            f,
            ": field `{}` has value {}: {}",
            self.field, self.value, self.reason
        )
    }
}
