// Ledger reads, writes and reports over the record store
pub mod ledger;

pub use ledger::{LedgerService, MachineTimeQuery, MachineTimeReport};
