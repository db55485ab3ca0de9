//! sea-orm entities for the two ledger tables.

pub mod employee_wage;
pub mod production_record;
