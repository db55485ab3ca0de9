use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use crate::models::production_record::columns as record_columns;
use crate::models::wage::columns as wage_columns;
use crate::models::{ProductionRecord, WageLookup, WageRecord, YearMonth};
use crate::reports::{
    self, ChartDataset, CostSummary, FilterOptions, GroupedTotals, GroupingMode, MonthLocale,
};
use crate::store::{OrderBy, RecordStore, StoreBackend, Table};

/// Parameters of a machine-time report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineTimeQuery {
    pub mode: GroupingMode,
    /// Only used when grouping by order
    pub order_id: Option<String>,
    /// Only used when grouping by month
    pub month: Option<YearMonth>,
}

/// Grouped machine time together with the chart drawn from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineTimeReport {
    pub totals: GroupedTotals,
    pub chart: ChartDataset,
}

/// Reads and writes the ledger through a [`RecordStore`] and builds reports
/// from fresh snapshots.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn RecordStore>,
    locale: MonthLocale,
}

impl LedgerService {
    pub fn new(store: Arc<dyn RecordStore>, locale: MonthLocale) -> Self {
        Self { store, locale }
    }

    pub fn locale(&self) -> MonthLocale {
        self.locale
    }

    pub fn backend(&self) -> StoreBackend {
        self.store.backend()
    }

    /// Stores a new production record.
    #[instrument(skip(self, record), fields(order_id = %record.order_id, person = %record.person))]
    pub async fn insert_record(&self, record: &ProductionRecord) -> Result<(), ServiceError> {
        self.store
            .insert(Table::ProductionRecords, record.to_row())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to insert production record");
                ServiceError::from(e)
            })?;
        info!(minutes = record.machine_minutes, "Production record stored");
        Ok(())
    }

    /// Every production record, newest date first.
    ///
    /// Fails with a data-integrity error if any stored row cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_records(&self) -> Result<Vec<ProductionRecord>, ServiceError> {
        let rows = self
            .store
            .select_all(
                Table::ProductionRecords,
                OrderBy::desc(record_columns::DATE),
            )
            .await?;

        ProductionRecord::decode_rows(&rows).map_err(|e| {
            warn!(error = %e, "Stored production record failed to decode");
            ServiceError::from(e)
        })
    }

    /// Creates or replaces the wage of `wage.person`.
    #[instrument(skip(self, wage), fields(person = %wage.person))]
    pub async fn upsert_wage(&self, wage: &WageRecord) -> Result<(), ServiceError> {
        self.store
            .upsert(Table::EmployeeWages, wage.to_row(), wage_columns::PERSON)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to save wage");
                ServiceError::from(e)
            })?;
        info!("Wage saved");
        Ok(())
    }

    /// Every wage, ordered by person.
    #[instrument(skip(self))]
    pub async fn list_wages(&self) -> Result<Vec<WageRecord>, ServiceError> {
        let rows = self
            .store
            .select_all(Table::EmployeeWages, OrderBy::asc(wage_columns::PERSON))
            .await?;
        Ok(WageRecord::decode_rows(&rows)?)
    }

    pub async fn wage_lookup(&self) -> Result<WageLookup, ServiceError> {
        Ok(WageLookup::from_records(&self.list_wages().await?))
    }

    /// Distinct people named in production records, sorted.
    ///
    /// Only the person column is read, so a corrupt number elsewhere in a
    /// row does not hide the name from the wage form.
    #[instrument(skip(self))]
    pub async fn list_persons(&self) -> Result<Vec<String>, ServiceError> {
        let rows = self
            .store
            .select_all(
                Table::ProductionRecords,
                OrderBy::asc(record_columns::PERSON),
            )
            .await?;

        Ok(reports::sorted_distinct(rows.iter().filter_map(|row| {
            row.get(record_columns::PERSON)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })))
    }

    #[instrument(skip(self))]
    pub async fn machine_time_report(
        &self,
        query: &MachineTimeQuery,
    ) -> Result<MachineTimeReport, ServiceError> {
        let records = self.list_records().await?;
        let totals = reports::machine_time(
            &records,
            query.mode,
            query.order_id.as_deref(),
            query.month,
            self.locale,
        );
        let chart = ChartDataset::from_grouped(&totals);
        Ok(MachineTimeReport { totals, chart })
    }

    /// Per-order labor cost at full precision.
    #[instrument(skip(self))]
    pub async fn order_cost_report(&self) -> Result<CostSummary, ServiceError> {
        // Wages are read before records
        let wages = self.wage_lookup().await?;
        let records = self.list_records().await?;
        Ok(reports::order_costs(&records, &wages)?)
    }

    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        let records = self.list_records().await?;
        Ok(reports::filter_options(&records, self.locale))
    }

    /// Round trip to the record store.
    pub async fn check_store(&self) -> Result<(), ServiceError> {
        self.store.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn service() -> (LedgerService, MemoryRecordStore) {
        let store = MemoryRecordStore::new();
        (
            LedgerService::new(Arc::new(store.clone()), MonthLocale::Es),
            store,
        )
    }

    fn record(date: &str, person: &str, order: &str, minutes: u32) -> ProductionRecord {
        ProductionRecord {
            id: None,
            date: date.parse().unwrap(),
            person: person.into(),
            order_id: order.into(),
            quantity: 1,
            item: "brida".into(),
            machine_minutes: minutes,
            size: "M".into(),
            machine: "CNC-1".into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_then_list_returns_equal_record() {
        let (ledger, _) = service();
        let submitted = ProductionRecord {
            notes: Some("primer lote".into()),
            ..record("2024-01-15", "Ana", "OP1", 60)
        };
        ledger.insert_record(&submitted).await.unwrap();

        let fetched = ledger.list_records().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(fetched[0].id.is_some());
        assert_eq!(
            ProductionRecord {
                id: None,
                ..fetched[0].clone()
            },
            submitted
        );
    }

    #[tokio::test]
    async fn records_list_newest_first() {
        let (ledger, _) = service();
        for (date, order) in [("2024-01-01", "OP1"), ("2024-03-01", "OP2"), ("2024-02-01", "OP3")] {
            ledger.insert_record(&record(date, "Ana", order, 10)).await.unwrap();
        }
        let orders: Vec<String> = ledger
            .list_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.order_id)
            .collect();
        assert_eq!(orders, vec!["OP2", "OP3", "OP1"]);
    }

    #[tokio::test]
    async fn wage_upsert_creates_then_replaces() {
        let (ledger, _) = service();
        let mut wage = WageRecord {
            person: "Ana".into(),
            hourly_rate: dec!(10),
        };
        ledger.upsert_wage(&wage).await.unwrap();
        assert_eq!(ledger.list_wages().await.unwrap(), vec![wage.clone()]);

        wage.hourly_rate = dec!(12.5);
        ledger.upsert_wage(&wage).await.unwrap();
        let wages = ledger.list_wages().await.unwrap();
        assert_eq!(wages.len(), 1);
        assert_eq!(wages[0].hourly_rate, dec!(12.5));
    }

    #[tokio::test]
    async fn cost_report_matches_reference_scenario() {
        let (ledger, _) = service();
        ledger
            .upsert_wage(&WageRecord {
                person: "Ana".into(),
                hourly_rate: dec!(10),
            })
            .await
            .unwrap();
        ledger.insert_record(&record("2024-01-10", "Ana", "OP1", 60)).await.unwrap();
        ledger.insert_record(&record("2024-01-11", "Ana", "OP2", 45)).await.unwrap();
        ledger.insert_record(&record("2024-01-12", "Ana", "OP1", 30)).await.unwrap();

        let report = ledger
            .machine_time_report(&MachineTimeQuery::default())
            .await
            .unwrap();
        assert_eq!(report.totals.get("OP1").unwrap().total_minutes, 90);
        assert_eq!(report.totals.get("OP2").unwrap().total_minutes, 45);

        let costs = ledger.order_cost_report().await.unwrap().display_rounded();
        assert_eq!(costs.get("OP1").unwrap().total_cost.to_string(), "15.00");
        assert_eq!(costs.get("OP2").unwrap().total_cost.to_string(), "7.50");
    }

    #[tokio::test]
    async fn corrupt_minutes_fail_the_report() {
        let (ledger, store) = service();
        ledger.insert_record(&record("2024-01-10", "Ana", "OP1", 60)).await.unwrap();
        store
            .insert(
                Table::ProductionRecords,
                json!({
                    "fecha": "2024-01-11", "persona": "Luis", "op": "OP1", "cantidad": 1,
                    "item": "eje", "tiempo_mecanizado": "abc", "tamano": "M", "maquina": "T1"
                })
                .as_object()
                .cloned()
                .unwrap(),
            )
            .await
            .unwrap();

        let err = ledger
            .machine_time_report(&MachineTimeQuery::default())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::DataIntegrity(ref e) if e.field == "tiempo_mecanizado");

        // The persons list only needs names and stays available
        assert_eq!(ledger.list_persons().await.unwrap(), vec!["Ana", "Luis"]);
    }

    #[tokio::test]
    async fn oversized_stored_wage_is_reported_without_panicking() {
        let (ledger, store) = service();
        store
            .upsert(
                Table::EmployeeWages,
                json!({"persona": "Ana", "salario_por_hora": "79228162514264337593543950335"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                wage_columns::PERSON,
            )
            .await
            .unwrap();
        ledger.insert_record(&record("2024-01-10", "Ana", "OP1", 120)).await.unwrap();

        let task = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.order_cost_report().await })
        };
        let err = task.await.expect("cost report must not panic").unwrap_err();
        assert_matches!(err, ServiceError::DataIntegrity(ref e) if e.field == "salario_por_hora");
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

        // Overwriting the wage recovers the report
        ledger
            .upsert_wage(&WageRecord {
                person: "Ana".into(),
                hourly_rate: dec!(30),
            })
            .await
            .unwrap();
        let costs = ledger.order_cost_report().await.unwrap();
        assert_eq!(costs.get("OP1").unwrap().total_cost, dec!(60));
    }
}
