/*!
 * # Dashboard
 *
 * Owned application state behind the presentation surfaces: the record and
 * wage entry forms, the loaded lists, the chart view settings and the
 * notifications raised along the way. One task drives a [`Dashboard`]
 * through `&mut self`; every list is rebuilt from a fresh fetch after each
 * successful write.
 */

pub mod data_source;
pub mod notifications;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};
use validator::ValidationErrors;

use crate::errors::ServiceError;
use crate::models::{
    DataIntegrityError, ProductionRecord, ProductionRecordDraft, WageDraft, WageLookup, WageRecord,
    YearMonth,
};
use crate::reports::{
    self, ChartDataset, CostSummary, FilterOptions, GroupedTotals, GroupingMode,
};
use crate::services::LedgerService;

pub use data_source::{Completion, DataSource, LoadState, RequestTag};
pub use notifications::{Notification, Severity};

/// Chart grouping and the filters that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: GroupingMode,
    pub order_filter: Option<String>,
    pub month_filter: Option<YearMonth>,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved,
    /// The draft did not validate; the store was not contacted
    Invalid(ValidationErrors),
    /// The store refused or was unreachable; the draft is kept for retry
    StoreFailed(ServiceError),
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved)
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Dashboard {
    ledger: LedgerService,
    records: DataSource<ProductionRecord>,
    wages: DataSource<WageRecord>,
    persons: DataSource<String>,
    record_draft: ProductionRecordDraft,
    wage_draft: WageDraft,
    view: ViewState,
    notifications: Vec<Notification>,
    today: fn() -> NaiveDate,
}

impl Dashboard {
    pub fn new(ledger: LedgerService) -> Self {
        Self::with_clock(ledger, local_today)
    }

    /// Dashboard whose notion of "today" comes from `today`.
    pub fn with_clock(ledger: LedgerService, today: fn() -> NaiveDate) -> Self {
        let now = today();
        Self {
            ledger,
            records: DataSource::new("records"),
            wages: DataSource::new("wages"),
            persons: DataSource::new("persons"),
            record_draft: ProductionRecordDraft::blank(now),
            wage_draft: WageDraft::default(),
            view: ViewState {
                mode: GroupingMode::ByOrder,
                order_filter: None,
                month_filter: Some(YearMonth::from_date(now)),
            },
            notifications: Vec::new(),
            today,
        }
    }

    /// Loads every list, wages before records.
    pub async fn load(&mut self) {
        self.refresh_wages().await;
        self.refresh_persons().await;
        self.refresh_records().await;
    }

    pub async fn refresh_records(&mut self) -> Completion {
        let tag = self.records.begin();
        let result = self.ledger.list_records().await;
        settle(
            &mut self.records,
            &mut self.notifications,
            tag,
            result,
            "No se pudieron cargar los registros",
        )
    }

    pub async fn refresh_wages(&mut self) -> Completion {
        let tag = self.wages.begin();
        let result = self.ledger.list_wages().await;
        settle(
            &mut self.wages,
            &mut self.notifications,
            tag,
            result,
            "No se pudieron cargar los salarios",
        )
    }

    pub async fn refresh_persons(&mut self) -> Completion {
        let tag = self.persons.begin();
        let result = self.ledger.list_persons().await;
        settle(
            &mut self.persons,
            &mut self.notifications,
            tag,
            result,
            "No se pudieron cargar las personas",
        )
    }

    /// Validates and stores the record draft.
    pub async fn submit_record(&mut self) -> SubmitOutcome {
        let record = match self.record_draft.parse() {
            Ok(record) => record,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        if let Err(e) = self.ledger.insert_record(&record).await {
            warn!(error = %e, "Record submit failed; draft kept");
            self.notifications
                .push(Notification::error("No se pudo guardar el registro"));
            return SubmitOutcome::StoreFailed(e);
        }

        info!(order_id = %record.order_id, "Record submitted");
        self.record_draft = ProductionRecordDraft::blank((self.today)());
        self.notifications
            .push(Notification::success("Registro guardado correctamente"));
        self.refresh_records().await;
        self.refresh_persons().await;
        SubmitOutcome::Saved
    }

    /// Validates and upserts the wage draft.
    pub async fn submit_wage(&mut self) -> SubmitOutcome {
        let wage = match self.wage_draft.parse() {
            Ok(wage) => wage,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        if let Err(e) = self.ledger.upsert_wage(&wage).await {
            warn!(error = %e, "Wage submit failed; draft kept");
            self.notifications
                .push(Notification::error("No se pudo guardar el salario"));
            return SubmitOutcome::StoreFailed(e);
        }

        info!(person = %wage.person, "Wage submitted");
        self.wage_draft = WageDraft::default();
        self.notifications
            .push(Notification::success("Salario guardado correctamente"));
        self.refresh_wages().await;
        self.refresh_persons().await;
        self.refresh_records().await;
        SubmitOutcome::Saved
    }

    /// Switches grouping; clears the order filter and selects the current month.
    pub fn set_grouping(&mut self, mode: GroupingMode) {
        self.view = ViewState {
            mode,
            order_filter: None,
            month_filter: Some(YearMonth::from_date((self.today)())),
        };
    }

    pub fn set_order_filter(&mut self, order_id: Option<String>) {
        self.view.order_filter = order_id.filter(|o| !o.trim().is_empty());
    }

    pub fn set_month_filter(&mut self, month: Option<YearMonth>) {
        self.view.month_filter = month;
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Machine time of the loaded records under the current view.
    pub fn grouped(&self) -> GroupedTotals {
        reports::machine_time(
            &self.records.snapshot(),
            self.view.mode,
            self.view.order_filter.as_deref(),
            self.view.month_filter,
            self.ledger.locale(),
        )
    }

    pub fn chart(&self) -> ChartDataset {
        ChartDataset::from_grouped(&self.grouped())
    }

    /// Per-order costs of the loaded records at the loaded wages.
    pub fn cost_table(&self) -> Result<CostSummary, DataIntegrityError> {
        let wages = WageLookup::from_records(&self.wages.snapshot());
        reports::order_costs(&self.records.snapshot(), &wages)
    }

    pub fn filter_options(&self) -> FilterOptions {
        reports::filter_options(&self.records.snapshot(), self.ledger.locale())
    }

    pub fn records(&self) -> &DataSource<ProductionRecord> {
        &self.records
    }

    pub fn wages(&self) -> &DataSource<WageRecord> {
        &self.wages
    }

    pub fn persons(&self) -> &DataSource<String> {
        &self.persons
    }

    pub fn record_draft(&self) -> &ProductionRecordDraft {
        &self.record_draft
    }

    pub fn record_draft_mut(&mut self) -> &mut ProductionRecordDraft {
        &mut self.record_draft
    }

    pub fn wage_draft(&self) -> &WageDraft {
        &self.wage_draft
    }

    pub fn wage_draft_mut(&mut self) -> &mut WageDraft {
        &mut self.wage_draft
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

fn settle<T>(
    source: &mut DataSource<T>,
    notifications: &mut Vec<Notification>,
    tag: RequestTag,
    result: Result<Vec<T>, ServiceError>,
    failure: &str,
) -> Completion {
    let completion = source.complete(tag, result);
    if let (Completion::Failed, LoadState::Failed(reason)) = (completion, source.state()) {
        warn!(source = source.name(), %reason, "Fetch failed");
        notifications.push(Notification::error(format!("{} ({})", failure, reason)));
    }
    completion
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("records", &self.records.state())
            .field("wages", &self.wages.state())
            .field("view", &self.view)
            .field("notifications", &self.notifications.len())
            .finish()
    }
}
