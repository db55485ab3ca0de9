//! Aggregations over production records: machine-time totals grouped by
//! order or month, per-order labor costs, chart datasets and filter options.
//!
//! Every function here is pure and rebuilds its output from the record
//! slice it is given.

pub mod chart;
pub mod costs;
pub mod machine_time;
pub mod options;

use chrono::Locale;
use serde::{Deserialize, Serialize};

use crate::models::YearMonth;

pub use chart::ChartDataset;
pub use costs::{line_cost, order_costs, round_for_display, CostLineItem, CostSummary, OrderCost};
pub use machine_time::{
    group_by_month, group_by_order, machine_time, BreakdownEntry, GroupTotals, GroupedTotals,
};
pub use options::{distinct_persons, filter_options, sorted_distinct, FilterOptions, MonthOption};

/// How machine time is grouped.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingMode {
    /// One group per production order, broken down by item
    #[default]
    #[serde(alias = "order")]
    #[strum(to_string = "by-order", serialize = "order")]
    ByOrder,
    /// One group per calendar month, broken down by person
    #[serde(alias = "month")]
    #[strum(to_string = "by-month", serialize = "month")]
    ByMonth,
}

/// Language of month labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthLocale {
    #[default]
    Es,
    En,
}

impl MonthLocale {
    fn chrono_locale(self) -> Locale {
        match self {
            MonthLocale::Es => Locale::es_ES,
            MonthLocale::En => Locale::en_US,
        }
    }

    /// "month-name year", e.g. `enero 2024`.
    pub fn month_label(self, month: YearMonth) -> String {
        match month.first_day() {
            Some(day) => day
                .format_localized("%B %Y", self.chrono_locale())
                .to_string(),
            None => month.to_string(),
        }
    }
}
