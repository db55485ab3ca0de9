use serde::Serialize;
use std::collections::BTreeSet;

use super::MonthLocale;
use crate::models::{ProductionRecord, YearMonth};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    pub key: YearMonth,
    pub label: String,
}

/// Values offered by the report filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct order ids, ascending
    pub orders: Vec<String>,
    /// Distinct months, newest first
    pub months: Vec<MonthOption>,
}

pub fn filter_options(records: &[ProductionRecord], locale: MonthLocale) -> FilterOptions {
    let orders = sorted_distinct(records.iter().map(|r| r.order_id.clone()));

    let months: BTreeSet<YearMonth> = records.iter().map(ProductionRecord::month).collect();
    let months = months
        .into_iter()
        .rev()
        .map(|key| MonthOption {
            key,
            label: locale.month_label(key),
        })
        .collect();

    FilterOptions { orders, months }
}

/// People who appear in production records, for the wage form picker.
pub fn distinct_persons(records: &[ProductionRecord]) -> Vec<String> {
    sorted_distinct(records.iter().map(|r| r.person.clone()))
}

/// Sorted, de-duplicated, blank entries dropped.
pub fn sorted_distinct<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::machine_time::tests::record;

    #[test]
    fn options_are_sorted_and_distinct() {
        let records = vec![
            record("2024-01-10", "Luis", "OP2", "eje", 10),
            record("2024-03-01", "Ana", "OP1", "brida", 10),
            record("2024-01-20", "Ana", "OP2", "eje", 10),
        ];

        let options = filter_options(&records, MonthLocale::Es);
        assert_eq!(options.orders, vec!["OP1", "OP2"]);
        let keys: Vec<String> = options.months.iter().map(|m| m.key.to_string()).collect();
        assert_eq!(keys, vec!["2024-03", "2024-01"]);
        assert_eq!(options.months[0].label, "marzo 2024");

        assert_eq!(distinct_persons(&records), vec!["Ana", "Luis"]);
    }

    #[test]
    fn blank_names_are_dropped() {
        let names = vec!["  ".to_string(), "Ana".to_string(), "Ana".to_string()];
        assert_eq!(sorted_distinct(names), vec!["Ana"]);
    }
}
