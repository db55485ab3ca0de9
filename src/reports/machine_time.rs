use serde::Serialize;
use std::collections::HashMap;

use super::{GroupingMode, MonthLocale};
use crate::models::{ProductionRecord, YearMonth};

/// Minutes attributed to one sub-key (item or person) inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    /// Order id, or `YYYY-MM` month key
    pub key: String,
    /// Text shown for the group; the localized month name in month mode
    pub label: String,
    pub total_minutes: u64,
    pub breakdown: Vec<BreakdownEntry>,
}

/// Grouped machine time. Groups and breakdown entries keep encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedTotals {
    pub mode: GroupingMode,
    pub groups: Vec<GroupTotals>,
}

impl GroupedTotals {
    pub fn get(&self, key: &str) -> Option<&GroupTotals> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn total_minutes(&self) -> u64 {
        self.groups.iter().map(|g| g.total_minutes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

struct Accumulator {
    groups: Vec<GroupTotals>,
    index: HashMap<String, usize>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, key: &str, label: impl FnOnce() -> String, sub_key: &str, minutes: u32) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.groups.push(GroupTotals {
                    key: key.to_string(),
                    label: label(),
                    total_minutes: 0,
                    breakdown: Vec::new(),
                });
                self.index.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[slot];
        let minutes = u64::from(minutes);
        group.total_minutes += minutes;
        match group.breakdown.iter_mut().find(|e| e.key == sub_key) {
            Some(entry) => entry.minutes += minutes,
            None => group.breakdown.push(BreakdownEntry {
                key: sub_key.to_string(),
                minutes,
            }),
        }
    }

    fn finish(self, mode: GroupingMode) -> GroupedTotals {
        GroupedTotals {
            mode,
            groups: self.groups,
        }
    }
}

/// Total machine minutes per production order, broken down by item.
pub fn group_by_order(records: &[ProductionRecord], order_filter: Option<&str>) -> GroupedTotals {
    let mut acc = Accumulator::new();
    for record in records
        .iter()
        .filter(|r| order_filter.map_or(true, |order| r.order_id == order))
    {
        acc.add(
            &record.order_id,
            || record.order_id.clone(),
            &record.item,
            record.machine_minutes,
        );
    }
    acc.finish(GroupingMode::ByOrder)
}

/// Total machine minutes per calendar month, broken down by person.
pub fn group_by_month(
    records: &[ProductionRecord],
    month_filter: Option<YearMonth>,
    locale: MonthLocale,
) -> GroupedTotals {
    let mut acc = Accumulator::new();
    for record in records {
        let month = record.month();
        if month_filter.is_some_and(|wanted| wanted != month) {
            continue;
        }
        acc.add(
            &month.to_string(),
            || locale.month_label(month),
            &record.person,
            record.machine_minutes,
        );
    }
    acc.finish(GroupingMode::ByMonth)
}

/// Groups by `mode`, applying the filter that belongs to that mode.
pub fn machine_time(
    records: &[ProductionRecord],
    mode: GroupingMode,
    order_filter: Option<&str>,
    month_filter: Option<YearMonth>,
    locale: MonthLocale,
) -> GroupedTotals {
    match mode {
        GroupingMode::ByOrder => group_by_order(records, order_filter),
        GroupingMode::ByMonth => group_by_month(records, month_filter, locale),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn record(
        date: &str,
        person: &str,
        order: &str,
        item: &str,
        minutes: u32,
    ) -> ProductionRecord {
        ProductionRecord {
            id: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            person: person.to_string(),
            order_id: order.to_string(),
            quantity: 1,
            item: item.to_string(),
            machine_minutes: minutes,
            size: "M".to_string(),
            machine: "CNC-1".to_string(),
            notes: None,
        }
    }

    fn scenario() -> Vec<ProductionRecord> {
        vec![
            record("2024-01-10", "Ana", "OP1", "brida", 60),
            record("2024-01-11", "Ana", "OP2", "eje", 45),
            record("2024-02-01", "Luis", "OP1", "brida", 30),
        ]
    }

    #[test]
    fn groups_by_order_in_encounter_order() {
        let totals = group_by_order(&scenario(), None);
        let keys: Vec<&str> = totals.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["OP1", "OP2"]);
        assert_eq!(totals.get("OP1").unwrap().total_minutes, 90);
        assert_eq!(totals.get("OP2").unwrap().total_minutes, 45);
        assert_eq!(
            totals.get("OP1").unwrap().breakdown,
            vec![BreakdownEntry {
                key: "brida".into(),
                minutes: 90
            }]
        );
        assert_eq!(totals.total_minutes(), 135);
    }

    #[test]
    fn order_filter_keeps_one_group() {
        let records = scenario();
        let filtered = group_by_order(&records, Some("OP2"));
        assert_eq!(filtered.groups.len(), 1);
        assert_eq!(
            filtered.groups[0],
            group_by_order(&records, None).get("OP2").unwrap().clone()
        );

        assert!(group_by_order(&records, Some("OP9")).is_empty());
    }

    #[test]
    fn groups_by_month_with_person_breakdown() {
        let totals = group_by_month(&scenario(), None, MonthLocale::Es);
        assert_eq!(totals.groups.len(), 2);

        let january = totals.get("2024-01").unwrap();
        assert_eq!(january.label, "enero 2024");
        assert_eq!(january.total_minutes, 105);
        assert_eq!(january.breakdown.len(), 1);
        assert_eq!(january.breakdown[0].key, "Ana");

        let february: YearMonth = "2024-02".parse().unwrap();
        let only_feb = group_by_month(&scenario(), Some(february), MonthLocale::En);
        assert_eq!(only_feb.groups.len(), 1);
        assert_eq!(only_feb.groups[0].label, "February 2024");
        assert_eq!(only_feb.groups[0].total_minutes, 30);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_order(&[], None).is_empty());
        assert!(group_by_month(&[], None, MonthLocale::Es).is_empty());
    }
}
