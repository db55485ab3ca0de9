use serde::Serialize;

use super::{GroupedTotals, GroupingMode};

const Y_AXIS: &str = "Tiempo (minutos)";

/// Bar chart series built from grouped machine time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataset {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub series_label: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartDataset {
    pub fn from_grouped(totals: &GroupedTotals) -> Self {
        let (title, x_axis, series_label) = match totals.mode {
            GroupingMode::ByOrder => (
                "Tiempo Total por OP",
                "Orden de Producción",
                "Tiempo Total (min)",
            ),
            GroupingMode::ByMonth => (
                "Tiempo Total por Mes",
                "Mes",
                "Tiempo Total por Mes (min)",
            ),
        };

        Self {
            title: title.to_string(),
            x_axis: x_axis.to_string(),
            y_axis: Y_AXIS.to_string(),
            series_label: series_label.to_string(),
            labels: totals.groups.iter().map(|g| g.label.clone()).collect(),
            values: totals.groups.iter().map(|g| g.total_minutes).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::machine_time::tests::record;
    use crate::reports::{group_by_month, group_by_order, MonthLocale};

    #[test]
    fn order_chart_uses_order_ids() {
        let records = vec![
            record("2024-01-10", "Ana", "OP1", "brida", 60),
            record("2024-01-11", "Ana", "OP2", "eje", 45),
        ];
        let chart = ChartDataset::from_grouped(&group_by_order(&records, None));
        assert_eq!(chart.title, "Tiempo Total por OP");
        assert_eq!(chart.x_axis, "Orden de Producción");
        assert_eq!(chart.labels, vec!["OP1", "OP2"]);
        assert_eq!(chart.values, vec![60, 45]);
    }

    #[test]
    fn month_chart_uses_month_labels() {
        let records = vec![record("2024-03-05", "Ana", "OP1", "brida", 20)];
        let chart =
            ChartDataset::from_grouped(&group_by_month(&records, None, MonthLocale::Es));
        assert_eq!(chart.series_label, "Tiempo Total por Mes (min)");
        assert_eq!(chart.labels, vec!["marzo 2024"]);
        assert_eq!(chart.y_axis, "Tiempo (minutos)");
    }
}
