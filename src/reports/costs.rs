use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::wage::columns as wage_columns;
use crate::models::{DataIntegrityError, ProductionRecord, WageLookup};

const MINUTES_PER_HOUR: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    pub person: String,
    pub minutes: u32,
    pub hourly_rate: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCost {
    pub order_id: String,
    pub total_minutes: u64,
    pub total_cost: Decimal,
    pub line_items: Vec<CostLineItem>,
}

/// Labor cost per production order, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub orders: Vec<OrderCost>,
}

impl CostSummary {
    pub fn get(&self, order_id: &str) -> Option<&OrderCost> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Sum over every order, or `None` if it does not fit in a `Decimal`.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.orders
            .iter()
            .try_fold(Decimal::ZERO, |acc, o| acc.checked_add(o.total_cost))
    }

    /// Copy with every amount rounded to cents for presentation.
    pub fn display_rounded(&self) -> Self {
        Self {
            orders: self
                .orders
                .iter()
                .map(|order| OrderCost {
                    order_id: order.order_id.clone(),
                    total_minutes: order.total_minutes,
                    total_cost: round_for_display(order.total_cost),
                    line_items: order
                        .line_items
                        .iter()
                        .map(|item| CostLineItem {
                            cost: round_for_display(item.cost),
                            ..item.clone()
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// `rate × minutes / 60`, multiplied first and never rounded.
///
/// `None` when the product does not fit in a `Decimal`.
pub fn line_cost(hourly_rate: Decimal, minutes: u32) -> Option<Decimal> {
    hourly_rate
        .checked_mul(Decimal::from(minutes))?
        .checked_div(Decimal::from(MINUTES_PER_HOUR))
}

/// Two decimal places, halves rounded away from zero.
pub fn round_for_display(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Costs every record at its person's hourly rate and rolls them up per order.
///
/// People without a wage record are costed at zero. A cost that overflows
/// is reported against the record whose wage produced it.
pub fn order_costs(
    records: &[ProductionRecord],
    wages: &WageLookup,
) -> Result<CostSummary, DataIntegrityError> {
    let mut orders: Vec<OrderCost> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let hourly_rate = wages.rate_for(&record.person);
        let overflow = || {
            DataIntegrityError::new(
                record.id,
                wage_columns::HOURLY_RATE,
                hourly_rate.to_string(),
                format!("labor cost of order {} overflows", record.order_id),
            )
        };
        let cost = line_cost(hourly_rate, record.machine_minutes).ok_or_else(overflow)?;

        let slot = *index.entry(record.order_id.as_str()).or_insert_with(|| {
            orders.push(OrderCost {
                order_id: record.order_id.clone(),
                total_minutes: 0,
                total_cost: Decimal::ZERO,
                line_items: Vec::new(),
            });
            orders.len() - 1
        });

        let order = &mut orders[slot];
        order.total_minutes += u64::from(record.machine_minutes);
        order.total_cost = order.total_cost.checked_add(cost).ok_or_else(overflow)?;
        order.line_items.push(CostLineItem {
            record_id: record.id,
            person: record.person.clone(),
            minutes: record.machine_minutes,
            hourly_rate,
            cost,
        });
    }

    Ok(CostSummary { orders })
}
