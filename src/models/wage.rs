use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

use super::production_record::text_field;
use super::DataIntegrityError;
use crate::store::Row;

/// Column names of the `employee_wages` table.
pub mod columns {
    pub const PERSON: &str = "persona";
    pub const HOURLY_RATE: &str = "salario_por_hora";
}

/// Largest hourly rate accepted from the wage form or read from a store.
pub const MAX_HOURLY_RATE: Decimal = dec!(1000000000);

/// Decimal places accepted for an hourly rate entered in the wage form.
pub const MAX_RATE_SCALE: u32 = 4;

/// Hourly wage of one person. At most one exists per person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRecord {
    #[serde(rename = "persona")]
    pub person: String,
    #[serde(rename = "salario_por_hora")]
    pub hourly_rate: Decimal,
}

impl WageRecord {
    pub fn to_row(&self) -> Row {
        let mut row = Map::new();
        row.insert(columns::PERSON.into(), Value::String(self.person.clone()));
        row.insert(
            columns::HOURLY_RATE.into(),
            Value::String(self.hourly_rate.normalize().to_string()),
        );
        row
    }

    pub fn from_row(row: &Row) -> Result<Self, DataIntegrityError> {
        let person = text_field(row, columns::PERSON, None)?;
        let raw = row.get(columns::HOURLY_RATE).unwrap_or(&Value::Null);

        let invalid = |reason: &str| {
            DataIntegrityError::new(None, columns::HOURLY_RATE, raw.to_string(), reason)
        };

        let rate = match raw {
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|_| invalid("expected a decimal number"))?
            }
            Value::String(s) => {
                Decimal::from_str(s.trim()).map_err(|_| invalid("expected a decimal number"))?
            }
            Value::Null => return Err(invalid("is missing")),
            _ => return Err(invalid("expected a decimal number")),
        };

        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(invalid("must not be negative"));
        }
        if rate > MAX_HOURLY_RATE {
            return Err(invalid("exceeds the largest accepted hourly rate"));
        }

        Ok(Self {
            person,
            hourly_rate: rate,
        })
    }

    pub fn decode_rows(rows: &[Row]) -> Result<Vec<Self>, DataIntegrityError> {
        rows.iter().map(Self::from_row).collect()
    }
}

/// Person to hourly rate lookup; people without a wage cost nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WageLookup {
    rates: HashMap<String, Decimal>,
}

impl WageLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[WageRecord]) -> Self {
        records.iter().cloned().collect()
    }

    pub fn rate_for(&self, person: &str) -> Decimal {
        self.rates.get(person).copied().unwrap_or(Decimal::ZERO)
    }
}

impl FromIterator<WageRecord> for WageLookup {
    fn from_iter<I: IntoIterator<Item = WageRecord>>(iter: I) -> Self {
        Self {
            rates: iter
                .into_iter()
                .map(|w| (w.person, w.hourly_rate))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn decodes_numeric_and_text_rates() {
        let from_number =
            WageRecord::from_row(&row(json!({"persona": "Ana", "salario_por_hora": 10.5})))
                .unwrap();
        assert_eq!(from_number.hourly_rate, dec!(10.5));

        let from_text =
            WageRecord::from_row(&row(json!({"persona": "Luis", "salario_por_hora": "12.25"})))
                .unwrap();
        assert_eq!(from_text.hourly_rate, dec!(12.25));
    }

    #[test]
    fn rejects_bad_rates() {
        for bad in [
            json!("diez"),
            json!(-4),
            json!(null),
            json!(true),
            json!("79228162514264337593543950335"),
        ] {
            let result =
                WageRecord::from_row(&row(json!({"persona": "Ana", "salario_por_hora": bad})));
            assert!(result.is_err());
        }
    }

    #[test]
    fn lookup_defaults_to_zero() {
        let lookup = WageLookup::from_records(&[WageRecord {
            person: "Ana".into(),
            hourly_rate: dec!(10),
        }]);
        assert_eq!(lookup.rate_for("Ana"), dec!(10));
        assert_eq!(lookup.rate_for("Nadie"), Decimal::ZERO);
    }
}
