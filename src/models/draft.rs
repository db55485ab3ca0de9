//! Form drafts: user input held as entered text until it is submitted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

use super::numbers::parse_count;
use super::production_record::columns as record_columns;
use super::wage::{columns as wage_columns, MAX_HOURLY_RATE, MAX_RATE_SCALE};
use super::{ProductionRecord, WageRecord};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("is required".into());
        return Err(err);
    }
    Ok(())
}

fn field_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into().into());
    err
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Numeric form fields arrive as text from a form and as numbers from JSON
/// clients; both end up as the text the parser sees.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => String::new(),
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Number(number)) => match (number.as_i64(), number.as_f64()) {
            (Some(n), _) => n.to_string(),
            (None, Some(f)) if number.as_u64().is_none() => f.to_string(),
            _ => number.to_string(),
        },
    })
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Production record as typed into the entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProductionRecordDraft {
    #[serde(rename = "fecha")]
    #[validate(custom = "not_blank")]
    pub date: String,
    #[serde(rename = "persona")]
    #[validate(custom = "not_blank")]
    pub person: String,
    #[serde(rename = "op")]
    #[validate(custom = "not_blank")]
    pub order_id: String,
    #[serde(rename = "cantidad", deserialize_with = "text_or_number")]
    #[validate(custom = "not_blank")]
    pub quantity: String,
    #[validate(custom = "not_blank")]
    pub item: String,
    #[serde(rename = "tiempo_mecanizado", deserialize_with = "text_or_number")]
    #[validate(custom = "not_blank")]
    pub machine_minutes: String,
    #[serde(rename = "tamano")]
    #[validate(custom = "not_blank")]
    pub size: String,
    #[serde(rename = "maquina")]
    #[validate(custom = "not_blank")]
    pub machine: String,
    #[serde(rename = "observaciones")]
    pub notes: String,
}

impl ProductionRecordDraft {
    /// Empty form with the date preset to `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }

    /// Validates every field and converts the draft into a record.
    ///
    /// All field problems are reported together; nothing is coerced.
    pub fn parse(&self) -> Result<ProductionRecord, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let date = if self.date.trim().is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add(
                        record_columns::DATE,
                        field_error("date", "must be a date in YYYY-MM-DD form"),
                    );
                    None
                }
            }
        };

        let mut count = |field: &'static str, text: &str| -> Option<u32> {
            if text.trim().is_empty() {
                return None;
            }
            match parse_count(text) {
                Ok(n) => Some(n),
                Err(e) => {
                    errors.add(field, field_error("whole_number", e.to_string()));
                    None
                }
            }
        };

        let quantity = count(record_columns::QUANTITY, &self.quantity);
        let machine_minutes = count(record_columns::MACHINE_MINUTES, &self.machine_minutes);

        into_result(errors)?;

        match (date, quantity, machine_minutes) {
            (Some(date), Some(quantity), Some(machine_minutes)) => {
                let notes = self.notes.trim();
                Ok(ProductionRecord {
                    id: None,
                    date,
                    person: self.person.trim().to_string(),
                    order_id: self.order_id.trim().to_string(),
                    quantity,
                    item: self.item.trim().to_string(),
                    machine_minutes,
                    size: self.size.trim().to_string(),
                    machine: self.machine.trim().to_string(),
                    notes: (!notes.is_empty()).then(|| notes.to_string()),
                })
            }
            // Blank required fields were already reported by `validate`
            _ => {
                let mut errors = ValidationErrors::new();
                errors.add(record_columns::DATE, field_error("required", "is required"));
                Err(errors)
            }
        }
    }
}

/// Wage entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WageDraft {
    #[serde(rename = "persona")]
    #[validate(custom = "not_blank")]
    pub person: String,
    #[serde(rename = "salario_por_hora", deserialize_with = "text_or_number")]
    #[validate(custom = "not_blank")]
    pub hourly_rate: String,
}

impl WageDraft {
    pub fn parse(&self) -> Result<WageRecord, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let text = self.hourly_rate.trim();
        let rate = if text.is_empty() {
            None
        } else {
            match Decimal::from_str(text) {
                Ok(rate) if rate.is_sign_negative() && !rate.is_zero() => {
                    errors.add(
                        wage_columns::HOURLY_RATE,
                        field_error("non_negative", "must not be negative"),
                    );
                    None
                }
                Ok(rate) if rate > MAX_HOURLY_RATE => {
                    errors.add(
                        wage_columns::HOURLY_RATE,
                        field_error("range", format!("must be at most {}", MAX_HOURLY_RATE)),
                    );
                    None
                }
                Ok(rate) if rate.scale() > MAX_RATE_SCALE => {
                    errors.add(
                        wage_columns::HOURLY_RATE,
                        field_error(
                            "precision",
                            format!("must have at most {} decimal places", MAX_RATE_SCALE),
                        ),
                    );
                    None
                }
                Ok(rate) => Some(rate),
                Err(_) => {
                    errors.add(
                        wage_columns::HOURLY_RATE,
                        field_error("decimal", "must be a decimal number"),
                    );
                    None
                }
            }
        };

        into_result(errors)?;

        match rate {
            Some(hourly_rate) => Ok(WageRecord {
                person: self.person.trim().to_string(),
                hourly_rate,
            }),
            None => {
                let mut errors = ValidationErrors::new();
                errors.add(wage_columns::HOURLY_RATE, field_error("required", "is required"));
                Err(errors)
            }
        }
    }
}
