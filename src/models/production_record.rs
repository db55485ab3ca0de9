use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use super::numbers::count_from_json;
use super::{DataIntegrityError, YearMonth};
use crate::store::Row;

/// Column names of the `production_records` table.
pub mod columns {
    pub const ID: &str = "id";
    pub const DATE: &str = "fecha";
    pub const PERSON: &str = "persona";
    pub const ORDER_ID: &str = "op";
    pub const QUANTITY: &str = "cantidad";
    pub const ITEM: &str = "item";
    pub const MACHINE_MINUTES: &str = "tiempo_mecanizado";
    pub const SIZE: &str = "tamano";
    pub const MACHINE: &str = "maquina";
    pub const NOTES: &str = "observaciones";
}

/// One unit of machining work booked against a production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionRecord {
    /// Store-assigned identity; `None` until the record has been persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "persona")]
    pub person: String,
    #[serde(rename = "op")]
    pub order_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    pub item: String,
    #[serde(rename = "tiempo_mecanizado")]
    pub machine_minutes: u32,
    #[serde(rename = "tamano")]
    pub size: String,
    #[serde(rename = "maquina")]
    pub machine: String,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
}

impl ProductionRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    /// Row for inserting this record. The identity is left to the store.
    pub fn to_row(&self) -> Row {
        let mut row = Map::new();
        row.insert(
            columns::DATE.into(),
            Value::String(self.date.format("%Y-%m-%d").to_string()),
        );
        row.insert(columns::PERSON.into(), Value::String(self.person.clone()));
        row.insert(columns::ORDER_ID.into(), Value::String(self.order_id.clone()));
        row.insert(columns::QUANTITY.into(), Value::from(self.quantity));
        row.insert(columns::ITEM.into(), Value::String(self.item.clone()));
        row.insert(columns::MACHINE_MINUTES.into(), Value::from(self.machine_minutes));
        row.insert(columns::SIZE.into(), Value::String(self.size.clone()));
        row.insert(columns::MACHINE.into(), Value::String(self.machine.clone()));
        row.insert(
            columns::NOTES.into(),
            self.notes.clone().map(Value::String).unwrap_or(Value::Null),
        );
        row
    }

    /// Decodes a stored row, failing on any value that is not representable.
    pub fn from_row(row: &Row) -> Result<Self, DataIntegrityError> {
        let id = row.get(columns::ID).and_then(row_id);

        let count = |field: &'static str| -> Result<u32, DataIntegrityError> {
            let value = row.get(field).unwrap_or(&Value::Null);
            count_from_json(value)
                .map_err(|e| DataIntegrityError::new(id, field, value.to_string(), e.to_string()))
        };

        Ok(Self {
            id,
            date: date_field(row, id)?,
            person: text_field(row, columns::PERSON, id)?,
            order_id: text_field(row, columns::ORDER_ID, id)?,
            quantity: count(columns::QUANTITY)?,
            item: text_field(row, columns::ITEM, id)?,
            machine_minutes: count(columns::MACHINE_MINUTES)?,
            size: text_field(row, columns::SIZE, id)?,
            machine: text_field(row, columns::MACHINE, id)?,
            notes: match row.get(columns::NOTES) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.trim().is_empty() => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
        })
    }

    /// Decodes a full listing; the first corrupt row aborts the whole batch.
    pub fn decode_rows(rows: &[Row]) -> Result<Vec<Self>, DataIntegrityError> {
        rows.iter().map(Self::from_row).collect()
    }
}

fn row_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn text_field(
    row: &Row,
    field: &'static str,
    id: Option<i64>,
) -> Result<String, DataIntegrityError> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other @ (Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_))) => Err(
            DataIntegrityError::new(id, field, other.to_string(), "expected text"),
        ),
        None => Err(DataIntegrityError::new(id, field, "null", "is missing")),
    }
}

fn date_field(row: &Row, id: Option<i64>) -> Result<NaiveDate, DataIntegrityError> {
    let raw = text_field(row, columns::DATE, id)?;
    // Timestamp columns come back as RFC 3339; only the calendar day matters
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| {
            DataIntegrityError::new(
                id,
                columns::DATE,
                format!("{:?}", raw),
                "expected a YYYY-MM-DD date",
            )
        })
}
