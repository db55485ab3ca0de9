use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{sea_query::OnConflict, ActiveValue::NotSet, EntityTrait, Order, QueryOrder, Set};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, instrument};

use super::{OrderBy, RecordStore, Row, StoreBackend, StoreError, Table};
use crate::db::{self, DbPool};
use crate::entities::{employee_wage, production_record};

/// Record store over a sea-orm connection pool.
#[derive(Debug, Clone)]
pub struct SqlRecordStore {
    db: DbPool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewProductionRecord {
    fecha: NaiveDate,
    persona: String,
    op: String,
    cantidad: i32,
    item: String,
    tiempo_mecanizado: i32,
    tamano: String,
    maquina: String,
    #[serde(default)]
    observaciones: Option<String>,
}

impl From<NewProductionRecord> for production_record::ActiveModel {
    fn from(row: NewProductionRecord) -> Self {
        Self {
            id: NotSet,
            fecha: Set(row.fecha),
            persona: Set(row.persona),
            op: Set(row.op),
            cantidad: Set(row.cantidad),
            item: Set(row.item),
            tiempo_mecanizado: Set(row.tiempo_mecanizado),
            tamano: Set(row.tamano),
            maquina: Set(row.maquina),
            observaciones: Set(row.observaciones),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewEmployeeWage {
    persona: String,
    salario_por_hora: Decimal,
}

impl From<NewEmployeeWage> for employee_wage::ActiveModel {
    fn from(row: NewEmployeeWage) -> Self {
        Self {
            id: NotSet,
            persona: Set(row.persona),
            salario_por_hora: Set(row.salario_por_hora),
        }
    }
}

impl SqlRecordStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DbPool {
        &self.db
    }
}

fn decode<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| StoreError::InvalidRow {
        table,
        reason: e.to_string(),
    })
}

fn encode<M: Serialize>(table: Table, model: &M) -> Result<Row, StoreError> {
    match serde_json::to_value(model) {
        Ok(serde_json::Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::InvalidRow {
            table,
            reason: format!("model serialized to {} instead of an object", other),
        }),
        Err(e) => Err(StoreError::InvalidRow {
            table,
            reason: e.to_string(),
        }),
    }
}

fn column<C: FromStr>(table: Table, name: &str) -> Result<C, StoreError> {
    C::from_str(name).map_err(|_| StoreError::UnknownColumn {
        table,
        column: name.to_string(),
    })
}

fn sort_order(order_by: OrderBy) -> Order {
    if order_by.ascending {
        Order::Asc
    } else {
        Order::Desc
    }
}

#[async_trait]
impl RecordStore for SqlRecordStore {
    #[instrument(skip(self, row), fields(table = %table))]
    async fn insert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        match table {
            Table::ProductionRecords => {
                let model: production_record::ActiveModel =
                    decode::<NewProductionRecord>(table, row)?.into();
                production_record::Entity::insert(model)
                    .exec_without_returning(&self.db)
                    .await?;
            }
            Table::EmployeeWages => {
                let model: employee_wage::ActiveModel =
                    decode::<NewEmployeeWage>(table, row)?.into();
                employee_wage::Entity::insert(model)
                    .exec_without_returning(&self.db)
                    .await?;
            }
        }
        debug!("Row inserted");
        Ok(())
    }

    #[instrument(skip(self), fields(table = %table, order_by = order_by.field))]
    async fn select_all(&self, table: Table, order_by: OrderBy) -> Result<Vec<Row>, StoreError> {
        let rows = match table {
            Table::ProductionRecords => {
                let sort: production_record::Column = column(table, order_by.field)?;
                production_record::Entity::find()
                    .order_by(sort, sort_order(order_by))
                    .order_by_asc(production_record::Column::Id)
                    .all(&self.db)
                    .await?
                    .iter()
                    .map(|model| encode(table, model))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Table::EmployeeWages => {
                let sort: employee_wage::Column = column(table, order_by.field)?;
                employee_wage::Entity::find()
                    .order_by(sort, sort_order(order_by))
                    .order_by_asc(employee_wage::Column::Id)
                    .all(&self.db)
                    .await?
                    .iter()
                    .map(|model| encode(table, model))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        debug!(rows = rows.len(), "Rows selected");
        Ok(rows)
    }

    #[instrument(skip(self, row), fields(table = %table))]
    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<(), StoreError> {
        match table {
            Table::EmployeeWages => {
                let key: employee_wage::Column = column(table, conflict_key)?;
                if !matches!(key, employee_wage::Column::Persona) {
                    return Err(StoreError::InvalidRow {
                        table,
                        reason: format!("`{}` has no unique constraint", conflict_key),
                    });
                }

                let model: employee_wage::ActiveModel =
                    decode::<NewEmployeeWage>(table, row)?.into();
                employee_wage::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(employee_wage::Column::Persona)
                            .update_column(employee_wage::Column::SalarioPorHora)
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
            }
            Table::ProductionRecords => {
                // Production records are append-only and carry no natural key
                let _: production_record::Column = column(table, conflict_key)?;
                return Err(StoreError::InvalidRow {
                    table,
                    reason: format!("`{}` has no unique constraint", conflict_key),
                });
            }
        }
        debug!(conflict_key, "Row upserted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        db::check_connection(&self.db).await?;
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Sql
    }
}
