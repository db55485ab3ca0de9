use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub fecha: Date,
    pub persona: String,
    pub op: String,
    pub cantidad: i32,
    pub item: String,
    pub tiempo_mecanizado: i32,
    pub tamano: String,
    pub maquina: String,
    #[sea_orm(nullable)]
    pub observaciones: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
