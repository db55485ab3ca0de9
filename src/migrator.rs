use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_production_records_table::Migration),
            Box::new(m20240101_000002_create_employee_wages_table::Migration),
        ]
    }
}

mod m20240101_000001_create_production_records_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_production_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionRecords::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductionRecords::Fecha).date().not_null())
                        .col(ColumnDef::new(ProductionRecords::Persona).string().not_null())
                        .col(ColumnDef::new(ProductionRecords::Op).string().not_null())
                        .col(
                            ColumnDef::new(ProductionRecords::Cantidad)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionRecords::Item).string().not_null())
                        .col(
                            ColumnDef::new(ProductionRecords::TiempoMecanizado)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionRecords::Tamano).string().not_null())
                        .col(ColumnDef::new(ProductionRecords::Maquina).string().not_null())
                        .col(ColumnDef::new(ProductionRecords::Observaciones).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_records_fecha")
                        .table(ProductionRecords::Table)
                        .col(ProductionRecords::Fecha)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_records_op")
                        .table(ProductionRecords::Table)
                        .col(ProductionRecords::Op)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionRecords {
        Table,
        Id,
        Fecha,
        Persona,
        Op,
        Cantidad,
        Item,
        TiempoMecanizado,
        Tamano,
        Maquina,
        Observaciones,
    }
}

mod m20240101_000002_create_employee_wages_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_employee_wages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(EmployeeWages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EmployeeWages::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(EmployeeWages::Persona).string().not_null())
                        .col(
                            ColumnDef::new(EmployeeWages::SalarioPorHora)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // Upserts resolve conflicts on this index
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_employee_wages_persona")
                        .table(EmployeeWages::Table)
                        .col(EmployeeWages::Persona)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EmployeeWages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum EmployeeWages {
        Table,
        Id,
        Persona,
        SalarioPorHora,
    }
}
