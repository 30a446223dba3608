pub use sea_orm_migration::prelude::*;

mod m20250209_000001_ledger;
mod m20250210_000001_money_flows;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250209_000001_ledger::Migration),
            Box::new(m20250210_000001_money_flows::Migration),
        ]
    }
}
