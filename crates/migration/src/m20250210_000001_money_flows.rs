use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum MoneyFlows {
    Table,
    Id,
    TenantId,
    OwnerId,
    PersonName,
    Kind,
    AmountMinor,
    RemainingAmountMinor,
    Status,
    StartedOn,
    DueOn,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum MoneyFlowPayments {
    Table,
    Id,
    MoneyFlowId,
    AmountMinor,
    PaidOn,
    PaymentMethod,
    Note,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MoneyFlows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoneyFlows::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MoneyFlows::TenantId).string().not_null())
                    .col(ColumnDef::new(MoneyFlows::OwnerId).string().not_null())
                    .col(ColumnDef::new(MoneyFlows::PersonName).string().not_null())
                    .col(ColumnDef::new(MoneyFlows::Kind).string().not_null())
                    .col(
                        ColumnDef::new(MoneyFlows::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(MoneyFlows::AmountMinor).gt(0)),
                    )
                    .col(
                        ColumnDef::new(MoneyFlows::RemainingAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MoneyFlows::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(MoneyFlows::StartedOn).date().not_null())
                    .col(ColumnDef::new(MoneyFlows::DueOn).date())
                    .col(ColumnDef::new(MoneyFlows::Note).string())
                    .col(ColumnDef::new(MoneyFlows::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-money_flows-scope-status")
                    .table(MoneyFlows::Table)
                    .col(MoneyFlows::TenantId)
                    .col(MoneyFlows::OwnerId)
                    .col(MoneyFlows::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MoneyFlowPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoneyFlowPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MoneyFlowPayments::MoneyFlowId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MoneyFlowPayments::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(MoneyFlowPayments::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(MoneyFlowPayments::PaidOn).date().not_null())
                    .col(ColumnDef::new(MoneyFlowPayments::PaymentMethod).string())
                    .col(ColumnDef::new(MoneyFlowPayments::Note).string())
                    .col(
                        ColumnDef::new(MoneyFlowPayments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-money_flow_payments-money_flow_id")
                            .from(MoneyFlowPayments::Table, MoneyFlowPayments::MoneyFlowId)
                            .to(MoneyFlows::Table, MoneyFlows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-money_flow_payments-money_flow_id")
                    .table(MoneyFlowPayments::Table)
                    .col(MoneyFlowPayments::MoneyFlowId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MoneyFlowPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MoneyFlows::Table).to_owned())
            .await?;
        Ok(())
    }
}
