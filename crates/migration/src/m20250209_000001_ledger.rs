use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Holders {
    Table,
    Id,
    TenantId,
    OwnerId,
    Kind,
    Name,
    NameNorm,
    AccountType,
    Phone,
    Email,
    Address,
    Notes,
    InitialBalanceMinor,
    BalanceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    TenantId,
    OwnerId,
    Kind,
    Name,
    NameNorm,
    Color,
    Icon,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    TenantId,
    OwnerId,
    HolderId,
    WalletId,
    CategoryId,
    Kind,
    TransferGroupId,
    TransferDirection,
    AmountMinor,
    OccurredOn,
    Note,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Holders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Holders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Holders::TenantId).string().not_null())
                    .col(ColumnDef::new(Holders::OwnerId).string().not_null())
                    .col(ColumnDef::new(Holders::Kind).string().not_null())
                    .col(ColumnDef::new(Holders::Name).string().not_null())
                    .col(ColumnDef::new(Holders::NameNorm).string().not_null())
                    .col(ColumnDef::new(Holders::AccountType).string())
                    .col(ColumnDef::new(Holders::Phone).string())
                    .col(ColumnDef::new(Holders::Email).string())
                    .col(ColumnDef::new(Holders::Address).string())
                    .col(ColumnDef::new(Holders::Notes).string())
                    .col(
                        ColumnDef::new(Holders::InitialBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Holders::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Holders::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-holders-scope-kind-name_norm-unique")
                    .table(Holders::Table)
                    .col(Holders::TenantId)
                    .col(Holders::OwnerId)
                    .col(Holders::Kind)
                    .col(Holders::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::TenantId).string().not_null())
                    .col(ColumnDef::new(Categories::OwnerId).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-scope-kind-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::TenantId)
                    .col(Categories::OwnerId)
                    .col(Categories::Kind)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::TenantId).string().not_null())
                    .col(ColumnDef::new(Entries::OwnerId).string().not_null())
                    .col(ColumnDef::new(Entries::HolderId).string().not_null())
                    .col(ColumnDef::new(Entries::WalletId).string())
                    .col(ColumnDef::new(Entries::CategoryId).string())
                    .col(ColumnDef::new(Entries::Kind).string().not_null())
                    .col(ColumnDef::new(Entries::TransferGroupId).string())
                    .col(ColumnDef::new(Entries::TransferDirection).string())
                    .col(
                        ColumnDef::new(Entries::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Entries::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(Entries::OccurredOn).date().not_null())
                    .col(ColumnDef::new(Entries::Note).string())
                    .col(ColumnDef::new(Entries::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-holder_id")
                            .from(Entries::Table, Entries::HolderId)
                            .to(Holders::Table, Holders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-wallet_id")
                            .from(Entries::Table, Entries::WalletId)
                            .to(Holders::Table, Holders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-category_id")
                            .from(Entries::Table, Entries::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-scope-occurred_on")
                    .table(Entries::Table)
                    .col(Entries::TenantId)
                    .col(Entries::OwnerId)
                    .col(Entries::OccurredOn)
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-entries-holder_id", Entries::HolderId),
            ("idx-entries-wallet_id", Entries::WalletId),
            ("idx-entries-category_id", Entries::CategoryId),
            ("idx-entries-transfer_group_id", Entries::TransferGroupId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Entries::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Holders::Table).to_owned())
            .await?;
        Ok(())
    }
}
