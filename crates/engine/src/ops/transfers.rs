//! Paired transfers between accounts and wallets.
//!
//! A transfer is two entries sharing a `pair_id`: `out` on the source and
//! `in` on the destination. They are written, changed and deleted together.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, LedgerEntry, ResultEngine, TenantScope, Transfer, TransferCmd,
    TransferDirection, UpdateTransferCmd, entries,
    reconcile::{apply_entry_created, apply_entry_deleted, apply_entry_updated},
    util::{normalize_optional_text, require_positive_amount},
};

use super::{Engine, with_tx};

fn mirror_note(source_name: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("Transfer from {source_name} - {description}"),
        None => format!("Transfer from {source_name}"),
    }
}

impl Engine {
    /// Move money from one account or wallet to another.
    ///
    /// The source is debited before the destination is checked; a missing
    /// destination rolls the whole transfer back.
    pub async fn transfer(&self, scope: &TenantScope, cmd: TransferCmd) -> ResultEngine<Transfer> {
        cmd.validate()?;
        let description = normalize_optional_text(cmd.description.as_deref());
        with_tx!(self, |db_tx| {
            let source = self.require_funds_holder(&db_tx, scope, cmd.from).await?;
            let pair_id = Uuid::new_v4();
            let created_at = Utc::now();

            let outbound = LedgerEntry {
                id: Uuid::new_v4(),
                tenant_id: scope.tenant_id,
                owner_id: scope.owner_id,
                holder_id: cmd.from,
                wallet_id: None,
                category_id: None,
                kind: EntryKind::Transfer {
                    pair_id,
                    direction: TransferDirection::Out,
                },
                amount_minor: cmd.amount_minor,
                occurred_on: cmd.occurred_on,
                note: description.clone(),
                created_at,
            };
            entries::ActiveModel::from(&outbound).insert(&db_tx).await?;
            self.reconcile(&db_tx, scope, &apply_entry_created(&outbound)?)
                .await?;

            self.require_funds_holder(&db_tx, scope, cmd.to).await?;
            let inbound = LedgerEntry {
                id: Uuid::new_v4(),
                holder_id: cmd.to,
                kind: EntryKind::Transfer {
                    pair_id,
                    direction: TransferDirection::In,
                },
                note: Some(mirror_note(&source.name, description.as_deref())),
                ..outbound.clone()
            };
            entries::ActiveModel::from(&inbound).insert(&db_tx).await?;
            self.reconcile(&db_tx, scope, &apply_entry_created(&inbound)?)
                .await?;

            tracing::info!(
                pair = %pair_id,
                from = %cmd.from,
                to = %cmd.to,
                amount_minor = cmd.amount_minor,
                "transfer recorded"
            );
            Ok(Transfer {
                pair_id,
                source: outbound,
                destination: inbound,
            })
        })
    }

    pub async fn transfer_pair(&self, scope: &TenantScope, pair_id: Uuid) -> ResultEngine<Transfer> {
        self.load_transfer(&self.database, scope, pair_id).await
    }

    /// Delete both sides of a transfer and reverse both balances.
    pub async fn delete_transfer(&self, scope: &TenantScope, pair_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let transfer = self.load_transfer(&db_tx, scope, pair_id).await?;
            entries::Entity::delete_many()
                .filter(entries::Column::TenantId.eq(scope.tenant_key()))
                .filter(entries::Column::OwnerId.eq(scope.owner_key()))
                .filter(entries::Column::TransferGroupId.eq(pair_id.to_string()))
                .exec(&db_tx)
                .await?;
            let mut changes = apply_entry_deleted(&transfer.source)?;
            changes.merge(apply_entry_deleted(&transfer.destination)?)?;
            self.reconcile(&db_tx, scope, &changes).await?;
            tracing::info!(pair = %pair_id, "transfer deleted");
            Ok(())
        })
    }

    /// Change amount, date or description on both sides at once.
    pub async fn update_transfer(
        &self,
        scope: &TenantScope,
        pair_id: Uuid,
        cmd: UpdateTransferCmd,
    ) -> ResultEngine<Transfer> {
        require_positive_amount(cmd.amount_minor)?;
        let description = normalize_optional_text(cmd.description.as_deref());
        with_tx!(self, |db_tx| {
            let old = self.load_transfer(&db_tx, scope, pair_id).await?;
            let source = self
                .require_holder(&db_tx, scope, old.source.holder_id)
                .await?;
            let occurred_on = cmd.occurred_on.unwrap_or(old.source.occurred_on);

            let mut source_entry = old.source.clone();
            source_entry.amount_minor = cmd.amount_minor;
            source_entry.occurred_on = occurred_on;
            let mut destination_entry = old.destination.clone();
            destination_entry.amount_minor = cmd.amount_minor;
            destination_entry.occurred_on = occurred_on;
            if cmd.description.is_some() {
                source_entry.note = description.clone();
                destination_entry.note =
                    Some(mirror_note(&source.name, description.as_deref()));
            }

            entries::ActiveModel::from(&source_entry)
                .update(&db_tx)
                .await?;
            entries::ActiveModel::from(&destination_entry)
                .update(&db_tx)
                .await?;
            let mut changes = apply_entry_updated(&old.source, &source_entry)?;
            changes.merge(apply_entry_updated(&old.destination, &destination_entry)?)?;
            self.reconcile(&db_tx, scope, &changes).await?;

            Ok(Transfer {
                pair_id,
                source: source_entry,
                destination: destination_entry,
            })
        })
    }

    async fn load_transfer<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        pair_id: Uuid,
    ) -> ResultEngine<Transfer> {
        let rows = entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .filter(entries::Column::TransferGroupId.eq(pair_id.to_string()))
            .all(db)
            .await?;

        let mut source = None;
        let mut destination = None;
        for row in rows {
            let entry = LedgerEntry::try_from(row)?;
            match entry.kind {
                EntryKind::Transfer {
                    direction: TransferDirection::Out,
                    ..
                } => source = Some(entry),
                EntryKind::Transfer {
                    direction: TransferDirection::In,
                    ..
                } => destination = Some(entry),
                _ => {}
            }
        }
        match (source, destination) {
            (Some(source), Some(destination)) => Ok(Transfer {
                pair_id,
                source,
                destination,
            }),
            (None, None) => Err(EngineError::KeyNotFound("transfer".to_string())),
            _ => Err(EngineError::Conflict(format!(
                "transfer {pair_id} is missing one side"
            ))),
        }
    }
}
