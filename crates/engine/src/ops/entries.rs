//! Standalone entries: income, expense, give and receive.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    CategoryKind, EngineError, EntryCmd, EntryKind, EntryTag, LedgerEntry,
    ResultEngine, TenantScope, entries,
    reconcile::{apply_entry_created, apply_entry_deleted, apply_entry_updated},
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Narrow [`Engine::list_entries`]. Every field is optional.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    /// Entries of this holder, including contact entries it funded.
    pub holder_id: Option<Uuid>,
    pub kind: Option<EntryTag>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
}

impl EntryFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn holder_id(mut self, holder_id: Uuid) -> Self {
        self.holder_id = Some(holder_id);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: EntryTag) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Engine {
    /// Record an entry and move the balances it touches.
    pub async fn record_entry(
        &self,
        scope: &TenantScope,
        cmd: EntryCmd,
    ) -> ResultEngine<LedgerEntry> {
        cmd.validate()?;
        with_tx!(self, |db_tx| {
            let kind = self.check_entry_refs(&db_tx, scope, &cmd).await?;
            let entry = LedgerEntry {
                id: Uuid::new_v4(),
                tenant_id: scope.tenant_id,
                owner_id: scope.owner_id,
                holder_id: cmd.holder_id,
                wallet_id: cmd.wallet_id,
                category_id: cmd.category_id,
                kind,
                amount_minor: cmd.amount_minor,
                occurred_on: cmd.occurred_on,
                note: normalize_optional_text(cmd.note.as_deref()),
                created_at: Utc::now(),
            };
            entries::ActiveModel::from(&entry).insert(&db_tx).await?;
            self.reconcile(&db_tx, scope, &apply_entry_created(&entry)?)
                .await?;
            Ok(entry)
        })
    }

    /// Replace every editable field of an entry.
    ///
    /// The old effect is reversed and the new one applied, so moving an entry
    /// to another holder updates both holders.
    pub async fn update_entry(
        &self,
        scope: &TenantScope,
        entry_id: Uuid,
        cmd: EntryCmd,
    ) -> ResultEngine<LedgerEntry> {
        cmd.validate()?;
        with_tx!(self, |db_tx| {
            let old = LedgerEntry::try_from(self.require_entry(&db_tx, scope, entry_id).await?)?;
            if old.kind.is_transfer() {
                return Err(EngineError::Validation(
                    "transfer entries are changed together, use update_transfer".to_string(),
                ));
            }
            let kind = self.check_entry_refs(&db_tx, scope, &cmd).await?;
            let new = LedgerEntry {
                holder_id: cmd.holder_id,
                wallet_id: cmd.wallet_id,
                category_id: cmd.category_id,
                kind,
                amount_minor: cmd.amount_minor,
                occurred_on: cmd.occurred_on,
                note: normalize_optional_text(cmd.note.as_deref()),
                ..old.clone()
            };
            entries::ActiveModel::from(&new).update(&db_tx).await?;
            self.reconcile(&db_tx, scope, &apply_entry_updated(&old, &new)?)
                .await?;
            Ok(new)
        })
    }

    /// Delete a standalone entry and reverse its effect.
    pub async fn delete_entry(&self, scope: &TenantScope, entry_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_entry(&db_tx, scope, entry_id).await?;
            let entry = LedgerEntry::try_from(model.clone())?;
            if entry.kind.is_transfer() {
                return Err(EngineError::Unsupported(
                    "deleting one side of a transfer, use delete_transfer".to_string(),
                ));
            }
            model.delete(&db_tx).await?;
            self.reconcile(&db_tx, scope, &apply_entry_deleted(&entry)?)
                .await?;
            tracing::info!(entry = %entry_id, kind = entry.kind.as_str(), "entry deleted");
            Ok(())
        })
    }

    pub async fn entry(&self, scope: &TenantScope, entry_id: Uuid) -> ResultEngine<LedgerEntry> {
        let model = self.require_entry(&self.database, scope, entry_id).await?;
        LedgerEntry::try_from(model)
    }

    /// Entries in scope, newest first.
    pub async fn list_entries(
        &self,
        scope: &TenantScope,
        filter: &EntryFilter,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let mut query = entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()));
        if let Some(holder_id) = filter.holder_id {
            let key = holder_id.to_string();
            query = query.filter(
                Condition::any()
                    .add(entries::Column::HolderId.eq(key.clone()))
                    .add(entries::Column::WalletId.eq(key)),
            );
        }
        if let Some(kind) = filter.kind {
            query = query.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(entries::Column::CategoryId.eq(category_id.to_string()));
        }
        if let Some(from) = filter.from {
            query = query.filter(entries::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(entries::Column::OccurredOn.lte(to));
        }
        query = query
            .order_by_desc(entries::Column::OccurredOn)
            .order_by_desc(entries::Column::CreatedAt);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    /// Check the holder, wallet and category an entry points at.
    async fn check_entry_refs(
        &self,
        db: &DatabaseTransaction,
        scope: &TenantScope,
        cmd: &EntryCmd,
    ) -> ResultEngine<EntryKind> {
        let kind = cmd.kind.plain_kind().ok_or_else(|| {
            EngineError::Validation("transfer entries only exist in pairs".to_string())
        })?;

        if cmd.kind.is_contact() {
            self.require_contact(db, scope, cmd.holder_id).await?;
            if let Some(wallet_id) = cmd.wallet_id {
                self.require_funds_holder(db, scope, wallet_id).await?;
            }
        } else {
            self.require_funds_holder(db, scope, cmd.holder_id).await?;
        }

        if let Some(category_id) = cmd.category_id {
            let category = self.require_category(db, scope, category_id).await?;
            let expected = match cmd.kind {
                EntryTag::Income => CategoryKind::Income,
                _ => CategoryKind::Expense,
            };
            if CategoryKind::try_from(category.kind.as_str())? != expected {
                return Err(EngineError::Validation(format!(
                    "category {} is not an {} category",
                    category.name,
                    expected.as_str()
                )));
            }
        }
        Ok(kind)
    }

    pub(super) async fn count_entries_where<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        condition: Condition,
    ) -> ResultEngine<u64> {
        entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .filter(condition)
            .count(db)
            .await
            .map_err(Into::into)
    }
}
