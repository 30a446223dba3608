//! Cached balance maintenance.

use sea_orm::{
    ActiveModelTrait, ActiveValue, Condition, ConnectionTrait, DatabaseTransaction, QueryFilter,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BalanceDrift, LedgerEntry, ResultEngine, TenantScope, entries, holders,
    money::add_minor,
    reconcile::{BalanceChanges, derive_balance},
    util::parse_uuid,
};

use super::{Engine, ReconcileMode, with_tx};

impl Engine {
    /// Bring every holder in `changes` up to date inside the caller's
    /// transaction.
    pub(super) async fn reconcile(
        &self,
        db: &DatabaseTransaction,
        scope: &TenantScope,
        changes: &BalanceChanges,
    ) -> ResultEngine<()> {
        for (holder_id, delta) in changes.iter() {
            let holder = self.require_holder(db, scope, holder_id).await?;
            let balance = match self.reconcile_mode {
                ReconcileMode::Incremental => add_minor(holder.balance_minor, delta)?,
                ReconcileMode::Recompute => {
                    let entries = self.entries_touching(db, scope, holder_id).await?;
                    derive_balance(holder_id, holder.initial_balance_minor, &entries)?
                }
            };
            tracing::debug!(
                holder = %holder_id,
                delta,
                from = holder.balance_minor,
                to = balance,
                mode = ?self.reconcile_mode,
                "reconciled balance"
            );
            if balance != holder.balance_minor {
                let mut active: holders::ActiveModel = holder.into();
                active.balance_minor = ActiveValue::Set(balance);
                active.update(db).await?;
            }
        }
        Ok(())
    }

    /// Entries affecting a holder directly or as the wallet of a contact
    /// entry.
    async fn entries_touching<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        holder_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let key = holder_id.to_string();
        entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .filter(
                Condition::any()
                    .add(entries::Column::HolderId.eq(key.clone()))
                    .add(entries::Column::WalletId.eq(key)),
            )
            .all(db)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    async fn scope_entries<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .all(db)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    async fn scope_holders<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
    ) -> ResultEngine<Vec<holders::Model>> {
        holders::Entity::find()
            .filter(holders::Column::TenantId.eq(scope.tenant_key()))
            .filter(holders::Column::OwnerId.eq(scope.owner_key()))
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Rebuild every cached balance in scope from the entries.
    ///
    /// Returns how many holders had a stale balance.
    pub async fn recompute_balances(&self, scope: &TenantScope) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let entries = self.scope_entries(&db_tx, scope).await?;
            let mut changed = 0usize;
            for holder in self.scope_holders(&db_tx, scope).await? {
                let holder_id = parse_uuid(&holder.id, "holder")?;
                let derived = derive_balance(holder_id, holder.initial_balance_minor, &entries)?;
                if derived != holder.balance_minor {
                    tracing::info!(
                        holder = %holder_id,
                        cached = holder.balance_minor,
                        derived,
                        "repaired holder balance"
                    );
                    let mut active: holders::ActiveModel = holder.into();
                    active.balance_minor = ActiveValue::Set(derived);
                    active.update(&db_tx).await?;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    /// Compare cached balances with the entries without writing anything.
    pub async fn audit_balances(&self, scope: &TenantScope) -> ResultEngine<Vec<BalanceDrift>> {
        let entries = self.scope_entries(&self.database, scope).await?;
        let mut drift = Vec::new();
        for holder in self.scope_holders(&self.database, scope).await? {
            let holder_id = parse_uuid(&holder.id, "holder")?;
            let derived = derive_balance(holder_id, holder.initial_balance_minor, &entries)?;
            if derived != holder.balance_minor {
                tracing::warn!(
                    holder = %holder_id,
                    cached = holder.balance_minor,
                    derived,
                    "balance drift"
                );
                drift.push(BalanceDrift {
                    holder_id,
                    name: holder.name,
                    cached_minor: holder.balance_minor,
                    derived_minor: derived,
                });
            }
        }
        Ok(drift)
    }
}
