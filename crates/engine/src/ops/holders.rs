use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Holder, HolderKind, HolderUpdate, NewHolderCmd, ResultEngine, TenantScope,
    entries, holders,
    util::{normalize_optional_text, normalize_required_name, require_name_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create an account, wallet or contact. Its balance starts at the
    /// initial balance.
    pub async fn new_holder(&self, scope: &TenantScope, cmd: NewHolderCmd) -> ResultEngine<Holder> {
        cmd.validate()?;
        let name = normalize_required_name(&cmd.name, cmd.kind.as_str())?;
        let name_norm = require_name_key(&name, cmd.kind.as_str())?;
        with_tx!(self, |db_tx| {
            self.ensure_holder_name_free(&db_tx, scope, cmd.kind, &name_norm, None)
                .await?;
            let model = holders::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                tenant_id: ActiveValue::Set(scope.tenant_key()),
                owner_id: ActiveValue::Set(scope.owner_key()),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                account_type: ActiveValue::Set(
                    cmd.account_type.map(|ty| ty.as_str().to_string()),
                ),
                phone: ActiveValue::Set(normalize_optional_text(cmd.phone.as_deref())),
                email: ActiveValue::Set(normalize_optional_text(cmd.email.as_deref())),
                address: ActiveValue::Set(normalize_optional_text(cmd.address.as_deref())),
                notes: ActiveValue::Set(normalize_optional_text(cmd.notes.as_deref())),
                initial_balance_minor: ActiveValue::Set(cmd.initial_balance_minor),
                balance_minor: ActiveValue::Set(cmd.initial_balance_minor),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Holder::try_from(model)
        })
    }

    /// Change holder metadata. Balances are never edited here.
    pub async fn update_holder(
        &self,
        scope: &TenantScope,
        holder_id: Uuid,
        update: HolderUpdate,
    ) -> ResultEngine<Holder> {
        with_tx!(self, |db_tx| {
            let model = self.require_holder(&db_tx, scope, holder_id).await?;
            let kind = model.holder_kind()?;
            if update.account_type.is_some() && !kind.is_funds() {
                return Err(EngineError::Validation(
                    "contacts do not have an account type".to_string(),
                ));
            }
            if kind.is_funds()
                && (update.phone.is_some() || update.email.is_some() || update.address.is_some())
            {
                return Err(EngineError::Validation(format!(
                    "contact details are only kept for contacts, not {}s",
                    kind.as_str()
                )));
            }

            let mut active: holders::ActiveModel = model.into();
            if let Some(name) = update.name.as_deref() {
                let name = normalize_required_name(name, kind.as_str())?;
                let name_norm = require_name_key(&name, kind.as_str())?;
                self.ensure_holder_name_free(&db_tx, scope, kind, &name_norm, Some(holder_id))
                    .await?;
                active.name = ActiveValue::Set(name);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(account_type) = update.account_type {
                active.account_type = ActiveValue::Set(Some(account_type.as_str().to_string()));
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            if let Some(email) = update.email.as_deref() {
                active.email = ActiveValue::Set(normalize_optional_text(Some(email)));
            }
            if let Some(address) = update.address.as_deref() {
                active.address = ActiveValue::Set(normalize_optional_text(Some(address)));
            }
            if let Some(notes) = update.notes.as_deref() {
                active.notes = ActiveValue::Set(normalize_optional_text(Some(notes)));
            }
            let model = active.update(&db_tx).await?;
            Holder::try_from(model)
        })
    }

    pub async fn holder(&self, scope: &TenantScope, holder_id: Uuid) -> ResultEngine<Holder> {
        let model = self.require_holder(&self.database, scope, holder_id).await?;
        Holder::try_from(model)
    }

    /// Holders in scope ordered by name, optionally of one kind.
    pub async fn list_holders(
        &self,
        scope: &TenantScope,
        kind: Option<HolderKind>,
    ) -> ResultEngine<Vec<Holder>> {
        let mut query = holders::Entity::find()
            .filter(holders::Column::TenantId.eq(scope.tenant_key()))
            .filter(holders::Column::OwnerId.eq(scope.owner_key()));
        if let Some(kind) = kind {
            query = query.filter(holders::Column::Kind.eq(kind.as_str()));
        }
        query
            .order_by_asc(holders::Column::NameNorm)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Holder::try_from)
            .collect()
    }

    /// Delete a holder no entry refers to.
    pub async fn delete_holder(&self, scope: &TenantScope, holder_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_holder(&db_tx, scope, holder_id).await?;
            let key = holder_id.to_string();
            let used = self
                .count_entries_where(
                    &db_tx,
                    scope,
                    Condition::any()
                        .add(entries::Column::HolderId.eq(key.clone()))
                        .add(entries::Column::WalletId.eq(key)),
                )
                .await?;
            if used > 0 {
                return Err(EngineError::Conflict(format!(
                    "cannot delete {} {}: it is used in {used} entries",
                    model.kind, model.name
                )));
            }
            model.delete(&db_tx).await?;
            tracing::info!(holder = %holder_id, "holder deleted");
            Ok(())
        })
    }

    async fn ensure_holder_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        kind: HolderKind,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = holders::Entity::find()
            .filter(holders::Column::TenantId.eq(scope.tenant_key()))
            .filter(holders::Column::OwnerId.eq(scope.owner_key()))
            .filter(holders::Column::Kind.eq(kind.as_str()))
            .filter(holders::Column::NameNorm.eq(name_norm));
        if let Some(except) = except {
            query = query.filter(holders::Column::Id.ne(except.to_string()));
        }
        if let Some(existing) = query.one(db).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
