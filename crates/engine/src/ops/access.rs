use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, HolderKind, ResultEngine, TenantScope, categories, entries, holders,
    money_flow_payments, money_flows,
};

use super::Engine;

/// Generates `find_*` and `require_*` lookups restricted to a scope.
///
/// Rows of another tenant or owner are indistinguishable from missing rows.
macro_rules! impl_scoped_lookup {
    ($find_fn:ident, $require_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $find_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            scope: &TenantScope,
            id: Uuid,
        ) -> ResultEngine<Option<$module::Model>> {
            $module::Entity::find_by_id(id.to_string())
                .filter($module::Column::TenantId.eq(scope.tenant_key()))
                .filter($module::Column::OwnerId.eq(scope.owner_key()))
                .one(db)
                .await
                .map_err(Into::into)
        }

        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            scope: &TenantScope,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            self.$find_fn(db, scope, id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($label.to_string()))
        }
    };
}

impl Engine {
    impl_scoped_lookup!(find_holder, require_holder, holders, "holder");
    impl_scoped_lookup!(find_category, require_category, categories, "category");
    impl_scoped_lookup!(find_entry, require_entry, entries, "entry");
    impl_scoped_lookup!(find_money_flow, require_money_flow, money_flows, "money flow");

    /// An account or wallet in scope.
    pub(super) async fn require_funds_holder<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> ResultEngine<holders::Model> {
        let model = self.require_holder(db, scope, id).await?;
        if !model.holder_kind()?.is_funds() {
            return Err(EngineError::Validation(format!(
                "{} is not an account or wallet",
                model.name
            )));
        }
        Ok(model)
    }

    pub(super) async fn require_contact<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> ResultEngine<holders::Model> {
        let model = self.require_holder(db, scope, id).await?;
        if model.holder_kind()? != HolderKind::Contact {
            return Err(EngineError::Validation(format!(
                "{} is not a contact",
                model.name
            )));
        }
        Ok(model)
    }

    /// A payment of a money flow that is itself in scope.
    pub(super) async fn require_payment<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        money_flow_id: Uuid,
        payment_id: Uuid,
    ) -> ResultEngine<money_flow_payments::Model> {
        self.require_money_flow(db, scope, money_flow_id).await?;
        money_flow_payments::Entity::find_by_id(payment_id.to_string())
            .filter(money_flow_payments::Column::MoneyFlowId.eq(money_flow_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment".to_string()))
    }
}
