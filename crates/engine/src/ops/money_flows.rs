//! Receivables, payables and their payments.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    AddPaymentCmd, EngineError, Money, MoneyFlow, MoneyFlowKind, MoneyFlowPayment,
    MoneyFlowStatus, MoneyFlowSummary, NewMoneyFlowCmd, ResultEngine, TenantScope,
    money::add_minor,
    money_flow_payments,
    money_flows::{self, status_update},
    util::{normalize_optional_text, normalize_required_name, require_positive_amount},
};

use super::{Engine, with_tx};

/// Narrow [`Engine::list_money_flows`].
#[derive(Clone, Debug, Default)]
pub struct MoneyFlowFilter {
    pub kind: Option<MoneyFlowKind>,
    /// Leave out completed flows.
    pub open_only: bool,
    /// Only open flows due strictly before this day.
    pub overdue_as_of: Option<NaiveDate>,
}

impl MoneyFlowFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: MoneyFlowKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    #[must_use]
    pub fn overdue_as_of(mut self, as_of: NaiveDate) -> Self {
        self.overdue_as_of = Some(as_of);
        self
    }
}

impl Engine {
    pub async fn new_money_flow(
        &self,
        scope: &TenantScope,
        cmd: NewMoneyFlowCmd,
    ) -> ResultEngine<MoneyFlow> {
        cmd.validate()?;
        let person_name = normalize_required_name(&cmd.person_name, "person")?;
        with_tx!(self, |db_tx| {
            let model = money_flows::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                tenant_id: ActiveValue::Set(scope.tenant_key()),
                owner_id: ActiveValue::Set(scope.owner_key()),
                person_name: ActiveValue::Set(person_name),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                remaining_amount_minor: ActiveValue::Set(cmd.amount_minor),
                status: ActiveValue::Set(MoneyFlowStatus::Pending.as_str().to_string()),
                started_on: ActiveValue::Set(cmd.started_on),
                due_on: ActiveValue::Set(cmd.due_on),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            MoneyFlow::try_from(model)
        })
    }

    /// A money flow with its payments, newest first.
    pub async fn money_flow(&self, scope: &TenantScope, money_flow_id: Uuid) -> ResultEngine<MoneyFlow> {
        let model = self
            .require_money_flow(&self.database, scope, money_flow_id)
            .await?;
        let payments = self.payments_of(&self.database, &model.id).await?;
        model.into_flow(payments)
    }

    /// Money flows without their payments, most recent start first.
    pub async fn list_money_flows(
        &self,
        scope: &TenantScope,
        filter: &MoneyFlowFilter,
    ) -> ResultEngine<Vec<MoneyFlow>> {
        let mut query = money_flows::Entity::find()
            .filter(money_flows::Column::TenantId.eq(scope.tenant_key()))
            .filter(money_flows::Column::OwnerId.eq(scope.owner_key()));
        if let Some(kind) = filter.kind {
            query = query.filter(money_flows::Column::Kind.eq(kind.as_str()));
        }
        if filter.open_only || filter.overdue_as_of.is_some() {
            query = query.filter(
                money_flows::Column::Status.ne(MoneyFlowStatus::Completed.as_str()),
            );
        }
        if let Some(as_of) = filter.overdue_as_of {
            query = query.filter(money_flows::Column::DueOn.lt(as_of));
        }
        query
            .order_by_desc(money_flows::Column::StartedOn)
            .order_by_desc(money_flows::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(MoneyFlow::try_from)
            .collect()
    }

    /// Record a payment and re-derive the flow's remaining amount and status.
    pub async fn add_payment(&self, scope: &TenantScope, cmd: AddPaymentCmd) -> ResultEngine<MoneyFlow> {
        require_positive_amount(cmd.amount_minor)?;
        with_tx!(self, |db_tx| {
            let flow = self
                .require_money_flow(&db_tx, scope, cmd.money_flow_id)
                .await?;
            if cmd.amount_minor > flow.remaining_amount_minor {
                return Err(EngineError::Conflict(format!(
                    "payment of {} exceeds the remaining {}",
                    Money::new(cmd.amount_minor),
                    Money::new(flow.remaining_amount_minor)
                )));
            }
            money_flow_payments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                money_flow_id: ActiveValue::Set(flow.id.clone()),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                paid_on: ActiveValue::Set(cmd.paid_on),
                payment_method: ActiveValue::Set(normalize_optional_text(
                    cmd.payment_method.as_deref(),
                )),
                note: ActiveValue::Set(normalize_optional_text(cmd.note.as_deref())),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            let flow = self.refresh_money_flow(&db_tx, flow).await?;
            let payments = self.payments_of(&db_tx, &flow.id).await?;
            flow.into_flow(payments)
        })
    }

    /// Remove a payment; the flow may move back to partial or pending.
    pub async fn delete_payment(
        &self,
        scope: &TenantScope,
        money_flow_id: Uuid,
        payment_id: Uuid,
    ) -> ResultEngine<MoneyFlow> {
        with_tx!(self, |db_tx| {
            let payment = self
                .require_payment(&db_tx, scope, money_flow_id, payment_id)
                .await?;
            payment.delete(&db_tx).await?;
            let flow = self
                .require_money_flow(&db_tx, scope, money_flow_id)
                .await?;
            let flow = self.refresh_money_flow(&db_tx, flow).await?;
            let payments = self.payments_of(&db_tx, &flow.id).await?;
            flow.into_flow(payments)
        })
    }

    /// Delete a money flow together with its payments.
    pub async fn delete_money_flow(&self, scope: &TenantScope, money_flow_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let flow = self
                .require_money_flow(&db_tx, scope, money_flow_id)
                .await?;
            let removed = money_flow_payments::Entity::delete_many()
                .filter(money_flow_payments::Column::MoneyFlowId.eq(flow.id.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;
            flow.delete(&db_tx).await?;
            tracing::info!(money_flow = %money_flow_id, payments = removed, "money flow deleted");
            Ok(())
        })
    }

    /// Outstanding receivables and payables over open flows.
    pub async fn money_flow_summary(
        &self,
        scope: &TenantScope,
        as_of: NaiveDate,
    ) -> ResultEngine<MoneyFlowSummary> {
        let open = self
            .list_money_flows(scope, &MoneyFlowFilter::new().open_only())
            .await?;
        let mut summary = MoneyFlowSummary {
            as_of,
            total_receivable_minor: 0,
            total_payable_minor: 0,
            net_minor: 0,
            overdue_receivable_minor: 0,
            overdue_payable_minor: 0,
            overdue_count: 0,
        };
        for flow in &open {
            let overdue = flow.is_overdue(as_of);
            let remaining = flow.remaining_amount_minor;
            let (total, overdue_total) = match flow.kind {
                MoneyFlowKind::Receive => (
                    &mut summary.total_receivable_minor,
                    &mut summary.overdue_receivable_minor,
                ),
                MoneyFlowKind::Give => (
                    &mut summary.total_payable_minor,
                    &mut summary.overdue_payable_minor,
                ),
            };
            *total = add_minor(*total, remaining)?;
            if overdue {
                *overdue_total = add_minor(*overdue_total, remaining)?;
                summary.overdue_count += 1;
            }
        }
        summary.net_minor =
            add_minor(summary.total_receivable_minor, -summary.total_payable_minor)?;
        Ok(summary)
    }

    /// Re-sum every payment of the flow and store remaining and status.
    async fn refresh_money_flow(
        &self,
        db: &DatabaseTransaction,
        flow: money_flows::Model,
    ) -> ResultEngine<money_flows::Model> {
        let total_paid = money_flow_payments::Entity::find()
            .select_only()
            .column_as(Expr::col(money_flow_payments::Column::AmountMinor).sum(), "total")
            .filter(money_flow_payments::Column::MoneyFlowId.eq(flow.id.clone()))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?
            .flatten()
            .unwrap_or(0);
        let (active, status) = status_update(flow, total_paid);
        let flow = active.update(db).await?;
        tracing::debug!(
            money_flow = %flow.id,
            total_paid,
            remaining = flow.remaining_amount_minor,
            status = status.as_str(),
            "money flow status refreshed"
        );
        Ok(flow)
    }

    async fn payments_of<C: ConnectionTrait>(
        &self,
        db: &C,
        money_flow_id: &str,
    ) -> ResultEngine<Vec<MoneyFlowPayment>> {
        money_flow_payments::Entity::find()
            .filter(money_flow_payments::Column::MoneyFlowId.eq(money_flow_id))
            .order_by_desc(money_flow_payments::Column::PaidOn)
            .order_by_desc(money_flow_payments::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(MoneyFlowPayment::try_from)
            .collect()
    }
}
