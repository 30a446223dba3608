//! Money flows: tracked debts owed to or by another person.
//!
//! `remaining_amount_minor` and `status` are derived from the payments and
//! are re-summed in full after every payment change.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, money_flow_payments::MoneyFlowPayment, util::parse_uuid};

/// `Receive` is money to get back from the person (receivable), `Give` is
/// money still to hand over (payable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyFlowKind {
    Give,
    Receive,
}

impl MoneyFlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Give => "give",
            Self::Receive => "receive",
        }
    }
}

impl TryFrom<&str> for MoneyFlowKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "give" => Ok(Self::Give),
            "receive" => Ok(Self::Receive),
            other => Err(EngineError::Validation(format!(
                "invalid money flow kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyFlowStatus {
    Pending,
    Partial,
    Completed,
}

impl MoneyFlowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for MoneyFlowStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "invalid money flow status: {other}"
            ))),
        }
    }
}

/// Derive `(remaining, status)` from the fixed amount and the sum of all
/// payments.
#[must_use]
pub fn derive_status(amount_minor: i64, total_paid_minor: i64) -> (i64, MoneyFlowStatus) {
    let remaining = amount_minor - total_paid_minor;
    let status = if remaining <= 0 {
        MoneyFlowStatus::Completed
    } else if total_paid_minor > 0 {
        MoneyFlowStatus::Partial
    } else {
        MoneyFlowStatus::Pending
    };
    (remaining, status)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyFlow {
    pub id: Uuid,
    pub person_name: String,
    pub kind: MoneyFlowKind,
    pub amount_minor: i64,
    pub remaining_amount_minor: i64,
    pub status: MoneyFlowStatus,
    pub started_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Newest first. Empty when the flow is listed without details.
    pub payments: Vec<MoneyFlowPayment>,
}

impl MoneyFlow {
    #[must_use]
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.status != MoneyFlowStatus::Completed && self.due_on.is_some_and(|due| due < as_of)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "money_flows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub person_name: String,
    pub kind: String,
    pub amount_minor: i64,
    pub remaining_amount_minor: i64,
    pub status: String,
    pub started_on: Date,
    pub due_on: Option<Date>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::money_flow_payments::Entity")]
    Payments,
}

impl Related<super::money_flow_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn into_flow(self, payments: Vec<MoneyFlowPayment>) -> ResultEngine<MoneyFlow> {
        Ok(MoneyFlow {
            id: parse_uuid(&self.id, "money flow")?,
            person_name: self.person_name,
            kind: MoneyFlowKind::try_from(self.kind.as_str())?,
            amount_minor: self.amount_minor,
            remaining_amount_minor: self.remaining_amount_minor,
            status: MoneyFlowStatus::try_from(self.status.as_str())?,
            started_on: self.started_on,
            due_on: self.due_on,
            note: self.note,
            created_at: self.created_at,
            payments,
        })
    }
}

impl TryFrom<Model> for MoneyFlow {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        model.into_flow(Vec::new())
    }
}

pub(crate) fn status_update(
    model: Model,
    total_paid_minor: i64,
) -> (ActiveModel, MoneyFlowStatus) {
    let (remaining, status) = derive_status(model.amount_minor, total_paid_minor);
    let mut active: ActiveModel = model.into();
    active.remaining_amount_minor = ActiveValue::Set(remaining);
    active.status = ActiveValue::Set(status.as_str().to_string());
    (active, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_with_payments() {
        assert_eq!(derive_status(1000, 0), (1000, MoneyFlowStatus::Pending));
        assert_eq!(derive_status(1000, 400), (600, MoneyFlowStatus::Partial));
        assert_eq!(derive_status(1000, 1000), (0, MoneyFlowStatus::Completed));
    }

    #[test]
    fn status_moves_backward_when_payments_shrink() {
        let (_, done) = derive_status(1000, 1000);
        assert_eq!(done, MoneyFlowStatus::Completed);
        assert_eq!(derive_status(1000, 600).1, MoneyFlowStatus::Partial);
        assert_eq!(derive_status(1000, 0).1, MoneyFlowStatus::Pending);
    }

    #[test]
    fn overdue_needs_open_flow_past_due() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        let mut flow = MoneyFlow {
            id: Uuid::new_v4(),
            person_name: "Rahim".to_string(),
            kind: MoneyFlowKind::Give,
            amount_minor: 500,
            remaining_amount_minor: 500,
            status: MoneyFlowStatus::Pending,
            started_on: day(1),
            due_on: Some(day(10)),
            note: None,
            created_at: Utc::now(),
            payments: Vec::new(),
        };
        assert!(!flow.is_overdue(day(10)));
        assert!(flow.is_overdue(day(11)));
        flow.status = MoneyFlowStatus::Completed;
        assert!(!flow.is_overdue(day(11)));
    }
}
