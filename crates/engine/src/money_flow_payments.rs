//! Payments made against a money flow.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyFlowPayment {
    pub id: Uuid,
    pub money_flow_id: Uuid,
    pub amount_minor: i64,
    pub paid_on: NaiveDate,
    pub payment_method: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "money_flow_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub money_flow_id: String,
    pub amount_minor: i64,
    pub paid_on: Date,
    pub payment_method: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::money_flows::Entity",
        from = "Column::MoneyFlowId",
        to = "super::money_flows::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MoneyFlow,
}

impl Related<super::money_flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MoneyFlow.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for MoneyFlowPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            money_flow_id: parse_uuid(&model.money_flow_id, "money flow")?,
            amount_minor: model.amount_minor,
            paid_on: model.paid_on,
            payment_method: model.payment_method,
            note: model.note,
            created_at: model.created_at,
        })
    }
}
