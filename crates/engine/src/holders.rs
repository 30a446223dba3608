//! Balance holders: accounts, wallets and contacts.
//!
//! A holder's `balance_minor` is a cache. It always equals the initial
//! balance plus the signed effects of every entry that touches the holder,
//! either as `holder_id` or as the funding `wallet_id` of a contact entry.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderKind {
    Account,
    Wallet,
    Contact,
}

impl HolderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Wallet => "wallet",
            Self::Contact => "contact",
        }
    }

    /// Accounts and wallets hold the user's own money.
    pub fn is_funds(self) -> bool {
        matches!(self, Self::Account | Self::Wallet)
    }
}

impl TryFrom<&str> for HolderKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "account" => Ok(Self::Account),
            "wallet" => Ok(Self::Wallet),
            "contact" => Ok(Self::Contact),
            other => Err(EngineError::Validation(format!(
                "invalid holder kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Bank,
    MobileBanking,
    Card,
    Other,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::MobileBanking => "mobile_banking",
            Self::Card => "card",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "mobile_banking" => Ok(Self::MobileBanking),
            "card" => Ok(Self::Card),
            "other" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub kind: HolderKind,
    pub name: String,
    pub account_type: Option<AccountType>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "holders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub kind: String,
    pub name: String,
    pub name_norm: String,
    pub account_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn holder_kind(&self) -> ResultEngine<HolderKind> {
        HolderKind::try_from(self.kind.as_str())
    }
}

impl TryFrom<Model> for Holder {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let account_type = model
            .account_type
            .as_deref()
            .map(AccountType::try_from)
            .transpose()?;
        Ok(Self {
            id: parse_uuid(&model.id, "holder")?,
            tenant_id: parse_uuid(&model.tenant_id, "tenant")?,
            owner_id: parse_uuid(&model.owner_id, "owner")?,
            kind: HolderKind::try_from(model.kind.as_str())?,
            name: model.name,
            account_type,
            phone: model.phone,
            email: model.email,
            address: model.address,
            notes: model.notes,
            initial_balance_minor: model.initial_balance_minor,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}
