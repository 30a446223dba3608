//! Ledger entries.
//!
//! An entry is a single signed movement against one holder. Its direction is
//! carried by the kind; `amount_minor` is always positive.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Out,
    In,
}

impl TransferDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::In => "in",
        }
    }
}

impl TryFrom<&str> for TransferDirection {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "out" => Ok(Self::Out),
            "in" => Ok(Self::In),
            other => Err(EngineError::Validation(format!(
                "invalid transfer direction: {other}"
            ))),
        }
    }
}

/// Kind of an entry without transfer pairing data.
///
/// Used by commands and filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTag {
    Income,
    Expense,
    Give,
    Receive,
    Transfer,
}

impl EntryTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Give => "give",
            Self::Receive => "receive",
            Self::Transfer => "transfer",
        }
    }

    /// Give and receive record money exchanged with a contact.
    pub fn is_contact(self) -> bool {
        matches!(self, Self::Give | Self::Receive)
    }

    /// Kind for a standalone entry. Transfers only exist as pairs.
    pub fn plain_kind(self) -> Option<EntryKind> {
        match self {
            Self::Income => Some(EntryKind::Income),
            Self::Expense => Some(EntryKind::Expense),
            Self::Give => Some(EntryKind::Give),
            Self::Receive => Some(EntryKind::Receive),
            Self::Transfer => None,
        }
    }
}

impl TryFrom<&str> for EntryTag {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "give" => Ok(Self::Give),
            "receive" => Ok(Self::Receive),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::Validation(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
    Give,
    Receive,
    Transfer {
        pair_id: Uuid,
        direction: TransferDirection,
    },
}

impl EntryKind {
    pub fn tag(self) -> EntryTag {
        match self {
            Self::Income => EntryTag::Income,
            Self::Expense => EntryTag::Expense,
            Self::Give => EntryTag::Give,
            Self::Receive => EntryTag::Receive,
            Self::Transfer { .. } => EntryTag::Transfer,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.tag().as_str()
    }

    /// Credits raise the holder's balance.
    pub fn is_credit(self) -> bool {
        match self {
            Self::Income | Self::Receive => true,
            Self::Expense | Self::Give => false,
            Self::Transfer { direction, .. } => direction == TransferDirection::In,
        }
    }

    pub fn sign(self) -> i64 {
        if self.is_credit() { 1 } else { -1 }
    }

    pub fn is_transfer(self) -> bool {
        matches!(self, Self::Transfer { .. })
    }

    pub fn pair_id(self) -> Option<Uuid> {
        match self {
            Self::Transfer { pair_id, .. } => Some(pair_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub holder_id: Uuid,
    /// Funding or receiving wallet of a contact entry.
    pub wallet_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub kind: EntryKind,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[must_use]
    pub fn signed_amount(&self) -> i64 {
        self.kind.sign() * self.amount_minor
    }
}

/// Both sides of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub pair_id: Uuid,
    pub source: LedgerEntry,
    pub destination: LedgerEntry,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub holder_id: String,
    pub wallet_id: Option<String>,
    pub category_id: Option<String>,
    pub kind: String,
    pub transfer_group_id: Option<String>,
    pub transfer_direction: Option<String>,
    pub amount_minor: i64,
    pub occurred_on: Date,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::holders::Entity",
        from = "Column::HolderId",
        to = "super::holders::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Holder,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::holders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Holder.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        let (group, direction) = match entry.kind {
            EntryKind::Transfer { pair_id, direction } => (
                Some(pair_id.to_string()),
                Some(direction.as_str().to_string()),
            ),
            _ => (None, None),
        };
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            tenant_id: ActiveValue::Set(entry.tenant_id.to_string()),
            owner_id: ActiveValue::Set(entry.owner_id.to_string()),
            holder_id: ActiveValue::Set(entry.holder_id.to_string()),
            wallet_id: ActiveValue::Set(entry.wallet_id.map(|id| id.to_string())),
            category_id: ActiveValue::Set(entry.category_id.map(|id| id.to_string())),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            transfer_group_id: ActiveValue::Set(group),
            transfer_direction: ActiveValue::Set(direction),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            occurred_on: ActiveValue::Set(entry.occurred_on),
            note: ActiveValue::Set(entry.note.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let kind = match EntryTag::try_from(model.kind.as_str())? {
            EntryTag::Income => EntryKind::Income,
            EntryTag::Expense => EntryKind::Expense,
            EntryTag::Give => EntryKind::Give,
            EntryTag::Receive => EntryKind::Receive,
            EntryTag::Transfer => {
                let pair = model.transfer_group_id.as_deref().ok_or_else(|| {
                    EngineError::Validation(format!("transfer entry {} has no pair", model.id))
                })?;
                let direction = model.transfer_direction.as_deref().ok_or_else(|| {
                    EngineError::Validation(format!(
                        "transfer entry {} has no direction",
                        model.id
                    ))
                })?;
                EntryKind::Transfer {
                    pair_id: parse_uuid(pair, "transfer")?,
                    direction: TransferDirection::try_from(direction)?,
                }
            }
        };
        Ok(Self {
            id: parse_uuid(&model.id, "entry")?,
            tenant_id: parse_uuid(&model.tenant_id, "tenant")?,
            owner_id: parse_uuid(&model.owner_id, "owner")?,
            holder_id: parse_uuid(&model.holder_id, "holder")?,
            wallet_id: parse_optional_uuid(model.wallet_id.as_deref(), "wallet")?,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category")?,
            kind,
            amount_minor: model.amount_minor,
            occurred_on: model.occurred_on,
            note: model.note,
            created_at: model.created_at,
        })
    }
}
