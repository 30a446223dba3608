//! Command structs for engine write operations.
//!
//! Commands are validated on their own before any storage access; checks
//! that need stored rows (scope, holder kinds, category kinds) run inside the
//! operation.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    AccountType, CategoryKind, EngineError, EntryTag, HolderKind, MoneyFlowKind, ResultEngine,
    util::{normalize_required_name, require_positive_amount},
};

/// Record a standalone entry, or replace one with [`Engine::update_entry`].
///
/// [`Engine::update_entry`]: crate::Engine::update_entry
#[derive(Clone, Debug)]
pub struct EntryCmd {
    pub holder_id: Uuid,
    pub kind: EntryTag,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub category_id: Option<Uuid>,
    pub wallet_id: Option<Uuid>,
    pub note: Option<String>,
}

impl EntryCmd {
    #[must_use]
    pub fn new(holder_id: Uuid, kind: EntryTag, amount_minor: i64, occurred_on: NaiveDate) -> Self {
        Self {
            holder_id,
            kind,
            amount_minor,
            occurred_on,
            category_id: None,
            wallet_id: None,
            note: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Wallet funding a give, or receiving a receive.
    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn validate(&self) -> ResultEngine<()> {
        require_positive_amount(self.amount_minor)?;
        if self.kind == EntryTag::Transfer {
            return Err(EngineError::Validation(
                "transfer entries only exist in pairs, use transfer or update_transfer"
                    .to_string(),
            ));
        }
        if self.wallet_id.is_some() && !self.kind.is_contact() {
            return Err(EngineError::Validation(format!(
                "{} entries do not take a wallet",
                self.kind.as_str()
            )));
        }
        if self.wallet_id == Some(self.holder_id) {
            return Err(EngineError::Validation(
                "wallet must differ from the contact".to_string(),
            ));
        }
        if self.category_id.is_some() && self.kind.is_contact() {
            return Err(EngineError::Validation(format!(
                "{} entries do not take a category",
                self.kind.as_str()
            )));
        }
        Ok(())
    }
}

/// Move money between two of the user's accounts or wallets.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from: Uuid,
    pub to: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from: Uuid, to: Uuid, amount_minor: i64, occurred_on: NaiveDate) -> Self {
        Self {
            from,
            to,
            amount_minor,
            occurred_on,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> ResultEngine<()> {
        if self.from == self.to {
            return Err(EngineError::Validation(
                "cannot transfer to the same holder".to_string(),
            ));
        }
        require_positive_amount(self.amount_minor)
    }
}

/// Change both sides of a transfer together.
#[derive(Clone, Debug)]
pub struct UpdateTransferCmd {
    pub amount_minor: i64,
    pub occurred_on: Option<NaiveDate>,
    pub description: Option<String>,
}

impl UpdateTransferCmd {
    #[must_use]
    pub fn new(amount_minor: i64) -> Self {
        Self {
            amount_minor,
            occurred_on: None,
            description: None,
        }
    }

    #[must_use]
    pub fn occurred_on(mut self, occurred_on: NaiveDate) -> Self {
        self.occurred_on = Some(occurred_on);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Create an account, wallet or contact.
#[derive(Clone, Debug)]
pub struct NewHolderCmd {
    pub kind: HolderKind,
    pub name: String,
    pub account_type: Option<AccountType>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub initial_balance_minor: i64,
}

impl NewHolderCmd {
    #[must_use]
    pub fn new(kind: HolderKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            account_type: None,
            phone: None,
            email: None,
            address: None,
            notes: None,
            initial_balance_minor: 0,
        }
    }

    #[must_use]
    pub fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, initial_balance_minor: i64) -> Self {
        self.initial_balance_minor = initial_balance_minor;
        self
    }

    pub fn validate(&self) -> ResultEngine<()> {
        normalize_required_name(&self.name, self.kind.as_str())?;
        if self.kind.is_funds() {
            if self.phone.is_some() || self.email.is_some() || self.address.is_some() {
                return Err(EngineError::Validation(format!(
                    "contact details are only kept for contacts, not {}s",
                    self.kind.as_str()
                )));
            }
            if self.initial_balance_minor < 0 {
                return Err(EngineError::InvalidAmount(
                    "initial balance must be >= 0".to_string(),
                ));
            }
        } else if self.account_type.is_some() {
            return Err(EngineError::Validation(
                "contacts do not have an account type".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metadata changes for a holder. `None` keeps the current value; a blank
/// string clears an optional text field.
#[derive(Clone, Debug, Default)]
pub struct HolderUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl HolderUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewCategoryCmd {
    pub kind: CategoryKind,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewCategoryCmd {
    #[must_use]
    pub fn new(kind: CategoryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            color: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Category changes. The kind can only change while no entry uses the
/// category.
#[derive(Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: CategoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Open a receivable (`Receive`) or payable (`Give`) money flow.
#[derive(Clone, Debug)]
pub struct NewMoneyFlowCmd {
    pub person_name: String,
    pub kind: MoneyFlowKind,
    pub amount_minor: i64,
    pub started_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub note: Option<String>,
}

impl NewMoneyFlowCmd {
    #[must_use]
    pub fn new(
        person_name: impl Into<String>,
        kind: MoneyFlowKind,
        amount_minor: i64,
        started_on: NaiveDate,
    ) -> Self {
        Self {
            person_name: person_name.into(),
            kind,
            amount_minor,
            started_on,
            due_on: None,
            note: None,
        }
    }

    #[must_use]
    pub fn due_on(mut self, due_on: NaiveDate) -> Self {
        self.due_on = Some(due_on);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn validate(&self) -> ResultEngine<()> {
        normalize_required_name(&self.person_name, "person")?;
        require_positive_amount(self.amount_minor)?;
        if let Some(due_on) = self.due_on
            && due_on <= self.started_on
        {
            return Err(EngineError::Validation(
                "due date must be after the start date".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AddPaymentCmd {
    pub money_flow_id: Uuid,
    pub amount_minor: i64,
    pub paid_on: NaiveDate,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

impl AddPaymentCmd {
    #[must_use]
    pub fn new(money_flow_id: Uuid, amount_minor: i64, paid_on: NaiveDate) -> Self {
        Self {
            money_flow_id,
            amount_minor,
            paid_on,
            payment_method: None,
            note: None,
        }
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
