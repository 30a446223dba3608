//! Ledger core: holders, entries, transfers, money flows and the balance
//! reconciliation that keeps cached balances equal to their entries.

pub use categories::{Category, CategoryKind, CategoryUsage};
pub use commands::{
    AddPaymentCmd, CategoryUpdate, EntryCmd, HolderUpdate, NewCategoryCmd, NewHolderCmd,
    NewMoneyFlowCmd, TransferCmd, UpdateTransferCmd,
};
pub use entries::{EntryKind, EntryTag, LedgerEntry, Transfer, TransferDirection};
pub use error::{EngineError, ErrorClass};
pub use holders::{AccountType, Holder, HolderKind};
pub use money::Money;
pub use money_flow_payments::MoneyFlowPayment;
pub use money_flows::{MoneyFlow, MoneyFlowKind, MoneyFlowStatus, derive_status};
pub use ops::{Engine, EngineBuilder, EntryFilter, MoneyFlowFilter, ReconcileMode};
pub use reconcile::BalanceChanges;
pub use reports::{
    AccountTypeTotal, BalanceDrift, BalanceOverview, CategorySummaryRow, CategoryTotal,
    ContactBalance, ContactOverview, DailyTotal, MoneyFlowSummary, MonthlyTotals, Statistics,
};
pub use scope::TenantScope;

mod categories;
mod commands;
mod entries;
mod error;
mod holders;
mod money;
mod money_flow_payments;
mod money_flows;
mod ops;
pub mod reconcile;
mod reports;
mod scope;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
