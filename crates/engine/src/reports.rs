//! Read-only aggregate views.
//!
//! All amounts are minor units. Shares and rates are basis points
//! (1/100 of a percent), rounded half away from zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccountType, CategoryKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_income_minor: i64,
    pub total_expense_minor: i64,
    pub net_savings_minor: i64,
    /// Net savings over income. Zero without income.
    pub savings_rate_bp: i64,
    /// At most five, largest first. Uncategorized expenses are left out.
    pub top_expense_categories: Vec<CategoryTotal>,
    /// Ascending by day; days without expenses are omitted.
    pub daily_expenses: Vec<DailyTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub total_minor: i64,
    /// Share of the period's total expense.
    pub share_bp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub income_minor: i64,
    pub expense_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummaryRow {
    /// `None` groups entries without a category.
    pub category_id: Option<Uuid>,
    pub name: String,
    pub kind: CategoryKind,
    pub total_minor: i64,
    pub entries: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceOverview {
    pub total_minor: i64,
    pub by_account_type: Vec<AccountTypeTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypeTotal {
    pub account_type: AccountType,
    pub holders: u64,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOverview {
    pub total_given_minor: i64,
    pub total_received_minor: i64,
    /// Highest balances first, at most five.
    pub top_contacts: Vec<ContactBalance>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBalance {
    pub holder_id: Uuid,
    pub name: String,
    pub balance_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyFlowSummary {
    pub as_of: NaiveDate,
    /// Remaining on open `receive` flows.
    pub total_receivable_minor: i64,
    /// Remaining on open `give` flows.
    pub total_payable_minor: i64,
    pub net_minor: i64,
    pub overdue_receivable_minor: i64,
    pub overdue_payable_minor: i64,
    pub overdue_count: u64,
}

/// Cached balance that disagrees with the entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub holder_id: Uuid,
    pub name: String,
    pub cached_minor: i64,
    pub derived_minor: i64,
}

/// `part / whole` in basis points, rounded half away from zero.
pub(crate) fn basis_points(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        return 0;
    }
    let num = i128::from(part) * 10_000;
    let den = i128::from(whole);
    let half = den.abs() / 2;
    let rounded = if (num < 0) == (den < 0) {
        (num.abs() + half) / den.abs()
    } else {
        -((num.abs() + half) / den.abs())
    };
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}
