use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{
    AccountType, AccountTypeTotal, BalanceOverview, CategoryKind, CategorySummaryRow,
    CategoryTotal, ContactBalance, ContactOverview, DailyTotal, EntryTag, HolderKind,
    LedgerEntry, MonthlyTotals, ResultEngine, Statistics, TenantScope, categories, entries,
    holders,
    money::add_minor,
    reports::basis_points,
    util::parse_uuid,
};

use super::Engine;

const TOP_N: usize = 5;

impl Engine {
    /// Income and expense over `from..=to`.
    ///
    /// Transfers and contact entries move money between the user's own
    /// holders or to other people, so they are not counted.
    pub async fn statistics(
        &self,
        scope: &TenantScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultEngine<Statistics> {
        let totals = self.sum_by_kind(scope, Some((from, to))).await?;
        let total_income_minor = totals.get(EntryTag::Income.as_str()).copied().unwrap_or(0);
        let total_expense_minor = totals.get(EntryTag::Expense.as_str()).copied().unwrap_or(0);
        let net_savings_minor = add_minor(total_income_minor, -total_expense_minor)?;

        let expenses = self
            .entries_of_kind(scope, EntryTag::Expense, Some((from, to)))
            .await?;

        let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        let mut by_category: HashMap<Uuid, i64> = HashMap::new();
        for entry in &expenses {
            let day = by_day.entry(entry.occurred_on).or_insert(0);
            *day = add_minor(*day, entry.amount_minor)?;
            if let Some(category_id) = entry.category_id {
                let total = by_category.entry(category_id).or_insert(0);
                *total = add_minor(*total, entry.amount_minor)?;
            }
        }

        let names = self.category_models(scope).await?;
        let mut top: Vec<CategoryTotal> = by_category
            .into_iter()
            .filter_map(|(category_id, total_minor)| {
                let model = names.get(&category_id)?;
                Some(CategoryTotal {
                    category_id,
                    name: model.name.clone(),
                    color: model.color.clone(),
                    total_minor,
                    share_bp: basis_points(total_minor, total_expense_minor),
                })
            })
            .collect();
        top.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then_with(|| a.name.cmp(&b.name))
        });
        top.truncate(TOP_N);

        Ok(Statistics {
            from,
            to,
            total_income_minor,
            total_expense_minor,
            net_savings_minor,
            savings_rate_bp: basis_points(net_savings_minor, total_income_minor),
            top_expense_categories: top,
            daily_expenses: by_day
                .into_iter()
                .map(|(day, total_minor)| DailyTotal { day, total_minor })
                .collect(),
        })
    }

    /// Income and expense per calendar month, newest month first.
    pub async fn monthly_trend(
        &self,
        scope: &TenantScope,
        months: usize,
    ) -> ResultEngine<Vec<MonthlyTotals>> {
        let mut by_month: BTreeMap<(i32, u32), (i64, i64)> = BTreeMap::new();
        for tag in [EntryTag::Income, EntryTag::Expense] {
            for entry in self.entries_of_kind(scope, tag, None).await? {
                let key = (entry.occurred_on.year(), entry.occurred_on.month());
                let slot = by_month.entry(key).or_insert((0, 0));
                let total = if tag == EntryTag::Income {
                    &mut slot.0
                } else {
                    &mut slot.1
                };
                *total = add_minor(*total, entry.amount_minor)?;
            }
        }
        Ok(by_month
            .into_iter()
            .rev()
            .take(months)
            .map(|((year, month), (income_minor, expense_minor))| MonthlyTotals {
                year,
                month,
                income_minor,
                expense_minor,
            })
            .collect())
    }

    /// Total and count per category for one kind, largest first.
    ///
    /// Entries without a category are grouped under `Uncategorized`.
    pub async fn category_summary(
        &self,
        scope: &TenantScope,
        kind: CategoryKind,
    ) -> ResultEngine<Vec<CategorySummaryRow>> {
        let tag = match kind {
            CategoryKind::Income => EntryTag::Income,
            CategoryKind::Expense => EntryTag::Expense,
        };
        let mut groups: HashMap<Option<Uuid>, (i64, u64)> = HashMap::new();
        for entry in self.entries_of_kind(scope, tag, None).await? {
            let slot = groups.entry(entry.category_id).or_insert((0, 0));
            slot.0 = add_minor(slot.0, entry.amount_minor)?;
            slot.1 += 1;
        }

        let names = self.category_models(scope).await?;
        let mut rows: Vec<CategorySummaryRow> = groups
            .into_iter()
            .map(|(category_id, (total_minor, count))| CategorySummaryRow {
                category_id,
                name: category_id
                    .and_then(|id| names.get(&id))
                    .map_or_else(|| "Uncategorized".to_string(), |m| m.name.clone()),
                kind,
                total_minor,
                entries: count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    /// Money held across accounts and wallets.
    pub async fn balance_overview(&self, scope: &TenantScope) -> ResultEngine<BalanceOverview> {
        let funds = holders::Entity::find()
            .filter(holders::Column::TenantId.eq(scope.tenant_key()))
            .filter(holders::Column::OwnerId.eq(scope.owner_key()))
            .filter(holders::Column::Kind.is_in([
                HolderKind::Account.as_str(),
                HolderKind::Wallet.as_str(),
            ]))
            .all(&self.database)
            .await?;

        let mut total_minor = 0;
        let mut by_type: BTreeMap<AccountType, (u64, i64)> = BTreeMap::new();
        for holder in funds {
            let account_type = holder
                .account_type
                .as_deref()
                .map(AccountType::try_from)
                .transpose()?
                .unwrap_or(AccountType::Other);
            total_minor = add_minor(total_minor, holder.balance_minor)?;
            let slot = by_type.entry(account_type).or_insert((0, 0));
            slot.0 += 1;
            slot.1 = add_minor(slot.1, holder.balance_minor)?;
        }
        Ok(BalanceOverview {
            total_minor,
            by_account_type: by_type
                .into_iter()
                .map(|(account_type, (holders, total_minor))| AccountTypeTotal {
                    account_type,
                    holders,
                    total_minor,
                })
                .collect(),
        })
    }

    /// Money exchanged with contacts and the contacts holding the highest
    /// balances.
    pub async fn contact_overview(&self, scope: &TenantScope) -> ResultEngine<ContactOverview> {
        let totals = self.sum_by_kind(scope, None).await?;
        let top_contacts = holders::Entity::find()
            .filter(holders::Column::TenantId.eq(scope.tenant_key()))
            .filter(holders::Column::OwnerId.eq(scope.owner_key()))
            .filter(holders::Column::Kind.eq(HolderKind::Contact.as_str()))
            .order_by_desc(holders::Column::BalanceMinor)
            .order_by_asc(holders::Column::NameNorm)
            .limit(TOP_N as u64)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| {
                Ok(ContactBalance {
                    holder_id: parse_uuid(&model.id, "holder")?,
                    name: model.name,
                    balance_minor: model.balance_minor,
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(ContactOverview {
            total_given_minor: totals.get(EntryTag::Give.as_str()).copied().unwrap_or(0),
            total_received_minor: totals.get(EntryTag::Receive.as_str()).copied().unwrap_or(0),
            top_contacts,
        })
    }

    /// `kind -> SUM(amount_minor)` over the scope, optionally within dates.
    async fn sum_by_kind(
        &self,
        scope: &TenantScope,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> ResultEngine<HashMap<String, i64>> {
        let mut query = entries::Entity::find()
            .select_only()
            .column(entries::Column::Kind)
            .column_as(Expr::col(entries::Column::AmountMinor).sum(), "total")
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()));
        if let Some((from, to)) = range {
            query = query
                .filter(entries::Column::OccurredOn.gte(from))
                .filter(entries::Column::OccurredOn.lte(to));
        }
        let rows = query
            .group_by(entries::Column::Kind)
            .into_tuple::<(String, Option<i64>)>()
            .all(&self.database)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(kind, total)| (kind, total.unwrap_or(0)))
            .collect())
    }

    async fn entries_of_kind(
        &self,
        scope: &TenantScope,
        tag: EntryTag,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let mut query = entries::Entity::find()
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .filter(entries::Column::Kind.eq(tag.as_str()));
        if let Some((from, to)) = range {
            query = query
                .filter(entries::Column::OccurredOn.gte(from))
                .filter(entries::Column::OccurredOn.lte(to));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    async fn category_models(
        &self,
        scope: &TenantScope,
    ) -> ResultEngine<HashMap<Uuid, categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::TenantId.eq(scope.tenant_key()))
            .filter(categories::Column::OwnerId.eq(scope.owner_key()))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Ok((parse_uuid(&model.id, "category")?, model)))
            .collect()
    }
}
