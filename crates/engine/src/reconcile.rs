//! Balance reconciliation rules.
//!
//! Pure functions mapping entry changes to per-holder balance deltas. The
//! engine applies them either as deltas on the cached balance or by
//! re-deriving each touched holder from its entries (see
//! [`ReconcileMode`](crate::ReconcileMode)).
//!
//! Sums never wrap: a total outside `i64` is an
//! [`InvalidAmount`](crate::EngineError::InvalidAmount) error.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{LedgerEntry, ResultEngine, money::add_minor};

/// Signed balance deltas keyed by holder.
///
/// A holder touched by a change stays in the map even when its deltas cancel
/// out, so the recompute path still refreshes it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceChanges(BTreeMap<Uuid, i64>);

impl BalanceChanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, holder_id: Uuid, delta: i64) -> ResultEngine<()> {
        let slot = self.0.entry(holder_id).or_insert(0);
        *slot = add_minor(*slot, delta)?;
        Ok(())
    }

    pub fn merge(&mut self, other: BalanceChanges) -> ResultEngine<()> {
        for (holder_id, delta) in other.0 {
            self.add(holder_id, delta)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, holder_id: Uuid) -> Option<i64> {
        self.0.get(&holder_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, i64)> + '_ {
        self.0.iter().map(|(holder_id, delta)| (*holder_id, *delta))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Signed effect of one entry on every holder it touches.
///
/// Contact entries funded from a wallet move the wallet by the same amount
/// in the same direction: giving money lowers both, receiving raises both.
#[must_use]
pub fn entry_effects(entry: &LedgerEntry) -> Vec<(Uuid, i64)> {
    let delta = entry.signed_amount();
    let mut effects = vec![(entry.holder_id, delta)];
    if let Some(wallet_id) = entry.wallet_id {
        effects.push((wallet_id, delta));
    }
    effects
}

pub fn apply_entry_created(entry: &LedgerEntry) -> ResultEngine<BalanceChanges> {
    let mut changes = BalanceChanges::new();
    for (holder_id, delta) in entry_effects(entry) {
        changes.add(holder_id, delta)?;
    }
    Ok(changes)
}

/// Exact inverse of [`apply_entry_created`].
pub fn apply_entry_deleted(entry: &LedgerEntry) -> ResultEngine<BalanceChanges> {
    let mut changes = BalanceChanges::new();
    for (holder_id, delta) in entry_effects(entry) {
        changes.add(holder_id, -delta)?;
    }
    Ok(changes)
}

/// Reverse the old entry, then apply the new one.
pub fn apply_entry_updated(old: &LedgerEntry, new: &LedgerEntry) -> ResultEngine<BalanceChanges> {
    let mut changes = apply_entry_deleted(old)?;
    changes.merge(apply_entry_created(new)?)?;
    Ok(changes)
}

/// Authoritative balance of `holder_id`: the initial balance plus every
/// entry effect on it.
pub fn derive_balance<'a>(
    holder_id: Uuid,
    initial_balance_minor: i64,
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> ResultEngine<i64> {
    entries
        .into_iter()
        .flat_map(entry_effects)
        .filter(|(id, _)| *id == holder_id)
        .try_fold(initial_balance_minor, |acc, (_, delta)| add_minor(acc, delta))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{EntryKind, ErrorClass, TransferDirection};

    fn entry(holder_id: Uuid, kind: EntryKind, amount_minor: i64) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            owner_id: Uuid::nil(),
            holder_id,
            wallet_id: None,
            category_id: None,
            kind,
            amount_minor,
            occurred_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn created_entries_move_balance_by_kind() {
        let a = Uuid::new_v4();
        let created = |kind, amount| apply_entry_created(&entry(a, kind, amount)).unwrap().get(a);
        assert_eq!(created(EntryKind::Income, 500), Some(500));
        assert_eq!(created(EntryKind::Expense, 200), Some(-200));
        assert_eq!(created(EntryKind::Give, 30), Some(-30));
        assert_eq!(created(EntryKind::Receive, 30), Some(30));
    }

    #[test]
    fn contact_entries_also_move_the_wallet() {
        let contact = Uuid::new_v4();
        let wallet = Uuid::new_v4();
        let mut give = entry(contact, EntryKind::Give, 1000);
        give.wallet_id = Some(wallet);

        let changes = apply_entry_created(&give).unwrap();
        assert_eq!(changes.get(contact), Some(-1000));
        assert_eq!(changes.get(wallet), Some(-1000));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn delete_is_the_inverse_of_create() {
        let a = Uuid::new_v4();
        let e = entry(a, EntryKind::Expense, 750);
        let mut changes = apply_entry_created(&e).unwrap();
        changes.merge(apply_entry_deleted(&e).unwrap()).unwrap();
        assert_eq!(changes.get(a), Some(0));
    }

    #[test]
    fn update_on_same_holder_nets_to_one_delta() {
        let a = Uuid::new_v4();
        let old = entry(a, EntryKind::Expense, 200);
        let mut new = old.clone();
        new.amount_minor = 350;

        let changes = apply_entry_updated(&old, &new).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get(a), Some(-150));
    }

    #[test]
    fn update_across_holders_kind_and_amount() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let old = entry(a, EntryKind::Expense, 100);
        let mut new = old.clone();
        new.holder_id = b;
        new.kind = EntryKind::Income;
        new.amount_minor = 40;

        let changes = apply_entry_updated(&old, &new).unwrap();
        assert_eq!(changes.get(a), Some(100));
        assert_eq!(changes.get(b), Some(40));
    }

    #[test]
    fn derive_balance_sums_only_matching_effects() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pair_id = Uuid::new_v4();
        let mut give = entry(Uuid::new_v4(), EntryKind::Give, 25);
        give.wallet_id = Some(a);
        let entries = vec![
            entry(a, EntryKind::Income, 1000),
            entry(a, EntryKind::Expense, 300),
            entry(b, EntryKind::Income, 999),
            entry(
                a,
                EntryKind::Transfer {
                    pair_id,
                    direction: TransferDirection::Out,
                },
                100,
            ),
            give,
        ];
        assert_eq!(
            derive_balance(a, 50, &entries).unwrap(),
            50 + 1000 - 300 - 100 - 25
        );
        assert_eq!(derive_balance(b, 0, &entries).unwrap(), 999);
        assert_eq!(derive_balance(Uuid::new_v4(), 7, &entries).unwrap(), 7);
    }

    #[test]
    fn sums_past_i64_are_errors() {
        let a = Uuid::new_v4();
        let huge = entry(a, EntryKind::Income, i64::MAX);
        assert_eq!(
            derive_balance(a, 100, [&huge]).unwrap_err().class(),
            ErrorClass::Validation
        );

        let mut changes = apply_entry_created(&huge).unwrap();
        assert!(changes.add(a, 1).is_err());
        assert_eq!(changes.get(a), Some(i64::MAX));
    }
}
