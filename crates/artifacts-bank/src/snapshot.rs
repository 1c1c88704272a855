//! Point-in-time copies of the bank.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One item whose banked quantity changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankChange {
    /// Item code.
    pub code: String,
    /// Quantity before the change.
    pub before: u32,
    /// Quantity after the change.
    pub after: u32,
}

impl BankChange {
    /// Signed quantity delta.
    pub fn delta(&self) -> i64 {
        i64::from(self.after).saturating_sub(i64::from(self.before))
    }
}

/// An owned copy of the bank contents.
///
/// Callers take a snapshot, decide what to do, and then act. The snapshot
/// is never updated in place, so by the time an action reaches the server
/// the real bank may already differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    /// Quantities by item code. Zero quantities are never stored.
    pub items: BTreeMap<String, u32>,
    /// Revision this copy was taken at.
    pub revision: u64,
}

impl BankSnapshot {
    /// Banked quantity of an item.
    pub fn quantity(&self, code: &str) -> u32 {
        self.items.get(code).copied().unwrap_or(0)
    }

    /// Whether at least `quantity` units are banked.
    pub fn has(&self, code: &str, quantity: u32) -> bool {
        self.quantity(code) >= quantity
    }

    /// Total banked units.
    pub fn total_units(&self) -> u64 {
        self.items
            .values()
            .fold(0_u64, |acc, q| acc.saturating_add(u64::from(*q)))
    }

    /// Items whose quantity differs between `self` and `newer`, in code
    /// order.
    pub fn diff(&self, newer: &Self) -> Vec<BankChange> {
        diff_contents(&self.items, &newer.items)
    }
}

/// Per-item changes between two bank contents.
pub(crate) fn diff_contents(
    before: &BTreeMap<String, u32>,
    after: &BTreeMap<String, u32>,
) -> Vec<BankChange> {
    let mut changes = Vec::new();
    for (code, old) in before {
        let new = after.get(code).copied().unwrap_or(0);
        if new != *old {
            changes.push(BankChange {
                code: code.clone(),
                before: *old,
                after: new,
            });
        }
    }
    for (code, new) in after {
        if !before.contains_key(code) && *new > 0 {
            changes.push(BankChange {
                code: code.clone(),
                before: 0,
                after: *new,
            });
        }
    }
    changes.sort_by(|a, b| a.code.cmp(&b.code));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: &[(&str, u32)]) -> BankSnapshot {
        BankSnapshot {
            items: items.iter().map(|(c, q)| ((*c).to_owned(), *q)).collect(),
            revision: 0,
        }
    }

    #[test]
    fn diff_reports_added_removed_and_changed() {
        let old = snapshot(&[("ash_wood", 10), ("copper_ore", 5)]);
        let new = snapshot(&[("ash_wood", 4), ("feather", 2)]);
        let changes = old.diff(&new);
        let codes: Vec<(&str, i64)> = changes.iter().map(|c| (c.code.as_str(), c.delta())).collect();
        assert_eq!(
            codes,
            vec![("ash_wood", -6), ("copper_ore", -5), ("feather", 2)]
        );
    }

    #[test]
    fn identical_contents_have_no_diff() {
        let a = snapshot(&[("ash_wood", 10)]);
        assert!(a.diff(&a.clone()).is_empty());
        assert_eq!(a.total_units(), 10);
        assert!(a.has("ash_wood", 10));
        assert!(!a.has("ash_wood", 11));
    }
}
