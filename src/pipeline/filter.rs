//! Prefix filter over transaction signatures

use super::types::{SignedTransaction, SlotGroup, Snapshot};

/// Project `snapshot` onto the transactions matching `predicate`.
///
/// An empty predicate is the identity. Otherwise a transaction is kept when
/// any of its signatures starts with the predicate, and groups left empty are
/// dropped. Relative order of groups and transactions is preserved.
pub fn project(snapshot: &[SlotGroup], predicate: &str) -> Snapshot {
    if predicate.is_empty() {
        return snapshot.to_vec();
    }

    snapshot
        .iter()
        .filter_map(|group| {
            let transactions: Vec<SignedTransaction> = group
                .transactions
                .iter()
                .filter(|txn| txn.has_signature_prefix(predicate))
                .cloned()
                .collect();

            if transactions.is_empty() {
                None
            } else {
                Some(SlotGroup {
                    slot: group.slot,
                    transactions,
                })
            }
        })
        .collect()
}
