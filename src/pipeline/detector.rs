//! Change detection between consecutive snapshots

use super::types::SlotGroup;

/// Returns true when `new` is semantically different from `old`.
///
/// Equality is structural and order-sensitive over the typed model, so two
/// payloads that only differ in JSON key order compare equal.
pub fn differs(old: &[SlotGroup], new: &[SlotGroup]) -> bool {
    old != new
}
