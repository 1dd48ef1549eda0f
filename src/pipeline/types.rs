//! Data model for the polled transfer feed
//!
//! Wire shape (one element per slot):
//!
//! ```json
//! { "slot": 5, "txns": [ { "signatures": ["abc123"], "txn": { "from": "A", "to": "B", "amount": 10.0 } } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete fetched state, in server order
pub type Snapshot = Vec<SlotGroup>;

/// All transfers observed at one ledger slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGroup {
    pub slot: u64,
    #[serde(rename = "txns")]
    pub transactions: Vec<SignedTransaction>,
}

/// One transfer plus the signatures that authenticate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signatures: Vec<String>,
    #[serde(rename = "txn")]
    pub transfer: Transfer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl SignedTransaction {
    /// First signature, used as the display identity
    pub fn primary_signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }

    /// True if any signature starts with `prefix` (case-sensitive)
    pub fn has_signature_prefix(&self, prefix: &str) -> bool {
        self.signatures.iter().any(|sig| sig.starts_with(prefix))
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sent {} USDC to {}", self.from, self.amount, self.to)
    }
}

/// Total number of transactions across all groups
pub fn transaction_count(snapshot: &[SlotGroup]) -> usize {
    snapshot.iter().map(|group| group.transactions.len()).sum()
}
