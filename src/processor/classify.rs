//! Query vs. mutation heuristic.
//!
//! Rules, first match wins:
//!   1. name starts with `get_`          → read-only
//!   2. name contains `public_key`       → read-only
//!   3. return type is the void sentinel → mutating
//!   4. anything else                    → read-only
//!
//! A circuit that both writes the ledger and returns a value lands in rule 4
//! and is treated as a query.

use crate::model::VOID_TYPE;

/// `true` when the circuit is expected to change ledger state.
pub fn mutates(name: &str, return_type: &str) -> bool {
    if name.starts_with("get_") {
        return false;
    }
    if name.contains("public_key") {
        return false;
    }
    is_void(return_type)
}

pub fn is_void(return_type: &str) -> bool {
    let t = return_type.trim();
    t.is_empty() || t == VOID_TYPE
}
