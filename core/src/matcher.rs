//! Advancing the ledger cursor by comparing typed text with the reference.

use crate::ledger::Ledger;

/// Apply `chunk` to a copy of `ledger`, one character at a time.
///
/// Each character is judged against the cell under the cursor and the cursor
/// advances whether or not it matched. Characters arriving after the last cell
/// are discarded. The caller receives the whole result at once, so a composed
/// chunk becomes a single history entry.
pub fn apply(ledger: &Ledger, chunk: &str) -> Ledger {
    let mut next = ledger.clone();
    for ch in chunk.chars() {
        if !next.judge(ch) {
            break;
        }
    }
    next
}

/// Apply an explicit Enter press: a one-character chunk holding `'\n'`.
pub fn apply_newline(ledger: &Ledger) -> Ledger {
    apply(ledger, "\n")
}
