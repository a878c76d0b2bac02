//! Edge-triggered completion detection.

use crate::ledger::Ledger;

/// Fires once when the cursor reaches the end of the ledger.
///
/// The detector re-arms when the cursor leaves the end again (backspace or
/// undo), so finishing a second time fires a second time. Staying at the end
/// across later no-op input never fires again.
#[derive(Debug, Clone, Default)]
pub struct CompletionDetector {
    complete: bool,
}

impl CompletionDetector {
    /// Start armed or already complete depending on `ledger` (a session
    /// resumed at the end does not fire on start).
    pub fn new(ledger: &Ledger) -> Self {
        Self {
            complete: ledger.is_complete(),
        }
    }

    /// Observe the ledger after a mutation. Returns `true` exactly on the
    /// transition into the complete state.
    pub fn observe(&mut self, ledger: &Ledger) -> bool {
        let now = ledger.is_complete();
        let fired = now && !self.complete;
        self.complete = now;
        fired
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
