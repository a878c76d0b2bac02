//! Undo/redo history over ledger snapshots.
//!
//! The top of the history stack is always the active ledger. Every forward
//! edit pushes a full copy and clears the redo stack; undo and redo move
//! snapshots between the two stacks without creating new ones.
//!
//! Snapshots are deep copies, so memory grows with `cap * text length`. The
//! cap keeps that bounded: once exceeded, the oldest snapshot is dropped and
//! history deeper than `cap` entries is lost.

use std::collections::VecDeque;

use crate::ledger::Ledger;

/// A stored ledger state. The ledger carries its own cursor.
pub type Snapshot = Ledger;

/// Default number of snapshots kept on the history stack.
pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    cap: usize,
}

impl History {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: Ledger) -> Self {
        Self::with_cap(initial, DEFAULT_HISTORY_CAP)
    }

    /// Like `new` with a custom cap (minimum 1).
    pub fn with_cap(initial: Ledger, cap: usize) -> Self {
        let mut undo_stack = VecDeque::new();
        undo_stack.push_back(initial);
        Self {
            undo_stack,
            redo_stack: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// The active ledger.
    pub fn current(&self) -> &Ledger {
        // never empty: constructors push one entry and undo keeps the last
        &self.undo_stack[self.undo_stack.len() - 1]
    }

    /// Push a new snapshot and clear the redo stack.
    pub fn commit(&mut self, ledger: Ledger) {
        self.undo_stack.push_back(ledger);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.cap {
            self.undo_stack.pop_front();
        }
    }

    /// Step back one snapshot. Returns `false` when only one entry remains.
    pub fn undo(&mut self) -> bool {
        if self.undo_stack.len() <= 1 {
            return false;
        }
        if let Some(top) = self.undo_stack.pop_back() {
            self.redo_stack.push(top);
        }
        true
    }

    /// Re-apply the most recently undone snapshot. Returns `false` when there
    /// is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                self.undo_stack.push_back(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of snapshots on the history stack, including the active one.
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::apply;

    #[test]
    fn test_undo_on_initial_is_noop() {
        let mut h = History::new(Ledger::new("ab"));
        assert!(!h.undo());
        assert_eq!(h.depth(), 1);
        assert_eq!(h.current().cursor(), 0);
    }

    #[test]
    fn test_redo_on_empty_is_noop() {
        let mut h = History::new(Ledger::new("ab"));
        assert!(!h.redo());
        assert_eq!(h.depth(), 1);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut h = History::new(Ledger::new("abc"));
        let one = apply(h.current(), "a");
        h.commit(one.clone());
        let two = apply(h.current(), "x");
        h.commit(two.clone());

        assert!(h.undo());
        assert_eq!(h.current(), &one);
        assert!(h.redo());
        assert_eq!(h.current(), &two);
        assert!(!h.can_redo());
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut h = History::new(Ledger::new("abc"));
        h.commit(apply(h.current(), "a"));
        h.undo();
        assert!(h.can_redo());
        h.commit(apply(h.current(), "b"));
        assert!(!h.can_redo());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let text = "a".repeat(10);
        let mut h = History::with_cap(Ledger::new(&text), 3);
        for _ in 0..5 {
            let next = apply(h.current(), "a");
            h.commit(next);
        }
        assert_eq!(h.depth(), 3);
        assert!(h.undo());
        assert!(h.undo());
        assert!(!h.undo());
        // oldest surviving snapshot is after the third keystroke
        assert_eq!(h.current().cursor(), 3);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let h = History::with_cap(Ledger::new("a"), 0);
        assert_eq!(h.cap(), 1);
    }
}
