//! Practice session state.
//!
//! `TraceSession` is the explicit owner of the live ledger. All four mutating
//! operations (apply chunk, backspace, undo, redo) go through `apply`, a
//! reducer from a classified `Action` to the next state. Every mutation runs
//! to completion before returning, and completion is checked after each one.

use tracing::debug;

use crate::classifier::Action;
use crate::completion::CompletionDetector;
use crate::history::History;
use crate::ledger::Ledger;
use crate::matcher;
use crate::Config;

/// Outcome of applying one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The classifier produced `Action::Ignore`
    Ignored,
    /// The action was a no-op (overrun, undo/redo on an empty stack,
    /// backspace at the start)
    Unchanged,
    /// The ledger changed
    Changed,
    /// The ledger changed and the cursor just reached the end
    Completed,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed | Self::Completed)
    }
}

#[derive(Debug, Clone)]
pub struct TraceSession {
    history: History,
    completion: CompletionDetector,
    reference: String,
}

impl TraceSession {
    /// Start at cursor 0.
    pub fn new(reference: &str, config: &Config) -> Self {
        Self::resume(reference, 0, config)
    }

    /// Start from a saved cursor; see `Ledger::resumed` for what that implies
    /// about the prefix. The reference goes through `utils::prepare_reference`
    /// first. Typed chunks are compared as delivered.
    pub fn resume(reference: &str, cursor: usize, config: &Config) -> Self {
        let reference = crate::utils::prepare_reference(reference, config);
        let ledger = Ledger::resumed(&reference, cursor);
        Self {
            completion: CompletionDetector::new(&ledger),
            history: History::with_cap(ledger, config.history_cap),
            reference,
        }
    }

    /// Discard all progress and history and start over at cursor 0.
    pub fn restart(&mut self) {
        let ledger = Ledger::new(&self.reference);
        self.completion = CompletionDetector::new(&ledger);
        self.history = History::with_cap(ledger, self.history.cap());
    }

    pub fn ledger(&self) -> &Ledger {
        self.history.current()
    }

    pub fn cursor(&self) -> usize {
        self.ledger().cursor()
    }

    pub fn progress_percent(&self) -> f64 {
        self.ledger().progress_percent()
    }

    pub fn is_complete(&self) -> bool {
        self.ledger().is_complete()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Reduce one classified action into the session state.
    pub fn apply(&mut self, action: Action) -> Transition {
        let changed = match action {
            Action::Ignore => return Transition::Ignored,
            Action::TextChunk(text) => {
                let next = matcher::apply(self.ledger(), &text);
                self.commit_if_advanced(next)
            }
            Action::Newline => {
                let next = matcher::apply_newline(self.ledger());
                self.commit_if_advanced(next)
            }
            Action::Backspace => self.backspace(),
            Action::Undo => self.history.undo(),
            Action::Redo => self.history.redo(),
        };
        if !changed {
            return Transition::Unchanged;
        }

        let ledger = self.history.current();
        debug!(
            cursor = ledger.cursor(),
            len = ledger.len(),
            depth = self.history.depth(),
            "ledger updated"
        );
        if self.completion.observe(ledger) {
            Transition::Completed
        } else {
            Transition::Changed
        }
    }

    /// Commit `next` unless the matcher discarded the whole chunk.
    fn commit_if_advanced(&mut self, next: Ledger) -> bool {
        if next.cursor() == self.cursor() {
            return false;
        }
        self.history.commit(next);
        true
    }

    /// Backspace is its own commit rather than an alias for undo: it always
    /// steps exactly one cell back, whatever the last edit was, and can itself
    /// be undone.
    fn backspace(&mut self) -> bool {
        let mut next = self.ledger().clone();
        if !next.retract() {
            return false;
        }
        self.history.commit(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::CellStatus;

    fn chunk(s: &str) -> Action {
        Action::TextChunk(s.to_string())
    }

    #[test]
    fn test_ignore_is_ignored() {
        let mut s = TraceSession::new("ab", &Config::default());
        assert_eq!(s.apply(Action::Ignore), Transition::Ignored);
        assert_eq!(s.history().depth(), 1);
    }

    #[test]
    fn test_overrun_does_not_commit() {
        let mut s = TraceSession::new("a", &Config::default());
        assert_eq!(s.apply(chunk("a")), Transition::Completed);
        let depth = s.history().depth();
        assert_eq!(s.apply(chunk("bcd")), Transition::Unchanged);
        assert_eq!(s.apply(Action::Newline), Transition::Unchanged);
        assert_eq!(s.history().depth(), depth);
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_backspace_commits_and_is_undoable() {
        let mut s = TraceSession::new("abc", &Config::default());
        s.apply(chunk("ax"));
        assert_eq!(s.apply(Action::Backspace), Transition::Changed);
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.ledger().cell(1).unwrap().status, CellStatus::Untyped);

        assert_eq!(s.apply(Action::Undo), Transition::Changed);
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.ledger().cell(1).unwrap().status, CellStatus::Incorrect);
    }

    #[test]
    fn test_backspace_at_start_is_unchanged() {
        let mut s = TraceSession::new("abc", &Config::default());
        assert_eq!(s.apply(Action::Backspace), Transition::Unchanged);
        assert_eq!(s.history().depth(), 1);
    }

    #[test]
    fn test_undo_redo_on_empty_stacks() {
        let mut s = TraceSession::new("abc", &Config::default());
        assert_eq!(s.apply(Action::Undo), Transition::Unchanged);
        assert_eq!(s.apply(Action::Redo), Transition::Unchanged);
    }

    #[test]
    fn test_composed_chunk_is_one_history_entry() {
        let mut s = TraceSession::new("你好世界", &Config::default());
        s.apply(chunk("你好"));
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.history().depth(), 2);
        s.apply(Action::Undo);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_decomposed_reference_is_composed() {
        let mut s = TraceSession::new("e\u{301}x", &Config::default());
        assert_eq!(s.ledger().len(), 2);
        assert_eq!(s.apply(chunk("\u{e9}")), Transition::Changed);
        assert_eq!(s.ledger().cell(0).unwrap().status, CellStatus::Correct);
    }

    #[test]
    fn test_decomposed_chunk_matches_per_char_typing() {
        let mut chunked = TraceSession::new("e\u{301}x", &Config::default());
        let mut sequential = chunked.clone();
        chunked.apply(chunk("e\u{301}"));
        sequential.apply(chunk("e"));
        sequential.apply(chunk("\u{301}"));
        assert_eq!(chunked.ledger(), sequential.ledger());
        assert_eq!(chunked.cursor(), 2);
        assert_eq!(chunked.ledger().count(CellStatus::Incorrect), 2);
    }

    #[test]
    fn test_reference_kept_verbatim_when_normalization_off() {
        let cfg = Config {
            normalize_unicode: false,
            normalize_line_endings: false,
            ..Config::default()
        };
        let mut s = TraceSession::new("e\u{301}", &cfg);
        assert_eq!(s.ledger().len(), 2);
        assert_eq!(s.apply(chunk("e\u{301}")), Transition::Completed);
    }

    #[test]
    fn test_restart_clears_history() {
        let mut s = TraceSession::resume("abc", 2, &Config::default());
        s.apply(chunk("c"));
        s.restart();
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.history().depth(), 1);
        assert_eq!(s.ledger().count(CellStatus::Untyped), 3);
    }
}
