//! Input classification.
//!
//! The input surface reports four kinds of signals: composition start/update/
//! end from an IME, raw key-downs with modifier flags, and generic text-input
//! notifications. `InputClassifier::handle` folds each of them into exactly one
//! `Action`. It keeps only the state needed to disambiguate channels (whether a
//! composition is open, and what was just consumed) and knows nothing about
//! the ledger or whether the session is complete.

use tracing::debug;

/// Modifier flags carried by a key-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Command on macOS, Windows key elsewhere
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        alt: false,
        shift: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl or Meta: the platform's primary shortcut modifier.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Alt, or Ctrl and Meta held together.
    pub fn secondary(&self) -> bool {
        self.alt || (self.ctrl && self.meta)
    }
}

/// Key identity of a key-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Printable character (already shifted, e.g. 'A' for Shift+a)
    Char(char),
    Backspace,
    Enter,
    /// Anything else: arrows, function keys, bare modifiers, the IME
    /// "Process" placeholder
    Named(String),
}

/// Raw signal from the input surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    CompositionStart,
    /// Intermediate preedit; never affects the ledger
    CompositionUpdate(String),
    /// Finalized composed text (empty when the composition was cancelled)
    CompositionEnd(String),
    KeyDown { key: Key, modifiers: Modifiers },
    /// Generic text-input carrying the value entered since the surface was
    /// last cleared
    TextInput(String),
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        Self::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn char(ch: char) -> Self {
        Self::key(Key::Char(ch))
    }
}

/// Classified intent handed to the session reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Undo,
    Redo,
    Backspace,
    Newline,
    TextChunk(String),
    Ignore,
}

/// Stateful classifier for one input surface.
#[derive(Debug, Clone, Default)]
pub struct InputClassifier {
    composing: bool,
    /// Payload consumed by the previous event. A text-input event repeating
    /// it right away is the same characters arriving on a second channel.
    last_consumed: Option<String>,
}

impl InputClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an IME composition is currently open.
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Forget any open composition and pending de-duplication payload.
    pub fn reset(&mut self) {
        self.composing = false;
        self.last_consumed = None;
    }

    /// Classify one event.
    pub fn handle(&mut self, event: InputEvent) -> Action {
        let pending = self.last_consumed.take();
        let action = match event {
            InputEvent::CompositionStart => {
                self.composing = true;
                Action::Ignore
            }
            InputEvent::CompositionUpdate(_) => Action::Ignore,
            InputEvent::CompositionEnd(text) => {
                self.composing = false;
                self.consume(text)
            }
            InputEvent::KeyDown { .. } if self.composing => Action::Ignore,
            InputEvent::KeyDown { key, modifiers } => self.classify_key(key, modifiers),
            InputEvent::TextInput(_) if self.composing => Action::Ignore,
            InputEvent::TextInput(text) => {
                if pending.as_deref() == Some(text.as_str()) {
                    debug!(payload = %text, "dropping duplicate text-input delivery");
                    Action::Ignore
                } else {
                    self.consume(text)
                }
            }
        };
        debug!(?action, composing = self.composing, "classified input event");
        action
    }

    fn classify_key(&mut self, key: Key, modifiers: Modifiers) -> Action {
        match key {
            Key::Char(ch) if modifiers.primary() => {
                if modifiers.secondary() || !ch.eq_ignore_ascii_case(&'z') {
                    Action::Ignore
                } else if modifiers.shift {
                    Action::Redo
                } else {
                    Action::Undo
                }
            }
            Key::Char(_) if modifiers.alt => Action::Ignore,
            Key::Char(ch) if ch.is_control() => Action::Ignore,
            Key::Char(ch) => self.consume(ch.to_string()),
            Key::Backspace if modifiers.primary() || modifiers.alt => Action::Ignore,
            Key::Backspace => Action::Backspace,
            Key::Enter if modifiers.primary() || modifiers.alt => Action::Ignore,
            Key::Enter => Action::Newline,
            Key::Named(_) => Action::Ignore,
        }
    }

    fn consume(&mut self, text: String) -> Action {
        if text.is_empty() {
            return Action::Ignore;
        }
        self.last_consumed = Some(text.clone());
        Action::TextChunk(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(s: &str) -> Action {
        Action::TextChunk(s.to_string())
    }

    #[test]
    fn test_plain_key_is_text_chunk() {
        let mut c = InputClassifier::new();
        assert_eq!(c.handle(InputEvent::char('a')), chunk("a"));
        assert_eq!(c.handle(InputEvent::char(' ')), chunk(" "));
    }

    #[test]
    fn test_shifted_char_is_text() {
        let mut c = InputClassifier::new();
        let ev = InputEvent::KeyDown {
            key: Key::Char('A'),
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::NONE
            },
        };
        assert_eq!(c.handle(ev), chunk("A"));
    }

    #[test]
    fn test_control_keys() {
        let mut c = InputClassifier::new();
        assert_eq!(c.handle(InputEvent::key(Key::Backspace)), Action::Backspace);
        assert_eq!(c.handle(InputEvent::key(Key::Enter)), Action::Newline);
        assert_eq!(
            c.handle(InputEvent::key(Key::Named("ArrowLeft".into()))),
            Action::Ignore
        );
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut c = InputClassifier::new();
        let undo = InputEvent::KeyDown {
            key: Key::Char('z'),
            modifiers: Modifiers::ctrl(),
        };
        let redo = InputEvent::KeyDown {
            key: Key::Char('Z'),
            modifiers: Modifiers::ctrl_shift(),
        };
        let meta_undo = InputEvent::KeyDown {
            key: Key::Char('z'),
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        };
        assert_eq!(c.handle(undo), Action::Undo);
        assert_eq!(c.handle(redo), Action::Redo);
        assert_eq!(c.handle(meta_undo), Action::Undo);
    }

    #[test]
    fn test_unrecognized_modifier_combos_are_ignored() {
        let mut c = InputClassifier::new();
        let ctrl_c = InputEvent::KeyDown {
            key: Key::Char('c'),
            modifiers: Modifiers::ctrl(),
        };
        let ctrl_alt_z = InputEvent::KeyDown {
            key: Key::Char('z'),
            modifiers: Modifiers {
                ctrl: true,
                alt: true,
                ..Modifiers::NONE
            },
        };
        let ctrl_meta_z = InputEvent::KeyDown {
            key: Key::Char('z'),
            modifiers: Modifiers {
                ctrl: true,
                meta: true,
                ..Modifiers::NONE
            },
        };
        let ctrl_meta_shift_z = InputEvent::KeyDown {
            key: Key::Char('Z'),
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::ctrl_shift()
            },
        };
        assert_eq!(c.handle(ctrl_c), Action::Ignore);
        assert_eq!(c.handle(ctrl_alt_z), Action::Ignore);
        assert_eq!(c.handle(ctrl_meta_z), Action::Ignore);
        assert_eq!(c.handle(ctrl_meta_shift_z), Action::Ignore);
    }

    #[test]
    fn test_keys_ignored_while_composing() {
        let mut c = InputClassifier::new();
        assert_eq!(c.handle(InputEvent::CompositionStart), Action::Ignore);
        assert!(c.is_composing());
        assert_eq!(c.handle(InputEvent::char('n')), Action::Ignore);
        assert_eq!(c.handle(InputEvent::key(Key::Backspace)), Action::Ignore);
        assert_eq!(
            c.handle(InputEvent::CompositionUpdate("ni".into())),
            Action::Ignore
        );
        assert_eq!(c.handle(InputEvent::TextInput("ni".into())), Action::Ignore);
        assert_eq!(c.handle(InputEvent::CompositionEnd("你".into())), chunk("你"));
        assert!(!c.is_composing());
    }

    #[test]
    fn test_cancelled_composition_is_ignored() {
        let mut c = InputClassifier::new();
        c.handle(InputEvent::CompositionStart);
        assert_eq!(c.handle(InputEvent::CompositionEnd(String::new())), Action::Ignore);
    }

    #[test]
    fn test_duplicate_text_input_after_composition_is_dropped() {
        let mut c = InputClassifier::new();
        c.handle(InputEvent::CompositionStart);
        assert_eq!(
            c.handle(InputEvent::CompositionEnd("你好".into())),
            chunk("你好")
        );
        assert_eq!(c.handle(InputEvent::TextInput("你好".into())), Action::Ignore);
        // only the immediately following echo is dropped
        assert_eq!(c.handle(InputEvent::TextInput("你好".into())), chunk("你好"));
    }

    #[test]
    fn test_duplicate_text_input_after_key_is_dropped() {
        let mut c = InputClassifier::new();
        assert_eq!(c.handle(InputEvent::char('a')), chunk("a"));
        assert_eq!(c.handle(InputEvent::TextInput("a".into())), Action::Ignore);
    }

    #[test]
    fn test_different_text_input_is_consumed() {
        let mut c = InputClassifier::new();
        c.handle(InputEvent::char('a'));
        assert_eq!(c.handle(InputEvent::TextInput("xy".into())), chunk("xy"));
        assert_eq!(c.handle(InputEvent::TextInput(String::new())), Action::Ignore);
    }

    #[test]
    fn test_intervening_event_clears_dedup() {
        let mut c = InputClassifier::new();
        c.handle(InputEvent::char('a'));
        c.handle(InputEvent::key(Key::Named("Shift".into())));
        assert_eq!(c.handle(InputEvent::TextInput("a".into())), chunk("a"));
    }
}
