//! Line-oriented terminal driver.
//!
//! A terminal in cooked mode delivers whole lines, so each line is expanded
//! into the events a keyboard would have produced: one key-down per
//! character followed by Enter. Lines starting with `:` are commands:
//!
//! - `:undo`, `:redo` send the undo/redo shortcuts
//! - `:bs [n]` sends `n` backspaces (default 1), never more than the cursor
//! - `:ime <text>` simulates an IME composition committing `<text>`, including
//!   the duplicate text-input echo a browser would send
//! - `:restart` and `:quit` (`:q`) control the session
//! - `::<text>` types `:<text>` literally

use typetrace_core::{CellStatus, InputEvent, Key, Ledger, Modifiers, Practice, ProgressStore};

/// Glyph shown in place of a line-break cell.
pub const LINE_BREAK_GLYPH: char = '↲';

/// What one stdin line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Events(Vec<InputEvent>),
    /// Repeat count from `:bs`, applied by `backspace`
    Backspace(usize),
    Restart,
    Quit,
    Unknown(String),
}

/// Translate one stdin line (without its trailing newline).
pub fn parse_line(line: &str) -> LineInput {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if let Some(literal) = line.strip_prefix("::") {
        return LineInput::Events(typed_line(&format!(":{literal}")));
    }
    let Some(command) = line.strip_prefix(':') else {
        return LineInput::Events(typed_line(line));
    };

    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, Some(arg)),
        None => (command, None),
    };
    match (name, arg) {
        ("undo", None) => LineInput::Events(vec![shortcut('z', false)]),
        ("redo", None) => LineInput::Events(vec![shortcut('Z', true)]),
        ("bs", None) => LineInput::Backspace(1),
        ("bs", Some(n)) => match n.trim().parse::<usize>() {
            Ok(n) => LineInput::Backspace(n),
            Err(_) => LineInput::Unknown(line.to_string()),
        },
        ("ime", Some(text)) => LineInput::Events(vec![
            InputEvent::CompositionStart,
            InputEvent::CompositionUpdate(text.to_string()),
            InputEvent::CompositionEnd(text.to_string()),
            InputEvent::TextInput(text.to_string()),
        ]),
        ("restart", None) => LineInput::Restart,
        ("quit", None) | ("q", None) => LineInput::Quit,
        _ => LineInput::Unknown(line.to_string()),
    }
}

fn typed_line(line: &str) -> Vec<InputEvent> {
    line.chars()
        .map(InputEvent::char)
        .chain(std::iter::once(InputEvent::key(Key::Enter)))
        .collect()
}

fn shortcut(ch: char, shift: bool) -> InputEvent {
    InputEvent::KeyDown {
        key: Key::Char(ch),
        modifiers: if shift {
            Modifiers::ctrl_shift()
        } else {
            Modifiers::ctrl()
        },
    }
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31;4m";
const CURSOR: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";

/// Render the ledger.
///
/// With `color`, correct cells are green, incorrect ones red and underlined,
/// and the cursor cell is reverse video. Without it, incorrect cells are
/// wrapped in `[..]` and the cursor is shown as `|`.
pub fn render(ledger: &Ledger, color: bool) -> String {
    let mut out = String::with_capacity(ledger.len() * 2);
    for (i, cell) in ledger.cells().iter().enumerate() {
        let shown = if cell.is_line_break() {
            format!("{LINE_BREAK_GLYPH}\n")
        } else {
            cell.expected.to_string()
        };
        let at_cursor = i == ledger.cursor();
        match (color, cell.status) {
            (true, CellStatus::Correct) => out.push_str(&format!("{GREEN}{shown}{RESET}")),
            (true, CellStatus::Incorrect) => out.push_str(&format!("{RED}{shown}{RESET}")),
            (true, CellStatus::Untyped) if at_cursor => {
                out.push_str(&format!("{CURSOR}{shown}{RESET}"))
            }
            (true, CellStatus::Untyped) => out.push_str(&shown),
            (false, status) => {
                if at_cursor {
                    out.push('|');
                }
                if status == CellStatus::Incorrect {
                    out.push('[');
                    out.push_str(shown.trim_end_matches('\n'));
                    out.push(']');
                    if cell.is_line_break() {
                        out.push('\n');
                    }
                } else {
                    out.push_str(&shown);
                }
            }
        }
    }
    if !color && ledger.is_complete() {
        out.push('|');
    }
    out
}

/// `progress: 3 / 5 (60.0%) · errors: 1`
pub fn status_line(ledger: &Ledger) -> String {
    format!(
        "progress: {} / {} ({:.1}%) · errors: {}",
        ledger.cursor(),
        ledger.len(),
        ledger.progress_percent(),
        ledger.count(CellStatus::Incorrect)
    )
}

/// Feed a parsed line into a practice session. Returns `true` when the
/// session transitioned into completion during this line.
pub fn feed<S: ProgressStore + ?Sized + 'static>(
    practice: &mut Practice<S>,
    events: Vec<InputEvent>,
) -> bool {
    let mut completed = false;
    for event in events {
        if practice.process_event(event) == typetrace_core::Transition::Completed {
            completed = true;
        }
    }
    completed
}

/// Send up to `n` backspace key presses, stopping once the cursor is at 0.
/// Returns how many were sent.
pub fn backspace<S: ProgressStore + ?Sized + 'static>(
    practice: &mut Practice<S>,
    n: usize,
) -> usize {
    let count = n.min(practice.cursor());
    for _ in 0..count {
        practice.process_event(InputEvent::key(Key::Backspace));
    }
    count
}
