//! # Input Decoder
//!
//! Classifies one raw terminal token (a single code point or a short
//! escape sequence, the unit a raw-mode terminal emits per keypress)
//! into a semantic key action. Pure classification, no state.
//!
//! The token vocabulary matches what xterm-style terminals send: `\x03`
//! for Ctrl+C, `\r` for Enter, `\x7f` for Backspace, `ESC [ A` / `ESC O A`
//! for cursor-up (CSI and SS3 variants, depending on cursor key mode).

/// Semantic action for one raw input token. Closed set: every token maps
/// to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// A printable ASCII character to append to the line buffer.
    Char(char),
    Backspace,
    Enter,
    /// Ctrl+C: clear the line, and stop the session if one is running.
    Interrupt,
    HistoryUp,
    HistoryDown,
    /// Anything the bridge has no use for (function keys, cursor left/right,
    /// non-ASCII input, stray control codes).
    Ignore,
}

const ETX: char = '\u{3}'; // Ctrl+C
const BS: char = '\u{8}';
const ESC: char = '\u{1b}';
const DEL: char = '\u{7f}';

/// Classify a raw input token.
///
/// Rules in priority order: interrupt, enter, backspace, recognized cursor
/// up/down escapes, any other escape-introduced sequence (ignored), printable
/// ASCII, everything else (ignored).
pub fn decode(token: &str) -> KeyAction {
    let mut chars = token.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return KeyAction::Ignore,
    };

    match first {
        ETX => KeyAction::Interrupt,
        '\r' | '\n' => KeyAction::Enter,
        DEL | BS => KeyAction::Backspace,
        ESC => match token {
            "\u{1b}[A" | "\u{1b}OA" => KeyAction::HistoryUp,
            "\u{1b}[B" | "\u{1b}OB" => KeyAction::HistoryDown,
            _ => KeyAction::Ignore,
        },
        c if token.len() == c.len_utf8() && (' '..='~').contains(&c) => KeyAction::Char(c),
        _ => KeyAction::Ignore,
    }
}
