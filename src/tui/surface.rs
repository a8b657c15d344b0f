//! # Rendering Surface
//!
//! Small write-only abstraction over the raw-mode terminal, so the session
//! loop (and tests) never touch stdout directly. In raw mode `\n` only
//! moves down a row, so every newline written through here becomes `\r\n`.

use std::io::{Write, stdout};

use crate::core::editor::Feedback;

/// Where echoed input and interpreter output land.
pub trait Surface {
    fn write_char(&mut self, c: char);
    fn write_str(&mut self, s: &str);
    /// Write `s` followed by a newline.
    fn write_line(&mut self, s: &str);
    fn clear(&mut self);
}

/// The real terminal, assumed to be in raw mode.
#[derive(Default)]
pub struct TermSurface;

impl TermSurface {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, s: &str) {
        let mut out = stdout();
        // Stdout write failures are not actionable mid-session.
        let _ = out.write_all(s.replace('\n', "\r\n").as_bytes());
        let _ = out.flush();
    }
}

impl Surface for TermSurface {
    fn write_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.emit(c.encode_utf8(&mut buf));
    }

    fn write_str(&mut self, s: &str) {
        self.emit(s);
    }

    fn write_line(&mut self, s: &str) {
        self.emit(s);
        self.emit("\n");
    }

    fn clear(&mut self) {
        let mut out = stdout();
        let _ = out.write_all(b"\x1b[2J\x1b[H");
        let _ = out.flush();
    }
}

/// Render one line-editor feedback instruction. `\x08 \x08` erases one
/// visible cell without assuming anything about the cursor position.
pub fn apply_feedback(surface: &mut dyn Surface, feedback: &Feedback) {
    match feedback {
        Feedback::Echo(c) => surface.write_char(*c),
        Feedback::EraseOne => surface.write_str("\x08 \x08"),
        Feedback::Newline => surface.write_str("\n"),
        Feedback::InterruptEcho => surface.write_str("^C\n"),
        Feedback::Replace { erase, text } => {
            for _ in 0..*erase {
                surface.write_str("\x08 \x08");
            }
            surface.write_str(text);
        }
    }
}
