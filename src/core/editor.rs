//! # Line Editor
//!
//! Owns the in-progress command buffer and the submitted-line history.
//! `apply()` consumes one decoded [`KeyAction`], mutates the buffer, and
//! reports what the rendering surface must do to stay in sync.
//!
//! The feedback instructions are incremental: after any sequence
//! of actions the visible line is an exact rendering of the buffer without
//! the surface ever redrawing the whole line. Echo one char, erase one
//! cell, or erase-then-replace for history recall, and nothing else.

use crate::core::decoder::KeyAction;

/// Instruction for the rendering surface after an action was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Echo one just-typed character.
    Echo(char),
    /// Erase the last visible cell (backspace, space, backspace).
    EraseOne,
    /// Move to the next line (a line was submitted, possibly empty).
    Newline,
    /// Show the interrupt echo (`^C`) and move to the next line.
    InterruptEcho,
    /// History recall: erase `erase` cells, then echo `text`.
    Replace { erase: usize, text: String },
}

/// Result of applying one key action.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub feedback: Option<Feedback>,
    /// A completed, trimmed, non-empty command line. Present only on Enter.
    pub submitted: Option<String>,
}

impl Applied {
    fn none() -> Self {
        Self::default()
    }

    fn feedback(fb: Feedback) -> Self {
        Self {
            feedback: Some(fb),
            submitted: None,
        }
    }
}

/// Cursor into the history list, ranging over `[0, len]` where `len` means
/// "no recalled entry, fresh buffer". Increments and decrements clamp at
/// the bounds instead of wrapping or failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    pos: usize,
    len: usize,
}

impl HistoryCursor {
    pub fn new() -> Self {
        Self { pos: 0, len: 0 }
    }

    /// A cursor at the fresh position over `len` entries.
    pub fn fresh(len: usize) -> Self {
        Self { pos: len, len }
    }

    /// Record one appended history entry and reset to the fresh position.
    pub fn append_and_reset(&mut self) {
        self.len += 1;
        self.pos = self.len;
    }

    /// Move toward older entries. Returns `false` when already at the oldest.
    pub fn up(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        true
    }

    /// Move toward newer entries. Returns `false` when already at the fresh
    /// position.
    pub fn down(&mut self) -> bool {
        if self.pos >= self.len {
            return false;
        }
        self.pos += 1;
        true
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True when the cursor sits past the newest entry (fresh buffer).
    pub fn at_fresh(&self) -> bool {
        self.pos == self.len
    }
}

impl Default for HistoryCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffer + history state machine. One per session.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
    history: Vec<String>,
    cursor: HistoryCursor,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Discard any in-progress line, keeping history. Used when a new run
    /// starts so stale input cannot leak into it.
    pub fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.cursor = HistoryCursor::fresh(self.history.len());
    }

    /// Apply one key action. See [`Feedback`] for what the surface must do.
    pub fn apply(&mut self, action: KeyAction) -> Applied {
        match action {
            KeyAction::Char(c) => {
                self.buffer.push(c);
                Applied::feedback(Feedback::Echo(c))
            }
            KeyAction::Backspace => {
                if self.buffer.pop().is_some() {
                    Applied::feedback(Feedback::EraseOne)
                } else {
                    Applied::none()
                }
            }
            KeyAction::Enter => {
                let line = self.buffer.trim().to_string();
                self.buffer.clear();
                self.cursor = HistoryCursor::fresh(self.history.len());
                if line.is_empty() {
                    // Whitespace-only lines submit nothing and enter no history.
                    Applied::feedback(Feedback::Newline)
                } else {
                    self.history.push(line.clone());
                    self.cursor.append_and_reset();
                    Applied {
                        feedback: Some(Feedback::Newline),
                        submitted: Some(line),
                    }
                }
            }
            KeyAction::Interrupt => {
                self.buffer.clear();
                self.cursor = HistoryCursor::fresh(self.history.len());
                Applied::feedback(Feedback::InterruptEcho)
            }
            KeyAction::HistoryUp => {
                if !self.cursor.up() {
                    return Applied::none();
                }
                self.recall()
            }
            KeyAction::HistoryDown => {
                if !self.cursor.down() {
                    return Applied::none();
                }
                self.recall()
            }
            KeyAction::Ignore => Applied::none(),
        }
    }

    /// Replace the buffer with the entry under the cursor (empty at the
    /// fresh position) and emit the erase-then-echo feedback.
    fn recall(&mut self) -> Applied {
        let erase = self.buffer.chars().count();
        let text = if self.cursor.at_fresh() {
            String::new()
        } else {
            self.history[self.cursor.pos()].clone()
        };
        self.buffer = text.clone();
        Applied::feedback(Feedback::Replace { erase, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::KeyAction::*;

    fn type_line(editor: &mut LineEditor, line: &str) -> Option<String> {
        for c in line.chars() {
            editor.apply(Char(c));
        }
        editor.apply(Enter).submitted
    }

    #[test]
    fn test_chars_accumulate_without_submission() {
        let mut ed = LineEditor::new();
        for c in "go north".chars() {
            let applied = ed.apply(Char(c));
            assert_eq!(applied.feedback, Some(Feedback::Echo(c)));
            assert!(applied.submitted.is_none());
        }
        assert_eq!(ed.buffer(), "go north");
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_noop() {
        let mut ed = LineEditor::new();
        let applied = ed.apply(Backspace);
        assert_eq!(applied, Applied::none());
        assert_eq!(ed.buffer(), "");
    }

    #[test]
    fn test_backspace_drops_last_char() {
        let mut ed = LineEditor::new();
        ed.apply(Char('a'));
        ed.apply(Char('b'));
        let applied = ed.apply(Backspace);
        assert_eq!(applied.feedback, Some(Feedback::EraseOne));
        assert_eq!(ed.buffer(), "a");
    }

    #[test]
    fn test_submit_trims_and_records_history() {
        let mut ed = LineEditor::new();
        assert_eq!(type_line(&mut ed, "  look  "), Some("look".to_string()));
        assert_eq!(type_line(&mut ed, "go north"), Some("go north".to_string()));
        assert_eq!(ed.history(), ["look", "go north"]);
        assert_eq!(ed.buffer(), "");
    }

    #[test]
    fn test_whitespace_only_line_submits_nothing() {
        let mut ed = LineEditor::new();
        assert_eq!(type_line(&mut ed, "   "), None);
        assert!(ed.history().is_empty());
        // Still emits the newline so the prompt advances.
        ed.apply(Char(' '));
        let applied = ed.apply(Enter);
        assert_eq!(applied.feedback, Some(Feedback::Newline));
    }

    #[test]
    fn test_interrupt_clears_buffer() {
        let mut ed = LineEditor::new();
        ed.apply(Char('x'));
        let applied = ed.apply(Interrupt);
        assert_eq!(applied.feedback, Some(Feedback::InterruptEcho));
        assert!(applied.submitted.is_none());
        assert_eq!(ed.buffer(), "");
        assert!(ed.history().is_empty());
    }

    #[test]
    fn test_history_navigation_clamps_at_both_ends() {
        let mut ed = LineEditor::new();
        type_line(&mut ed, "a");
        type_line(&mut ed, "b");

        let applied = ed.apply(HistoryUp);
        assert_eq!(ed.buffer(), "b");
        assert_eq!(
            applied.feedback,
            Some(Feedback::Replace { erase: 0, text: "b".to_string() })
        );

        ed.apply(HistoryUp);
        assert_eq!(ed.buffer(), "a");

        // Clamped at the oldest entry.
        let applied = ed.apply(HistoryUp);
        assert_eq!(applied, Applied::none());
        assert_eq!(ed.buffer(), "a");

        ed.apply(HistoryDown);
        assert_eq!(ed.buffer(), "b");
    }

    #[test]
    fn test_history_down_past_newest_yields_empty_buffer() {
        let mut ed = LineEditor::new();
        type_line(&mut ed, "look");
        ed.apply(HistoryUp);
        assert_eq!(ed.buffer(), "look");

        let applied = ed.apply(HistoryDown);
        assert_eq!(ed.buffer(), "");
        assert_eq!(
            applied.feedback,
            Some(Feedback::Replace { erase: 4, text: String::new() })
        );

        // Clamped at the fresh position.
        assert_eq!(ed.apply(HistoryDown), Applied::none());
    }

    #[test]
    fn test_recall_erase_count_matches_visible_chars() {
        let mut ed = LineEditor::new();
        type_line(&mut ed, "inventory");
        ed.apply(Char('g'));
        ed.apply(Char('o'));
        let applied = ed.apply(HistoryUp);
        assert_eq!(
            applied.feedback,
            Some(Feedback::Replace { erase: 2, text: "inventory".to_string() })
        );
    }

    #[test]
    fn test_submit_resets_history_cursor_to_fresh() {
        let mut ed = LineEditor::new();
        type_line(&mut ed, "a");
        type_line(&mut ed, "b");
        ed.apply(HistoryUp);
        ed.apply(HistoryUp);
        assert_eq!(ed.buffer(), "a");

        // Submitting the recalled entry appends it again and resets the cursor.
        let submitted = ed.apply(Enter).submitted;
        assert_eq!(submitted, Some("a".to_string()));
        assert_eq!(ed.history(), ["a", "b", "a"]);

        ed.apply(HistoryUp);
        assert_eq!(ed.buffer(), "a");
    }

    #[test]
    fn test_ignore_changes_nothing() {
        let mut ed = LineEditor::new();
        ed.apply(Char('z'));
        assert_eq!(ed.apply(Ignore), Applied::none());
        assert_eq!(ed.buffer(), "z");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut c = HistoryCursor::new();
        assert!(!c.up());
        assert!(!c.down());
        c.append_and_reset();
        c.append_and_reset();
        assert_eq!(c.pos(), 2);
        assert!(c.at_fresh());
        assert!(c.up());
        assert!(c.up());
        assert!(!c.up());
        assert_eq!(c.pos(), 0);
        assert!(c.down());
        assert!(c.down());
        assert!(!c.down());
        assert!(c.at_fresh());
    }
}
