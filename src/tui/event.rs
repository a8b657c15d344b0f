use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Session control chords (everything that is not game input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    /// Ctrl+G: start the selected version.
    Start,
    /// Ctrl+S: snapshot the in-game save file.
    Save,
    /// Ctrl+O: restore the most recent snapshot.
    Load,
    /// Ctrl+E: export the most recent snapshot to a file.
    Export,
    /// Ctrl+T: import a snapshot from the import drop file.
    Import,
    /// Ctrl+N: select the next game version.
    NextVersion,
    /// Ctrl+P: select the previous game version.
    PrevVersion,
    /// Ctrl+Q: leave the bridge.
    Quit,
}

/// TUI-specific input events
pub enum TuiEvent {
    /// One raw input token, in the byte form a terminal emits: printable
    /// characters as themselves, Enter as `\r`, Backspace as DEL, the
    /// arrows as CSI sequences, Ctrl+C as ETX.
    Raw(String),
    Control(ControlKey),
    Resize,
}

/// Poll for an event with timeout (blocks up to 100ms)
pub fn poll_event() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::from_millis(100))
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    if event::poll(timeout).ok()? {
        match event::read().ok()? {
            Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                log::debug!(
                    "Key event: {:?} with modifiers {:?}",
                    key_event.code,
                    key_event.modifiers
                );
                translate_key(key_event)
            }
            Event::Resize(_, _) => Some(TuiEvent::Resize),
            _ => None,
        }
    } else {
        None
    }
}

/// Map one key event to a control chord or a raw token.
fn translate_key(key_event: KeyEvent) -> Option<TuiEvent> {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        let control = match key_event.code {
            // Ctrl+C is game input (the interrupt), not a control chord.
            KeyCode::Char('c') => return Some(TuiEvent::Raw("\u{3}".to_string())),
            KeyCode::Char('g') => ControlKey::Start,
            KeyCode::Char('s') => ControlKey::Save,
            KeyCode::Char('o') => ControlKey::Load,
            KeyCode::Char('e') => ControlKey::Export,
            KeyCode::Char('t') => ControlKey::Import,
            KeyCode::Char('n') => ControlKey::NextVersion,
            KeyCode::Char('p') => ControlKey::PrevVersion,
            KeyCode::Char('q') => ControlKey::Quit,
            _ => return None,
        };
        return Some(TuiEvent::Control(control));
    }

    let token = match key_event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Backspace => "\u{7f}".to_string(),
        KeyCode::Up => "\u{1b}[A".to_string(),
        KeyCode::Down => "\u{1b}[B".to_string(),
        _ => return None,
    };
    Some(TuiEvent::Raw(token))
}
