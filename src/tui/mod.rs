//! # TUI Adapter
//!
//! The crossterm-specific layer: raw-mode terminal setup, the event loop,
//! and the translation of keyboard events into session calls.
//!
//! This is the only module that knows about crossterm. The session itself
//! consumes raw byte tokens and emits surface instructions, so a different
//! front end could drive it without touching the core.
//!
//! ## Loop shape
//!
//! Each iteration drains pending keyboard events (one blocking poll of up
//! to 100ms, then immediate polls until empty), routes them through the
//! session, then pumps the interpreter once. The interpreter never blocks
//! the loop: a pump turn forwards whatever input and output is ready and
//! returns.

mod event;
pub mod surface;

use std::sync::Arc;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::session::GameSession;
use crate::core::versions::{self, VERSIONS};
use crate::interp::{InterpreterFactory, ProcessFactory};
use crate::store::{JsonFileStore, SaveStore, StoreError};
use crate::tui::event::{ControlKey, TuiEvent, poll_event, poll_event_immediate};
use crate::tui::surface::{Surface, TermSurface, apply_feedback};

/// Raw mode for the lifetime of the session, restored on every exit path.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> std::io::Result<Self> {
        enable_raw_mode()?;
        info!("Raw mode enabled");
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Bridge messages are prefixed so they never read as game output.
fn notice(surface: &mut dyn Surface, message: &str) {
    surface.write_line(&format!("[System] {message}"));
}

/// Run the bridge until the user quits. Blocks the task for the whole
/// session.
pub async fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let store = match JsonFileStore::open(&config.saves_dir) {
        Ok(backend) => SaveStore::new(Arc::new(backend)),
        Err(e) => {
            warn!("Save storage unavailable, continuing without it: {e}");
            SaveStore::unavailable()
        }
    };
    let store_missing = !store.is_available();
    let mut session = GameSession::new(config, store);

    let _raw = RawModeGuard::new()?;
    let mut surface = TermSurface::new();
    surface.clear();
    notice(&mut surface, "zorkbridge: classic Zork under glass");
    if store_missing {
        notice(&mut surface, "save storage unavailable; save/load disabled");
    }

    session.begin_loading();
    notice(&mut surface, "acquiring interpreter...");
    let factory = ProcessFactory;
    let acquired = factory.acquire(session.config()).await;
    match acquired {
        Ok(interpreter) => session.attach_interpreter(interpreter),
        Err(e) => {
            session.acquisition_failed(&e);
            notice(&mut surface, &format!("fatal: {e}"));
            notice(&mut surface, "fix the installation and restart the bridge");
            return Ok(());
        }
    }

    describe_selection(&mut surface, &session);
    notice(
        &mut surface,
        "^G start  ^N/^P version  ^S save  ^O load  ^E export  ^T import  ^Q quit",
    );

    loop {
        let mut quit = false;
        let mut next = poll_event();
        while let Some(ev) = next.take() {
            match ev {
                TuiEvent::Raw(token) => {
                    let outcome = session.handle_raw_input(&token);
                    if let Some(feedback) = &outcome.feedback {
                        apply_feedback(&mut surface, feedback);
                    }
                    if outcome.not_active {
                        notice(&mut surface, "no game is running; press ^G to start");
                    }
                    if let Some(reason) = &outcome.stopped {
                        notice(&mut surface, &format!("session stopped: {reason}"));
                    }
                }
                TuiEvent::Control(ControlKey::Quit) => quit = true,
                TuiEvent::Control(control) => {
                    handle_control(&mut session, &mut surface, control).await;
                }
                TuiEvent::Resize => {}
            }
            next = poll_event_immediate();
        }
        if quit {
            break;
        }

        let mut output = Vec::new();
        let stopped = session.pump(&mut |b| output.push(b));
        if !output.is_empty() {
            surface.write_str(&String::from_utf8_lossy(&output));
        }
        if let Some(reason) = stopped {
            notice(&mut surface, &format!("session stopped: {reason}"));
            notice(&mut surface, "press ^G to play again, ^Q to quit");
        }
    }

    notice(&mut surface, "goodbye");
    Ok(())
}

fn describe_selection(surface: &mut dyn Surface, session: &GameSession) {
    match versions::find(session.selected_version()) {
        Some(version) => notice(surface, &format!("selected: {}", version.label)),
        None => notice(
            surface,
            &format!("selected: {} (unknown version)", session.selected_version()),
        ),
    }
}

/// Step the version selector through the registry in either direction.
fn cycle_version(session: &mut GameSession, forward: bool) {
    let current = VERSIONS
        .iter()
        .position(|v| v.id == session.selected_version())
        .unwrap_or(0);
    let next = if forward {
        (current + 1) % VERSIONS.len()
    } else {
        (current + VERSIONS.len() - 1) % VERSIONS.len()
    };
    // The registry id is always valid, so this cannot fail.
    let _ = session.select_version(VERSIONS[next].id);
}

async fn handle_control(
    session: &mut GameSession,
    surface: &mut dyn Surface,
    control: ControlKey,
) {
    let controls = session.controls();
    match control {
        ControlKey::Start => {
            if !controls.start {
                notice(surface, "cannot start right now");
                return;
            }
            match session.start() {
                Ok(version) => notice(surface, &format!("starting {}...", version.label)),
                Err(e) => notice(surface, &format!("start failed: {e}")),
            }
        }
        ControlKey::NextVersion | ControlKey::PrevVersion => {
            if !controls.version_select {
                notice(surface, "cannot change version while a game is running");
                return;
            }
            cycle_version(session, control == ControlKey::NextVersion);
            describe_selection(surface, session);
        }
        ControlKey::Save => {
            if !controls.save {
                notice(surface, &gate_message(session));
                return;
            }
            match session.save_game().await {
                Ok(snapshot) => notice(surface, &format!("saved snapshot {}", snapshot.id)),
                Err(e) => notice(surface, &format!("save failed: {e}")),
            }
        }
        ControlKey::Load => {
            if !controls.load {
                notice(surface, &gate_message(session));
                return;
            }
            match session.load_game().await {
                Ok(snapshot) => {
                    notice(surface, &format!("restored snapshot {}", snapshot.id));
                    notice(
                        surface,
                        &format!(
                            "use the game's RESTORE command with \"{}\"",
                            versions::ARTIFACT_NAME
                        ),
                    );
                }
                Err(e) => notice(surface, &format!("load failed: {e}")),
            }
        }
        ControlKey::Export => {
            if !controls.export {
                notice(surface, &gate_message(session));
                return;
            }
            match session.export_game().await {
                Ok((snapshot, serialized)) => {
                    let path = session
                        .config()
                        .data_dir
                        .join(format!("export-{}.json", snapshot.id));
                    match tokio::fs::write(&path, serialized).await {
                        Ok(()) => notice(surface, &format!("exported to {}", path.display())),
                        Err(e) => notice(surface, &format!("export failed: {e}")),
                    }
                }
                Err(e) => notice(surface, &format!("export failed: {e}")),
            }
        }
        ControlKey::Import => {
            if !controls.import {
                notice(surface, &gate_message(session));
                return;
            }
            let path = session.config().data_dir.join("import.json");
            match tokio::fs::read_to_string(&path).await {
                Ok(serialized) => match session.import_game(&serialized).await {
                    Ok(snapshot) => {
                        notice(surface, &format!("imported as snapshot {}", snapshot.id));
                    }
                    Err(e) => notice(surface, &format!("import failed: {e}")),
                },
                Err(e) => notice(
                    surface,
                    &format!("import failed: cannot read {}: {e}", path.display()),
                ),
            }
        }
        ControlKey::Quit => {}
    }
}

/// Why a persistence chord is disabled right now.
fn gate_message(session: &GameSession) -> String {
    if session.store_available() {
        StoreError::NotRunning.to_string()
    } else {
        StoreError::Unavailable.to_string()
    }
}
