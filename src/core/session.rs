//! # Game Session
//!
//! The single session-owning object. Everything mutable about a play
//! session (the line editor, the relay queue, the lifecycle state, the
//! interpreter handle, the selected version) lives here as fields, not as
//! ambient globals, so multiple sessions (and test harnesses) can exist
//! independently.
//!
//! The session is the routing layer: raw input tokens go to the line
//! editor only while running, submitted lines go to the relay, the relay
//! feeds the interpreter's pull source, and persistence operations are
//! gated on the lifecycle before they ever reach the store.

use log::{error, info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::decoder::{KeyAction, decode};
use crate::core::editor::{Feedback, LineEditor};
use crate::core::lifecycle::{Controls, Lifecycle, SessionState, StopReason};
use crate::core::relay::RelayQueue;
use crate::core::versions::{self, GameVersion, StartError};
use crate::interp::{AcquireError, Interpreter, StepOutcome};
use crate::store::{SaveSnapshot, SaveStore, StoreError};

/// What one raw input token did to the session.
#[derive(Debug, Default)]
pub struct InputOutcome {
    /// Render instruction for the surface, if any.
    pub feedback: Option<Feedback>,
    /// The token was discarded because no game is running, and the user
    /// should be told so (only in the ready/stopped states).
    pub not_active: bool,
    /// The interrupt stopped the running session this turn.
    pub stopped: Option<StopReason>,
}

/// One play session: interpreter, editor, relay, lifecycle, and save store.
pub struct GameSession {
    config: ResolvedConfig,
    lifecycle: Lifecycle,
    editor: LineEditor,
    relay: RelayQueue,
    interpreter: Option<Box<dyn Interpreter>>,
    store: SaveStore,
    selected_version: String,
    /// Version of the game currently (or last) run; save operations key on
    /// this, never on the selector.
    running_version: Option<String>,
}

impl GameSession {
    pub fn new(config: ResolvedConfig, store: SaveStore) -> Self {
        let selected_version = config.default_version.clone();
        Self {
            config,
            lifecycle: Lifecycle::new(),
            editor: LineEditor::new(),
            relay: RelayQueue::new(),
            interpreter: None,
            store,
            selected_version,
            running_version: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn controls(&self) -> Controls {
        self.lifecycle.controls(self.store.is_available())
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn selected_version(&self) -> &str {
        &self.selected_version
    }

    pub fn store_available(&self) -> bool {
        self.store.is_available()
    }

    // ------------------------------------------------------------------
    // Acquisition
    // ------------------------------------------------------------------

    /// `Idle → Loading`: interpreter acquisition has begun.
    pub fn begin_loading(&mut self) {
        if let Err(e) = self.lifecycle.begin_loading() {
            warn!("begin_loading out of order: {e}");
        }
    }

    /// `Loading → Ready`: acquisition succeeded, the handle is ours.
    pub fn attach_interpreter(&mut self, interpreter: Box<dyn Interpreter>) {
        self.interpreter = Some(interpreter);
        if let Err(e) = self.lifecycle.acquisition_complete() {
            warn!("attach_interpreter out of order: {e}");
        }
    }

    /// Acquisition failed. Terminal for this session: the state stays in
    /// `Loading` with every control disabled; only a restart recovers.
    pub fn acquisition_failed(&mut self, err: &AcquireError) {
        error!("Interpreter acquisition failed (fatal): {err}");
    }

    // ------------------------------------------------------------------
    // Start / stop
    // ------------------------------------------------------------------

    /// Point the selector at a known version. The selector is only honored
    /// by a later `start()`; an unknown id changes nothing.
    pub fn select_version(&mut self, id: &str) -> Result<&'static GameVersion, StartError> {
        let version = versions::find(id).ok_or_else(|| StartError::UnknownVersion(id.to_string()))?;
        self.selected_version = version.id.to_string();
        Ok(version)
    }

    /// Start the selected version: `Ready → Running` (or `Stopped →
    /// Running`, which is the same request). On any error the state is left
    /// untouched, so the session remains startable.
    pub fn start(&mut self) -> Result<&'static GameVersion, StartError> {
        if !self.controls().start {
            return Err(StartError::NotStartable(self.state()));
        }
        let version = versions::find(&self.selected_version)
            .ok_or_else(|| StartError::UnknownVersion(self.selected_version.clone()))?;
        let launch =
            versions::launch_spec(version, &self.config.games_dir, &self.config.interpreter_path)?;

        let interpreter = self
            .interpreter
            .as_mut()
            .ok_or(StartError::NotStartable(SessionState::Idle))?;
        interpreter.start(&launch)?;

        if let Err(e) = self.lifecycle.start() {
            // Unreachable given the controls check above; keep the session
            // consistent anyway.
            warn!("lifecycle start rejected after interpreter start: {e}");
            interpreter.shutdown();
            return Err(StartError::NotStartable(self.state()));
        }

        self.relay.clear();
        self.editor.reset_buffer();
        self.running_version = Some(version.id.to_string());
        info!("Session started: {} ({})", version.id, version.label);
        Ok(version)
    }

    /// `Running → Stopped`. Shuts the interpreter run down and drops any
    /// pending relay input.
    fn stop(&mut self, reason: StopReason) -> StopReason {
        if let Some(interpreter) = self.interpreter.as_mut() {
            interpreter.shutdown();
        }
        self.relay.clear();
        if let Err(e) = self.lifecycle.stop(&reason) {
            warn!("stop out of order: {e}");
        }
        info!("Session stopped: {reason}");
        reason
    }

    // ------------------------------------------------------------------
    // Input routing
    // ------------------------------------------------------------------

    /// Route one raw input token. Keystrokes reach the line editor only
    /// while running; otherwise they are discarded (with a user-visible
    /// notice in the ready/stopped states).
    pub fn handle_raw_input(&mut self, token: &str) -> InputOutcome {
        match self.state() {
            SessionState::Running => {
                let action = decode(token);
                let applied = self.editor.apply(action);
                if let Some(line) = applied.submitted.as_deref() {
                    self.relay.enqueue(line);
                    self.relay.enqueue("\n");
                }
                let stopped = if action == KeyAction::Interrupt {
                    Some(self.stop(StopReason::Interrupted))
                } else {
                    None
                };
                InputOutcome {
                    feedback: applied.feedback,
                    not_active: false,
                    stopped,
                }
            }
            SessionState::Ready | SessionState::Stopped => InputOutcome {
                not_active: true,
                ..InputOutcome::default()
            },
            SessionState::Idle | SessionState::Loading => InputOutcome::default(),
        }
    }

    // ------------------------------------------------------------------
    // Interpreter pump
    // ------------------------------------------------------------------

    /// Drive the interpreter for one scheduling turn, feeding it relay
    /// input and forwarding its output into `sink`. Returns the stop
    /// reason if the run ended this turn.
    pub fn pump(&mut self, sink: &mut dyn FnMut(u8)) -> Option<StopReason> {
        if self.state() != SessionState::Running {
            return None;
        }
        let Some(interpreter) = self.interpreter.as_mut() else {
            return None;
        };

        // The relay is consumed only here, and only while running.
        let relay = &mut self.relay;
        let mut pull = || relay.dequeue_one();

        match interpreter.pump(&mut pull, sink) {
            StepOutcome::Continue => None,
            StepOutcome::Exited => Some(self.stop(StopReason::Exited)),
            StepOutcome::Fault(kind) => {
                warn!("Interpreter fault: {kind}");
                Some(self.stop(StopReason::Fault(kind.to_string())))
            }
        }
    }

    // ------------------------------------------------------------------
    // Persistence (gated on the lifecycle)
    // ------------------------------------------------------------------

    fn running_version(&self) -> Result<String, StoreError> {
        if self.state() != SessionState::Running {
            return Err(StoreError::NotRunning);
        }
        self.running_version.clone().ok_or(StoreError::NotRunning)
    }

    fn running_game_dir(&self) -> Result<std::path::PathBuf, StoreError> {
        Ok(self.config.games_dir.join(self.running_version()?))
    }

    /// Snapshot the in-game save artifact under a fresh id.
    pub async fn save_game(&self) -> Result<SaveSnapshot, StoreError> {
        let version = self.running_version()?;
        let game_dir = self.running_game_dir()?;
        let payload = versions::read_save_artifact(&game_dir)
            .map_err(StoreError::Io)?
            .ok_or_else(|| {
                StoreError::InvalidFormat(format!(
                    "no in-game save file; use the game's SAVE command with \"{}\" first",
                    versions::ARTIFACT_NAME
                ))
            })?;
        self.store.save(&version, payload).await
    }

    /// Fetch the most recent snapshot for the running version and restore
    /// its artifact so the game can RESTORE it.
    pub async fn load_game(&self) -> Result<SaveSnapshot, StoreError> {
        let version = self.running_version()?;
        let game_dir = self.running_game_dir()?;
        let snapshot = self.store.load_most_recent(&version).await?;
        versions::write_save_artifact(&game_dir, &snapshot.payload).map_err(StoreError::Io)?;
        Ok(snapshot)
    }

    /// Serialize the most recent snapshot for the running version.
    pub async fn export_game(&self) -> Result<(SaveSnapshot, String), StoreError> {
        let version = self.running_version()?;
        let snapshot = self.store.load_most_recent(&version).await?;
        let serialized = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        Ok((snapshot, serialized))
    }

    /// Import an external snapshot representation under a fresh id.
    pub async fn import_game(&self, serialized: &str) -> Result<SaveSnapshot, StoreError> {
        self.running_version()?;
        self.store.import(serialized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::SessionState;
    use crate::interp::FaultKind;
    use crate::store::SaveStore;
    use crate::test_support::{MemoryStore, ScriptedInterpreter, test_config};
    use std::sync::{Arc, Mutex};

    const VERSION: &str = "mdlzork_810722";

    fn ready_session() -> (GameSession, Arc<Mutex<Vec<u8>>>) {
        let config = test_config(VERSION);
        let store = SaveStore::new(Arc::new(MemoryStore::new()));
        let mut session = GameSession::new(config, store);
        let (interp, received) = ScriptedInterpreter::new("WELCOME TO ZORK\n");
        session.begin_loading();
        session.attach_interpreter(Box::new(interp));
        (session, received)
    }

    fn type_line(session: &mut GameSession, line: &str) {
        for c in line.chars() {
            session.handle_raw_input(&c.to_string());
        }
        session.handle_raw_input("\r");
    }

    fn pump_collect(session: &mut GameSession) -> (Vec<u8>, Option<StopReason>) {
        let mut out = Vec::new();
        let stopped = session.pump(&mut |b| out.push(b));
        (out, stopped)
    }

    #[test]
    fn test_start_with_unknown_version_stays_ready() {
        let (mut session, _) = ready_session();
        assert!(session.select_version("mdlzork_999999").is_err());
        assert_eq!(session.selected_version(), VERSION);

        session.selected_version = "bogus".to_string();
        match session.start() {
            Err(StartError::UnknownVersion(id)) => assert_eq!(id, "bogus"),
            other => panic!("expected UnknownVersion, got {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_start_enables_persistence_controls() {
        let (mut session, _) = ready_session();
        assert!(!session.controls().save);
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Running);
        let controls = session.controls();
        assert!(controls.save && controls.load && controls.export && controls.import);
        assert!(!controls.start && !controls.version_select);
    }

    #[test]
    fn test_keystrokes_flow_to_interpreter_in_order() {
        let (mut session, received) = ready_session();
        session.start().unwrap();

        type_line(&mut session, "look");
        type_line(&mut session, "go north");
        let (out, stopped) = pump_collect(&mut session);

        assert!(stopped.is_none());
        assert_eq!(&received.lock().unwrap()[..], b"look\ngo north\n");
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("WELCOME TO ZORK\n"));
        assert!(text.contains("> look\n> go north\n"));
    }

    #[test]
    fn test_input_discarded_when_not_running() {
        let (mut session, received) = ready_session();
        let outcome = session.handle_raw_input("x");
        assert!(outcome.not_active);
        assert!(outcome.feedback.is_none());

        session.start().unwrap();
        type_line(&mut session, "look");
        pump_collect(&mut session);
        session.handle_raw_input("\u{3}");
        assert_eq!(session.state(), SessionState::Stopped);

        // Stopped discards too, with the notice.
        let outcome = session.handle_raw_input("y");
        assert!(outcome.not_active);
        assert_eq!(&received.lock().unwrap()[..], b"look\n");
    }

    #[test]
    fn test_interrupt_stops_running_session() {
        let (mut session, _) = ready_session();
        session.start().unwrap();
        session.handle_raw_input("x");

        let outcome = session.handle_raw_input("\u{3}");
        assert_eq!(outcome.stopped, Some(StopReason::Interrupted));
        assert_eq!(outcome.feedback, Some(Feedback::InterruptEcho));
        assert_eq!(session.state(), SessionState::Stopped);

        // Stopped is startable again, like Ready.
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_normal_exit_transitions_to_stopped() {
        let (mut session, _) = ready_session();
        session.start().unwrap();
        type_line(&mut session, "quit");
        let (_, stopped) = pump_collect(&mut session);
        assert_eq!(stopped, Some(StopReason::Exited));
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_fault_surfaces_diagnostic_and_stops() {
        let config = test_config(VERSION);
        let store = SaveStore::new(Arc::new(MemoryStore::new()));
        let mut session = GameSession::new(config, store);
        let (mut interp, _) = ScriptedInterpreter::new("");
        interp.fail_with = Some(FaultKind::Aborted { code: 2 });
        session.begin_loading();
        session.attach_interpreter(Box::new(interp));
        session.start().unwrap();

        let (_, stopped) = pump_collect(&mut session);
        match stopped {
            Some(StopReason::Fault(msg)) => assert!(msg.contains("exit code 2")),
            other => panic!("expected fault stop, got {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_no_pump_outside_running() {
        let (mut session, _) = ready_session();
        let (out, stopped) = pump_collect(&mut session);
        assert!(out.is_empty());
        assert!(stopped.is_none());
    }

    #[tokio::test]
    async fn test_save_outside_running_is_not_running() {
        let (session, _) = ready_session();
        assert!(matches!(session.save_game().await, Err(StoreError::NotRunning)));
        assert!(matches!(session.load_game().await, Err(StoreError::NotRunning)));
        assert!(matches!(
            session.import_game("{}").await,
            Err(StoreError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_save_load_round_trip_through_artifact() {
        let (mut session, _) = ready_session();
        session.start().unwrap();

        let game_dir = session.config().games_dir.join(VERSION);
        std::fs::write(game_dir.join(versions::ARTIFACT_NAME), b"state-1").unwrap();
        let first = session.save_game().await.unwrap();
        assert_eq!(first.game_version, VERSION);

        std::fs::write(game_dir.join(versions::ARTIFACT_NAME), b"state-2").unwrap();
        session.save_game().await.unwrap();

        // Load restores the newest artifact bytes.
        std::fs::remove_file(game_dir.join(versions::ARTIFACT_NAME)).unwrap();
        let loaded = session.load_game().await.unwrap();
        assert_ne!(loaded.id, first.id);
        assert_eq!(
            std::fs::read(game_dir.join(versions::ARTIFACT_NAME)).unwrap(),
            b"state-2"
        );
    }

    #[tokio::test]
    async fn test_save_without_artifact_reports_invalid_format() {
        let (mut session, _) = ready_session();
        session.start().unwrap();
        assert!(matches!(
            session.save_game().await,
            Err(StoreError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_export_import_keeps_payload_new_id() {
        let (mut session, _) = ready_session();
        session.start().unwrap();
        let game_dir = session.config().games_dir.join(VERSION);
        std::fs::write(game_dir.join(versions::ARTIFACT_NAME), b"deep in the dungeon").unwrap();
        let saved = session.save_game().await.unwrap();

        let (_, serialized) = session.export_game().await.unwrap();
        let imported = session.import_game(&serialized).await.unwrap();
        assert_ne!(imported.id, saved.id);
        assert_eq!(imported.payload, saved.payload);
        assert_eq!(imported.timestamp, saved.timestamp);
    }
}
