//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::config::ResolvedConfig;
use crate::core::versions::{LaunchSpec, StartError};
use crate::interp::{FaultKind, Interpreter, StepOutcome};
use crate::store::{RecordStore, SaveSnapshot, StoreError};
use crate::tui::surface::Surface;

/// In-memory record store for tests that don't need real files.
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<SaveSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put_record(&self, collection: &str, record: SaveSnapshot) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let records = collections.entry(collection.to_string()).or_default();
        records.retain(|r| r.id != record.id);
        records.push(record);
        Ok(())
    }

    async fn get_all_records(&self, collection: &str) -> Result<Vec<SaveSnapshot>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

/// Scripted interpreter: emits a banner on start, echoes every complete
/// input line back as `> <line>`, and exits when told to `quit`. The bytes
/// it pulled stay inspectable through the shared handle.
pub struct ScriptedInterpreter {
    banner: &'static str,
    banner_pending: bool,
    line: Vec<u8>,
    received: Arc<Mutex<Vec<u8>>>,
    /// Forced outcome for fault-path tests.
    pub fail_with: Option<FaultKind>,
    quit_requested: bool,
}

impl ScriptedInterpreter {
    pub fn new(banner: &'static str) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                banner,
                banner_pending: false,
                line: Vec::new(),
                received: received.clone(),
                fail_with: None,
                quit_requested: false,
            },
            received,
        )
    }
}

impl Interpreter for ScriptedInterpreter {
    fn start(&mut self, _launch: &LaunchSpec) -> Result<(), StartError> {
        self.banner_pending = true;
        self.quit_requested = false;
        Ok(())
    }

    fn pump(
        &mut self,
        pull: &mut dyn FnMut() -> Option<u8>,
        sink: &mut dyn FnMut(u8),
    ) -> StepOutcome {
        if let Some(kind) = self.fail_with.take() {
            return StepOutcome::Fault(kind);
        }
        if self.banner_pending {
            self.banner_pending = false;
            for b in self.banner.bytes() {
                sink(b);
            }
        }
        while let Some(b) = pull() {
            self.received.lock().unwrap().push(b);
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.line).to_string();
                self.line.clear();
                if line == "quit" {
                    self.quit_requested = true;
                } else {
                    for out in format!("> {line}\n").bytes() {
                        sink(out);
                    }
                }
            } else {
                self.line.push(b);
            }
        }
        if self.quit_requested {
            StepOutcome::Exited
        } else {
            StepOutcome::Continue
        }
    }

    fn shutdown(&mut self) {
        self.banner_pending = false;
        self.line.clear();
    }
}

/// Surface that records everything written to it.
#[derive(Default)]
pub struct CaptureSurface {
    pub written: String,
    pub cleared: usize,
}

impl Surface for CaptureSurface {
    fn write_char(&mut self, c: char) {
        self.written.push(c);
    }

    fn write_str(&mut self, s: &str) {
        self.written.push_str(s);
    }

    fn write_line(&mut self, s: &str) {
        self.written.push_str(s);
        self.written.push('\n');
    }

    fn clear(&mut self) {
        self.cleared += 1;
        self.written.clear();
    }
}

/// A resolved config rooted in a fresh temp directory, with a game dir and
/// restore file laid out for `version` so `start()` can succeed.
pub fn test_config(version: &str) -> ResolvedConfig {
    let root = std::env::temp_dir()
        .join("zorkbridge-test")
        .join(uuid::Uuid::new_v4().to_string());
    let games_dir = root.join("games");
    let game_dir = games_dir.join(version);
    std::fs::create_dir_all(game_dir.join("SAVEFILE")).unwrap();
    std::fs::write(game_dir.join("SAVEFILE").join("ZORK.SAVE"), b"world").unwrap();
    let interpreter = games_dir.join("mdli");
    std::fs::write(&interpreter, b"stub").unwrap();

    ResolvedConfig {
        default_version: version.to_string(),
        games_dir,
        interpreter_path: interpreter,
        saves_dir: root.join("saves"),
        data_dir: root,
    }
}
