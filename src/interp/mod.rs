//! # Interpreter Capability
//!
//! The hosted interpreter is a black box behind two traits: a factory that
//! acquires it once at startup, and the handle the session drives.
//!
//! The handle is pull-based: `pump()` runs one scheduling turn in which the
//! interpreter may pull pending input characters (the relay's `dequeue_one`,
//! where `None` means "no data", never a block) and emit output characters into
//! a sink. The bridge never waits on the interpreter; a consumer built
//! around blocking reads has to tolerate empty pulls, which is the one
//! documented architectural limitation of hosting it here.
//!
//! Faults are classified structurally (exit status, I/O error kinds) at
//! this boundary. Nothing downstream ever inspects diagnostic message text.

mod process;

pub use process::{ProcessFactory, ProcessInterpreter};

use std::fmt;
use std::io;

use async_trait::async_trait;

use crate::core::config::ResolvedConfig;
use crate::core::versions::{LaunchSpec, StartError};

/// Interpreter acquisition failed. Fatal: there is no automatic retry, the
/// user must fix the install and restart.
#[derive(Debug)]
pub enum AcquireError {
    /// The interpreter binary is missing or unreadable.
    Missing(std::path::PathBuf),
    Io(io::Error),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Missing(p) => write!(
                f,
                "interpreter not found at {}; build confusion-mdl and point \
                 interpreter_path at the mdli binary",
                p.display()
            ),
            AcquireError::Io(e) => write!(f, "interpreter acquisition failed: {e}"),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Structured classification of an unrecoverable interpreter failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// The interpreter gave up on its input stream (it expected a blocking
    /// read the bridge cannot honor).
    EndOfInput,
    /// The interpreter process aborted with a nonzero exit code.
    Aborted { code: i32 },
    /// The process was killed by a signal or vanished without a status.
    Signaled,
    /// I/O plumbing to the process broke.
    Io(String),
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::EndOfInput => write!(
                f,
                "interpreter closed its input (it expects blocking reads the bridge cannot provide)"
            ),
            FaultKind::Aborted { code } => write!(f, "interpreter aborted (exit code {code})"),
            FaultKind::Signaled => write!(f, "interpreter terminated by signal"),
            FaultKind::Io(msg) => write!(f, "interpreter I/O failure: {msg}"),
        }
    }
}

/// Outcome of one `pump()` turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still running; call `pump` again next turn.
    Continue,
    /// Normal termination (the game ended or the player quit).
    Exited,
    /// Unrecoverable failure; the session transitions to stopped with a
    /// diagnostic.
    Fault(FaultKind),
}

/// A started (or startable) interpreter instance.
pub trait Interpreter: Send {
    /// Begin executing the given version. Called once per `Running` phase;
    /// a second start replaces any previous run.
    fn start(&mut self, launch: &LaunchSpec) -> Result<(), StartError>;

    /// Drive one scheduling turn: drain `pull` into the interpreter's input,
    /// drain its output into `sink`. Must never block the caller and must
    /// never fabricate data.
    fn pump(
        &mut self,
        pull: &mut dyn FnMut() -> Option<u8>,
        sink: &mut dyn FnMut(u8),
    ) -> StepOutcome;

    /// Tear the current run down (interrupt or shutdown). Idempotent.
    fn shutdown(&mut self);
}

/// One-shot acquisition of the interpreter capability.
#[async_trait]
pub trait InterpreterFactory: Send + Sync {
    fn name(&self) -> &str;

    async fn acquire(&self, config: &ResolvedConfig) -> Result<Box<dyn Interpreter>, AcquireError>;
}
