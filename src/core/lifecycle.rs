//! # Session Lifecycle
//!
//! The finite state machine gating which controls are enabled and whether
//! keystrokes reach the line editor at all:
//!
//! ```text
//! Idle → Loading → Ready → Running → Stopped
//!                     ▲_______________│   (a new start request)
//! ```
//!
//! There is no `Loading → Idle`: interpreter acquisition failure is terminal
//! for the session. The bridge surfaces a fatal diagnostic and only a
//! restart recovers. `Stopped` is user-facing-equivalent to `Ready`: the
//! version selector and start control come back, and a new start request
//! behaves exactly like `Ready → Running`.

use std::fmt;

use log::info;

/// Exactly one state is live at a time; [`Lifecycle`] transitions are the
/// only way to change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Running,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

/// Why a running session transitioned to `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// User pressed the interrupt key while running.
    Interrupted,
    /// The interpreter terminated normally.
    Exited,
    /// The interpreter aborted or hit an unrecoverable fault.
    Fault(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::Exited => write!(f, "game ended"),
            StopReason::Fault(msg) => write!(f, "interpreter fault: {msg}"),
        }
    }
}

#[derive(Debug)]
pub enum LifecycleError {
    /// The requested transition is not an edge of the state machine.
    InvalidTransition {
        from: SessionState,
        requested: &'static str,
    },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::InvalidTransition { from, requested } => {
                write!(f, "cannot {requested} while {from}")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Which user-facing controls are enabled for a given state. Derived, never
/// stored; the state machine is the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub version_select: bool,
    pub start: bool,
    pub save: bool,
    pub load: bool,
    pub export: bool,
    pub import: bool,
}

/// The session state machine.
#[derive(Debug)]
pub struct Lifecycle {
    state: SessionState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Keystrokes are routed to the line editor only while running.
    pub fn accepts_input(&self) -> bool {
        self.state == SessionState::Running
    }

    /// `Idle → Loading`: interpreter acquisition has begun.
    pub fn begin_loading(&mut self) -> Result<(), LifecycleError> {
        self.transition(SessionState::Idle, SessionState::Loading, "begin loading")
    }

    /// `Loading → Ready`: acquisition succeeded.
    pub fn acquisition_complete(&mut self) -> Result<(), LifecycleError> {
        self.transition(SessionState::Loading, SessionState::Ready, "complete loading")
    }

    /// `Ready → Running` or `Stopped → Running` (a fresh start request).
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            SessionState::Ready | SessionState::Stopped => {
                info!("Lifecycle: {} -> running", self.state);
                self.state = SessionState::Running;
                Ok(())
            }
            from => Err(LifecycleError::InvalidTransition {
                from,
                requested: "start",
            }),
        }
    }

    /// `Running → Stopped`, for any [`StopReason`].
    pub fn stop(&mut self, reason: &StopReason) -> Result<(), LifecycleError> {
        match self.state {
            SessionState::Running => {
                info!("Lifecycle: running -> stopped ({reason})");
                self.state = SessionState::Stopped;
                Ok(())
            }
            from => Err(LifecycleError::InvalidTransition {
                from,
                requested: "stop",
            }),
        }
    }

    /// Enabled controls for the current state. Persistence controls require
    /// both a running session and an available store.
    pub fn controls(&self, store_available: bool) -> Controls {
        match self.state {
            SessionState::Idle | SessionState::Loading => Controls::default(),
            SessionState::Ready | SessionState::Stopped => Controls {
                version_select: true,
                start: true,
                ..Controls::default()
            },
            SessionState::Running => {
                let persistence = store_available;
                Controls {
                    version_select: false,
                    start: false,
                    save: persistence,
                    load: persistence,
                    export: persistence,
                    import: persistence,
                }
            }
        }
    }

    fn transition(
        &mut self,
        expected: SessionState,
        next: SessionState,
        requested: &'static str,
    ) -> Result<(), LifecycleError> {
        if self.state != expected {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                requested,
            });
        }
        info!("Lifecycle: {} -> {next}", self.state);
        self.state = next;
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
