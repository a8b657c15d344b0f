//! # Core Session Logic
//!
//! Everything between the keyboard and the interpreter process, with no
//! knowledge of any specific UI technology.
//!
//! ```text
//!   raw tokens ──▶ decoder ──▶ editor ──▶ relay ──▶ interpreter pull
//!                                │
//!                                └──▶ surface feedback (echo/erase)
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: raw keystroke tokens → semantic key actions
//! - [`editor`]: the command buffer and submitted-line history
//! - [`relay`]: the byte queue between submitted lines and the interpreter
//! - [`lifecycle`]: the session state machine and control gating
//! - [`versions`]: the game registry and launch/restore-file resolution
//! - [`session`]: the object tying all of the above together
//! - [`config`]: settings with the defaults → file → env → CLI hierarchy

pub mod config;
pub mod decoder;
pub mod editor;
pub mod lifecycle;
pub mod relay;
pub mod session;
pub mod versions;
