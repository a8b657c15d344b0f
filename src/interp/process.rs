//! Subprocess-backed interpreter.
//!
//! Spawns the game program with piped stdio. A reader thread forwards
//! stdout/stderr bytes over an mpsc channel; `pump()` drains that channel
//! and the pull source without ever blocking the event loop. Process exit
//! is detected with `try_wait` and classified into [`StepOutcome`] from the
//! exit status alone.

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::{AcquireError, FaultKind, Interpreter, InterpreterFactory, StepOutcome};
use crate::core::config::ResolvedConfig;
use crate::core::versions::{LaunchSpec, StartError};

/// Acquires [`ProcessInterpreter`]s. Acquisition verifies the configured
/// `mdli` binary exists so a broken install fails up front, during the
/// loading phase, instead of at the first start request.
pub struct ProcessFactory;

#[async_trait]
impl InterpreterFactory for ProcessFactory {
    fn name(&self) -> &str {
        "process"
    }

    async fn acquire(&self, config: &ResolvedConfig) -> Result<Box<dyn Interpreter>, AcquireError> {
        match tokio::fs::metadata(&config.interpreter_path).await {
            Ok(meta) if meta.is_file() => {
                info!(
                    "Acquired process interpreter: {}",
                    config.interpreter_path.display()
                );
                Ok(Box::new(ProcessInterpreter::new()))
            }
            Ok(_) => Err(AcquireError::Missing(config.interpreter_path.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AcquireError::Missing(config.interpreter_path.clone()))
            }
            Err(e) => Err(AcquireError::Io(e)),
        }
    }
}

/// One run of a game subprocess. Reusable across starts: a new `start`
/// replaces the previous child.
pub struct ProcessInterpreter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output_rx: Option<mpsc::Receiver<u8>>,
}

impl ProcessInterpreter {
    pub fn new() -> Self {
        Self {
            child: None,
            stdin: None,
            output_rx: None,
        }
    }

    /// Forward everything a pipe produces into the output channel. Ends at
    /// EOF or when the receiver is gone.
    fn spawn_reader<R: Read + Send + 'static>(source: R, tx: mpsc::Sender<u8>, label: &'static str) {
        thread::spawn(move || {
            let mut source = source;
            let mut buf = [0u8; 1024];
            loop {
                match source.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        for &b in &buf[..n] {
                            if tx.send(b).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        debug!("Interpreter {label} reader finished: {e}");
                        break;
                    }
                }
            }
        });
    }

    /// Classify a finished child from its exit status.
    fn classify_exit(status: std::process::ExitStatus) -> StepOutcome {
        if status.success() {
            StepOutcome::Exited
        } else {
            match status.code() {
                Some(code) => StepOutcome::Fault(FaultKind::Aborted { code }),
                None => StepOutcome::Fault(FaultKind::Signaled),
            }
        }
    }

    /// Drain any buffered output that arrived before the process ended.
    fn drain_output(&mut self, sink: &mut dyn FnMut(u8)) {
        if let Some(rx) = self.output_rx.as_ref() {
            while let Ok(b) = rx.try_recv() {
                sink(b);
            }
        }
    }

    /// Drain until the reader threads hit EOF. Only safe once the child has
    /// exited; the pipes close and the senders drop, so this terminates.
    fn drain_output_to_eof(&mut self, sink: &mut dyn FnMut(u8)) {
        if let Some(rx) = self.output_rx.take() {
            while let Ok(b) = rx.recv() {
                sink(b);
            }
        }
    }
}

impl Default for ProcessInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for ProcessInterpreter {
    fn start(&mut self, launch: &LaunchSpec) -> Result<(), StartError> {
        self.shutdown();

        let mut child = Command::new(&launch.program)
            .args(&launch.args)
            .current_dir(&launch.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(StartError::Spawn)?;

        info!(
            "Started interpreter pid {} ({} {:?})",
            child.id(),
            launch.program.display(),
            launch.args
        );

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            Self::spawn_reader(stdout, tx.clone(), "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            Self::spawn_reader(stderr, tx, "stderr");
        }

        self.stdin = child.stdin.take();
        self.output_rx = Some(rx);
        self.child = Some(child);
        Ok(())
    }

    fn pump(
        &mut self,
        pull: &mut dyn FnMut() -> Option<u8>,
        sink: &mut dyn FnMut(u8),
    ) -> StepOutcome {
        if self.child.is_none() {
            return StepOutcome::Fault(FaultKind::Io("no interpreter process".to_string()));
        }

        // Relay pending input into the child's stdin.
        let mut pending = Vec::new();
        while let Some(b) = pull() {
            pending.push(b);
        }
        if !pending.is_empty() {
            let write_result = match self.stdin.as_mut() {
                Some(stdin) => stdin.write_all(&pending).and_then(|_| stdin.flush()),
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stdin already closed",
                )),
            };
            if let Err(e) = write_result {
                // A closed pipe with a live child means the interpreter gave
                // up on its input stream; if the child already exited, the
                // exit status is the real story.
                warn!("Interpreter stdin write failed: {e}");
                self.stdin = None;
                if let Some(child) = self.child.as_mut()
                    && let Ok(Some(status)) = child.try_wait()
                {
                    self.drain_output_to_eof(sink);
                    self.child = None;
                    return Self::classify_exit(status);
                }
                self.drain_output(sink);
                return StepOutcome::Fault(FaultKind::EndOfInput);
            }
        }

        // Relay buffered output to the sink.
        self.drain_output(sink);

        // Exit detection last, after output has been flushed through.
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(Some(status))) => {
                // Release our stdin handle first so the reader threads see
                // EOF, then flush whatever the game printed on its way out.
                self.stdin = None;
                self.drain_output_to_eof(sink);
                debug!("Interpreter exited: {status}");
                self.child = None;
                Self::classify_exit(status)
            }
            Some(Ok(None)) => StepOutcome::Continue,
            Some(Err(e)) => StepOutcome::Fault(FaultKind::Io(e.to_string())),
            None => StepOutcome::Fault(FaultKind::Io("no interpreter process".to_string())),
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Shutting down interpreter pid {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stdin = None;
        self.output_rx = None;
    }
}

impl Drop for ProcessInterpreter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
