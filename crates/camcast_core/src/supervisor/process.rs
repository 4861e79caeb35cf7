//! Supervision of a single external transcoder process.
//!
//! One `StreamSupervisor` owns at most one live child process. `start()`
//! spawns it, `pump()` drains and classifies its stderr until the stream
//! closes or a stop is requested, and `stop()` escalates quit ->
//! terminate -> kill with bounded waits.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::classify::{classify_line, LogClass};
use super::errors::LaunchError;
use super::{EXIT_POLL_INTERVAL, TERM_WAIT};

/// Lifecycle state of the supervised process. Terminal states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// No process has been started yet.
    Created,
    /// The process is live.
    Running,
    /// The process ended on its own (possibly after the quit directive).
    Exited(Option<i32>),
    /// The process honored the terminate signal.
    Terminated,
    /// The process had to be force-killed.
    Killed,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessState::Exited(_) | ProcessState::Terminated | ProcessState::Killed
        )
    }
}

/// Supervises one external transcoder process for a stream job.
pub struct StreamSupervisor {
    job: String,
    program: String,
    args: Vec<String>,
    child: Mutex<Option<Child>>,
    stderr: Mutex<Option<ChildStderr>>,
    state: Mutex<ProcessState>,
    stop_requested: AtomicBool,
    last_class: Mutex<LogClass>,
}

impl StreamSupervisor {
    /// Create a supervisor running `ffmpeg` with the given arguments.
    pub fn new(job: impl Into<String>, args: Vec<String>) -> Self {
        Self::with_program(job, "ffmpeg", args)
    }

    /// Create a supervisor for an arbitrary program.
    ///
    /// Used by tests with stub processes; the fleet always supervises
    /// FFmpeg.
    pub fn with_program(
        job: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            job: job.into(),
            program: program.into(),
            args,
            child: Mutex::new(None),
            stderr: Mutex::new(None),
            state: Mutex::new(ProcessState::Created),
            stop_requested: AtomicBool::new(false),
            last_class: Mutex::new(LogClass::Info),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        *self.state.lock()
    }

    /// Last classification seen on the diagnostic stream.
    pub fn last_class(&self) -> LogClass {
        *self.last_class.lock()
    }

    /// Spawn the external process and capture its diagnostic stream.
    ///
    /// Returns the OS process id. Each supervisor runs exactly one
    /// process over its lifetime; a second call fails.
    pub fn start(&self) -> Result<u32, LaunchError> {
        if self.state() != ProcessState::Created {
            return Err(LaunchError::AlreadyStarted {
                job: self.job.clone(),
            });
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    LaunchError::NotFound {
                        program: self.program.clone(),
                    }
                } else {
                    LaunchError::Spawn {
                        program: self.program.clone(),
                        source,
                    }
                }
            })?;

        let pid = child.id();
        *self.stderr.lock() = child.stderr.take();
        *self.child.lock() = Some(child);
        *self.state.lock() = ProcessState::Running;
        tracing::info!(job = %self.job, pid, "process started");
        Ok(pid)
    }

    /// Drain and classify the diagnostic stream until it closes or a stop
    /// is requested.
    ///
    /// The read blocks until the process writes or exits; no timeout is
    /// imposed on it. This is the supervisor's long-running loop - run it
    /// on its own thread. The stop flag is checked between lines.
    pub fn pump(&self) {
        let Some(stderr) = self.stderr.lock().take() else {
            return;
        };

        let mut reader = BufReader::new(stderr);
        let mut line = String::new();
        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }
            line.clear();
            match reader.read_line(&mut line) {
                // Stream closed: the process exited or is exiting
                Ok(0) => break,
                Ok(_) => self.report(line.trim_end()),
                Err(err) => {
                    tracing::debug!(job = %self.job, error = %err, "diagnostic stream read failed");
                    break;
                }
            }
        }

        // Without a stop request the process ended on its own; reap it.
        // Under a stop request, stop() owns reaping and state assignment.
        if !self.stop_requested.load(Ordering::SeqCst) {
            let status = self.child.lock().as_mut().and_then(|child| child.wait().ok());
            self.set_terminal(ProcessState::Exited(status.and_then(|s| s.code())));
        }
    }

    /// Request shutdown: quit directive, then terminate, then kill.
    ///
    /// Waits up to `grace` for the quit directive to be honored and up to
    /// [`TERM_WAIT`](super::TERM_WAIT) more for the terminate signal.
    /// Idempotent: once the process is in a terminal state (or was never
    /// started) further calls return the state unchanged.
    pub fn stop(&self, grace: Duration) -> ProcessState {
        let current = self.state();
        if current != ProcessState::Running {
            return current;
        }
        self.stop_requested.store(true, Ordering::SeqCst);

        // Already gone on its own?
        if let Some(code) = self.try_wait() {
            self.set_terminal(ProcessState::Exited(code));
            return self.state();
        }

        self.send_quit();
        if let Some(code) = self.wait_for_exit(grace) {
            tracing::info!(job = %self.job, "process quit gracefully");
            self.set_terminal(ProcessState::Exited(code));
            return self.state();
        }

        self.send_terminate();
        if self.wait_for_exit(TERM_WAIT).is_some() {
            tracing::info!(job = %self.job, "process terminated");
            self.set_terminal(ProcessState::Terminated);
            return self.state();
        }

        self.kill();
        tracing::warn!(job = %self.job, "process killed");
        self.set_terminal(ProcessState::Killed);
        self.state()
    }

    fn report(&self, line: &str) {
        if line.is_empty() {
            return;
        }
        let class = classify_line(line);
        *self.last_class.lock() = class;
        match class {
            LogClass::Error => tracing::error!(job = %self.job, "{line}"),
            LogClass::Warning => tracing::warn!(job = %self.job, "{line}"),
            LogClass::Status => tracing::info!(job = %self.job, "{line}"),
            LogClass::Info => tracing::debug!(job = %self.job, "{line}"),
        }
    }

    /// Only the first terminal transition wins; later ones are dropped.
    fn set_terminal(&self, next: ProcessState) {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            *state = next;
        }
    }

    /// Poll for exit without blocking. `Some(code)` once the process ended.
    fn try_wait(&self) -> Option<Option<i32>> {
        let mut child = self.child.lock();
        match child.as_mut()?.try_wait() {
            Ok(Some(status)) => Some(status.code()),
            _ => None,
        }
    }

    fn wait_for_exit(&self, timeout: Duration) -> Option<Option<i32>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(code) = self.try_wait() {
                return Some(code);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    /// Ask FFmpeg to finish cleanly via its interactive `q` command.
    fn send_quit(&self) {
        let stdin = self.child.lock().as_mut().and_then(|child| child.stdin.take());
        if let Some(mut stdin) = stdin {
            // Dropping the handle closes the pipe after the write.
            let _ = stdin.write_all(b"q\n");
            let _ = stdin.flush();
        }
    }

    #[cfg(unix)]
    fn send_terminate(&self) {
        if let Some(child) = self.child.lock().as_ref() {
            let pid = child.id() as i32;
            // SAFETY: sending SIGTERM to our own child's pid has no other effects.
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }

    #[cfg(not(unix))]
    fn send_terminate(&self) {
        // No terminate signal on this platform; the kill fallback handles it.
    }

    fn kill(&self) {
        let mut child = self.child.lock();
        if let Some(child) = child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
