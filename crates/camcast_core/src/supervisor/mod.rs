//! Process supervision for stream jobs.
//!
//! A [`StreamSupervisor`] owns the lifecycle of one FFmpeg process:
//! launch, diagnostic-stream classification, and graceful-then-forced
//! shutdown. The [`FleetCoordinator`] runs any number of supervisors
//! concurrently and aggregates shutdown across them.

mod classify;
mod errors;
mod fleet;
mod process;

pub use classify::{classify_line, LogClass};
pub use errors::LaunchError;
pub use fleet::{FleetCoordinator, JobExit};
pub use process::{ProcessState, StreamSupervisor};

use std::time::Duration;

/// How long a process gets to honor the `q` quit directive.
pub const QUIT_GRACE: Duration = Duration::from_secs(3);

/// How long a process gets to honor the terminate signal before being killed.
pub const TERM_WAIT: Duration = Duration::from_secs(1);

/// Polling step while waiting for a process to exit.
pub(crate) const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
