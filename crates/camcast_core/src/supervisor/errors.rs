//! Supervisor error types.

use std::io;

use thiserror::Error;

/// Errors launching the external transcoder process.
///
/// A launch failure is fatal for its job only; sibling jobs in a fleet
/// keep running.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The executable is not installed or not on PATH.
    #[error("'{program}' not found; install FFmpeg (https://ffmpeg.org/download.html)")]
    NotFound { program: String },

    /// The process could not be spawned.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The supervisor already ran its one process.
    #[error("job '{job}' has already been started")]
    AlreadyStarted { job: String },
}
