//! Camcast core - compose RTSP camera feeds into RTMP live streams.
//!
//! This crate contains all planning and supervision logic with zero CLI
//! dependencies:
//! - Layout planning: camera count + layout choice -> FFmpeg filter graph
//! - Command building: sources + profile + graph -> FFmpeg argument list
//! - Process supervision: launch, log classification, graceful shutdown
//! - Fleet coordination across concurrent stream jobs

pub mod command;
pub mod config;
pub mod filter;
pub mod models;
pub mod supervisor;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
