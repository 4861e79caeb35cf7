//! External transcoder invocation building.

mod builder;

pub use builder::FfmpegCommand;
