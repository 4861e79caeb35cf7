//! Configuration loading, validation, and persistence.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    LayoutSettings, OutputSettings, Settings, DEFAULT_RTMP_BASE, PLACEHOLDER_CREDENTIALS,
    PLACEHOLDER_STREAM_KEY,
};
