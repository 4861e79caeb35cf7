//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// How multiple camera feeds are composed onto the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// All cameras in one row of equal-width columns.
    #[default]
    SideBySide,
    /// Roughly square grid, filled row-major.
    Grid,
    /// One camera at a time, rotating on a fixed interval.
    Switch,
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::SideBySide => write!(f, "side-by-side"),
            LayoutMode::Grid => write!(f, "grid"),
            LayoutMode::Switch => write!(f, "switch"),
        }
    }
}

impl std::str::FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "side-by-side" => Ok(LayoutMode::SideBySide),
            "grid" => Ok(LayoutMode::Grid),
            "switch" => Ok(LayoutMode::Switch),
            other => Err(format!(
                "unknown layout '{}' (expected side-by-side, grid, or switch)",
                other
            )),
        }
    }
}

/// Fully resolved layout choice, including the switch rotation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SideBySide,
    Grid,
    Switch { interval_secs: u32 },
}

impl Layout {
    /// Combine a layout mode with the configured switch interval.
    pub fn from_mode(mode: LayoutMode, switch_interval: u32) -> Self {
        match mode {
            LayoutMode::SideBySide => Layout::SideBySide,
            LayoutMode::Grid => Layout::Grid,
            LayoutMode::Switch => Layout::Switch {
                interval_secs: switch_interval,
            },
        }
    }

    /// The mode of this layout, without the interval.
    pub fn mode(&self) -> LayoutMode {
        match self {
            Layout::SideBySide => LayoutMode::SideBySide,
            Layout::Grid => LayoutMode::Grid,
            Layout::Switch { .. } => LayoutMode::Switch,
        }
    }
}

/// Whether cameras are combined into one stream or streamed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamingMode {
    /// All cameras composed into a single output stream.
    #[default]
    Combined,
    /// One output stream per camera, each with its own stream key.
    Independent,
}

impl std::fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamingMode::Combined => write!(f, "combined"),
            StreamingMode::Independent => write!(f, "independent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_mode_round_trips_through_str() {
        for mode in [LayoutMode::SideBySide, LayoutMode::Grid, LayoutMode::Switch] {
            let parsed: LayoutMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn layout_mode_rejects_unknown() {
        assert!("stacked".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn layout_carries_switch_interval() {
        let layout = Layout::from_mode(LayoutMode::Switch, 15);
        assert_eq!(layout, Layout::Switch { interval_secs: 15 });
        assert_eq!(layout.mode(), LayoutMode::Switch);
    }
}
