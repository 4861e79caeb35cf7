//! Camera sources and encoder profiles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel dimensions of the output canvas or of one layout cell.
///
/// Parses from and displays as `WIDTHxHEIGHT` (e.g. `1280x720`), which is
/// also its serialized form in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// A resolution string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid resolution '{0}' (expected WIDTHxHEIGHT, e.g. 1280x720)")]
pub struct ParseResolutionError(String);

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ParseResolutionError(s.to_string()))?;
        let width = width
            .trim()
            .parse()
            .map_err(|_| ParseResolutionError(s.to_string()))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| ParseResolutionError(s.to_string()))?;
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = ParseResolutionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

/// Encoder settings for one output stream.
///
/// The `[encode]` config section is the default profile; individual cameras
/// may override fields via [`EncodeOverrides`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    #[serde(default = "default_resolution")]
    pub resolution: Resolution,
    /// Video bitrate in FFmpeg notation, e.g. "2000k".
    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: String,
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    /// x264 speed preset.
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_resolution() -> Resolution {
    Resolution::new(1280, 720)
}

fn default_video_bitrate() -> String {
    "2000k".to_string()
}

fn default_framerate() -> u32 {
    25
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_preset() -> String {
    "ultrafast".to_string()
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            video_bitrate: default_video_bitrate(),
            framerate: default_framerate(),
            audio_bitrate: default_audio_bitrate(),
            preset: default_preset(),
        }
    }
}

impl EncodeProfile {
    /// Keyframe interval in frames: one keyframe every two seconds.
    pub fn keyframe_interval(&self) -> u32 {
        self.framerate * 2
    }

    /// Minimum keyframe spacing in frames: one second.
    pub fn min_keyframe_interval(&self) -> u32 {
        self.framerate
    }

    /// Apply per-camera overrides; unset fields keep this profile's values.
    pub fn with_overrides(&self, overrides: &EncodeOverrides) -> EncodeProfile {
        EncodeProfile {
            resolution: overrides.resolution.unwrap_or(self.resolution),
            video_bitrate: overrides
                .video_bitrate
                .clone()
                .unwrap_or_else(|| self.video_bitrate.clone()),
            framerate: overrides.framerate.unwrap_or(self.framerate),
            audio_bitrate: overrides
                .audio_bitrate
                .clone()
                .unwrap_or_else(|| self.audio_bitrate.clone()),
            preset: overrides.preset.clone().unwrap_or_else(|| self.preset.clone()),
        }
    }
}

/// Per-camera encoder overrides; unset fields inherit the default profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framerate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl EncodeOverrides {
    /// No field is overridden.
    pub fn is_empty(&self) -> bool {
        self.resolution.is_none()
            && self.video_bitrate.is_none()
            && self.framerate.is_none()
            && self.audio_bitrate.is_none()
            && self.preset.is_none()
    }
}

/// One configured camera feed.
///
/// Immutable once loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSource {
    /// Display name, unique within a run.
    pub name: String,
    /// Source URI (RTSP or HTTP endpoint, may embed credentials).
    pub url: String,
    /// Destination stream key when streaming this camera independently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_key: Option<String>,
    /// Encoder overrides for this camera.
    #[serde(default, skip_serializing_if = "EncodeOverrides::is_empty")]
    pub encode: EncodeOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_and_displays() {
        let res: Resolution = "1280x720".parse().unwrap();
        assert_eq!(res, Resolution::new(1280, 720));
        assert_eq!(res.to_string(), "1280x720");
    }

    #[test]
    fn resolution_accepts_uppercase_separator() {
        let res: Resolution = "1920X1080".parse().unwrap();
        assert_eq!(res, Resolution::new(1920, 1080));
    }

    #[test]
    fn resolution_rejects_garbage() {
        assert!("1280".parse::<Resolution>().is_err());
        assert!("wide x tall".parse::<Resolution>().is_err());
        assert!("".parse::<Resolution>().is_err());
    }

    #[test]
    fn zero_dimension_is_invalid() {
        assert!(!Resolution::new(0, 720).is_valid());
        assert!(!Resolution::new(1280, 0).is_valid());
        assert!(Resolution::new(1280, 720).is_valid());
    }

    #[test]
    fn profile_defaults_match_documented_values() {
        let profile = EncodeProfile::default();
        assert_eq!(profile.resolution, Resolution::new(1280, 720));
        assert_eq!(profile.video_bitrate, "2000k");
        assert_eq!(profile.framerate, 25);
        assert_eq!(profile.audio_bitrate, "128k");
        assert_eq!(profile.preset, "ultrafast");
    }

    #[test]
    fn keyframe_intervals_derive_from_framerate() {
        let profile = EncodeProfile {
            framerate: 30,
            ..EncodeProfile::default()
        };
        assert_eq!(profile.keyframe_interval(), 60);
        assert_eq!(profile.min_keyframe_interval(), 30);
    }

    #[test]
    fn overrides_replace_only_set_fields() {
        let base = EncodeProfile::default();
        let overrides = EncodeOverrides {
            video_bitrate: Some("3000k".to_string()),
            framerate: Some(30),
            ..EncodeOverrides::default()
        };

        let merged = base.with_overrides(&overrides);

        assert_eq!(merged.video_bitrate, "3000k");
        assert_eq!(merged.framerate, 30);
        // Inherited from the base profile
        assert_eq!(merged.resolution, base.resolution);
        assert_eq!(merged.audio_bitrate, base.audio_bitrate);
        assert_eq!(merged.preset, base.preset);
    }

    #[test]
    fn empty_overrides_are_a_no_op() {
        let base = EncodeProfile::default();
        assert!(EncodeOverrides::default().is_empty());
        assert_eq!(base.with_overrides(&EncodeOverrides::default()), base);
    }
}
