//! FFmpeg argument-list builder.
//!
//! Builds the complete invocation for one stream job. Argument order
//! matters to FFmpeg: input declarations first, then the filter graph and
//! stream mappings, then encoder parameters, with the destination URI as
//! the final positional argument.

use crate::config::{ConfigError, PLACEHOLDER_STREAM_KEY};
use crate::filter::FilterGraph;
use crate::models::{CameraSource, EncodeProfile};

/// Builder for a complete FFmpeg argument list (program name excluded).
///
/// Deterministic and side-effect free: the same inputs always produce the
/// identical token sequence.
pub struct FfmpegCommand<'a> {
    sources: &'a [CameraSource],
    profile: &'a EncodeProfile,
    graph: &'a FilterGraph,
    destination: &'a str,
}

impl<'a> FfmpegCommand<'a> {
    pub fn new(
        sources: &'a [CameraSource],
        profile: &'a EncodeProfile,
        graph: &'a FilterGraph,
        destination: &'a str,
    ) -> Self {
        Self {
            sources,
            profile,
            graph,
            destination,
        }
    }

    /// Build the argument tokens.
    ///
    /// Fails before producing anything if there are no sources or the
    /// destination is empty or still carries the sample placeholder key.
    pub fn build(&self) -> Result<Vec<String>, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoCameras);
        }
        if self.destination.is_empty() || self.destination.contains(PLACEHOLDER_STREAM_KEY) {
            return Err(ConfigError::MissingDestination);
        }

        let mut args = Vec::new();

        // Input declarations. TCP transport is forced for every RTSP pull;
        // UDP delivery drops frames on congested links.
        for source in self.sources {
            args.push("-rtsp_transport".to_string());
            args.push("tcp".to_string());
            args.push("-i".to_string());
            args.push(source.url.clone());
        }

        args.push("-filter_complex".to_string());
        args.push(self.graph.serialize());

        args.push("-map".to_string());
        args.push(format!("[{}]", self.graph.output_label()));
        // Audio passthrough from the first declared input only.
        args.push("-map".to_string());
        args.push("0:a".to_string());

        // Video encoding
        args.push("-c:v".to_string());
        args.push("libx264".to_string());
        args.push("-preset".to_string());
        args.push(self.profile.preset.clone());
        args.push("-tune".to_string());
        args.push("zerolatency".to_string());
        args.push("-b:v".to_string());
        args.push(self.profile.video_bitrate.clone());
        args.push("-r".to_string());
        args.push(self.profile.framerate.to_string());
        args.push("-g".to_string());
        args.push(self.profile.keyframe_interval().to_string());
        args.push("-keyint_min".to_string());
        args.push(self.profile.min_keyframe_interval().to_string());
        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());

        // Audio encoding
        args.push("-c:a".to_string());
        args.push("aac".to_string());
        args.push("-b:a".to_string());
        args.push(self.profile.audio_bitrate.clone());

        // RTMP wants FLV framing
        args.push("-f".to_string());
        args.push("flv".to_string());
        args.push(self.destination.to_string());

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::planner;
    use crate::models::{Layout, Resolution};

    const DESTINATION: &str = "rtmp://a.rtmp.youtube.com/live2/abcd-1234";

    fn cameras(count: usize) -> Vec<CameraSource> {
        (0..count)
            .map(|i| CameraSource {
                name: format!("cam{i}"),
                url: format!("rtsp://cam{i}.local:554/stream1"),
                stream_key: None,
                encode: Default::default(),
            })
            .collect()
    }

    fn build(sources: &[CameraSource]) -> Result<Vec<String>, ConfigError> {
        let profile = EncodeProfile::default();
        let graph = planner::plan(
            sources.len().max(1),
            &Layout::SideBySide,
            Resolution::new(1280, 720),
        )
        .unwrap();
        FfmpegCommand::new(sources, &profile, &graph, DESTINATION).build()
    }

    #[test]
    fn inputs_precede_filter_and_destination_is_last() {
        let sources = cameras(2);
        let args = build(&sources).unwrap();

        let first_input = args.iter().position(|a| a == "-i").unwrap();
        let filter = args.iter().position(|a| a == "-filter_complex").unwrap();
        assert!(first_input < filter);
        assert_eq!(args.last().unwrap(), DESTINATION);

        // One transport/input pair per camera, in declaration order
        let inputs: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[*i - 1] == "-i")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(
            inputs,
            vec!["rtsp://cam0.local:554/stream1", "rtsp://cam1.local:554/stream1"]
        );
    }

    #[test]
    fn maps_graph_output_and_first_input_audio() {
        let sources = cameras(2);
        let args = build(&sources).unwrap();

        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[*i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, vec!["[outv]", "0:a"]);
    }

    #[test]
    fn keyframe_interval_is_twice_the_framerate() {
        let sources = cameras(2);
        let args = build(&sources).unwrap();

        let g = args.iter().position(|a| a == "-g").unwrap();
        assert_eq!(args[g + 1], "50");
        let keyint = args.iter().position(|a| a == "-keyint_min").unwrap();
        assert_eq!(args[keyint + 1], "25");
    }

    #[test]
    fn build_is_deterministic() {
        let sources = cameras(3);
        assert_eq!(build(&sources).unwrap(), build(&sources).unwrap());
    }

    #[test]
    fn empty_sources_are_rejected() {
        assert!(matches!(build(&[]), Err(ConfigError::NoCameras)));
    }

    #[test]
    fn placeholder_destination_is_rejected() {
        let sources = cameras(2);
        let profile = EncodeProfile::default();
        let graph =
            planner::plan(2, &Layout::SideBySide, Resolution::new(1280, 720)).unwrap();

        let placeholder =
            format!("rtmp://a.rtmp.youtube.com/live2/{}", PLACEHOLDER_STREAM_KEY);
        let result = FfmpegCommand::new(&sources, &profile, &graph, &placeholder).build();
        assert!(matches!(result, Err(ConfigError::MissingDestination)));

        let result = FfmpegCommand::new(&sources, &profile, &graph, "").build();
        assert!(matches!(result, Err(ConfigError::MissingDestination)));
    }
}
