//! Stream jobs: a set of cameras bound to one destination.

use crate::command::FfmpegCommand;
use crate::config::ConfigError;
use crate::filter::planner;
use crate::models::{CameraSource, EncodeProfile, Layout};

/// One output stream: cameras, layout, encoder profile, destination.
///
/// A combined job carries every configured camera; an independent job
/// carries exactly one. The job owns the construction of its FFmpeg
/// invocation and, once launched, the lifetime of its supervisor.
#[derive(Debug, Clone)]
pub struct StreamJob {
    /// Identifier, unique across the fleet.
    pub name: String,
    pub cameras: Vec<CameraSource>,
    pub layout: Layout,
    pub profile: EncodeProfile,
    /// Full destination URI, stream key included.
    pub destination: String,
}

impl StreamJob {
    /// Build the full FFmpeg argument list for this job.
    ///
    /// Plans the filter graph for the camera count and layout, then
    /// assembles the invocation around it. Construction-time validation
    /// errors surface here, before any process is launched.
    pub fn command(&self) -> Result<Vec<String>, ConfigError> {
        let graph = planner::plan(self.cameras.len(), &self.layout, self.profile.resolution)?;
        FfmpegCommand::new(&self.cameras, &self.profile, &graph, &self.destination).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resolution;

    fn camera(name: &str, url: &str) -> CameraSource {
        CameraSource {
            name: name.to_string(),
            url: url.to_string(),
            stream_key: None,
            encode: Default::default(),
        }
    }

    #[test]
    fn combined_job_builds_a_command() {
        let job = StreamJob {
            name: "combined".to_string(),
            cameras: vec![
                camera("front", "rtsp://cam1.local:554/stream1"),
                camera("back", "rtsp://cam2.local:554/stream1"),
            ],
            layout: Layout::SideBySide,
            profile: EncodeProfile::default(),
            destination: "rtmp://a.rtmp.youtube.com/live2/abcd-1234".to_string(),
        };

        let args = job.command().unwrap();

        assert_eq!(args[0], "-rtsp_transport");
        assert_eq!(args.last().unwrap(), "rtmp://a.rtmp.youtube.com/live2/abcd-1234");
        assert!(args.contains(&"-filter_complex".to_string()));
    }

    #[test]
    fn single_camera_job_gets_a_pass_through_graph() {
        let job = StreamJob {
            name: "front".to_string(),
            cameras: vec![camera("front", "rtsp://cam1.local:554/stream1")],
            layout: Layout::SideBySide,
            profile: EncodeProfile {
                resolution: Resolution::new(1920, 1080),
                ..EncodeProfile::default()
            },
            destination: "rtmp://a.rtmp.youtube.com/live2/abcd-1234".to_string(),
        };

        let args = job.command().unwrap();
        let filter_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[filter_pos + 1];

        assert_eq!(graph, "[0:v]scale=1920:1080,setpts=PTS-STARTPTS[outv]");
    }

    #[test]
    fn job_with_no_cameras_fails() {
        let job = StreamJob {
            name: "empty".to_string(),
            cameras: Vec::new(),
            layout: Layout::Grid,
            profile: EncodeProfile::default(),
            destination: "rtmp://a.rtmp.youtube.com/live2/abcd-1234".to_string(),
        };

        assert!(matches!(job.command(), Err(ConfigError::NoCameras)));
    }
}
