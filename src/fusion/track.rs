//! Per-target observation streams.

use nalgebra::Vector3;
use thiserror::Error;

/// Identity of the camera a target was tracked from.
///
/// Two tracks share a camera when their ids compare equal; the position is
/// carried separately on each track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub String);

impl CameraId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("track {name}: start frame {start_frame} is after end frame {end_frame}")]
    InvertedRange {
        name: String,
        start_frame: i64,
        end_frame: i64,
    },
    #[error("track {name}: expected {expected} samples for its frame span, got {actual}")]
    SampleCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("track {name}: expected {expected} camera positions for its frame span, got {actual}")]
    CameraPathMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// What a track holds for a given frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleAt {
    /// Frame lies outside `[start_frame, end_frame]`.
    OutOfRange,
    /// Frame is in range but the marker was muted or missing.
    Missing,
    Present(Vector3<f64>),
}

impl SampleAt {
    pub fn position(self) -> Option<Vector3<f64>> {
        match self {
            SampleAt::Present(p) => Some(p),
            SampleAt::OutOfRange | SampleAt::Missing => None,
        }
    }
}

/// World-space observations of one tracked target over an inclusive frame
/// span. `samples[i]` and `camera_path[i]` belong to frame `start_frame + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTrack {
    name: String,
    camera: CameraId,
    camera_path: Vec<Vector3<f64>>,
    start_frame: i64,
    end_frame: i64,
    samples: Vec<Option<Vector3<f64>>>,
}

impl TargetTrack {
    /// Track seen from a camera that stays at `camera_position` for the
    /// whole span.
    pub fn new(
        name: impl Into<String>,
        camera: CameraId,
        camera_position: Vector3<f64>,
        start_frame: i64,
        end_frame: i64,
        samples: Vec<Option<Vector3<f64>>>,
    ) -> Result<Self, TrackError> {
        let name = name.into();
        if start_frame > end_frame {
            return Err(TrackError::InvertedRange {
                name,
                start_frame,
                end_frame,
            });
        }

        let expected = (end_frame - start_frame) as usize + 1;
        if samples.len() != expected {
            return Err(TrackError::SampleCountMismatch {
                name,
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            name,
            camera,
            camera_path: vec![camera_position; expected],
            start_frame,
            end_frame,
            samples,
        })
    }

    /// Replace the static camera position with one position per frame of
    /// the span, for cameras that move while tracking.
    pub fn with_camera_path(mut self, camera_path: Vec<Vector3<f64>>) -> Result<Self, TrackError> {
        if camera_path.len() != self.samples.len() {
            return Err(TrackError::CameraPathMismatch {
                name: self.name,
                expected: self.samples.len(),
                actual: camera_path.len(),
            });
        }
        self.camera_path = camera_path;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> &CameraId {
        &self.camera
    }

    /// Camera origin at `frame`, `None` outside the span.
    pub fn camera_position_at(&self, frame: i64) -> Option<&Vector3<f64>> {
        if !self.contains_frame(frame) {
            return None;
        }
        self.camera_path.get((frame - self.start_frame) as usize)
    }

    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Last frame of the span (inclusive).
    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    pub fn samples(&self) -> &[Option<Vector3<f64>>] {
        &self.samples
    }

    pub fn contains_frame(&self, frame: i64) -> bool {
        frame >= self.start_frame && frame <= self.end_frame
    }

    pub fn sample(&self, frame: i64) -> SampleAt {
        if !self.contains_frame(frame) {
            return SampleAt::OutOfRange;
        }
        match self.samples[(frame - self.start_frame) as usize] {
            Some(p) => SampleAt::Present(p),
            None => SampleAt::Missing,
        }
    }

    /// Camera origin and observed point at `frame`, when a sample exists.
    pub fn ray_at(&self, frame: i64) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let point = self.sample(frame).position()?;
        let camera = self.camera_position_at(frame)?;
        Some((*camera, point))
    }
}
