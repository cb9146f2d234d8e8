//! Boundary with the tracking host.
//!
//! The host owns objects, motion-tracking clips and cameras. Every position
//! query names its frame explicitly; nothing here moves a shared timeline
//! cursor.
//!
//! - [`TrackingHost`] - read access to objects, constraints, clips and positions
//! - [`KeyframeSink`] - receives the fused trajectory, one key per estimated frame
//! - [`resolve_target_track`] - builds a [`TargetTrack`](crate::fusion::TargetTrack) for one object
//! - [`resolve_camera_tracks`] - the whole operation: validate, resolve, fuse, key

pub mod resolve;

use nalgebra::Vector3;

use crate::fusion::CameraId;

pub use resolve::{ResolveError, ResolveSummary, resolve_camera_tracks, resolve_target_track};

/// Kind of a host object. Only empties can act as tracking targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Empty,
    Other(String),
}

/// Constraint making an object follow a motion track as seen from a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowTrackConstraint {
    /// Clip holding the tracking data; `None` when unset on the host.
    pub clip: Option<String>,
    /// Name of the followed track inside the clip.
    pub track: String,
    pub camera: CameraId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    FollowTrack(FollowTrackConstraint),
    Other(String),
}

/// One 2D marker of a motion track. Muted markers count as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub frame: i64,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionTrack {
    pub name: String,
    pub markers: Vec<Marker>,
}

/// Read-only view of the host scene.
pub trait TrackingHost {
    /// `None` when the host has no object with that name.
    fn object_kind(&self, object: &str) -> Option<ObjectKind>;

    /// Constraints of `object` in stack order. Empty for unknown objects.
    fn constraints(&self, object: &str) -> &[Constraint];

    /// All tracks of a clip, across its tracking objects. `None` when the
    /// clip does not exist.
    fn clip_tracks(&self, clip: &str) -> Option<&[MotionTrack]>;

    /// World-space position of `object` at `frame`.
    fn world_position(&self, object: &str, frame: i64) -> anyhow::Result<Vector3<f64>>;

    /// World-space position of `camera` at `frame`.
    fn camera_position(&self, camera: &CameraId, frame: i64) -> anyhow::Result<Vector3<f64>>;
}

/// Destination of the fused trajectory.
pub trait KeyframeSink {
    fn insert_keyframe(&mut self, frame: i64, position: &Vector3<f64>) -> anyhow::Result<()>;
}

/// Sink that keeps keyframes in memory, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedKeyframes {
    pub keys: Vec<(i64, Vector3<f64>)>,
}

impl RecordedKeyframes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed every recorded key, in order, into another sink.
    pub fn replay_into<S: KeyframeSink + ?Sized>(&self, sink: &mut S) -> anyhow::Result<()> {
        for (frame, position) in &self.keys {
            sink.insert_keyframe(*frame, position)?;
        }
        Ok(())
    }
}

impl KeyframeSink for RecordedKeyframes {
    fn insert_keyframe(&mut self, frame: i64, position: &Vector3<f64>) -> anyhow::Result<()> {
        self.keys.push((frame, *position));
        Ok(())
    }
}
