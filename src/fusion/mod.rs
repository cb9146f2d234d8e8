//! Track fusion: combines per-target observation streams into a single
//! trajectory.
//!
//! - [`TargetTrack`] - world-space samples of one target seen from one camera
//! - [`fuse`] / [`fuse_with_config`] - per-frame minimum-residual pair search
//! - [`FusedTrajectory`] - one optional estimate per visited frame

pub mod config;
pub mod fuser;
pub mod track;
pub mod trajectory;

pub use config::{DegeneratePolicy, FrameRangePolicy, FuserConfig};
pub use fuser::{FusionError, fuse, fuse_with_config};
pub use track::{CameraId, SampleAt, TargetTrack, TrackError};
pub use trajectory::{FrameEstimate, FusedTrajectory};
