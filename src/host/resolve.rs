//! Target resolution and the end-to-end resolve operation.

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

use thiserror::Error;
use tracing::{debug, info};

use crate::fusion::{FuserConfig, FusionError, TargetTrack, TrackError, fuse_with_config};
use crate::host::{Constraint, KeyframeSink, ObjectKind, TrackingHost};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Selection contains something that cannot be used as a target.
    #[error("{0}")]
    InvalidSelection(String),
    #[error("At least 2 cameras need to be available (found {found})")]
    InsufficientCameras { found: usize },
    #[error(transparent)]
    Track(#[from] TrackError),
    /// Fusion failed, e.g. on a degenerate camera pair.
    #[error(transparent)]
    Fusion(#[from] FusionError),
    /// The host failed to answer a query.
    #[error(transparent)]
    Host(#[from] anyhow::Error),
    #[error("failed to write keyframes: {0}")]
    Output(#[source] anyhow::Error),
}

/// Outcome of a successful [`resolve_camera_tracks`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Frames visited by fusion, end exclusive.
    pub frame_range: Range<i64>,
    pub frames_keyed: usize,
}

impl ResolveSummary {
    pub fn frames_visited(&self) -> usize {
        (self.frame_range.end - self.frame_range.start) as usize
    }
}

fn invalid(object: &str, message: impl std::fmt::Display) -> ResolveError {
    ResolveError::InvalidSelection(format!("{object}: {message}"))
}

/// Build the observation track of `object` from its follow-track constraint.
///
/// The frame span runs from the first to the last unmuted marker. Frames in
/// between without an unmuted marker get no sample. The camera position is
/// queried for every frame of the span, so moving cameras are followed.
pub fn resolve_target_track<H: TrackingHost + ?Sized>(
    host: &H,
    object: &str,
) -> Result<TargetTrack, ResolveError> {
    // Last matching constraint in the stack wins.
    let constraint = host
        .constraints(object)
        .iter()
        .rev()
        .find_map(|c| match c {
            Constraint::FollowTrack(follow) => Some(follow),
            Constraint::Other(_) => None,
        })
        .ok_or_else(|| invalid(object, "Motion Tracking constraint to be converted not found"))?;

    let clip = constraint
        .clip
        .as_deref()
        .ok_or_else(|| invalid(object, "Movie clip to use tracking data from isn't set"))?;
    let tracks = host
        .clip_tracks(clip)
        .ok_or_else(|| invalid(object, format_args!("movie clip {clip} not found")))?;
    let track = tracks
        .iter()
        .rev()
        .find(|t| t.name == constraint.track)
        .ok_or_else(|| invalid(object, format_args!("Tracked object not found ({})", constraint.track)))?;

    let enabled: BTreeSet<i64> = track
        .markers
        .iter()
        .filter(|m| !m.muted)
        .map(|m| m.frame)
        .collect();
    let (Some(&start_frame), Some(&end_frame)) = (enabled.first(), enabled.last()) else {
        return Err(invalid(
            object,
            format_args!("track {} has no enabled markers", track.name),
        ));
    };

    let samples = (start_frame..=end_frame)
        .map(|frame| {
            if enabled.contains(&frame) {
                host.world_position(object, frame).map(Some)
            } else {
                Ok(None)
            }
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let camera_path = (start_frame..=end_frame)
        .map(|frame| host.camera_position(&constraint.camera, frame))
        .collect::<anyhow::Result<Vec<_>>>()?;

    debug!(
        "Resolved {} -> {}/{} via {}, frames {}..={} ({} markers)",
        object,
        clip,
        track.name,
        constraint.camera,
        start_frame,
        end_frame,
        enabled.len()
    );

    Ok(TargetTrack::new(
        object,
        constraint.camera.clone(),
        camera_path[0],
        start_frame,
        end_frame,
        samples,
    )?
    .with_camera_path(camera_path)?)
}

/// Resolve the selected objects, fuse them and key every estimated frame
/// into `sink`.
///
/// All validation and fusion finishes before the sink is touched, so a
/// failed call leaves the sink empty.
pub fn resolve_camera_tracks<H, S, T>(
    host: &H,
    selection: &[T],
    config: &FuserConfig,
    sink: &mut S,
) -> Result<ResolveSummary, ResolveError>
where
    H: TrackingHost + ?Sized,
    S: KeyframeSink + ?Sized,
    T: AsRef<str>,
{
    if selection.len() < 2 {
        return Err(ResolveError::InvalidSelection(format!(
            "At least 2 targets need to be selected (got {})",
            selection.len()
        )));
    }

    for object in selection.iter().map(AsRef::as_ref) {
        match host.object_kind(object) {
            Some(ObjectKind::Empty) => {}
            Some(ObjectKind::Other(kind)) => {
                return Err(invalid(object, format_args!("Non-empty object selected ({kind})")));
            }
            None => return Err(invalid(object, "no such object")),
        }
    }

    let tracks = selection
        .iter()
        .map(|object| resolve_target_track(host, object.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let cameras: HashSet<_> = tracks.iter().map(|t| t.camera()).collect();
    if cameras.len() < 2 {
        return Err(ResolveError::InsufficientCameras {
            found: cameras.len(),
        });
    }

    let trajectory = fuse_with_config(&tracks, config)?;

    for (frame, estimate) in trajectory.keyed() {
        sink.insert_keyframe(frame, &estimate.position)
            .map_err(ResolveError::Output)?;
    }

    let summary = ResolveSummary {
        frame_range: trajectory.frame_range(),
        frames_keyed: trajectory.num_estimated(),
    };
    info!(
        "Keyed {} of {} frames from {} targets",
        summary.frames_keyed,
        summary.frames_visited(),
        tracks.len()
    );
    Ok(summary)
}
