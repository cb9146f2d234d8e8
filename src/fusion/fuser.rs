//! Minimum-residual pair selection across tracks, frame by frame.
//!
//! For every frame, every unordered pair of tracks that both hold a sample
//! is triangulated and the pair with the smallest residual supplies the
//! frame's estimate. Frames are independent of each other.

use std::collections::HashSet;
use std::ops::Range;

use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::fusion::config::{DegeneratePolicy, FrameRangePolicy, FuserConfig};
use crate::fusion::track::{CameraId, TargetTrack};
use crate::fusion::trajectory::{FrameEstimate, FusedTrajectory};
use crate::geometry::{GeometryError, closest_point_with_epsilon};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("At least 2 cameras need to be available (found {found})")]
    InsufficientCameras { found: usize },
    #[error("frame {frame}, tracks {first} and {second}: {source}")]
    DegenerateGeometry {
        frame: i64,
        first: String,
        second: String,
        source: GeometryError,
    },
}

/// Fuse `tracks` with the default (strict) configuration.
pub fn fuse(tracks: &[TargetTrack]) -> Result<FusedTrajectory, FusionError> {
    fuse_with_config(tracks, &FuserConfig::default())
}

/// Fuse `tracks` into one trajectory covering the frames selected by
/// `config.frame_range`.
///
/// Fails before any triangulation when fewer than two distinct cameras
/// contribute. Under [`DegeneratePolicy::Abort`] the first degenerate pair
/// (lowest frame, then pair order) fails the whole call.
pub fn fuse_with_config(
    tracks: &[TargetTrack],
    config: &FuserConfig,
) -> Result<FusedTrajectory, FusionError> {
    let cameras: HashSet<&CameraId> = tracks.iter().map(|t| t.camera()).collect();
    if cameras.len() < 2 {
        return Err(FusionError::InsufficientCameras {
            found: cameras.len(),
        });
    }

    let frames = frame_range(tracks, config.frame_range);
    info!(
        "Fusing {} tracks from {} cameras over frames {}..{}",
        tracks.len(),
        cameras.len(),
        frames.start,
        frames.end
    );

    let estimates = evaluate_frames(tracks, frames.clone(), config)?;
    let trajectory = FusedTrajectory::new(frames.start, estimates);

    info!(
        "Fusion done: {}/{} frames estimated",
        trajectory.num_estimated(),
        trajectory.len()
    );
    Ok(trajectory)
}

/// Frames to visit, end exclusive. Empty when `tracks` is empty.
fn frame_range(tracks: &[TargetTrack], policy: FrameRangePolicy) -> Range<i64> {
    let start = tracks.iter().map(|t| t.start_frame()).min();
    let end = tracks.iter().map(|t| t.end_frame()).max();
    match (start, end) {
        (Some(start), Some(end)) => match policy {
            FrameRangePolicy::Exclusive => start..end,
            FrameRangePolicy::Inclusive => start..end + 1,
        },
        _ => 0..0,
    }
}

fn evaluate_frames(
    tracks: &[TargetTrack],
    frames: Range<i64>,
    config: &FuserConfig,
) -> Result<Vec<Option<FrameEstimate>>, FusionError> {
    #[cfg(feature = "rayon")]
    if config.parallel {
        let start = frames.start;
        let count = (frames.end - frames.start) as usize;
        let results: Vec<_> = (0..count)
            .into_par_iter()
            .map(|i| evaluate_frame(tracks, start + i as i64, config))
            .collect();
        // Report the earliest failing frame, same as the sequential path.
        return results.into_iter().collect();
    }

    frames
        .map(|frame| evaluate_frame(tracks, frame, config))
        .collect()
}

fn evaluate_frame(
    tracks: &[TargetTrack],
    frame: i64,
    config: &FuserConfig,
) -> Result<Option<FrameEstimate>, FusionError> {
    let mut best: Option<FrameEstimate> = None;
    let mut best_residual = f64::INFINITY;

    for (i, first) in tracks.iter().enumerate() {
        let Some((cam1, point1)) = first.ray_at(frame) else {
            continue;
        };

        for (j, second) in tracks.iter().enumerate().skip(i + 1) {
            if !config.include_same_camera_pairs && first.camera() == second.camera() {
                continue;
            }
            let Some((cam2, point2)) = second.ray_at(frame) else {
                continue;
            };

            let approach = match closest_point_with_epsilon(
                &cam1,
                &cam2,
                &point1,
                &point2,
                config.parallel_epsilon,
            ) {
                Ok(approach) => approach,
                Err(source) => match config.on_degenerate {
                    DegeneratePolicy::Abort => {
                        return Err(FusionError::DegenerateGeometry {
                            frame,
                            first: first.name().to_string(),
                            second: second.name().to_string(),
                            source,
                        });
                    }
                    DegeneratePolicy::SkipPair => {
                        warn!(
                            "Frame {}: skipping {} / {}: {}",
                            frame,
                            first.name(),
                            second.name(),
                            source
                        );
                        continue;
                    }
                },
            };

            // Strict comparison: ties keep the earlier pair, NaN never wins.
            if approach.residual < best_residual {
                best_residual = approach.residual;
                best = Some(FrameEstimate {
                    position: approach.estimate,
                    residual: approach.residual,
                    pair: (i, j),
                });
            }
        }
    }

    match &best {
        Some(estimate) => debug!(
            "Frame {}: tracks {:?} residual {:.6}",
            frame, estimate.pair, estimate.residual
        ),
        None => debug!("Frame {}: no eligible pair", frame),
    }
    Ok(best)
}
