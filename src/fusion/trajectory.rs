//! Fused output trajectory.

use std::ops::Range;

use nalgebra::Vector3;

/// Best estimate for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEstimate {
    pub position: Vector3<f64>,
    /// Gap between the two winning rays.
    pub residual: f64,
    /// Indices of the winning tracks in the fused input, `pair.0 < pair.1`.
    pub pair: (usize, usize),
}

/// One slot per visited frame, starting at `start`. A `None` slot is a
/// visited frame with no eligible pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FusedTrajectory {
    start: i64,
    frames: Vec<Option<FrameEstimate>>,
}

impl FusedTrajectory {
    pub(crate) fn new(start: i64, frames: Vec<Option<FrameEstimate>>) -> Self {
        Self { start, frames }
    }

    /// Visited frames, end exclusive.
    pub fn frame_range(&self) -> Range<i64> {
        self.start..self.start + self.frames.len() as i64
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, frame: i64) -> Option<&FrameEstimate> {
        if !self.frame_range().contains(&frame) {
            return None;
        }
        self.frames[(frame - self.start) as usize].as_ref()
    }

    pub fn position(&self, frame: i64) -> Option<Vector3<f64>> {
        self.get(frame).map(|e| e.position)
    }

    /// Every visited frame in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, Option<&FrameEstimate>)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .map(move |(i, e)| (self.start + i as i64, e.as_ref()))
    }

    /// Frames that received an estimate, ascending.
    pub fn keyed(&self) -> impl Iterator<Item = (i64, &FrameEstimate)> + '_ {
        self.iter().filter_map(|(frame, e)| e.map(|e| (frame, e)))
    }

    pub fn num_estimated(&self) -> usize {
        self.frames.iter().filter(|e| e.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(x: f64) -> FrameEstimate {
        FrameEstimate {
            position: Vector3::new(x, 0.0, 0.0),
            residual: 0.0,
            pair: (0, 1),
        }
    }

    #[test]
    fn test_lookup_inside_and_outside_range() {
        let traj = FusedTrajectory::new(10, vec![Some(estimate(1.0)), None, Some(estimate(3.0))]);

        assert_eq!(traj.frame_range(), 10..13);
        assert_eq!(traj.position(10), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(traj.get(11), None);
        assert_eq!(traj.get(9), None);
        assert_eq!(traj.get(13), None);
        assert_eq!(traj.num_estimated(), 2);
    }

    #[test]
    fn test_keyed_skips_gaps() {
        let traj = FusedTrajectory::new(-1, vec![None, Some(estimate(2.0)), None]);
        let frames: Vec<i64> = traj.keyed().map(|(f, _)| f).collect();
        assert_eq!(frames, vec![0]);
        assert_eq!(traj.iter().count(), 3);
    }

    #[test]
    fn test_empty() {
        let traj = FusedTrajectory::default();
        assert!(traj.is_empty());
        assert_eq!(traj.keyed().count(), 0);
    }
}
