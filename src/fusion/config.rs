//! Fusion settings.

use serde::Deserialize;

use crate::geometry::PARALLEL_EPSILON;

/// Which frames of the combined track span are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRangePolicy {
    /// `[global_start, global_end)`. The last frame of the latest-ending
    /// track is never evaluated; kept for compatibility with existing
    /// keyframed results.
    #[default]
    Exclusive,
    /// `[global_start, global_end]`.
    Inclusive,
}

/// Reaction to a pair of rays that are too close to parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail the whole fusion on the first degenerate pair.
    #[default]
    Abort,
    /// Drop that pair and keep searching the frame's remaining pairs.
    SkipPair,
}

/// Configuration for [`fuse_with_config`](crate::fusion::fuse_with_config).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FuserConfig {
    pub frame_range: FrameRangePolicy,
    pub on_degenerate: DegeneratePolicy,
    /// Determinant threshold below which two rays count as parallel.
    pub parallel_epsilon: f64,
    /// Pair two tracks that share a camera. Such rays meet at the camera
    /// origin, so these pairs usually win with a near-zero residual.
    pub include_same_camera_pairs: bool,
    /// Evaluate frames on the rayon thread pool. Ignored without the
    /// `rayon` feature.
    pub parallel: bool,
}

impl Default for FuserConfig {
    fn default() -> Self {
        Self {
            frame_range: FrameRangePolicy::Exclusive,
            on_degenerate: DegeneratePolicy::Abort,
            parallel_epsilon: PARALLEL_EPSILON,
            include_same_camera_pairs: true,
            parallel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_strict_behavior() {
        let config = FuserConfig::default();
        assert_eq!(config.frame_range, FrameRangePolicy::Exclusive);
        assert_eq!(config.on_degenerate, DegeneratePolicy::Abort);
        assert_eq!(config.parallel_epsilon, 1e-4);
        assert!(config.include_same_camera_pairs);
        assert!(!config.parallel);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: FuserConfig =
            serde_yaml::from_str("frame_range: inclusive\non_degenerate: skip_pair\n").unwrap();
        assert_eq!(config.frame_range, FrameRangePolicy::Inclusive);
        assert_eq!(config.on_degenerate, DegeneratePolicy::SkipPair);
        assert_eq!(config.parallel_epsilon, PARALLEL_EPSILON);
    }
}
