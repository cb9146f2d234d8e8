//! Closest approach between two camera rays.
//!
//! Each ray starts at a camera origin and passes through an observed world
//! point. The observed point only fixes a direction, so both lines are
//! treated as infinite and the line parameters are never clamped.

use nalgebra::Vector3;
use thiserror::Error;

/// Below this value of the normal-equation determinant the two rays are
/// treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// Rays are (nearly) parallel, or one of them has no direction.
    #[error("Lines are too close to parallel (determinant {determinant:.3e})")]
    DegenerateGeometry { determinant: f64 },
}

/// Result of intersecting two rays in the least-squares sense.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayApproach {
    /// Midpoint between the closest points on each ray.
    pub estimate: Vector3<f64>,
    /// Distance between the two rays at their closest approach.
    pub residual: f64,
}

/// Midpoint of closest approach between the lines `cam1 → point1` and
/// `cam2 → point2`, using the default parallel threshold.
///
/// NaN or zero-length inputs are not checked; NaN propagates into the
/// result.
pub fn closest_point(
    cam1: &Vector3<f64>,
    cam2: &Vector3<f64>,
    point1: &Vector3<f64>,
    point2: &Vector3<f64>,
) -> Result<RayApproach, GeometryError> {
    closest_point_with_epsilon(cam1, cam2, point1, point2, PARALLEL_EPSILON)
}

/// Same as [`closest_point`] with an explicit parallel threshold.
///
/// Solves the 2x2 normal equations for the line parameters `t1`, `t2`:
///
/// ```text
/// | a  b | |t1|   | d |
/// | b  c | |t2| = | e |
/// ```
///
/// with `a = d1·d1`, `b = -d1·d2`, `c = d2·d2`, `d = d3·d1`, `e = -d3·d2`
/// and `d3 = cam2 - cam1`.
pub fn closest_point_with_epsilon(
    cam1: &Vector3<f64>,
    cam2: &Vector3<f64>,
    point1: &Vector3<f64>,
    point2: &Vector3<f64>,
    epsilon: f64,
) -> Result<RayApproach, GeometryError> {
    let dir1 = point1 - cam1;
    let dir2 = point2 - cam2;
    let dir3 = cam2 - cam1;

    let a = dir1.dot(&dir1);
    let b = -dir1.dot(&dir2);
    let c = dir2.dot(&dir2);
    let d = dir3.dot(&dir1);
    let e = -dir3.dot(&dir2);

    let determinant = c * a - b * b;
    if determinant.abs() < epsilon {
        return Err(GeometryError::DegenerateGeometry { determinant });
    }

    let t1 = (d * c - e * b) / determinant;
    let t2 = (e - b * t1) / c;

    let on_ray1 = cam1 + t1 * dir1;
    let on_ray2 = cam2 + t2 * dir2;

    Ok(RayApproach {
        estimate: (on_ray1 + on_ray2) * 0.5,
        residual: (on_ray1 - on_ray2).norm(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intersecting_rays_meet_at_point() {
        let cam1 = Vector3::new(-1.0, 0.0, 0.0);
        let cam2 = Vector3::new(1.0, 0.0, 0.0);
        let target = Vector3::new(0.0, 0.0, 1.0);

        let approach = closest_point(&cam1, &cam2, &target, &target).unwrap();

        assert_relative_eq!(approach.estimate, target, epsilon = 1e-12);
        assert_relative_eq!(approach.residual, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_observed_point_is_only_a_direction() {
        // Observed points lie halfway to the true intersection; the rays
        // must be extended past them.
        let cam1 = Vector3::new(-2.0, 0.0, 0.0);
        let cam2 = Vector3::new(2.0, 0.0, 0.0);
        let point1 = Vector3::new(-1.0, 0.0, 1.0);
        let point2 = Vector3::new(1.0, 0.0, 1.0);

        let approach = closest_point(&cam1, &cam2, &point1, &point2).unwrap();

        assert_relative_eq!(approach.estimate, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(approach.residual, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skew_rays_residual_is_gap() {
        // Ray along x at z = 0, ray along y at z = 1.
        let cam1 = Vector3::new(-1.0, 0.0, 0.0);
        let point1 = Vector3::new(1.0, 0.0, 0.0);
        let cam2 = Vector3::new(0.0, -1.0, 1.0);
        let point2 = Vector3::new(0.0, 1.0, 1.0);

        let approach = closest_point(&cam1, &cam2, &point1, &point2).unwrap();

        assert_relative_eq!(approach.estimate, Vector3::new(0.0, 0.0, 0.5), epsilon = 1e-12);
        assert_relative_eq!(approach.residual, 1.0, epsilon = 1e-12);
        assert!(approach.residual >= 0.0);
    }

    #[test]
    fn test_symmetric_under_ray_swap() {
        let cam1 = Vector3::new(0.3, -2.0, 0.5);
        let point1 = Vector3::new(0.1, 0.4, 1.7);
        let cam2 = Vector3::new(3.0, 1.0, -0.2);
        let point2 = Vector3::new(0.5, 0.2, 1.1);

        let forward = closest_point(&cam1, &cam2, &point1, &point2).unwrap();
        let swapped = closest_point(&cam2, &cam1, &point2, &point1).unwrap();

        assert_relative_eq!(forward.estimate, swapped.estimate, epsilon = 1e-9);
        assert_relative_eq!(forward.residual, swapped.residual, epsilon = 1e-9);
    }

    #[test]
    fn test_parallel_rays_are_degenerate() {
        let cam1 = Vector3::new(0.0, 0.0, 0.0);
        let point1 = Vector3::new(1.0, 0.0, 0.0);
        let cam2 = Vector3::new(0.0, 1.0, 0.0);
        let point2 = Vector3::new(1.0, 1.0, 0.0);

        let err = closest_point(&cam1, &cam2, &point1, &point2).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_parallel_vertical_rays_are_degenerate() {
        let cam1 = Vector3::new(0.0, 0.0, 0.0);
        let point1 = Vector3::new(0.0, 0.0, 1.0);
        let cam2 = Vector3::new(1.0, 0.0, 0.0);
        let point2 = Vector3::new(1.0, 0.0, 1.0);

        assert!(closest_point(&cam1, &cam2, &point1, &point2).is_err());
    }

    #[test]
    fn test_custom_epsilon_rejects_shallow_angle() {
        let cam1 = Vector3::new(0.0, 0.0, 0.0);
        let point1 = Vector3::new(1.0, 0.0, 0.0);
        let cam2 = Vector3::new(0.0, 1.0, 0.0);
        let point2 = Vector3::new(1.0, 1.01, 0.0);

        // determinant = |d1|^2 |d2|^2 - (d1·d2)^2 = 1e-4 exactly here, up to rounding
        assert!(closest_point_with_epsilon(&cam1, &cam2, &point1, &point2, 1e-6).is_ok());
        assert!(closest_point_with_epsilon(&cam1, &cam2, &point1, &point2, 1e-2).is_err());
    }
}
