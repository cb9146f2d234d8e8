//! Geometry utilities: two-ray triangulation.

pub mod ray;

pub use ray::{
    GeometryError, PARALLEL_EPSILON, RayApproach, closest_point, closest_point_with_epsilon,
};

/// World-space point or direction.
pub type Vector3 = nalgebra::Vector3<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_works_with_triangulation() {
        let cam1 = Vector3::new(-1.0, 0.0, 0.0);
        let cam2 = Vector3::new(1.0, 0.0, 0.0);
        let target: Vector3 = Vector3::new(0.0, 0.0, 1.0);

        let approach = closest_point(&cam1, &cam2, &target, &target).unwrap();
        let estimate: Vector3 = approach.estimate;
        assert!((estimate - target).norm() < 1e-12);
    }
}
