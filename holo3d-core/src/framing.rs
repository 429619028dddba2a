/// Canonical scaling and centering of a staged model
use nalgebra::{Matrix4, Vector3};

use crate::geometry::Aabb;
use crate::transform::{RotationState, Transform};

/// Largest bounding-box dimension every staged model is rescaled to
pub const CANONICAL_SIZE: f32 = 4.0;
/// Fixed presentation lift above eye-level center
pub const VERTICAL_LIFT: f32 = 0.5;

/// Uniform scale plus translation placing a model on the stage
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub scale: f32,
    pub translation: Vector3<f32>,
}

impl Placement {
    /// Fit a bounding box to the canonical size, centered at the origin in
    /// x and z and lifted by the fixed vertical offset.
    pub fn fit(bounds: &Aabb) -> Self {
        let max_dim = bounds.max_dim();
        let scale = if max_dim > 0.0 {
            CANONICAL_SIZE / max_dim
        } else {
            1.0
        };
        let center = bounds.center();
        let translation = Vector3::new(
            -center.x * scale,
            -center.y * scale + VERTICAL_LIFT,
            -center.z * scale,
        );
        Self { scale, translation }
    }

    /// Model matrix: translate, then rotate, then uniformly scale
    pub fn matrix(&self, rotation: &RotationState) -> Matrix4<f32> {
        Transform::translation_matrix(&self.translation)
            * Transform::rotation_matrix(rotation)
            * Transform::scale_matrix(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn bounds(min: [f32; 3], max: [f32; 3]) -> Aabb {
        Aabb::from_points([Point3::from(min), Point3::from(max)])
    }

    #[test]
    fn test_scale_matches_canonical_size() {
        // Max dimension 4 is already canonical.
        let p = Placement::fit(&bounds([0.0, 0.0, 0.0], [2.0, 1.0, 4.0]));
        assert!((p.scale - 1.0).abs() < 1e-6);

        let p = Placement::fit(&bounds([0.0, 0.0, 0.0], [8.0, 8.0, 8.0]));
        assert!((p.scale - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_bounds_keep_unit_scale() {
        let p = Placement::fit(&bounds([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]));
        assert!((p.scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_placement_centers_and_lifts() {
        let raw = bounds([2.0, -3.0, 10.0], [10.0, 3.0, 14.0]);
        let placement = Placement::fit(&raw);
        let staged = raw.transformed(&placement.matrix(&RotationState::zero()));
        let center = staged.center();
        assert!(center.x.abs() < 1e-5);
        assert!(center.z.abs() < 1e-5);
        assert!((center.y - VERTICAL_LIFT).abs() < 1e-5);
        assert!((staged.max_dim() - CANONICAL_SIZE).abs() < 1e-5);
    }
}
