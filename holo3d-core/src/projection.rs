/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

/// Vertical field of view of the stage camera (75 degrees)
pub const STAGE_FOV: f32 = 75.0 * std::f32::consts::PI / 180.0;

/// Perspective camera for the stage viewport
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            // Fixed framing offset, aimed slightly above the origin
            position: Point3::new(-1.0, 2.5, 6.0),
            target: Point3::new(0.0, 0.8, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: STAGE_FOV,
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Track a viewport resize; the next projection matrix picks it up.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Project a 3D point to 2D screen space
    ///
    /// Returns screen coordinates plus view-space depth, or None when the
    /// point falls outside the frustum.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        let mvp = projection * view * model_matrix;

        // transform_point performs the homogeneous divide, so this is NDC.
        let ndc = mvp.transform_point(point);

        if !(-1.0..=1.0).contains(&ndc.x)
            || !(-1.0..=1.0).contains(&ndc.y)
            || !(-1.0..=1.0).contains(&ndc.z)
        {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
