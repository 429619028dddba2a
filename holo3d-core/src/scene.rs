/// Scene state: camera, lights, and the optionally staged model
use nalgebra::{Point3, Vector3};

use crate::framing::Placement;
use crate::glb::{AssetError, Model};
use crate::material::{apply_hologram, luminance, ShadedMesh};
use crate::projection::Camera;
use crate::raster::FrameBuffer;
use crate::transform::{RotationState, Transform};

/// Per-frame spin about the vertical axis (radians)
pub const SPIN_STEP: f32 = 0.002;

/// Uniform fill light so the model reads from any orientation
pub struct AmbientLight {
    pub intensity: f32,
}

/// Key light shining from a fixed offset toward the origin
pub struct DirectionalLight {
    pub intensity: f32,
    pub position: Point3<f32>,
}

impl DirectionalLight {
    /// Unit vector from the stage origin toward the light
    pub fn direction(&self) -> Vector3<f32> {
        (self.position - Point3::origin()).normalize()
    }
}

/// Outcome stream of the one-shot asset load
pub enum LoadEvent {
    /// Fraction of the asset fetched so far, in [0, 1]
    Progress(f32),
    Loaded(Model),
    Failed(AssetError),
}

/// A model on the stage: overridden drawables plus placement and spin
pub struct StagedModel {
    pub meshes: Vec<ShadedMesh>,
    pub placement: Placement,
    pub rotation: RotationState,
}

/// The stage: always renderable, with or without a model.
///
/// The model is absent until a load completes and is the only thing
/// animated. A failed load leaves the lit, empty stage rendering
/// indefinitely.
pub struct Scene {
    pub camera: Camera,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    model: Option<StagedModel>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: Camera::new(width, height),
            ambient: AmbientLight { intensity: 0.5 },
            directional: DirectionalLight {
                intensity: 1.0,
                position: Point3::new(5.0, 5.0, 5.0),
            },
            model: None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&StagedModel> {
        self.model.as_ref()
    }

    /// Fold one load outcome into the scene. Progress and failure are
    /// logging-level notifications only; success stages the model.
    pub fn ingest(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress(fraction) => {
                log::info!("loading model: {:.0}%", fraction * 100.0);
            }
            LoadEvent::Loaded(model) => self.stage(model),
            LoadEvent::Failed(error) => {
                log::error!("error loading model: {error}");
            }
        }
    }

    /// Override materials, fit to the canonical size, and put the model on
    /// the stage. Happens at most once per load.
    pub fn stage(&mut self, model: Model) {
        let bounds = model.bounding_box();
        let placement = Placement::fit(&bounds);
        let meshes = apply_hologram(model);
        log::info!(
            "staged model: {} meshes, scale {:.3}",
            meshes.len(),
            placement.scale
        );
        self.model = Some(StagedModel {
            meshes,
            placement,
            rotation: RotationState::zero(),
        });
    }

    /// Per-frame step: spin the staged model, if any
    pub fn advance(&mut self) {
        if let Some(staged) = &mut self.model {
            staged.rotation.spin_y(SPIN_STEP);
        }
    }

    /// Rasterize the stage through the camera. Runs every frame, model
    /// present or not.
    pub fn render_into(&self, fb: &mut FrameBuffer) {
        fb.clear();
        let Some(staged) = &self.model else {
            return;
        };

        let width = fb.width() as u32;
        let height = fb.height() as u32;
        let model_matrix = staged.placement.matrix(&staged.rotation);
        let rotation_matrix = Transform::rotation_matrix(&staged.rotation);
        let light = self.directional.direction();

        for shaded in &staged.meshes {
            for triangle in &shaded.mesh.triangles {
                let mut coords = [(0.0f32, 0.0f32, 0.0f32); 3];
                let mut visible = true;
                for (slot, vertex) in coords.iter_mut().zip(&triangle.vertices) {
                    match self.camera.project_to_screen(
                        &vertex.position,
                        &model_matrix,
                        width,
                        height,
                    ) {
                        Some(screen) => *slot = screen,
                        None => {
                            visible = false;
                            break;
                        }
                    }
                }
                if !visible {
                    continue;
                }

                // Flat shade from the spun face normal; translation and
                // uniform scale leave normals untouched.
                let normal = rotation_matrix
                    .transform_vector(&triangle.calculate_normal())
                    .normalize();
                let shade = shaded.material.shade(
                    &normal,
                    &light,
                    self.ambient.intensity,
                    self.directional.intensity,
                );
                fb.fill_triangle(&coords, shade, shaded.material.opacity);
            }

            // Wireframe overlay pass, drawn over the fill with its own opacity
            let edge_value = luminance(&shaded.overlay.color);
            for edge in &shaded.overlay.edges {
                let a = self
                    .camera
                    .project_to_screen(&edge[0], &model_matrix, width, height);
                let b = self
                    .camera
                    .project_to_screen(&edge[1], &model_matrix, width, height);
                if let (Some(a), Some(b)) = (a, b) {
                    fb.draw_line((a.0, a.1), (b.0, b.1), edge_value, shaded.overlay.opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;

    fn cube_model() -> Model {
        Model {
            meshes: vec![Mesh::cube(2.0)],
        }
    }

    #[test]
    fn test_empty_scene_still_renders() {
        let scene = Scene::new(80, 60);
        let mut fb = FrameBuffer::new(80, 60);
        scene.render_into(&mut fb);
        assert!(fb.pixels().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_failed_load_leaves_model_unset() {
        let mut scene = Scene::new(80, 60);
        scene.ingest(LoadEvent::Failed(AssetError::BadContainer));
        assert!(!scene.has_model());

        // Subsequent frames still render and advance without effect.
        scene.advance();
        let mut fb = FrameBuffer::new(80, 60);
        scene.render_into(&mut fb);
        assert!(!scene.has_model());
    }

    #[test]
    fn test_loaded_model_is_staged_and_framed() {
        let mut scene = Scene::new(80, 60);
        scene.ingest(LoadEvent::Loaded(cube_model()));
        let staged = scene.model().unwrap();
        assert_eq!(staged.meshes.len(), 1);
        // Cube of size 2 scales up to the canonical 4.
        assert!((staged.placement.scale - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_advance_spins_only_a_staged_model() {
        let mut scene = Scene::new(80, 60);
        scene.advance();
        assert!(!scene.has_model());

        scene.stage(cube_model());
        scene.advance();
        scene.advance();
        let staged = scene.model().unwrap();
        assert!((staged.rotation.y - 2.0 * SPIN_STEP).abs() < 1e-6);
        assert_eq!(staged.rotation.x, 0.0);
        assert_eq!(staged.rotation.z, 0.0);
    }

    #[test]
    fn test_staged_cube_rasterizes_pixels() {
        let mut scene = Scene::new(80, 60);
        scene.stage(cube_model());
        let mut fb = FrameBuffer::new(80, 60);
        scene.render_into(&mut fb);
        assert!(fb.pixels().iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_progress_event_changes_nothing() {
        let mut scene = Scene::new(80, 60);
        scene.ingest(LoadEvent::Progress(0.5));
        assert!(!scene.has_model());
    }
}
