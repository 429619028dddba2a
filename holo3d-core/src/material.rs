/// Hologram surface treatment and wireframe overlays
use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use crate::geometry::Mesh;
use crate::glb::Model;

/// Relative luminance of a linear RGB color
pub(crate) fn luminance(color: &[f32; 3]) -> f32 {
    0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2]
}

/// Translucent physically-based parameter set giving the ghost-like look.
/// Applied uniformly to every mesh of a loaded model, replacing whatever
/// the asset shipped with.
#[derive(Debug, Clone, Copy)]
pub struct HologramMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub double_sided: bool,
}

impl Default for HologramMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            metalness: 0.2,
            roughness: 0.1,
            opacity: 0.3,
            // 0x4287f5, the blueprint-blue tint
            emissive: [66.0 / 255.0, 135.0 / 255.0, 245.0 / 255.0],
            emissive_intensity: 0.5,
            double_sided: true,
        }
    }
}

impl HologramMaterial {
    /// Scalar surface brightness under one ambient and one directional light.
    ///
    /// Double-sided surfaces light back faces too, so the model stays
    /// readable through its own translucency.
    pub fn shade(
        &self,
        normal: &Vector3<f32>,
        light_dir: &Vector3<f32>,
        ambient: f32,
        directional: f32,
    ) -> f32 {
        let facing = if self.double_sided {
            normal.dot(light_dir).abs()
        } else {
            normal.dot(light_dir).max(0.0)
        };
        let diffuse = directional * facing * (1.0 - self.metalness);
        let gloss =
            directional * facing.powf(1.0 + (1.0 - self.roughness) * 8.0) * self.metalness;
        let lit = (ambient + diffuse + gloss) * luminance(&self.color);
        let glow = self.emissive_intensity * luminance(&self.emissive);
        (lit + glow).clamp(0.0, 1.0)
    }
}

/// Line-only rendering of a mesh's edges, owned by its parent mesh
#[derive(Debug, Clone)]
pub struct WireframeOverlay {
    pub edges: Vec<[Point3<f32>; 2]>,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl WireframeOverlay {
    pub fn for_mesh(mesh: &Mesh) -> Self {
        Self {
            edges: unique_edges(mesh),
            color: [1.0, 1.0, 1.0],
            opacity: 0.4,
        }
    }
}

/// Deduplicated edge list of a triangle soup, keyed on exact endpoint bits
fn unique_edges(mesh: &Mesh) -> Vec<[Point3<f32>; 2]> {
    type Key = [u32; 3];
    fn key(p: &Point3<f32>) -> Key {
        [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
    }

    let mut seen: HashSet<(Key, Key)> = HashSet::new();
    let mut edges = Vec::new();
    for triangle in &mesh.triangles {
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let pa = triangle.vertices[a].position;
            let pb = triangle.vertices[b].position;
            let (ka, kb) = (key(&pa), key(&pb));
            let canonical = if ka <= kb { (ka, kb) } else { (kb, ka) };
            if seen.insert(canonical) {
                edges.push([pa, pb]);
            }
        }
    }
    edges
}

/// One drawable of the staged model: geometry plus its override material
/// and the wireframe overlay attached to it.
#[derive(Debug, Clone)]
pub struct ShadedMesh {
    pub mesh: Mesh,
    pub material: HologramMaterial,
    pub overlay: WireframeOverlay,
}

/// Override every mesh of a loaded model with the hologram treatment.
///
/// Two-phase on purpose: the drawables are snapshotted out of the model
/// first, then each gets its material and overlay, so the collection is
/// never mutated while being walked. Happens exactly once, at load
/// completion.
pub fn apply_hologram(model: Model) -> Vec<ShadedMesh> {
    let drawables: Vec<Mesh> = model.meshes;
    drawables
        .into_iter()
        .map(|mesh| {
            let overlay = WireframeOverlay::for_mesh(&mesh);
            ShadedMesh {
                mesh,
                material: HologramMaterial::default(),
                overlay,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, Vertex};

    fn triangle(z: f32) -> Triangle {
        Triangle::new(
            Vertex::new(0.0, 0.0, z, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 0.0, z, 0.0, 0.0, 1.0),
            Vertex::new(0.0, 1.0, z, 0.0, 0.0, 1.0),
        )
    }

    #[test]
    fn test_wireframe_edges_of_single_triangle() {
        let mut mesh = Mesh::new();
        mesh.add_triangle(triangle(0.0));
        let overlay = WireframeOverlay::for_mesh(&mesh);
        assert_eq!(overlay.edges.len(), 3);
    }

    #[test]
    fn test_shared_edges_are_deduplicated() {
        // Two triangles of a quad share the diagonal: 6 half-edges, 5 unique.
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::new(
            Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 1.0, 0.0, 0.0, 0.0, 1.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(1.0, 1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
        ));
        let overlay = WireframeOverlay::for_mesh(&mesh);
        assert_eq!(overlay.edges.len(), 5);
    }

    #[test]
    fn test_hologram_applied_to_every_mesh() {
        let mut a = Mesh::new();
        a.add_triangle(triangle(0.0));
        let mut b = Mesh::new();
        b.add_triangle(triangle(1.0));
        b.add_triangle(triangle(2.0));

        let staged = apply_hologram(Model { meshes: vec![a, b] });
        assert_eq!(staged.len(), 2);
        for shaded in &staged {
            assert!((shaded.material.opacity - 0.3).abs() < 1e-6);
            assert!(shaded.material.double_sided);
            assert!(!shaded.overlay.edges.is_empty());
        }
    }

    #[test]
    fn test_shade_stays_in_unit_range() {
        let material = HologramMaterial::default();
        let light = Vector3::new(1.0, 1.0, 1.0).normalize();
        for normal in [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 0.0),
        ] {
            let value = material.shade(&normal, &light, 0.5, 1.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_double_sided_lights_back_faces() {
        let material = HologramMaterial::default();
        let light = Vector3::new(0.0, 0.0, 1.0);
        let front = material.shade(&Vector3::new(0.0, 0.0, 1.0), &light, 0.0, 1.0);
        let back = material.shade(&Vector3::new(0.0, 0.0, -1.0), &light, 0.0, 1.0);
        assert!((front - back).abs() < 1e-6);
        assert!(back > 0.0);
    }
}
