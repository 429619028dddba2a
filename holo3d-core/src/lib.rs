/// Holo3D Core Library - presentation logic for the holographic stage
///
/// This library provides the front-end-agnostic core: GLB asset loading,
/// geometry and bounds, camera projection, the hologram material override,
/// canonical framing, software rasterization, and the typewriter script
/// presenter.

pub mod framing;
pub mod geometry;
pub mod glb;
pub mod material;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod transform;
pub mod typewriter;

#[cfg(not(target_arch = "wasm32"))]
pub mod loader;

// Re-export commonly used types
pub use framing::{Placement, CANONICAL_SIZE, VERTICAL_LIFT};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use glb::{parse_glb, AssetError, Model};
pub use material::{apply_hologram, HologramMaterial, ShadedMesh, WireframeOverlay};
pub use projection::Camera;
pub use raster::FrameBuffer;
pub use scene::{LoadEvent, Scene, SPIN_STEP};
pub use transform::{RotationState, Transform};
pub use typewriter::Typewriter;

#[cfg(not(target_arch = "wasm32"))]
pub use loader::ModelLoader;
