/// Moonwalk Core Library - geometry and math for a first-person terrain walk
///
/// This library provides the rendering-agnostic core: vector and matrix
/// helpers, triangle meshes with OBJ import, heightfield terrain, cameras
/// that follow the ground, and a scene context tying them together. Its
/// outputs are flat buffers and column-major matrices for whatever renderer
/// sits on top.

pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod scene;
pub mod terrain;
pub mod transform;
pub mod vector;

// Re-export commonly used types
pub use camera::{
    Camera, CameraSettings, FreeMovement, GroundConstraint, GroundSampling, TerrainCamera,
    TerrainFollow,
};
pub use config::SceneConfig;
pub use error::{Error, Result};
pub use geometry::{BoundingBox, Mesh};
pub use obj::{load_obj, parse_obj};
pub use projection::Projection;
pub use scene::{MeshBuffers, Placement, Scene};
pub use terrain::Terrain;
pub use transform::{Mat4, Transform};
pub use vector::{Vec3, Vec4};
