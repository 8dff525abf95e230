//! # Scene
//!
//! Geometry, models and per-object transforms of the demo scene.
//!
//! - [`Scene`] - the loaded scene and its per-object bind groups
//! - [`Model`] / [`Mesh`] - OBJ meshes uploaded to the GPU
//! - [`geometry`] - the hard-coded cube, grass quad and ground
//! - [`vertex`] - the vertex formats

pub mod geometry;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Geometry, Mesh, Model, ModelData, ObjectBinding, Transform};
pub use scene::{Scene, SceneTransforms};
pub use vertex::{BillboardVertex, ModelVertex, PositionVertex, TangentVertex};
