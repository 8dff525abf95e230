// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, materials, and the global bind group.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform, ShadingParams};
pub use material::{Material, MaterialKind, MaterialLayouts};
pub use texture_resource::{TextureData, TextureResource};
