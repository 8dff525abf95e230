//! # Graphics Module
//!
//! Everything between the program state and the pixels on screen.
//!
//! - **Camera** ([`camera`]) - fly camera, orbit mode and projection
//! - **Rendering** ([`rendering`]) - surface, pipelines and the per-frame passes
//! - **Resources** ([`resources`]) - textures, materials and the global uniform
//! - **Scene** ([`scene`]) - vertex formats, hard-coded geometry, OBJ models
//! - **UI** ([`ui`]) - the Dear ImGui debug panel
//!
//! The scene pass renders into a multisampled offscreen target that a
//! fullscreen pass copies to the swapchain, optionally as grayscale. The UI is
//! drawn last, directly onto the swapchain image.

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod ui;

// Re-export commonly used types
pub use camera::CameraManager;
pub use rendering::RenderEngine;
pub use scene::Scene;
