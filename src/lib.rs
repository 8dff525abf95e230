//! Tabletop
//!
//! A real-time 3D scene rendered with wgpu: a potted plant on a table lit by
//! an orbiting point light and a directional light, alpha-blended grass on a
//! parallax-mapped ground, multisampled and post-processed, with a Dear ImGui
//! panel for live tuning. Tuned values persist between runs.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod lighting;
pub mod performance;
pub mod state;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::TabletopApp;
pub use error::{Result, TabletopError};
