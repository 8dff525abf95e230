//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod pipeline_manager;
pub mod post_process;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager};
pub use post_process::PostProcess;
pub use render_engine::{FrameStatus, RenderEngine};
