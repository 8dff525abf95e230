//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up the GPU, loading assets or persisting state.
#[derive(Debug, Error)]
pub enum TabletopError {
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to build render pipelines: {0}")]
    Pipeline(String),

    #[error("surface ran out of memory while acquiring a frame")]
    SurfaceOutOfMemory,

    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {path} contains no meshes")]
    EmptyModel { path: PathBuf },

    #[error("failed to access program state {path}: {source}")]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program state at line {line}: {reason}")]
    StateParse { line: usize, reason: String },

    #[error("debug UI failed: {0}")]
    Ui(String),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TabletopError>;
