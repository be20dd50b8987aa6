use std::path::PathBuf;

use thiserror::Error;

use crate::scene::NodeHandle;

/// Errors raised while building the scene. All of them abort initialization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("curve parameter {t} is outside [0, 1]")]
    CurveDomain { t: f64 },
    #[error("invalid mesh parameters: {0}")]
    InvalidMesh(String),
    #[error("node {0:?} does not exist in this graph")]
    UnknownNode(NodeHandle),
    #[error("node {0:?} belongs to a different graph")]
    ForeignHandle(NodeHandle),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A model asset could not be loaded. Recoverable: the scene runs without it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to load asset {}: {cause}", path.display())]
pub struct AssetLoadError {
    pub path: PathBuf,
    pub cause: String,
}

impl AssetLoadError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Build from an anyhow chain, keeping every context layer in the message
    pub fn from_anyhow(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::new(path, format!("{:#}", err))
    }
}

/// Errors from the rendering side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The display surface could not be acquired. Fatal at startup.
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },
}

pub type SceneResult<T> = Result<T, SceneError>;
