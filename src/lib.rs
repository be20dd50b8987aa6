pub mod animation;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod frame;
pub mod loaders;
pub mod math;
pub mod mesh;
pub mod scene;
pub mod traits;

pub use animation::{AnimationRule, AnimationSet, AnimationTarget};
pub use camera::{CameraState, Projection};
pub use config::SceneConfig;
pub use error::{AssetLoadError, RenderError, SceneError, SceneResult};
pub use scene::{NodeHandle, SceneGraph, SceneSession};
