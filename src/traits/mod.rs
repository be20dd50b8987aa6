pub mod camera;
pub mod loader;
pub mod renderer;

pub use camera::CameraController;
pub use loader::ModelLoader;
pub use renderer::Renderer;
