use crate::camera::CameraState;
use crate::error::RenderError;
use crate::scene::SceneGraph;

/// Turns a scene snapshot into a displayed frame
pub trait Renderer {
    /// Draw the graph as seen from `camera`. Must not mutate the scene.
    fn render(&mut self, scene: &SceneGraph, camera: &CameraState) -> Result<(), RenderError>;

    /// Viewport changed size
    fn resize(&mut self, _width: u32, _height: u32) {}
}
