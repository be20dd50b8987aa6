use crate::camera::CameraState;

/// Turns buffered user input into camera movement
pub trait CameraController {
    /// Consume whatever input arrived since the last call and apply it to
    /// `camera`. With nothing buffered the camera must be left untouched.
    fn update(&mut self, camera: &mut CameraState);

    /// Viewport changed size (input deltas are scaled by it)
    fn resize(&mut self, _width: u32, _height: u32) {}
}
