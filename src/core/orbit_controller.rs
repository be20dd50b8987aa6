use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::WindowEvent;

use super::input_adapter::{PointerDelta, PointerInput};
use crate::camera::CameraState;
use crate::traits::CameraController;

/// Keeps the polar angle off the poles so the view never flips
const POLE_MARGIN: f32 = 1e-3;

/// Orbits the camera around its target from pointer drags and wheel zoom.
///
/// A full-height drag turns the camera once around. Wheel notches scale the
/// distance geometrically and the result is clamped to
/// `[min_distance, max_distance]`.
#[derive(Debug, Clone)]
pub struct OrbitController {
    input: PointerInput,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    viewport_height: f32,
}

impl OrbitController {
    pub fn new(viewport_height: u32) -> Self {
        Self {
            input: PointerInput::new(),
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 1.0,
            max_distance: 500.0,
            viewport_height: viewport_height.max(1) as f32,
        }
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn process_event(&mut self, event: &WindowEvent) -> bool {
        self.input.process_event(event)
    }

    /// Direct access for feeding input without a window
    pub fn input_mut(&mut self) -> &mut PointerInput {
        &mut self.input
    }

    fn apply(&self, delta: PointerDelta, camera: &mut CameraState) {
        let offset = camera.position - camera.target;
        let radius = offset.length();

        let (mut azimuth, mut polar) = if radius > f32::EPSILON {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };

        azimuth -= TAU * delta.rotate.x / self.viewport_height * self.rotate_speed;
        polar -= TAU * delta.rotate.y / self.viewport_height * self.rotate_speed;
        polar = polar.clamp(POLE_MARGIN, PI - POLE_MARGIN);

        let zoom_scale = 0.95_f32.powf(self.zoom_speed);
        let radius = (radius.max(self.min_distance) * zoom_scale.powf(delta.zoom))
            .clamp(self.min_distance, self.max_distance);

        if delta.pan != Vec2::ZERO {
            let units_per_pixel = radius / self.viewport_height * self.pan_speed;
            let shift = camera.right() * -delta.pan.x + camera.up() * delta.pan.y;
            camera.target += shift * units_per_pixel;
        }

        let direction = Vec3::new(polar.sin() * azimuth.sin(), polar.cos(), polar.sin() * azimuth.cos());
        camera.place(camera.target + direction * radius);
    }
}

impl CameraController for OrbitController {
    fn update(&mut self, camera: &mut CameraState) {
        let delta = self.input.take();
        if delta.is_zero() {
            return;
        }
        self.apply(delta, camera);
    }

    fn resize(&mut self, _width: u32, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input_adapter::PointerButton;

    fn camera() -> CameraState {
        CameraState::looking_at(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO)
    }

    fn drag(controller: &mut OrbitController, dx: f32, dy: f32) {
        let input = controller.input_mut();
        input.on_cursor_moved(100.0, 100.0);
        input.on_button(PointerButton::Primary, true);
        input.on_cursor_moved(100.0 + dx, 100.0 + dy);
        input.on_button(PointerButton::Primary, false);
    }

    #[test]
    fn test_no_input_leaves_camera_identical() {
        let mut controller = OrbitController::new(600);
        let mut cam = camera();
        let before = cam;
        controller.update(&mut cam);
        assert_eq!(cam, before);
    }

    #[test]
    fn test_drag_orbits_at_constant_distance() {
        let mut controller = OrbitController::new(600);
        let mut cam = camera();
        drag(&mut controller, 150.0, 0.0);
        controller.update(&mut cam);

        assert!((cam.position.length() - 30.0).abs() < 1e-3);
        // quarter turn around Y
        assert!((cam.position.x - -30.0).abs() < 1e-3, "{:?}", cam.position);
        assert!((cam.forward() - (cam.target - cam.position).normalize()).length() < 1e-4);
    }

    #[test]
    fn test_input_consumed_once() {
        let mut controller = OrbitController::new(600);
        let mut cam = camera();
        drag(&mut controller, 40.0, 10.0);
        controller.update(&mut cam);
        let after_first = cam;
        controller.update(&mut cam);
        assert_eq!(cam, after_first);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut controller = OrbitController::new(600);
        let mut cam = camera();
        drag(&mut controller, 0.0, 2000.0);
        controller.update(&mut cam);

        assert!(cam.position.y < 30.0);
        assert!(cam.position.y > 29.9);
        assert!(cam.position.is_finite());
    }

    #[test]
    fn test_scroll_zooms_in_and_clamps() {
        let mut controller = OrbitController::new(600).with_distance_limits(5.0, 100.0);
        let mut cam = camera();

        controller.input_mut().on_scroll(1.0);
        controller.update(&mut cam);
        assert!((cam.position.length() - 28.5).abs() < 1e-3);

        controller.input_mut().on_scroll(500.0);
        controller.update(&mut cam);
        assert!((cam.position.length() - 5.0).abs() < 1e-3);

        controller.input_mut().on_scroll(-500.0);
        controller.update(&mut cam);
        assert!((cam.position.length() - 100.0).abs() < 1e-2);
    }

    #[test]
    fn test_pan_moves_target_and_position_together() {
        let mut controller = OrbitController::new(600);
        let mut cam = camera();
        let input = controller.input_mut();
        input.on_cursor_moved(0.0, 0.0);
        input.on_button(PointerButton::Secondary, true);
        input.on_cursor_moved(-60.0, 0.0);
        controller.update(&mut cam);

        assert!(cam.target.x > 0.0);
        assert!((cam.position - cam.target - Vec3::new(0.0, 0.0, 30.0)).length() < 1e-3);
    }
}
