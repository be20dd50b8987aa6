use glam::{Mat4, Quat, Vec3};

/// Where the camera is and what it looks at.
///
/// Changed only by initial placement and by a camera controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub orientation: Quat,
    pub target: Vec3,
}

impl CameraState {
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            orientation: look_rotation(position, target),
            target,
        }
    }

    /// Move to `position` and re-aim at the current target
    pub fn place(&mut self, position: Vec3) {
        self.position = position;
        self.orientation = look_rotation(position, self.target);
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }
}

/// Rotation that points -Z from `eye` towards `target` with +Y up
fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let direction = target - eye;
    if direction.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    // looking straight up or down: pick another up vector
    let up = if direction.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(eye, target, up);
    Quat::from_mat4(&view.inverse()).normalize()
}

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect,
            near,
            far,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}
