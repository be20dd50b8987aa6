use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::geometry::Geometry;
use crate::error::{SceneError, SceneResult};

/// Latitude/longitude sphere centred on the origin.
///
/// `(width_segments + 1) * (height_segments + 1)` vertices; the seam column
/// is duplicated for texture coordinates and pole triangles are skipped.
pub fn build_sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> SceneResult<Geometry> {
    if width_segments < 3 || height_segments < 2 {
        return Err(SceneError::InvalidMesh(format!(
            "sphere needs at least 3x2 segments, got {}x{}",
            width_segments, height_segments
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SceneError::InvalidMesh(format!("sphere radius must be positive, got {}", radius)));
    }

    let columns = width_segments + 1;
    let mut geometry = Geometry::with_capacity(
        (columns * (height_segments + 1)) as usize,
        (width_segments * height_segments * 6) as usize,
    );

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let polar = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let azimuth = u * TAU;
            let direction = Vec3::new(-azimuth.cos() * polar.sin(), polar.cos(), azimuth.sin() * polar.sin());
            geometry.push_vertex(direction * radius, direction.normalize_or_zero(), Vec2::new(u, 1.0 - v));
        }
    }

    let index = |ix: u32, iy: u32| iy * columns + ix;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = index(ix + 1, iy);
            let b = index(ix, iy);
            let c = index(ix, iy + 1);
            let d = index(ix + 1, iy + 1);
            if iy != 0 {
                geometry.push_triangle(a, b, d);
            }
            if iy != height_segments - 1 {
                geometry.push_triangle(b, c, d);
            }
        }
    }

    Ok(geometry)
}
