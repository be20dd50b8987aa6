use glam::{Vec2, Vec3};

use crate::math::Color;

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Non-uniform scale applied after generation. Normals get the inverse
    /// scale so lighting stays correct on squashed axes.
    pub fn scale(&mut self, factors: Vec3) {
        for position in &mut self.positions {
            *position *= factors;
        }
        let inverse = factors.recip();
        for normal in &mut self.normals {
            *normal = (*normal * inverse).normalize_or_zero();
        }
    }

    /// Smooth normals from area-weighted face normals; replaces existing ones
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = (
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            );
            let face = (pb - pa).cross(pc - pa);
            normals[a as usize] += face;
            normals[b as usize] += face;
            normals[c as usize] += face;
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.normals = normals;
    }

    /// Axis-aligned bounds as (min, max); None for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .skip(1)
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }
}

/// Surface description paired with a geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Self { color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Geometry {
        let mut geometry = Geometry::new();
        let a = geometry.push_vertex(Vec3::ZERO, Vec3::Z, Vec2::ZERO);
        let b = geometry.push_vertex(Vec3::X, Vec3::Z, Vec2::X);
        let c = geometry.push_vertex(Vec3::Y, Vec3::Z, Vec2::Y);
        geometry.push_triangle(a, b, c);
        geometry
    }

    #[test]
    fn test_counts() {
        let geometry = unit_triangle();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.triangle_count(), 1);
        assert_eq!(geometry.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_scale_touches_every_vertex() {
        let mut geometry = unit_triangle();
        geometry.scale(Vec3::new(0.5, 1.0, 1.0));
        assert_eq!(geometry.positions[1], Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(geometry.positions[2], Vec3::new(0.0, 1.0, 0.0));
        for normal in &geometry.normals {
            assert!((normal.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_compute_vertex_normals_faces_up_for_ccw_triangle() {
        let mut geometry = unit_triangle();
        geometry.normals.clear();
        geometry.compute_vertex_normals();
        assert_eq!(geometry.normals, vec![Vec3::Z; 3]);
    }

    #[test]
    fn test_bounds() {
        let geometry = unit_triangle();
        assert_eq!(geometry.bounds(), Some((Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0))));
        assert_eq!(Geometry::new().bounds(), None);
    }
}
