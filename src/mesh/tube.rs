use std::f64::consts::TAU;

use glam::{DQuat, DVec3, Vec2};

use super::curve::Curve;
use super::geometry::Geometry;
use crate::error::{SceneError, SceneResult};

/// Orthonormal frame carried along the curve
#[derive(Debug, Clone, Copy)]
struct Frame {
    tangent: DVec3,
    normal: DVec3,
    binormal: DVec3,
}

/// Sweep a circle of `radius` along `curve`.
///
/// Produces `tubular_segments + 1` rings of `radial_segments` vertices each,
/// sampled at evenly spaced parameters. Ring `i` occupies vertex indices
/// `i * radial_segments .. (i + 1) * radial_segments`. Only neighbouring rings
/// are joined; a closed tube repeats the first ring's positions as its last.
pub fn build_tube_mesh(
    curve: &Curve,
    tubular_segments: u32,
    radius: f32,
    radial_segments: u32,
    closed: bool,
) -> SceneResult<Geometry> {
    curve.check()?;
    if tubular_segments == 0 {
        return Err(SceneError::InvalidMesh("tube needs at least one tubular segment".into()));
    }
    if radial_segments < 3 {
        return Err(SceneError::InvalidMesh(format!(
            "tube needs at least three radial segments, got {}",
            radial_segments
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SceneError::InvalidMesh(format!("tube radius must be positive, got {}", radius)));
    }

    let rings = tubular_segments as usize + 1;
    let ring_size = radial_segments as usize;
    let frames = compute_frames(curve, tubular_segments, closed);
    let mut geometry = Geometry::with_capacity(rings * ring_size, tubular_segments as usize * ring_size * 6);

    for ring in 0..rings {
        // closed tubes reuse the first sample so the seam lines up exactly
        let sample = if closed && ring == rings - 1 { 0 } else { ring };
        let t = sample as f64 / tubular_segments as f64;
        let center = curve.try_point_at(t)?;
        let frame = frames[sample];

        for j in 0..ring_size {
            let angle = j as f64 / ring_size as f64 * TAU;
            let normal = (frame.normal * -angle.cos() + frame.binormal * angle.sin()).normalize();
            let position = center + normal * radius as f64;
            geometry.push_vertex(
                position.as_vec3(),
                normal.as_vec3(),
                Vec2::new(ring as f32 / tubular_segments as f32, j as f32 / ring_size as f32),
            );
        }
    }

    for segment in 0..tubular_segments as usize {
        let near = (segment * ring_size) as u32;
        let far = ((segment + 1) * ring_size) as u32;
        for j in 0..ring_size as u32 {
            let next = (j + 1) % ring_size as u32;
            let a = near + j;
            let b = far + j;
            let c = far + next;
            let d = near + next;
            geometry.push_triangle(a, b, d);
            geometry.push_triangle(b, c, d);
        }
    }

    Ok(geometry)
}

/// Tangents from the curve, normals parallel-transported from ring to ring
fn compute_frames(curve: &Curve, segments: u32, closed: bool) -> Vec<Frame> {
    let n = segments as usize;
    let tangents: Vec<DVec3> = (0..=n)
        .map(|i| curve.tangent_at(i as f64 / segments as f64))
        .collect();

    let first_normal = initial_normal(tangents[0]);
    let mut frames = Vec::with_capacity(n + 1);
    frames.push(Frame {
        tangent: tangents[0],
        normal: first_normal,
        binormal: tangents[0].cross(first_normal),
    });

    for i in 1..=n {
        let previous = frames[i - 1];
        let tangent = tangents[i];
        let mut normal = previous.normal;

        let axis = previous.tangent.cross(tangent);
        if axis.length() > f64::EPSILON {
            let theta = previous.tangent.dot(tangent).clamp(-1.0, 1.0).acos();
            normal = DQuat::from_axis_angle(axis.normalize(), theta) * normal;
        }

        frames.push(Frame {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        });
    }

    if closed {
        let mut theta = frames[0].normal.dot(frames[n].normal).clamp(-1.0, 1.0).acos() / n as f64;
        if frames[0].tangent.dot(frames[0].normal.cross(frames[n].normal)) > 0.0 {
            theta = -theta;
        }
        for (i, frame) in frames.iter_mut().enumerate().skip(1) {
            frame.normal = DQuat::from_axis_angle(frame.tangent, theta * i as f64) * frame.normal;
            frame.binormal = frame.tangent.cross(frame.normal);
        }
    }

    frames
}

/// Any vector perpendicular to the tangent, seeded from its smallest component
fn initial_normal(tangent: DVec3) -> DVec3 {
    let abs = tangent.abs();
    let seed = if abs.x <= abs.y && abs.x <= abs.z {
        DVec3::X
    } else if abs.y <= abs.z {
        DVec3::Y
    } else {
        DVec3::Z
    };
    let side = tangent.cross(seed).normalize();
    tangent.cross(side).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ring_of(vertex: u32, radial_segments: u32) -> u32 {
        vertex / radial_segments
    }

    #[test]
    fn test_ring_count_is_segments_plus_one() {
        let curve = Curve::sinusoid(10.0);
        for n in [1, 2, 20, 64] {
            let geometry = build_tube_mesh(&curve, n, 1.0, 8, false).unwrap();
            assert_eq!(geometry.vertex_count(), (n as usize + 1) * 8);
            assert_eq!(geometry.triangle_count(), n as usize * 8 * 2);
        }
    }

    #[test]
    fn test_open_tube_does_not_join_first_and_last_ring() {
        let radial = 12;
        let n = 20;
        let geometry = build_tube_mesh(&Curve::sinusoid(10.0), n, 1.0, radial, false).unwrap();

        for triangle in geometry.triangles() {
            let rings: Vec<u32> = triangle.iter().map(|&v| ring_of(v, radial)).collect();
            let touches_first = rings.contains(&0);
            let touches_last = rings.contains(&n);
            assert!(!(touches_first && touches_last), "triangle {:?} spans the seam", triangle);
            let span = rings.iter().max().unwrap() - rings.iter().min().unwrap();
            assert!(span <= 1);
        }
    }

    #[test]
    fn test_rings_are_centered_on_curve_samples() {
        let curve = Curve::sinusoid(10.0);
        let radial = 16;
        let n = 10;
        let geometry = build_tube_mesh(&curve, n, 0.5, radial, false).unwrap();

        for ring in 0..=n as usize {
            let vertices = &geometry.positions[ring * radial as usize..(ring + 1) * radial as usize];
            let centroid = vertices.iter().copied().sum::<Vec3>() / radial as f32;
            let expected = curve.point_at(ring as f64 / n as f64).as_vec3();
            assert!((centroid - expected).length() < 1e-3, "ring {} off curve", ring);
            for v in vertices {
                assert!(((*v - expected).length() - 0.5).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_normals_are_perpendicular_to_tangent() {
        let curve = Curve::sinusoid(3.0);
        let radial = 8;
        let n = 12;
        let geometry = build_tube_mesh(&curve, n, 1.0, radial, false).unwrap();
        for ring in 0..=n as usize {
            let tangent = curve.tangent_at(ring as f64 / n as f64).as_vec3();
            for normal in &geometry.normals[ring * radial as usize..(ring + 1) * radial as usize] {
                assert!(normal.dot(tangent).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_closed_tube_repeats_first_ring() {
        let radial = 6;
        let n = 8;
        let geometry = build_tube_mesh(&Curve::sinusoid(2.0), n, 1.0, radial, true).unwrap();
        let first = &geometry.positions[..radial as usize];
        let last = &geometry.positions[(n * radial) as usize..];
        for (a, b) in first.iter().zip(last) {
            assert!((*a - *b).length() < 1e-4);
        }
    }

    #[test]
    fn test_post_scale_compresses_x_only() {
        let curve = Curve::sinusoid(10.0);
        let mut geometry = build_tube_mesh(&curve, 20, 1.0, 16, false).unwrap();
        let (min_before, max_before) = geometry.bounds().unwrap();
        geometry.scale(Vec3::new(0.5, 1.0, 1.0));
        let (min_after, max_after) = geometry.bounds().unwrap();

        assert!((max_after.x - max_before.x * 0.5).abs() < 1e-4);
        assert!((min_after.x - min_before.x * 0.5).abs() < 1e-4);
        assert_eq!(max_after.y, max_before.y);
        assert_eq!(min_after.z, min_before.z);
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        let curve = Curve::sinusoid(1.0);
        assert!(matches!(build_tube_mesh(&curve, 0, 1.0, 8, false), Err(SceneError::InvalidMesh(_))));
        assert!(matches!(build_tube_mesh(&curve, 4, 1.0, 2, false), Err(SceneError::InvalidMesh(_))));
        assert!(matches!(build_tube_mesh(&curve, 4, 0.0, 8, false), Err(SceneError::InvalidMesh(_))));
        assert!(matches!(build_tube_mesh(&curve, 4, f32::NAN, 8, false), Err(SceneError::InvalidMesh(_))));
        for collapsed in [Curve::sinusoid(0.0), Curve::sinusoid(f64::NAN)] {
            assert!(matches!(build_tube_mesh(&collapsed, 4, 1.0, 8, false), Err(SceneError::InvalidMesh(_))));
        }
    }
}
