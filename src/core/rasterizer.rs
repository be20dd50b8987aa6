use std::f32::consts::TAU;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use image::RgbaImage;

use super::display_context::DisplayContext;
use crate::camera::{CameraState, Projection};
use crate::error::RenderError;
use crate::math::Color;
use crate::mesh::{Geometry, Material};
use crate::scene::{Backdrop, Helper, NodeContent, SceneGraph};
use crate::traits::Renderer;

/// Clip-space w below which a point counts as behind the eye
const MIN_CLIP_W: f32 = 1e-4;
const GRID_CENTER_COLOR: Color = Color::rgb(0.53, 0.53, 0.53);
const GRID_COLOR: Color = Color::rgb(0.27, 0.27, 0.27);
const HELPER_SEGMENTS: u32 = 16;

#[derive(Debug, Clone, Copy)]
struct SceneLight {
    position: Vec3,
    color: Color,
    intensity: f32,
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pixel: Vec2,
    depth: f32,
    shade: Vec3,
}

/// CPU rasterizer: depth-buffered triangles with per-vertex Lambert
/// shading, plus lines for helpers. Produces an RGBA8 frame.
pub struct SoftwareRenderer {
    context: DisplayContext,
    projection: Projection,
    pixels: Vec<u8>,
    depth: Vec<f32>,
    ambient: f32,
    frames_rendered: u64,
    clip_scratch: Vec<Vec4>,
    shade_scratch: Vec<Vec3>,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32, mut projection: Projection) -> Self {
        let context = DisplayContext::new(width, height);
        projection.set_viewport(context.width, context.height);
        Self {
            context,
            projection,
            pixels: vec![0; context.buffer_size()],
            depth: vec![f32::INFINITY; context.pixel_count()],
            ambient: 0.15,
            frames_rendered: 0,
            clip_scratch: Vec::new(),
            shade_scratch: Vec::new(),
        }
    }

    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn context(&self) -> DisplayContext {
        self.context
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// RGBA8 pixels of the last rendered frame, row-major, top row first
    pub fn frame(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.context.width || y >= self.context.height {
            return None;
        }
        let offset = (y as usize * self.context.width as usize + x as usize) * 4;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.context.width, self.context.height, self.pixels.clone())
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = self
            .to_image()
            .context("frame buffer does not match the viewport")?;
        image
            .save(path)
            .with_context(|| format!("writing snapshot {}", path.display()))
    }

    fn clear(&mut self, backdrop: &Backdrop) {
        self.depth.fill(f32::INFINITY);
        match backdrop {
            Backdrop::Color(color) => {
                let rgba = color.to_rgba8();
                for pixel in self.pixels.chunks_exact_mut(4) {
                    pixel.copy_from_slice(&rgba);
                }
            }
            Backdrop::Image(image) => {
                let (width, height) = (self.context.width, self.context.height);
                let (src_width, src_height) = image.dimensions();
                for (index, pixel) in self.pixels.chunks_exact_mut(4).enumerate() {
                    let x = index as u32 % width;
                    let y = index as u32 / width;
                    let sx = (x as u64 * src_width as u64 / width as u64) as u32;
                    let sy = (y as u64 * src_height as u64 / height as u64) as u32;
                    pixel.copy_from_slice(&image.get_pixel(sx, sy).0);
                }
            }
        }
    }

    fn draw_mesh(&mut self, geometry: &Geometry, material: &Material, model: Mat4, view_proj: Mat4, light: Option<SceneLight>) {
        let normal_matrix = Mat3::from_mat4(model.inverse().transpose());
        let base = material.color.to_vec3();
        let tinted = light.map_or(Vec3::ZERO, |light| material.color.modulate(light.color).to_vec3());
        let clip_transform = view_proj * model;

        self.clip_scratch.clear();
        self.shade_scratch.clear();
        for (index, position) in geometry.positions.iter().enumerate() {
            self.clip_scratch.push(clip_transform * position.extend(1.0));

            let mut shade = base * self.ambient;
            if let Some(light) = light {
                let world = model.transform_point3(*position);
                let normal = geometry.normals.get(index).copied().unwrap_or(Vec3::Y);
                let normal = (normal_matrix * normal).normalize_or_zero();
                let to_light = (light.position - world).normalize_or_zero();
                let diffuse = normal.dot(to_light).max(0.0) * light.intensity;
                shade += tinted * diffuse;
            }
            self.shade_scratch.push(shade);
        }

        for [a, b, c] in geometry.triangles() {
            let corners = [a as usize, b as usize, c as usize];
            let mut screen = [None; 3];
            for (slot, &vertex) in screen.iter_mut().zip(corners.iter()) {
                *slot = self.to_screen(self.clip_scratch[vertex], self.shade_scratch[vertex]);
            }
            // triangles crossing the near plane are dropped
            if let [Some(a), Some(b), Some(c)] = screen {
                self.fill_triangle(a, b, c);
            }
        }
    }

    fn to_screen(&self, clip: Vec4, shade: Vec3) -> Option<ScreenVertex> {
        if clip.w < MIN_CLIP_W {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(ScreenVertex {
            pixel: self.context.ndc_to_pixel(ndc.truncate()),
            depth: ndc.z,
            shade,
        })
    }

    fn fill_triangle(&mut self, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) {
        let area = edge(a.pixel, b.pixel, c.pixel);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min = a.pixel.min(b.pixel).min(c.pixel).floor().max(Vec2::ZERO);
        let max = a
            .pixel
            .max(b.pixel)
            .max(c.pixel)
            .ceil()
            .min(Vec2::new(self.context.width as f32, self.context.height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        let width = self.context.width as usize;
        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.pixel, c.pixel, p) / area;
                let w1 = edge(c.pixel, a.pixel, p) / area;
                let w2 = edge(a.pixel, b.pixel, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let index = y as usize * width + x as usize;
                if !(0.0..=1.0).contains(&depth) || depth >= self.depth[index] {
                    continue;
                }
                self.depth[index] = depth;
                let shade = a.shade * w0 + b.shade * w1 + c.shade * w2;
                self.put_pixel(index, Color::rgb(shade.x, shade.y, shade.z));
            }
        }
    }

    fn draw_helper(&mut self, helper: &Helper, model: Mat4, view_proj: Mat4, light_color: Color) {
        let clip_transform = view_proj * model;
        match *helper {
            Helper::Grid { size, divisions } => {
                let half = size / 2.0;
                let step = size / divisions.max(1) as f32;
                for i in 0..=divisions {
                    let k = -half + i as f32 * step;
                    let color = if 2 * i == divisions { GRID_CENTER_COLOR } else { GRID_COLOR };
                    self.draw_line(clip_transform, Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half), color);
                    self.draw_line(clip_transform, Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k), color);
                }
            }
            Helper::PointLight { size } => {
                // three great circles around the light
                for axis in 0..3 {
                    let point = |i: u32| {
                        let angle = i as f32 / HELPER_SEGMENTS as f32 * TAU;
                        let (s, c) = angle.sin_cos();
                        let v = match axis {
                            0 => Vec3::new(0.0, c, s),
                            1 => Vec3::new(c, 0.0, s),
                            _ => Vec3::new(c, s, 0.0),
                        };
                        v * size
                    };
                    for i in 0..HELPER_SEGMENTS {
                        self.draw_line(clip_transform, point(i), point(i + 1), light_color);
                    }
                }
            }
        }
    }

    fn draw_line(&mut self, clip_transform: Mat4, from: Vec3, to: Vec3, color: Color) {
        let Some((a, b)) = clip_segment(clip_transform * from.extend(1.0), clip_transform * to.extend(1.0)) else {
            return;
        };
        let (Some(a), Some(b)) = (self.to_screen(a, Vec3::ZERO), self.to_screen(b, Vec3::ZERO)) else {
            return;
        };

        let size = Vec2::new(self.context.width as f32, self.context.height as f32);
        let Some((t0, t1)) = clip_to_rect(a.pixel, b.pixel, size) else {
            return;
        };

        let span = b.pixel - a.pixel;
        let steps = (span * (t1 - t0)).abs().max_element().ceil().max(1.0) as u32;
        let width = self.context.width as i64;
        let height = self.context.height as i64;
        for i in 0..=steps {
            let t = t0 + (t1 - t0) * i as f32 / steps as f32;
            let p = a.pixel + span * t;
            let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            let index = (y * width + x) as usize;
            if !(0.0..=1.0).contains(&depth) || depth >= self.depth[index] {
                continue;
            }
            self.depth[index] = depth;
            self.put_pixel(index, color);
        }
    }

    fn put_pixel(&mut self, index: usize, color: Color) {
        let offset = index * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&color.to_rgba8());
    }
}

impl Renderer for SoftwareRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &CameraState) -> Result<(), RenderError> {
        let expected = self.context.buffer_size();
        if self.pixels.len() != expected {
            return Err(RenderError::FrameSize {
                expected,
                actual: self.pixels.len(),
            });
        }

        self.clear(scene.backdrop());

        let world = scene.world_matrices();
        let light = scene.nodes().find_map(|(handle, node)| {
            node.light().map(|light| SceneLight {
                position: world[handle.index()].transform_point3(Vec3::ZERO),
                color: light.color,
                intensity: light.intensity,
            })
        });
        let light_color = light.map_or(Color::WHITE, |light| light.color);
        let view_proj = self.projection.matrix() * camera.view_matrix();

        for (handle, node) in scene.nodes() {
            let model = world[handle.index()];
            match &node.content {
                NodeContent::Mesh { geometry, material } => {
                    self.draw_mesh(geometry, material, model, view_proj, light)
                }
                NodeContent::Helper(helper) => self.draw_helper(helper, model, view_proj, light_color),
                NodeContent::Group | NodeContent::Light(_) => {}
            }
        }

        self.frames_rendered += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context = DisplayContext::new(width, height);
        self.projection.set_viewport(self.context.width, self.context.height);
        self.pixels.resize(self.context.buffer_size(), 0);
        self.depth.resize(self.context.pixel_count(), f32::INFINITY);
    }
}

/// Twice the signed area of (a, b, p)
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Cut a clip-space segment at the near plane, where clip z is zero
fn clip_segment(a: Vec4, b: Vec4) -> Option<(Vec4, Vec4)> {
    match (a.z >= 0.0, b.z >= 0.0) {
        (true, true) => Some((a, b)),
        (false, false) => None,
        (a_in, _) => {
            let t = a.z / (a.z - b.z);
            let cut = a + (b - a) * t;
            if a_in {
                Some((a, cut))
            } else {
                Some((cut, b))
            }
        }
    }
}

/// Parameter range of the segment a..b inside `[0, size]` (Liang-Barsky)
fn clip_to_rect(a: Vec2, b: Vec2, size: Vec2) -> Option<(f32, f32)> {
    let span = b - a;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    let boundaries = [
        (-span.x, a.x),
        (span.x, size.x - a.x),
        (-span.y, a.y),
        (span.y, size.y - a.y),
    ];
    for (p, q) in boundaries {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;
    use crate::mesh::build_sphere_mesh;
    use crate::scene::PointLight;

    fn camera() -> CameraState {
        CameraState::looking_at(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO)
    }

    fn renderer(width: u32, height: u32) -> SoftwareRenderer {
        SoftwareRenderer::new(width, height, Projection::new(60.0, 1.0, 0.1, 1000.0))
    }

    /// Square facing +Z, spanning [-size, size] in x and y
    fn quad(size: f32) -> Geometry {
        let mut geometry = Geometry::new();
        for (x, y) in [(-size, -size), (size, -size), (size, size), (-size, size)] {
            geometry.push_vertex(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::ZERO);
        }
        geometry.push_triangle(0, 1, 2);
        geometry.push_triangle(0, 2, 3);
        geometry
    }

    fn lit_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .create_node(
                root,
                "light",
                Transform::from_position(Vec3::new(0.0, 0.0, 40.0)),
                NodeContent::Light(PointLight {
                    color: Color::WHITE,
                    intensity: 1.0,
                }),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_empty_scene_shows_backdrop() {
        let mut graph = SceneGraph::new();
        graph.set_backdrop(Backdrop::Color(Color::from_hex(0x0b1a2e)));
        let mut renderer = renderer(16, 16);
        renderer.render(&graph, &camera()).unwrap();

        let expected = Color::from_hex(0x0b1a2e).to_rgba8();
        assert!(renderer.frame().chunks_exact(4).all(|p| p == expected));
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_backdrop_image_is_stretched() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
        let mut graph = SceneGraph::new();
        graph.set_backdrop(Backdrop::Image(std::sync::Arc::new(image)));

        let mut renderer = renderer(8, 4);
        renderer.render(&graph, &camera()).unwrap();
        assert_eq!(renderer.pixel(0, 3), Some([255, 0, 0, 255]));
        assert_eq!(renderer.pixel(7, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_lit_sphere_covers_center_only() {
        let mut graph = lit_graph();
        let root = graph.root();
        graph
            .create_node(
                root,
                "star",
                Transform::IDENTITY,
                NodeContent::mesh(build_sphere_mesh(2.0, 16, 16).unwrap(), Material::standard(Color::WHITE)),
            )
            .unwrap();

        let mut renderer = renderer(64, 64);
        renderer.render(&graph, &camera()).unwrap();

        let center = renderer.pixel(32, 32).unwrap();
        assert!(center[0] > 200, "center pixel {:?}", center);
        assert_eq!(renderer.pixel(0, 0), Some(Color::BLACK.to_rgba8()));
    }

    #[test]
    fn test_light_colour_tints_diffuse_only() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .create_node(
                root,
                "light",
                Transform::from_position(Vec3::new(0.0, 0.0, 40.0)),
                NodeContent::Light(PointLight {
                    color: Color::rgb(1.0, 0.0, 0.0),
                    intensity: 1.0,
                }),
            )
            .unwrap();
        graph
            .create_node(
                root,
                "star",
                Transform::IDENTITY,
                NodeContent::mesh(build_sphere_mesh(2.0, 16, 16).unwrap(), Material::standard(Color::WHITE)),
            )
            .unwrap();

        let mut renderer = renderer(64, 64);
        renderer.render(&graph, &camera()).unwrap();

        // green and blue keep the ambient term only
        let center = renderer.pixel(32, 32).unwrap();
        assert!(center[0] > 200, "center pixel {:?}", center);
        assert!(center[1] < 60 && center[2] < 60, "center pixel {:?}", center);
        assert_eq!(center[1], center[2]);
    }

    #[test]
    fn test_nearer_surface_wins() {
        let mut graph = lit_graph();
        let root = graph.root();
        let far = Material::standard(Color::rgb(1.0, 0.0, 0.0));
        let near = Material::standard(Color::rgb(0.0, 1.0, 0.0));
        // insert the near quad first so draw order cannot decide
        graph
            .create_node(root, "near", Transform::from_position(Vec3::new(0.0, 0.0, 5.0)), NodeContent::mesh(quad(1.0), near))
            .unwrap();
        graph
            .create_node(root, "far", Transform::IDENTITY, NodeContent::mesh(quad(5.0), far))
            .unwrap();

        let mut renderer = renderer(64, 64);
        renderer.render(&graph, &camera()).unwrap();

        let center = renderer.pixel(32, 32).unwrap();
        assert!(center[1] > 128 && center[0] == 0, "center pixel {:?}", center);
        let edge = renderer.pixel(32, 28).unwrap();
        assert!(edge[0] > 128 && edge[1] == 0, "edge pixel {:?}", edge);
    }

    #[test]
    fn test_unlit_mesh_gets_ambient_only() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .create_node(root, "quad", Transform::IDENTITY, NodeContent::mesh(quad(5.0), Material::standard(Color::WHITE)))
            .unwrap();

        let mut renderer = renderer(32, 32).with_ambient(0.5);
        renderer.render(&graph, &camera()).unwrap();
        assert_eq!(renderer.pixel(16, 16), Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_mesh_behind_camera_is_skipped() {
        let mut graph = lit_graph();
        let root = graph.root();
        graph
            .create_node(
                root,
                "behind",
                Transform::from_position(Vec3::new(0.0, 0.0, 60.0)),
                NodeContent::mesh(quad(50.0), Material::standard(Color::WHITE)),
            )
            .unwrap();

        let mut renderer = renderer(16, 16);
        renderer.render(&graph, &camera()).unwrap();
        assert!(renderer.frame().chunks_exact(4).all(|p| p == Color::BLACK.to_rgba8()));
    }

    #[test]
    fn test_grid_helper_draws_lines() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .create_node(root, "grid", Transform::IDENTITY, NodeContent::Helper(Helper::Grid { size: 200.0, divisions: 50 }))
            .unwrap();

        let mut renderer = renderer(64, 64);
        let above = CameraState::looking_at(Vec3::new(0.0, 20.0, 30.0), Vec3::ZERO);
        renderer.render(&graph, &above).unwrap();

        let lit = renderer
            .frame()
            .chunks_exact(4)
            .filter(|p| *p != Color::BLACK.to_rgba8())
            .count();
        assert!(lit > 64, "only {} grid pixels", lit);
    }

    #[test]
    fn test_clip_segment_cuts_at_near_plane() {
        let a = Vec4::new(0.0, 0.0, 1.0, 2.0);
        let b = Vec4::new(0.0, 0.0, -1.0, 0.0);
        let (start, end) = clip_segment(a, b).unwrap();
        assert_eq!(start, a);
        assert_eq!(end, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(clip_segment(b, b).is_none());
    }

    #[test]
    fn test_clip_to_rect() {
        let size = Vec2::new(10.0, 10.0);
        assert_eq!(clip_to_rect(Vec2::new(-10.0, 5.0), Vec2::new(20.0, 5.0), size), Some((1.0 / 3.0, 2.0 / 3.0)));
        assert_eq!(clip_to_rect(Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0), size), Some((0.0, 1.0)));
        assert_eq!(clip_to_rect(Vec2::new(-5.0, -1.0), Vec2::new(20.0, -1.0), size), None);
    }

    #[test]
    fn test_resize_reallocates_frame() {
        let mut renderer = renderer(16, 16);
        renderer.resize(32, 8);
        assert_eq!(renderer.frame().len(), 32 * 8 * 4);
        assert_eq!(renderer.projection().aspect, 4.0);
        renderer.render(&SceneGraph::new(), &camera()).unwrap();
    }

    #[test]
    fn test_save_png_writes_snapshot() {
        let mut renderer = renderer(8, 8);
        renderer.render(&SceneGraph::new(), &camera()).unwrap();
        let path = std::env::temp_dir().join(format!("starfield-snapshot-{}.png", std::process::id()));
        renderer.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (8, 8));
        std::fs::remove_file(&path).ok();
    }
}
