use std::path::Path;

use anyhow::{bail, Context, Result};
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use glam::{EulerRot, Quat, Vec2, Vec3};
use log::debug;

use crate::error::AssetLoadError;
use crate::math::{Color, Transform};
use crate::mesh::{Geometry, Material};
use crate::scene::{AssetTree, NodeContent};
use crate::traits::ModelLoader;

/// Loads glTF 2.0 files (.gltf or .glb) on a worker thread per request
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfLoader;

impl GltfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModelLoader for GltfLoader {
    fn load(&self, path: &Path) -> BoxFuture<'static, Result<AssetTree, AssetLoadError>> {
        let path = path.to_path_buf();
        let worker_path = path.clone();
        let (sender, receiver) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("gltf-loader".to_string())
            .spawn(move || {
                let result = load_gltf_tree(&worker_path)
                    .map_err(|e| AssetLoadError::from_anyhow(&worker_path, &e));
                sender.send(result).ok();
            });

        match spawned {
            Ok(_) => async move {
                receiver.await.unwrap_or_else(|_| {
                    Err(AssetLoadError::new(path, "loader thread exited without a result"))
                })
            }
            .boxed(),
            Err(e) => future::ready(Err(AssetLoadError::new(
                path,
                format!("failed to spawn loader thread: {}", e),
            )))
            .boxed(),
        }
    }
}

/// Parse a glTF file into an owned tree rooted at a group named after the file
pub fn load_gltf_tree(path: impl AsRef<Path>) -> Result<AssetTree> {
    let path = path.as_ref();
    debug!("Loading glTF file: {:?}", path);

    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("Failed to load glTF file: {:?}", path))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF file contains no scenes")?;

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .or(scene.name())
        .unwrap_or("model");
    let mut root = AssetTree::group(name);

    for node in scene.nodes() {
        root.children.push(convert_node(&node, &buffers)?);
    }

    debug!(
        "glTF {:?}: {} nodes, {} meshes, {} tree nodes",
        path,
        document.nodes().count(),
        document.meshes().count(),
        root.node_count()
    );
    Ok(root)
}

fn convert_node(node: &gltf::Node, buffers: &[gltf::buffer::Data]) -> Result<AssetTree> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let (x, y, z) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);

    let mut tree = AssetTree {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node-{}", node.index())),
        transform: Transform {
            position: Vec3::from_array(translation),
            rotation: Vec3::new(x, y, z),
            scale: Vec3::from_array(scale),
        },
        content: NodeContent::Group,
        children: Vec::new(),
    };

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("mesh");
        for primitive in mesh.primitives() {
            if let Some((geometry, material)) = convert_primitive(&primitive, buffers)? {
                let mut part = AssetTree::group(format!("{}-{}", mesh_name, primitive.index()));
                part.content = NodeContent::mesh(geometry, material);
                tree.children.push(part);
            }
        }
    }

    for child in node.children() {
        tree.children.push(convert_node(&child, buffers)?);
    }

    Ok(tree)
}

fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Result<Option<(Geometry, Material)>> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        debug!("Skipping primitive {} with mode {:?}", primitive.index(), primitive.mode());
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .context("Mesh primitive has no positions")?
        .map(Vec3::from_array)
        .collect();
    if positions.is_empty() {
        return Ok(None);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        bail!("index {} out of range for {} vertices", bad, positions.len());
    }

    let normals: Option<Vec<Vec3>> = reader
        .read_normals()
        .map(|normals| normals.map(Vec3::from_array).collect());
    let uvs: Option<Vec<Vec2>> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().map(Vec2::from_array).collect());

    let vertex_count = positions.len();
    let mut geometry = Geometry {
        positions,
        normals: Vec::new(),
        uvs: uvs
            .filter(|uvs| uvs.len() == vertex_count)
            .unwrap_or_else(|| vec![Vec2::ZERO; vertex_count]),
        indices: indices[..indices.len() - indices.len() % 3].to_vec(),
    };
    match normals {
        Some(normals) if normals.len() == vertex_count => geometry.normals = normals,
        _ => geometry.compute_vertex_normals(),
    }

    let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
    Ok(Some((geometry, Material::standard(Color::rgb(r, g, b)))))
}
