use std::sync::Arc;

use image::RgbaImage;

use super::graph::NodeHandle;
use crate::math::{Color, Transform};
use crate::mesh::{Geometry, Material};

/// Point light emitting in all directions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
}

/// Debug visuals drawn as lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Helper {
    /// Wireframe marker at a light's position
    PointLight { size: f32 },
    /// Square grid in the XZ plane
    Grid { size: f32, divisions: u32 },
}

/// What a node carries besides its transform
#[derive(Debug, Clone)]
pub enum NodeContent {
    Group,
    Mesh { geometry: Arc<Geometry>, material: Material },
    Light(PointLight),
    Helper(Helper),
}

impl NodeContent {
    pub fn mesh(geometry: Geometry, material: Material) -> Self {
        NodeContent::Mesh {
            geometry: Arc::new(geometry),
            material,
        }
    }
}

/// A node stored in a [`super::SceneGraph`]
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub(super) parent: Option<NodeHandle>,
    pub(super) children: Vec<NodeHandle>,
}

impl SceneNode {
    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.content {
            NodeContent::Mesh { geometry, .. } => Some(geometry),
            _ => None,
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.content {
            NodeContent::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&PointLight> {
        match &self.content {
            NodeContent::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}

/// Owned node tree produced by a model loader, grafted into a graph in one go
#[derive(Debug, Clone)]
pub struct AssetTree {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub children: Vec<AssetTree>,
}

impl AssetTree {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            content: NodeContent::Group,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: AssetTree) -> Self {
        self.children.push(child);
        self
    }

    /// Nodes in this tree, root included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AssetTree::node_count).sum::<usize>()
    }
}

/// What the renderer clears to before drawing
#[derive(Debug, Clone)]
pub enum Backdrop {
    Color(Color),
    Image(Arc<RgbaImage>),
}

impl Default for Backdrop {
    fn default() -> Self {
        Backdrop::Color(Color::BLACK)
    }
}
