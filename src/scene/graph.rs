use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec3};

use super::node::{AssetTree, Backdrop, NodeContent, SceneNode};
use crate::error::{SceneError, SceneResult};
use crate::math::Transform;

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Stable reference to a node. Valid for the lifetime of the graph that
/// issued it; handles from another graph are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    graph: u32,
    index: u32,
}

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Append-only scene graph.
///
/// Nodes live in a flat table in insertion order and are never removed or
/// re-parented, so every parent precedes its children and the tree cannot
/// contain cycles. The root is implicit: it is not yielded by traversal.
#[derive(Debug)]
pub struct SceneGraph {
    id: u32,
    nodes: Vec<SceneNode>,
    backdrop: Backdrop,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = SceneNode {
            name: "scene".to_string(),
            transform: Transform::IDENTITY,
            content: NodeContent::Group,
            parent: None,
            children: Vec::new(),
        };
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            nodes: vec![root],
            backdrop: Backdrop::default(),
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.handle(0)
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn set_backdrop(&mut self, backdrop: Backdrop) {
        self.backdrop = backdrop;
    }

    /// Append a node under `parent`
    pub fn create_node(
        &mut self,
        parent: NodeHandle,
        name: impl Into<String>,
        transform: Transform,
        content: NodeContent,
    ) -> SceneResult<NodeHandle> {
        self.validate(parent)?;
        Ok(self.push(parent, name.into(), transform, content))
    }

    /// Graft an owned tree under `parent`. The tree's root takes `offset` as its
    /// local transform; everything below keeps the transforms it came with.
    /// Returns the handle of the grafted root.
    pub fn attach_subtree(
        &mut self,
        parent: NodeHandle,
        subtree: AssetTree,
        offset: Transform,
    ) -> SceneResult<NodeHandle> {
        self.validate(parent)?;

        let AssetTree {
            name,
            content,
            children,
            ..
        } = subtree;
        let root = self.push(parent, name, offset, content);

        // depth-first, preserving child order
        let mut pending: Vec<(NodeHandle, AssetTree)> =
            children.into_iter().rev().map(|child| (root, child)).collect();
        while let Some((owner, tree)) = pending.pop() {
            let AssetTree {
                name,
                transform,
                content,
                children,
            } = tree;
            let handle = self.push(owner, name, transform, content);
            pending.extend(children.into_iter().rev().map(|child| (handle, child)));
        }

        Ok(root)
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.validate(handle).is_ok()
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.validate(handle).ok()?;
        self.nodes.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.validate(handle).ok()?;
        self.nodes.get_mut(handle.index())
    }

    /// Add a rotation delta; returns false when the node is absent
    pub fn rotate(&mut self, handle: NodeHandle, delta: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(node) => {
                node.transform.rotate_by(delta);
                true
            }
            None => false,
        }
    }

    /// Every node except the root, in insertion order. The iterator borrows a
    /// snapshot of the graph and is exhausted after one pass.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &SceneNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(move |(index, node)| (self.handle(index), node))
    }

    pub fn for_each_node<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeHandle, &SceneNode),
    {
        self.nodes().for_each(|(handle, node)| visitor(handle, node));
    }

    /// Number of nodes, root excluded
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World matrix of every node, indexed like [`NodeHandle::index`]
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.to_matrix();
            let matrix = match node.parent {
                Some(parent) => world[parent.index()] * local,
                None => local,
            };
            world.push(matrix);
        }
        world
    }

    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Mat4> {
        let mut node = self.get(handle)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.index()];
            matrix = node.transform.to_matrix() * matrix;
        }
        Some(matrix)
    }

    fn handle(&self, index: usize) -> NodeHandle {
        NodeHandle {
            graph: self.id,
            index: index as u32,
        }
    }

    fn validate(&self, handle: NodeHandle) -> SceneResult<()> {
        if handle.graph != self.id {
            return Err(SceneError::ForeignHandle(handle));
        }
        if handle.index() >= self.nodes.len() {
            return Err(SceneError::UnknownNode(handle));
        }
        Ok(())
    }

    fn push(&mut self, parent: NodeHandle, name: String, transform: Transform, content: NodeContent) -> NodeHandle {
        let handle = self.handle(self.nodes.len());
        self.nodes.push(SceneNode {
            name,
            transform,
            content,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(handle);
        handle
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;
    use crate::mesh::{build_sphere_mesh, Material};
    use crate::scene::PointLight;

    fn light() -> NodeContent {
        NodeContent::Light(PointLight {
            color: Color::WHITE,
            intensity: 1.0,
        })
    }

    fn model() -> AssetTree {
        let mut body = AssetTree::group("body");
        body.transform = Transform::from_position(Vec3::X);
        AssetTree::group("model")
            .with_child(body.with_child(AssetTree::group("label")))
            .with_child(AssetTree::group("case"))
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = SceneGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.nodes().count(), 0);
        assert!(graph.contains(graph.root()));
    }

    #[test]
    fn test_create_node_appends_in_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_node(root, "a", Transform::IDENTITY, NodeContent::Group).unwrap();
        let b = graph.create_node(a, "b", Transform::IDENTITY, light()).unwrap();
        let c = graph.create_node(root, "c", Transform::IDENTITY, NodeContent::Group).unwrap();

        let names: Vec<&str> = graph.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(graph.get(b).unwrap().parent(), Some(a));
        assert_eq!(graph.get(root).unwrap().children(), &[a, c]);
        assert!(graph.get(b).unwrap().light().is_some());
    }

    #[test]
    fn test_mesh_node_exposes_geometry_and_material() {
        let mut graph = SceneGraph::new();
        let sphere = build_sphere_mesh(0.25, 8, 6).unwrap();
        let handle = graph
            .create_node(
                graph.root(),
                "star",
                Transform::IDENTITY,
                NodeContent::mesh(sphere, Material::standard(Color::WHITE)),
            )
            .unwrap();
        let node = graph.get(handle).unwrap();
        assert_eq!(node.geometry().map(|g| g.vertex_count()), Some(9 * 7));
        assert_eq!(node.material().map(|m| m.color), Some(Color::WHITE));
    }

    #[test]
    fn test_attach_subtree_preorder_with_offset_on_root() {
        let mut graph = SceneGraph::new();
        let offset = Transform::from_position(Vec3::new(0.0, 3.0, 0.0)).with_scale(Vec3::splat(5.0));
        let root = graph.attach_subtree(graph.root(), model(), offset).unwrap();

        let names: Vec<&str> = graph.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["model", "body", "label", "case"]);
        assert_eq!(graph.get(root).unwrap().transform, offset);

        let (body, _) = graph.nodes().find(|(_, n)| n.name == "body").unwrap();
        assert_eq!(graph.get(body).unwrap().transform.position, Vec3::X);
        assert_eq!(graph.get(body).unwrap().parent(), Some(root));
    }

    #[test]
    fn test_world_matrices_compose_parents() {
        let mut graph = SceneGraph::new();
        let offset = Transform::from_position(Vec3::new(0.0, 3.0, 0.0)).with_scale(Vec3::splat(5.0));
        graph.attach_subtree(graph.root(), model(), offset).unwrap();
        let (label, _) = graph.nodes().find(|(_, n)| n.name == "label").unwrap();

        let world = graph.world_matrices();
        let origin = world[label.index()].transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(5.0, 3.0, 0.0)).length() < 1e-5);
        assert_eq!(graph.world_matrix(label), Some(world[label.index()]));
    }

    #[test]
    fn test_foreign_handles_are_rejected() {
        let mut first = SceneGraph::new();
        let second = SceneGraph::new();
        let err = first
            .create_node(second.root(), "x", Transform::IDENTITY, NodeContent::Group)
            .unwrap_err();
        assert!(matches!(err, SceneError::ForeignHandle(_)));
        assert!(first.get(second.root()).is_none());
    }

    #[test]
    fn test_rotate_missing_node_is_noop() {
        let mut graph = SceneGraph::new();
        let other = SceneGraph::new();
        assert!(!graph.rotate(other.root(), Vec3::ONE));
        let node = graph.create_node(graph.root(), "n", Transform::IDENTITY, NodeContent::Group).unwrap();
        assert!(graph.rotate(node, Vec3::new(0.1, 0.0, 0.0)));
        assert_eq!(graph.get(node).unwrap().transform.rotation, Vec3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn test_traversal_is_restartable_only_by_new_call() {
        let mut graph = SceneGraph::new();
        graph.create_node(graph.root(), "a", Transform::IDENTITY, NodeContent::Group).unwrap();
        let mut walk = graph.nodes();
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());

        let mut visited = 0;
        graph.for_each_node(|_, _| visited += 1);
        assert_eq!(visited, 1);
    }
}
