//! Per-frame rotation rules keyed by stable targets rather than node indices.
//!
//! A rule names an [`AnimationTarget`]; the target is bound to a node handle
//! once the node exists. Unbound rules are skipped, so a rule registered for
//! an asset that is still loading (or never loads) is simply inert.

use std::collections::HashMap;

use glam::Vec3;

use crate::loaders::AssetId;
use crate::scene::{NodeHandle, SceneGraph};

/// Stable key for something that may be animated.
///
/// Scene-built nodes and loaded assets live in separate key spaces, so an
/// asset can never take over the binding of a node the scene created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnimationTarget {
    /// Node created while building the scene, such as the tube
    Named(String),
    /// Root of a loaded asset
    Asset(AssetId),
}

impl AnimationTarget {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl From<&str> for AnimationTarget {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<AssetId> for AnimationTarget {
    fn from(id: AssetId) -> Self {
        Self::Asset(id)
    }
}

/// Rotation delta in radians added to the target every tick
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRule {
    pub target: AnimationTarget,
    pub delta: Vec3,
}

#[derive(Debug, Default)]
pub struct AnimationSet {
    rules: Vec<AnimationRule>,
    bindings: HashMap<AnimationTarget, NodeHandle>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, target: impl Into<AnimationTarget>, delta: Vec3) {
        self.rules.push(AnimationRule {
            target: target.into(),
            delta,
        });
    }

    /// Point a target at a node. Rules for it take effect from the next apply.
    pub fn bind(&mut self, target: impl Into<AnimationTarget>, node: NodeHandle) {
        self.bindings.insert(target.into(), node);
    }

    pub fn binding(&self, target: &AnimationTarget) -> Option<NodeHandle> {
        self.bindings.get(target).copied()
    }

    pub fn rules(&self) -> &[AnimationRule] {
        &self.rules
    }

    /// Apply every rule whose node currently exists; returns how many applied
    pub fn apply(&self, graph: &mut SceneGraph) -> usize {
        self.rules
            .iter()
            .filter_map(|rule| self.bindings.get(&rule.target).map(|&node| (node, rule.delta)))
            .filter(|&(node, delta)| graph.rotate(node, delta))
            .count()
    }
}
