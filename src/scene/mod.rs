mod graph;
mod node;
mod session;

pub use graph::{NodeHandle, SceneGraph};
pub use node::{AssetTree, Backdrop, Helper, NodeContent, PointLight, SceneNode};
pub use session::{SceneSession, LIGHT_NODE, STAR_NODE, TUBE_NODE};
