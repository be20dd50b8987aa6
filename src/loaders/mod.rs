pub mod gltf;
pub mod pipeline;

pub use self::gltf::{load_gltf_tree, GltfLoader};
pub use pipeline::{AssetId, AssetPipeline, LoadState, LoadableAsset};
