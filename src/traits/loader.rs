use std::path::Path;

use futures::future::BoxFuture;

use crate::error::AssetLoadError;
use crate::scene::AssetTree;

/// Parses external model files into owned node trees.
///
/// The returned future must not block whoever polls it; implementations do
/// the actual work elsewhere and resolve once it is done.
pub trait ModelLoader {
    fn load(&self, path: &Path) -> BoxFuture<'static, Result<AssetTree, AssetLoadError>>;
}
