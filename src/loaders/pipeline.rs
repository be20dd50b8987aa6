use futures::executor::block_on;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use glam::Vec3;
use log::{info, warn};

use crate::config::AssetConfig;
use crate::error::AssetLoadError;
use crate::scene::{AssetTree, NodeHandle, SceneSession};
use crate::traits::ModelLoader;

/// Index of a requested asset inside its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Pending,
    /// Grafted into the scene under this node
    Loaded(NodeHandle),
    Failed(AssetLoadError),
}

/// A requested asset and where it is in its lifecycle
#[derive(Debug, Clone)]
pub struct LoadableAsset {
    pub config: AssetConfig,
    pub state: LoadState,
}

type Completion = BoxFuture<'static, (AssetId, Result<AssetTree, AssetLoadError>)>;

/// Issues model loads and grafts the results into the scene as they finish.
///
/// Loads run concurrently and may finish in any order. Completions are only
/// applied from [`AssetPipeline::poll_completed`], which the frame loop calls
/// between ticks, so a tick never observes a half-attached asset. Failed loads
/// go to the error sink and leave the scene untouched.
pub struct AssetPipeline<L: ModelLoader> {
    loader: L,
    assets: Vec<LoadableAsset>,
    in_flight: FuturesUnordered<Completion>,
    error_sink: Box<dyn FnMut(&AssetLoadError)>,
}

impl<L: ModelLoader> AssetPipeline<L> {
    /// Pipeline whose failures are logged as warnings
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            assets: Vec::new(),
            in_flight: FuturesUnordered::new(),
            error_sink: Box::new(|err| warn!("{}", err)),
        }
    }

    pub fn with_error_sink(mut self, sink: impl FnMut(&AssetLoadError) + 'static) -> Self {
        self.error_sink = Box::new(sink);
        self
    }

    /// Start loading one asset. Returns immediately.
    pub fn request_load(&mut self, config: AssetConfig) -> AssetId {
        let id = AssetId(self.assets.len());
        let load = self.loader.load(&config.path);
        self.in_flight.push(async move { (id, load.await) }.boxed());

        info!("Requested asset {:?} from {:?}", config.name, config.path);
        self.assets.push(LoadableAsset {
            config,
            state: LoadState::Pending,
        });
        id
    }

    pub fn request_all(&mut self, configs: &[AssetConfig]) -> Vec<AssetId> {
        configs.iter().cloned().map(|config| self.request_load(config)).collect()
    }

    /// Apply every load that has already finished without waiting for the
    /// rest. Returns how many completed.
    pub fn poll_completed(&mut self, session: &mut SceneSession) -> usize {
        let mut completed = 0;
        while let Some(Some((id, result))) = self.in_flight.next().now_or_never() {
            self.complete(id, result, session);
            completed += 1;
        }
        completed
    }

    /// Block until every outstanding load has finished
    pub fn wait_all(&mut self, session: &mut SceneSession) -> usize {
        let mut completed = 0;
        while let Some((id, result)) = block_on(self.in_flight.next()) {
            self.complete(id, result, session);
            completed += 1;
        }
        completed
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn assets(&self) -> &[LoadableAsset] {
        &self.assets
    }

    pub fn state(&self, id: AssetId) -> Option<&LoadState> {
        self.assets.get(id.0).map(|asset| &asset.state)
    }

    fn complete(&mut self, id: AssetId, result: Result<AssetTree, AssetLoadError>, session: &mut SceneSession) {
        let Some(asset) = self.assets.get_mut(id.0) else {
            return;
        };
        let config = &asset.config;

        let attached = result.and_then(|tree| {
            let root = session.graph.root();
            session
                .graph
                .attach_subtree(root, tree, config.transform)
                .map_err(|e| AssetLoadError::new(&config.path, e.to_string()))
        });

        asset.state = match attached {
            Ok(node) => {
                // rules exist only once the node does
                session.animations.bind(id, node);
                if config.rotation_delta != Vec3::ZERO {
                    session.animations.add_rule(id, config.rotation_delta);
                }
                info!("Asset {:?} attached ({} nodes in scene)", config.name, session.graph.len());
                LoadState::Loaded(node)
            }
            Err(err) => {
                (self.error_sink)(&err);
                LoadState::Failed(err)
            }
        };
    }
}
