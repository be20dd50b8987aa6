use log::{debug, info, warn};

use crate::frame::{FpsCounter, FrameInfo};
use crate::loaders::AssetPipeline;
use crate::scene::SceneSession;
use crate::traits::{CameraController, ModelLoader, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Built, no frame run yet
    Idle,
    Running,
}

/// Drives the per-frame loop over a [`SceneSession`].
///
/// Each tick applies the animation rules, lets the camera controller consume
/// buffered input and renders the result. Finished asset loads are grafted
/// in before a tick starts, never during one. Ticks are strictly sequential:
/// the frame source decides when the next one runs.
pub struct AnimationScheduler<R, C, L>
where
    R: Renderer,
    C: CameraController,
    L: ModelLoader,
{
    session: SceneSession,
    renderer: R,
    controller: C,
    pipeline: AssetPipeline<L>,
    state: SchedulerState,
    ticks: u64,
    fps: FpsCounter,
}

impl<R, C, L> AnimationScheduler<R, C, L>
where
    R: Renderer,
    C: CameraController,
    L: ModelLoader,
{
    pub fn new(session: SceneSession, renderer: R, controller: C, pipeline: AssetPipeline<L>) -> Self {
        Self {
            session,
            renderer,
            controller,
            pipeline,
            state: SchedulerState::Idle,
            ticks: 0,
            fps: FpsCounter::default(),
        }
    }

    /// Idle -> Running. Later calls do nothing.
    pub fn start(&mut self) {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Running;
            info!(
                "Animation loop running ({} nodes, {} assets pending)",
                self.session.graph.len(),
                self.pipeline.pending_count()
            );
        }
    }

    /// Graft finished loads, then run one tick
    pub fn advance(&mut self, frame: FrameInfo) {
        self.pump_loads();
        self.tick(frame);
    }

    /// Run one tick per frame from `clock` until it runs out. Returns the
    /// total number of ticks run so far.
    pub fn run<I>(&mut self, clock: I) -> u64
    where
        I: IntoIterator<Item = FrameInfo>,
    {
        self.start();
        for frame in clock {
            self.advance(frame);
        }
        self.ticks
    }

    /// Apply every asset load that completed since the last call
    pub fn pump_loads(&mut self) -> usize {
        let completed = self.pipeline.poll_completed(&mut self.session);
        if completed > 0 {
            debug!("{} asset load(s) completed, {} pending", completed, self.pipeline.pending_count());
        }
        completed
    }

    pub fn tick(&mut self, frame: FrameInfo) {
        self.start();

        let session = &mut self.session;
        session.animations.apply(&mut session.graph);
        self.controller.update(&mut session.camera);

        // a dropped frame is not fatal: the next tick tries again
        if let Err(e) = self.renderer.render(&session.graph, &session.camera) {
            warn!("Frame {} not rendered: {}", frame.number, e);
        }

        self.ticks += 1;
        if let Some(fps) = self.fps.tick(frame.delta) {
            info!("FPS: {:.1}", fps);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.controller.resize(width, height);
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn session(&self) -> &SceneSession {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn pipeline(&self) -> &AssetPipeline<L> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut AssetPipeline<L> {
        &mut self.pipeline
    }

    /// Block until every requested asset has resolved and graft the results
    pub fn wait_for_assets(&mut self) -> usize {
        self.pipeline.wait_all(&mut self.session)
    }
}
