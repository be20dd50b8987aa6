use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use starfield::cli::Cli;
use starfield::config::SceneConfig;
use starfield::core::{AnimationScheduler, OrbitController, SoftwareRenderer, WindowRenderer};
use starfield::error::RenderError;
use starfield::frame::{FixedStepClock, FrameIterator};
use starfield::loaders::{AssetPipeline, GltfLoader};
use starfield::{Projection, SceneSession};

const HEADLESS_HZ: f32 = 60.0;

type WindowScheduler = AnimationScheduler<WindowRenderer, OrbitController, GltfLoader>;

/// Scene parts waiting for a window before the loop can start
struct Startup {
    session: SceneSession,
    controller: OrbitController,
    pipeline: AssetPipeline<GltfLoader>,
}

struct App {
    config: SceneConfig,
    startup: Option<Startup>,
    window: Option<Arc<Window>>,
    scheduler: Option<WindowScheduler>,
    frames: FrameIterator,
    fatal: Option<RenderError>,
}

impl App {
    fn new(config: SceneConfig, startup: Startup) -> Self {
        Self {
            config,
            startup: Some(startup),
            window: None,
            scheduler: None,
            frames: FrameIterator::new(),
            fatal: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(startup) = self.startup.take() else {
            return;
        };

        let viewport = &self.config.viewport;
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(viewport.title.clone())
                .with_inner_size(winit::dpi::LogicalSize::new(viewport.width, viewport.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fatal = Some(RenderError::RendererUnavailable(format!("cannot create window: {}", e)));
                event_loop.exit();
                return;
            }
        };

        let camera = &self.config.camera;
        let projection = Projection::new(camera.fov, 1.0, camera.near, camera.far);
        let renderer = match WindowRenderer::new(window.clone(), projection) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.fatal = Some(e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let mut scheduler = AnimationScheduler::new(startup.session, renderer, startup.controller, startup.pipeline);
        scheduler.resize(size.width, size.height);
        scheduler.start();

        self.window = Some(window);
        self.scheduler = Some(scheduler);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };

        if scheduler.controller_mut().process_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => scheduler.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if let Some(frame) = self.frames.next() {
                    scheduler.advance(frame);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run_headless(cli: &Cli, config: &SceneConfig, startup: Startup) -> Result<()> {
    let camera = &config.camera;
    let projection = Projection::new(camera.fov, 1.0, camera.near, camera.far);
    let renderer = SoftwareRenderer::new(config.viewport.width, config.viewport.height, projection);
    let mut scheduler = AnimationScheduler::new(startup.session, renderer, startup.controller, startup.pipeline);

    // without a display there is no reason to race the loaders
    scheduler.wait_for_assets();
    let ticks = scheduler.run(FixedStepClock::new(HEADLESS_HZ).limit(cli.frames));
    info!("Headless run finished after {} frames", ticks);

    if let Some(path) = &cli.snapshot {
        scheduler.renderer().save_png(path)?;
        info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    cli.apply(&mut config);

    let session = SceneSession::build(&config).context("building scene")?;
    let mut pipeline = AssetPipeline::new(GltfLoader::new());
    pipeline.request_all(&config.assets);
    let startup = Startup {
        session,
        controller: OrbitController::new(config.viewport.height),
        pipeline,
    };

    if cli.headless {
        return run_headless(&cli, &config, startup);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, startup);

    info!("Starfield - drag to orbit, right-drag to pan, scroll to zoom, Escape to quit");
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.fatal {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}
