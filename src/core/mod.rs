pub mod display_context;
pub mod gpu_context;
pub mod input_adapter;
pub mod orbit_controller;
pub mod rasterizer;
pub mod scheduler;
pub mod surface_renderer;

pub use display_context::DisplayContext;
pub use input_adapter::{PointerButton, PointerDelta, PointerInput};
pub use orbit_controller::OrbitController;
pub use rasterizer::SoftwareRenderer;
pub use scheduler::{AnimationScheduler, SchedulerState};
pub use surface_renderer::{SurfacePresenter, WindowRenderer};
