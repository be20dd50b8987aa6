use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixels of trackpad scroll that count as one wheel notch
const PIXELS_PER_LINE: f32 = 50.0;

/// Pointer buttons the camera cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Drag to orbit
    Primary,
    /// Drag to pan
    Secondary,
}

/// Input accumulated since the last [`PointerInput::take`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerDelta {
    pub rotate: Vec2,
    pub pan: Vec2,
    /// Wheel notches, positive towards the scene
    pub zoom: f32,
}

impl PointerDelta {
    pub fn is_zero(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Bridges winit pointer events into buffered drag and scroll deltas
#[derive(Debug, Clone, Default)]
pub struct PointerInput {
    primary_down: bool,
    secondary_down: bool,
    cursor: Option<Vec2>,
    pending: PointerDelta,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one window event. Returns true if it was a pointer event.
    pub fn process_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = Self::map_button(*button) else {
                    return false;
                };
                self.on_button(button, *state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(position.x as f32, position.y as f32);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.on_scroll(notches);
                true
            }
            _ => false,
        }
    }

    pub fn on_button(&mut self, button: PointerButton, pressed: bool) {
        match button {
            PointerButton::Primary => self.primary_down = pressed,
            PointerButton::Secondary => self.secondary_down = pressed,
        }
    }

    /// Cursor moved to window coordinates `(x, y)`. Movement only counts
    /// while a button is held.
    pub fn on_cursor_moved(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if let Some(previous) = self.cursor {
            let moved = position - previous;
            if self.primary_down {
                self.pending.rotate += moved;
            } else if self.secondary_down {
                self.pending.pan += moved;
            }
        }
        self.cursor = Some(position);
    }

    pub fn on_scroll(&mut self, notches: f32) {
        self.pending.zoom += notches;
    }

    pub fn is_dragging(&self) -> bool {
        self.primary_down || self.secondary_down
    }

    /// Return the buffered delta and clear it
    pub fn take(&mut self) -> PointerDelta {
        std::mem::take(&mut self.pending)
    }

    fn map_button(button: MouseButton) -> Option<PointerButton> {
        match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right | MouseButton::Middle => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}
