//! Pointer events and the macroquad adapter that produces them.

use macroquad::input::{
    is_mouse_button_down, is_mouse_button_pressed, is_mouse_button_released, mouse_position,
    simulate_mouse_with_touch, touches, MouseButton, TouchPhase,
};
use macroquad::window::{screen_height, screen_width};

/// Input in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    /// The drawable area changed size.
    Resize { width: f32, height: f32 },
}

/// Events collected between updates.
#[derive(Debug)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Takes every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls macroquad's mouse and touch state into an [`InputQueue`].
///
/// While attached, touches are reported directly and macroquad's touch to
/// mouse emulation is switched off so a tap is not seen twice.
#[derive(Debug, Default)]
pub struct MacroquadPointer {
    attached: bool,
    last_size: Option<(f32, f32)>,
    last_mouse: Option<(f32, f32)>,
}

impl MacroquadPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) {
        if !self.attached {
            simulate_mouse_with_touch(false);
            self.attached = true;
            self.last_size = None;
            self.last_mouse = None;
        }
    }

    pub fn detach(&mut self) {
        if self.attached {
            simulate_mouse_with_touch(true);
            self.attached = false;
        }
    }

    /// Pushes whatever happened since the previous poll. Does nothing while
    /// detached.
    pub fn poll(&mut self, queue: &mut InputQueue) {
        if !self.attached {
            return;
        }

        let size = (screen_width(), screen_height());
        if self.last_size != Some(size) {
            self.last_size = Some(size);
            queue.push(InputEvent::Resize {
                width: size.0,
                height: size.1,
            });
        }

        for touch in touches() {
            let (x, y) = (touch.position.x, touch.position.y);
            match touch.phase {
                TouchPhase::Started => queue.push(InputEvent::PointerDown { x, y }),
                TouchPhase::Moved => queue.push(InputEvent::PointerMove { x, y }),
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    queue.push(InputEvent::PointerUp { x, y })
                }
                TouchPhase::Stationary => {}
            }
        }

        let (x, y) = mouse_position();
        if is_mouse_button_pressed(MouseButton::Left) {
            queue.push(InputEvent::PointerDown { x, y });
        } else if is_mouse_button_released(MouseButton::Left) {
            queue.push(InputEvent::PointerUp { x, y });
        } else if is_mouse_button_down(MouseButton::Left) && self.last_mouse != Some((x, y)) {
            queue.push(InputEvent::PointerMove { x, y });
        }
        self.last_mouse = Some((x, y));
    }
}

impl Drop for MacroquadPointer {
    fn drop(&mut self) {
        self.detach();
    }
}
