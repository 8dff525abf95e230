//! Input events and their delivery
//!
//! Raw winit events are translated by [`InputController`] into [`InputEvent`]s
//! and queued on an [`EventController`]. Once per frame the queue is drained
//! into every [`InputListener`] subscribed to the event's [`EventType`].

pub mod input_controller;

pub use input_controller::{Command, InputController};

use winit::keyboard::KeyCode;

/// Category an [`InputEvent`] belongs to; listeners subscribe by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Keyboard,
    MouseMoved,
    MouseScroll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { code: KeyCode, pressed: bool },
    /// Relative pointer motion in device units.
    MouseMoved { dx: f32, dy: f32 },
    /// Vertical wheel motion in lines, positive away from the user.
    MouseScroll { dy: f32 },
}

impl InputEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            InputEvent::Key { .. } => EventType::Keyboard,
            InputEvent::MouseMoved { .. } => EventType::MouseMoved,
            InputEvent::MouseScroll { .. } => EventType::MouseScroll,
        }
    }
}

/// Something that reacts to input events.
pub trait InputListener {
    /// Event types this listener wants delivered.
    fn interests(&self) -> &[EventType];

    fn on_event(&mut self, event: &InputEvent);
}

/// Queue of pending input events.
#[derive(Debug, Default)]
pub struct EventController {
    queue: Vec<InputEvent>,
}

impl EventController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Number of events waiting for the next dispatch.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers queued events in arrival order and empties the queue.
    ///
    /// Each event goes to every listener subscribed to its type, in the order
    /// the listeners are given. Returns the number of deliveries made.
    pub fn dispatch(&mut self, listeners: &mut [&mut dyn InputListener]) -> usize {
        let mut delivered = 0;
        for event in self.queue.drain(..) {
            let event_type = event.event_type();
            for listener in listeners.iter_mut() {
                if listener.interests().contains(&event_type) {
                    listener.on_event(&event);
                    delivered += 1;
                }
            }
        }
        delivered
    }
}
