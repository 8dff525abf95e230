use std::collections::HashSet;

use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::{EventController, InputEvent, InputListener};

/// Pixels of trackpad scrolling treated as one wheel line.
const PIXELS_PER_SCROLL_LINE: f32 = 40.0;

/// Application-level actions bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleUi,
}

/// Translates winit events into [`InputEvent`]s and tracks held keys.
#[derive(Debug, Default)]
pub struct InputController {
    events: EventController,
    held: HashSet<KeyCode>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles keyboard and wheel events; returns a command if one was triggered.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> Option<Command> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => self.process_key(*code, *state == ElementState::Pressed, *repeat),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                        *y as f32 / PIXELS_PER_SCROLL_LINE
                    }
                };
                self.process_scroll(lines);
                None
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                None
            }
            _ => None,
        }
    }

    /// Handles an event the UI captured; only key releases get through.
    pub fn process_captured_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                winit::event::KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
            ..
        } = event
        {
            self.process_captured_key(*code, *state == ElementState::Pressed);
        }
    }

    /// Releases a held key even though the UI owns the keyboard, so movement
    /// started before the UI took focus stops. Presses are dropped.
    pub fn process_captured_key(&mut self, code: KeyCode, pressed: bool) {
        if !pressed && self.held.contains(&code) {
            self.process_key(code, false, false);
        }
    }

    /// Handles raw pointer motion, which keeps working while the cursor is grabbed.
    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.process_mouse_motion(delta.0 as f32, delta.1 as f32);
        }
    }

    pub fn process_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> Option<Command> {
        if pressed {
            self.held.insert(code);
        } else {
            self.held.remove(&code);
        }

        if pressed && !repeat {
            match code {
                KeyCode::Escape => return Some(Command::Quit),
                KeyCode::F1 => return Some(Command::ToggleUi),
                _ => {}
            }
        }

        if !repeat {
            self.events.publish(InputEvent::Key { code, pressed });
        }
        None
    }

    pub fn process_mouse_motion(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.events.publish(InputEvent::MouseMoved { dx, dy });
    }

    pub fn process_scroll(&mut self, dy: f32) {
        if dy == 0.0 {
            return;
        }
        self.events.publish(InputEvent::MouseScroll { dy });
    }

    /// Emits key releases for everything held, e.g. when focus is lost.
    pub fn release_all(&mut self) {
        for code in self.held.drain() {
            self.events.publish(InputEvent::Key {
                code,
                pressed: false,
            });
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// Delivers this frame's events to the listeners.
    pub fn update(&mut self, listeners: &mut [&mut dyn InputListener]) -> usize {
        self.events.dispatch(listeners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EventType;

    #[derive(Default)]
    struct Collector(Vec<InputEvent>);

    impl InputListener for Collector {
        fn interests(&self) -> &[EventType] {
            &[
                EventType::Keyboard,
                EventType::MouseMoved,
                EventType::MouseScroll,
            ]
        }

        fn on_event(&mut self, event: &InputEvent) {
            self.0.push(*event);
        }
    }

    #[test]
    fn test_escape_and_f1_are_commands() {
        let mut input = InputController::new();
        assert_eq!(
            input.process_key(KeyCode::Escape, true, false),
            Some(Command::Quit)
        );
        assert_eq!(
            input.process_key(KeyCode::F1, true, false),
            Some(Command::ToggleUi)
        );
        assert_eq!(input.process_key(KeyCode::F1, true, true), None);
        assert_eq!(input.process_key(KeyCode::F1, false, false), None);
    }

    #[test]
    fn test_held_keys_are_tracked() {
        let mut input = InputController::new();
        input.process_key(KeyCode::KeyW, true, false);
        assert!(input.is_held(KeyCode::KeyW));
        input.process_key(KeyCode::KeyW, false, false);
        assert!(!input.is_held(KeyCode::KeyW));
    }

    #[test]
    fn test_repeats_are_not_published() {
        let mut input = InputController::new();
        input.process_key(KeyCode::KeyA, true, false);
        input.process_key(KeyCode::KeyA, true, true);
        input.process_key(KeyCode::KeyA, true, true);

        let mut collector = Collector::default();
        input.update(&mut [&mut collector]);
        assert_eq!(collector.0.len(), 1);
    }

    #[test]
    fn test_release_all_emits_key_ups() {
        let mut input = InputController::new();
        input.process_key(KeyCode::KeyW, true, false);
        input.process_key(KeyCode::KeyD, true, false);
        input.update(&mut [&mut Collector::default()]);

        input.release_all();
        let mut collector = Collector::default();
        input.update(&mut [&mut collector]);

        assert_eq!(collector.0.len(), 2);
        assert!(collector
            .0
            .iter()
            .all(|e| matches!(e, InputEvent::Key { pressed: false, .. })));
        assert!(!input.is_held(KeyCode::KeyW));
    }

    #[test]
    fn test_zero_motion_is_ignored() {
        let mut input = InputController::new();
        input.process_mouse_motion(0.0, 0.0);
        input.process_scroll(0.0);
        input.process_mouse_motion(3.0, -1.0);

        let mut collector = Collector::default();
        assert_eq!(input.update(&mut [&mut collector]), 1);
        assert_eq!(collector.0[0], InputEvent::MouseMoved { dx: 3.0, dy: -1.0 });
    }

    #[test]
    fn test_captured_release_still_stops_held_key() {
        let mut input = InputController::new();
        input.process_key(KeyCode::KeyW, true, false);
        input.update(&mut [&mut Collector::default()]);

        input.process_captured_key(KeyCode::KeyW, false);
        input.process_captured_key(KeyCode::KeyS, true);
        input.process_captured_key(KeyCode::KeyD, false);

        let mut collector = Collector::default();
        input.update(&mut [&mut collector]);
        assert_eq!(
            collector.0,
            vec![InputEvent::Key {
                code: KeyCode::KeyW,
                pressed: false
            }]
        );
        assert!(!input.is_held(KeyCode::KeyW));
        assert!(!input.is_held(KeyCode::KeyS));
    }
}
