use std::collections::HashSet;

use winit::keyboard::KeyCode;

use super::fly_camera::{CameraMovement, FlyCamera};

/// Turns key and pointer input into fly-camera motion.
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Scale applied to wheel lines before they reach the zoom.
    pub zoom_speed: f32,
    /// Whether pointer motion steers the camera.
    pub mouse_look_enabled: bool,
    moving: HashSet<CameraMovement>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CameraController {
    pub fn new(zoom_speed: f32) -> Self {
        Self {
            zoom_speed,
            mouse_look_enabled: true,
            moving: HashSet::new(),
        }
    }

    /// Maps a movement key; returns false for keys the camera ignores.
    pub fn process_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let Some(movement) = movement_for_key(code) else {
            return false;
        };
        if pressed {
            self.moving.insert(movement);
        } else {
            self.moving.remove(&movement);
        }
        true
    }

    pub fn process_mouse_motion(&self, dx: f32, dy: f32, camera: &mut FlyCamera) {
        if self.mouse_look_enabled {
            camera.process_mouse_movement(dx, dy, true);
        }
    }

    pub fn process_scroll(&self, dy: f32, camera: &mut FlyCamera) {
        camera.process_mouse_scroll(dy * self.zoom_speed);
    }

    /// Applies every held movement for `delta_time` seconds.
    pub fn update(&self, camera: &mut FlyCamera, delta_time: f32) {
        for movement in &self.moving {
            camera.process_keyboard(*movement, delta_time);
        }
    }

    pub fn is_moving(&self) -> bool {
        !self.moving.is_empty()
    }
}

fn movement_for_key(code: KeyCode) -> Option<CameraMovement> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(CameraMovement::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(CameraMovement::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(CameraMovement::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(CameraMovement::Right),
        KeyCode::Space => Some(CameraMovement::Up),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(CameraMovement::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_held_keys_drive_movement() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 0.0));

        assert!(controller.process_key(KeyCode::KeyW, true));
        controller.update(&mut camera, 0.5);
        assert!(camera.position.z < 0.0);

        assert!(controller.process_key(KeyCode::KeyW, false));
        let before = camera.position;
        controller.update(&mut camera, 0.5);
        assert_eq!(camera.position, before);
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let mut controller = CameraController::default();
        assert!(!controller.process_key(KeyCode::KeyQ, true));
        assert!(!controller.is_moving());
    }

    #[test]
    fn test_mouse_look_can_be_disabled() {
        let mut controller = CameraController::default();
        let mut camera = FlyCamera::default();
        controller.mouse_look_enabled = false;
        controller.process_mouse_motion(100.0, 100.0, &mut camera);
        assert_eq!(camera.yaw, -90.0);

        controller.mouse_look_enabled = true;
        controller.process_mouse_motion(100.0, 0.0, &mut camera);
        assert!((camera.yaw + 80.0).abs() < 1e-4);
    }
}
