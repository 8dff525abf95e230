use cgmath::{perspective, Deg, Matrix4, Point3, SquareMatrix, Vector3};

use crate::input::{EventType, InputEvent, InputListener};

use super::{camera_controller::CameraController, fly_camera::FlyCamera};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;
/// Distance of the orbiting eye from the origin.
pub const ORBIT_RADIUS: f32 = 10.0;

/// How the view matrix is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Eye circles the origin at [`ORBIT_RADIUS`], one turn every 2π seconds.
    #[default]
    Orbit,
    /// Eye follows the user-driven [`FlyCamera`].
    Free,
}

impl CameraMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraMode::Orbit => "orbit",
            CameraMode::Free => "free",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "orbit" => Some(CameraMode::Orbit),
            "free" => Some(CameraMode::Free),
            _ => None,
        }
    }
}

/// Owns the fly camera and its controller and builds per-frame matrices.
#[derive(Debug, Clone)]
pub struct CameraManager {
    pub camera: FlyCamera,
    pub controller: CameraController,
    pub mode: CameraMode,
}

const CAMERA_INTERESTS: [EventType; 3] = [
    EventType::Keyboard,
    EventType::MouseMoved,
    EventType::MouseScroll,
];

impl CameraManager {
    pub fn new(camera: FlyCamera, controller: CameraController) -> Self {
        Self {
            camera,
            controller,
            mode: CameraMode::default(),
        }
    }

    /// Integrates held movement keys. The orbiting eye ignores them.
    pub fn update(&mut self, delta_time: f32) {
        if self.mode == CameraMode::Free {
            self.controller.update(&mut self.camera, delta_time);
        }
    }

    /// Eye position at `time` seconds.
    pub fn eye(&self, time: f32) -> Vector3<f32> {
        match self.mode {
            CameraMode::Orbit => Vector3::new(
                time.sin() * ORBIT_RADIUS,
                0.0,
                time.cos() * ORBIT_RADIUS,
            ),
            CameraMode::Free => self.camera.position,
        }
    }

    pub fn view_matrix(&self, time: f32) -> Matrix4<f32> {
        match self.mode {
            CameraMode::Orbit => {
                let eye = self.eye(time);
                Matrix4::look_at_rh(
                    Point3::new(eye.x, eye.y, eye.z),
                    Point3::new(0.0, 0.0, 0.0),
                    Vector3::unit_y(),
                )
            }
            CameraMode::Free => self.camera.view_matrix(),
        }
    }

    /// Perspective projection in wgpu clip space.
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.camera.zoom), aspect, Z_NEAR, Z_FAR)
    }

    pub fn uniform(&self, time: f32, aspect: f32) -> CameraUniform {
        let eye = self.eye(time);
        CameraUniform {
            view_position: [eye.x, eye.y, eye.z, 1.0],
            view_proj: (self.projection_matrix(aspect) * self.view_matrix(time)).into(),
        }
    }
}

impl InputListener for CameraManager {
    fn interests(&self) -> &[EventType] {
        &CAMERA_INTERESTS
    }

    fn on_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { code, pressed } => {
                self.controller.process_key(code, pressed);
            }
            InputEvent::MouseMoved { dx, dy } => {
                if self.mode == CameraMode::Free {
                    self.controller
                        .process_mouse_motion(dx, dy, &mut self.camera);
                }
            }
            InputEvent::MouseScroll { dy } => {
                self.controller.process_scroll(dy, &mut self.camera);
            }
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};
    use winit::keyboard::KeyCode;

    fn manager() -> CameraManager {
        CameraManager::new(FlyCamera::default(), CameraController::default())
    }

    #[test]
    fn test_orbit_eye_circles_origin() {
        let manager = manager();
        for step in 0..8 {
            let eye = manager.eye(step as f32 * 0.7);
            assert!((eye.magnitude() - ORBIT_RADIUS).abs() < 1e-4);
            assert_eq!(eye.y, 0.0);
        }
        let start = manager.eye(0.0);
        assert!((start.z - ORBIT_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn test_free_mode_uses_fly_camera() {
        let mut manager = manager();
        manager.mode = CameraMode::Free;
        manager.camera.position = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(manager.eye(5.0), Vector3::new(1.0, 2.0, 3.0));
        let uniform = manager.uniform(5.0, 1.0);
        assert_eq!(uniform.view_position, [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let manager = manager();
        let view_proj = manager.projection_matrix(1.25) * manager.view_matrix(0.3);
        let clip = view_proj * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let manager = manager();
        let bad = manager.projection_matrix(0.0);
        let square = manager.projection_matrix(1.0);
        assert_eq!(bad, square);
    }

    #[test]
    fn test_mouse_motion_ignored_in_orbit_mode() {
        let mut manager = manager();
        manager.on_event(&InputEvent::MouseMoved { dx: 50.0, dy: 0.0 });
        assert_eq!(manager.camera.yaw, -90.0);

        manager.mode = CameraMode::Free;
        manager.on_event(&InputEvent::MouseMoved { dx: 50.0, dy: 0.0 });
        assert!((manager.camera.yaw + 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_key_events_reach_controller() {
        let mut manager = manager();
        manager.mode = CameraMode::Free;
        manager.on_event(&InputEvent::Key {
            code: KeyCode::KeyS,
            pressed: true,
        });
        manager.update(1.0);
        assert!(manager.camera.position.z > 1.0);
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in [CameraMode::Orbit, CameraMode::Free] {
            assert_eq!(CameraMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(CameraMode::parse("spin"), None);
    }
}
