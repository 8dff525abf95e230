use cgmath::{vec3, InnerSpace, Matrix4, Point3, Vector3};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
/// Vertical field of view in degrees; also the widest zoom allowed.
pub const DEFAULT_FOV: f32 = 60.0;
pub const MIN_FOV: f32 = 1.0;
/// Pitch limit in degrees that keeps the view from flipping over the poles.
pub const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// First-person camera driven by yaw and pitch angles (in degrees).
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,
    pub world_up: Vector3<f32>,

    pub yaw: f32,
    pub pitch: f32,

    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(vec3(0.0, 0.0, 1.0))
    }
}

impl FlyCamera {
    pub fn new(position: Vector3<f32>) -> Self {
        let mut camera = Self {
            position,
            front: vec3(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            world_up: Vector3::unit_y(),
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_FOV,
        };
        camera.update_vectors();
        camera
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let target = eye + self.front;
        Matrix4::look_at_rh(eye, target, self.up)
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
            CameraMovement::Up => self.position += self.world_up * velocity,
            CameraMovement::Down => self.position -= self.world_up * velocity,
        }
    }

    /// Applies relative pointer motion. Positive `dy` moves the pointer down
    /// and so tilts the view down.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch -= dy * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(MIN_FOV, DEFAULT_FOV);
    }

    /// Points the camera along `front`, deriving yaw and pitch from it.
    ///
    /// A zero vector is ignored.
    pub fn set_front(&mut self, front: Vector3<f32>) {
        if front.magnitude2() <= f32::EPSILON {
            return;
        }
        let front = front.normalize();
        self.pitch = front
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = front.z.atan2(front.x).to_degrees();
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = vec3(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert!(approx(camera.front, vec3(0.0, 0.0, -1.0)));
        assert!(approx(camera.right, vec3(1.0, 0.0, 0.0)));
        assert!(approx(camera.up, vec3(0.0, 1.0, 0.0)));
        assert_eq!(camera.position, vec3(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_keyboard_moves_along_basis() {
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 0.0));
        camera.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(approx(camera.position, vec3(0.0, 0.0, -DEFAULT_SPEED)));

        camera.process_keyboard(CameraMovement::Right, 2.0);
        assert!(approx(
            camera.position,
            vec3(2.0 * DEFAULT_SPEED, 0.0, -DEFAULT_SPEED)
        ));

        camera.process_keyboard(CameraMovement::Up, 1.0);
        assert!((camera.position.y - DEFAULT_SPEED).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_is_constrained() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, -10_000.0, true);
        assert_eq!(camera.pitch, PITCH_LIMIT);
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_unconstrained_pitch_is_free() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, -1000.0, false);
        assert!((camera.pitch - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_mouse_right_turns_right() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(900.0, 0.0, true);
        assert!((camera.yaw - 0.0).abs() < 1e-3);
        assert!(approx(camera.front, vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_scroll_zoom_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_scroll(10.0);
        assert_eq!(camera.zoom, DEFAULT_FOV - 10.0);
        camera.process_mouse_scroll(1000.0);
        assert_eq!(camera.zoom, MIN_FOV);
        camera.process_mouse_scroll(-1000.0);
        assert_eq!(camera.zoom, DEFAULT_FOV);
    }

    #[test]
    fn test_set_front_recovers_angles() {
        let mut camera = FlyCamera::default();
        let front = vec3(1.0, 1.0, 0.0);
        camera.set_front(front);
        assert!((camera.pitch - 45.0).abs() < 1e-3);
        assert!(camera.yaw.abs() < 1e-3);
        assert!(approx(camera.front, front.normalize()));
    }

    #[test]
    fn test_set_front_ignores_zero_vector() {
        let mut camera = FlyCamera::default();
        let before = camera.front;
        camera.set_front(vec3(0.0, 0.0, 0.0));
        assert_eq!(camera.front, before);
    }
}
