//! Scene light sources
//!
//! The scene is lit by one point light that circles above the table and one
//! directional light acting as a dim sky fill.

use cgmath::{vec3, InnerSpace, Vector3};

/// Radius of the point light's orbit around the scene's vertical axis.
pub const POINT_LIGHT_ORBIT_RADIUS: f32 = 4.0;
/// Height the point light orbits at.
pub const POINT_LIGHT_HEIGHT: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,

    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: vec3(POINT_LIGHT_ORBIT_RADIUS, POINT_LIGHT_HEIGHT, 0.0),
            ambient: vec3(0.1, 0.1, 0.1),
            diffuse: vec3(0.8, 0.8, 0.8),
            specular: vec3(1.0, 1.0, 1.0),
            constant: 0.5,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    /// Position on the orbit after `time` seconds.
    pub fn orbit_position(time: f32) -> Vector3<f32> {
        vec3(
            POINT_LIGHT_ORBIT_RADIUS * time.cos(),
            POINT_LIGHT_HEIGHT,
            POINT_LIGHT_ORBIT_RADIUS * time.sin(),
        )
    }

    /// Moves the light along its orbit.
    pub fn orbit(&mut self, time: f32) {
        self.position = Self::orbit_position(time);
    }

    /// Light falloff at `distance`: `1 / (c + l*d + q*d^2)`.
    pub fn attenuation(&self, distance: f32) -> f32 {
        let denominator =
            self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denominator <= f32::EPSILON {
            return 0.0;
        }
        1.0 / denominator
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Default for DirLight {
    fn default() -> Self {
        Self {
            direction: vec3(-0.2, -1.0, -0.3),
            ambient: vec3(0.2, 0.2, 0.2),
            diffuse: vec3(0.2, 0.2, 0.2),
            specular: vec3(0.3, 0.3, 0.3),
        }
    }
}

impl DirLight {
    /// Unit vector pointing from the surface towards the light.
    pub fn to_light(&self) -> Vector3<f32> {
        if self.direction.magnitude2() <= f32::EPSILON {
            return Vector3::unit_y();
        }
        -self.direction.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_stays_on_circle() {
        for step in 0..16 {
            let t = step as f32 * 0.4;
            let p = PointLight::orbit_position(t);
            let radius = (p.x * p.x + p.z * p.z).sqrt();
            assert!((radius - POINT_LIGHT_ORBIT_RADIUS).abs() < 1e-4);
            assert_eq!(p.y, POINT_LIGHT_HEIGHT);
        }
    }

    #[test]
    fn test_orbit_starts_on_positive_x() {
        let mut light = PointLight::default();
        light.orbit(0.0);
        assert!((light.position.x - 4.0).abs() < 1e-6);
        assert!(light.position.z.abs() < 1e-6);

        light.orbit(std::f32::consts::FRAC_PI_2);
        assert!(light.position.x.abs() < 1e-5);
        assert!((light.position.z - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_attenuation_falls_off_with_distance() {
        let light = PointLight::default();
        assert!((light.attenuation(0.0) - 2.0).abs() < 1e-6);
        let near = light.attenuation(1.0);
        let far = light.attenuation(10.0);
        assert!(near > far);
        let expected = 1.0 / (0.5 + 0.9 + 3.2);
        assert!((far - expected).abs() < 1e-6);
    }

    #[test]
    fn test_attenuation_handles_zero_terms() {
        let light = PointLight {
            constant: 0.0,
            linear: 0.0,
            quadratic: 0.0,
            ..Default::default()
        };
        assert_eq!(light.attenuation(3.0), 0.0);
    }

    #[test]
    fn test_dir_light_points_towards_light() {
        let light = DirLight::default();
        let to_light = light.to_light();
        assert!((to_light.magnitude() - 1.0).abs() < 1e-6);
        assert!(to_light.y > 0.0);
    }
}
