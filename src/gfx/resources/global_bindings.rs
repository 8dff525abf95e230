//! Global uniform bindings for camera and scene lighting
//!
//! Everything that is constant across one frame and shared by every scene
//! pipeline: the camera matrices, both light sources and the shading switches.
//! Bound at slot 0 in all scene pipelines.

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    lighting::{DirLight, PointLight},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Point light block. Every member is a vec4 so the layout is the same under
/// std140 and WGSL rules.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
}

impl From<&PointLight> for PointLightUniform {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).into(),
            ambient: light.ambient.extend(0.0).into(),
            diffuse: light.diffuse.extend(0.0).into(),
            specular: light.specular.extend(0.0).into(),
            attenuation: [light.constant, light.linear, light.quadratic, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl From<&DirLight> for DirLightUniform {
    fn from(light: &DirLight) -> Self {
        Self {
            direction: light.direction.extend(0.0).into(),
            ambient: light.ambient.extend(0.0).into(),
            diffuse: light.diffuse.extend(0.0).into(),
            specular: light.specular.extend(0.0).into(),
        }
    }
}

/// Shading switches that are not part of either light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadingParams {
    pub shininess: f32,
    pub blinn: bool,
    pub height_scale: f32,
    /// Seconds since startup.
    pub time: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            shininess: 32.0,
            blinn: true,
            height_scale: 0.1,
            time: 0.0,
        }
    }
}

/// Global uniform buffer content.
///
/// MUST match the `Globals` struct in `lighting.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub point_light: PointLightUniform,
    pub dir_light: DirLightUniform,
    /// shininess, blinn (0 or 1), height scale, time
    pub params: [f32; 4],
}
// Total: 64 + 16 + 80 + 64 + 16 = 240 bytes

impl GlobalUniform {
    pub fn new(
        camera: &CameraUniform,
        point_light: &PointLight,
        dir_light: &DirLight,
        params: ShadingParams,
    ) -> Self {
        Self {
            view_proj: camera.view_proj,
            view_position: camera.view_position,
            point_light: point_light.into(),
            dir_light: dir_light.into(),
            params: [
                params.shininess,
                if params.blinn { 1.0 } else { 0.0 },
                params.height_scale,
                params.time,
            ],
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group layout and bind group for the global uniform buffer.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn test_global_uniform_size_matches_shader() {
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 80);
        assert_eq!(std::mem::size_of::<DirLightUniform>(), 64);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 240);
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }

    #[test]
    fn test_point_light_packing() {
        let mut light = PointLight::default();
        light.position = vec3(1.0, 2.0, 3.0);
        let packed = PointLightUniform::from(&light);
        assert_eq!(packed.position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(packed.attenuation, [0.5, 0.09, 0.032, 0.0]);
        assert_eq!(packed.specular, [1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_params_encode_blinn_flag() {
        let camera = CameraUniform::default();
        let params = ShadingParams {
            shininess: 32.0,
            blinn: false,
            height_scale: 0.25,
            time: 7.5,
        };
        let uniform = GlobalUniform::new(
            &camera,
            &PointLight::default(),
            &DirLight::default(),
            params,
        );
        assert_eq!(uniform.params, [32.0, 0.0, 0.25, 7.5]);
        assert_eq!(uniform.dir_light.direction, [-0.2, -1.0, -0.3, 0.0]);
    }
}
