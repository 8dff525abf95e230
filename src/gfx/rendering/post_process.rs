//! Fullscreen pass copying the resolved scene to the swapchain
//!
//! The scene is rendered offscreen, so the final image always goes through
//! this pass. The grayscale switch lives in its uniform.

use crate::{
    gfx::resources::texture_resource::TextureResource,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// MUST match `PostProcessParams` in `post_process.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostProcessUniform {
    /// x: grayscale (0 or 1)
    pub flags: [f32; 4],
}

impl PostProcessUniform {
    pub fn new(grayscale: bool) -> Self {
        Self {
            flags: [if grayscale { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }

    pub fn grayscale(&self) -> bool {
        self.flags[0] > 0.5
    }
}

pub struct PostProcess {
    layout: BindGroupLayoutWithDesc,
    ubo: UniformBuffer<PostProcessUniform>,
    bind_group: wgpu::BindGroup,
}

impl PostProcess {
    /// Binds `scene` as the pass input.
    pub fn new(device: &wgpu::Device, scene: &TextureResource) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Post Process Bind Group Layout");
        let ubo = UniformBuffer::new_with_data(device, &PostProcessUniform::new(false));
        let bind_group = Self::create_bind_group(device, &layout, &ubo, scene);

        Self {
            layout,
            ubo,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        ubo: &UniformBuffer<PostProcessUniform>,
        scene: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&scene.view)
            .sampler(&scene.sampler)
            .resource(ubo.binding_resource())
            .create(device, "Post Process Bind Group")
    }

    /// Points the pass at a new scene texture after a resize.
    pub fn rebind(&mut self, device: &wgpu::Device, scene: &TextureResource) {
        self.bind_group = Self::create_bind_group(device, &self.layout, &self.ubo, scene);
    }

    pub fn set_grayscale(&mut self, queue: &wgpu::Queue, grayscale: bool) {
        self.ubo
            .update_content(queue, PostProcessUniform::new(grayscale));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<PostProcessUniform>(), 16);
        assert!(PostProcessUniform::new(true).grayscale());
        assert!(!PostProcessUniform::new(false).grayscale());
        assert_eq!(PostProcessUniform::default(), PostProcessUniform::new(false));
    }
}
