//! Texture materials
//!
//! A material is a set of textures bound together at slot 2 of a scene
//! pipeline. Each binding pair is a texture followed by its sampler, so a
//! material with `n` textures has `2n` entries.

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::texture_resource::TextureResource;

/// Texture slots a pipeline expects, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Diffuse and specular maps of a loaded model.
    Model,
    /// Diffuse, normal and depth maps of the parallax ground.
    Parallax,
    /// A single RGBA texture for alpha-blended billboards.
    Billboard,
}

impl MaterialKind {
    pub fn texture_count(&self) -> usize {
        match self {
            MaterialKind::Model => 2,
            MaterialKind::Parallax => 3,
            MaterialKind::Billboard => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::Model => "Model Material",
            MaterialKind::Parallax => "Parallax Material",
            MaterialKind::Billboard => "Billboard Material",
        }
    }

    fn layout_builder(&self) -> BindGroupLayoutBuilder {
        (0..self.texture_count()).fold(BindGroupLayoutBuilder::new(), |builder, _| {
            builder
                .next_binding_fragment(binding_types::texture_2d())
                .next_binding_fragment(binding_types::filtering_sampler())
        })
    }
}

/// Bind group layouts for every material kind, created once per device.
pub struct MaterialLayouts {
    model: BindGroupLayoutWithDesc,
    parallax: BindGroupLayoutWithDesc,
    billboard: BindGroupLayoutWithDesc,
}

impl MaterialLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let create = |kind: MaterialKind| kind.layout_builder().create(device, kind.label());
        Self {
            model: create(MaterialKind::Model),
            parallax: create(MaterialKind::Parallax),
            billboard: create(MaterialKind::Billboard),
        }
    }

    pub fn get(&self, kind: MaterialKind) -> &BindGroupLayoutWithDesc {
        match kind {
            MaterialKind::Model => &self.model,
            MaterialKind::Parallax => &self.parallax,
            MaterialKind::Billboard => &self.billboard,
        }
    }

    pub fn layout(&self, kind: MaterialKind) -> &wgpu::BindGroupLayout {
        &self.get(kind).layout
    }
}

pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    textures: Vec<TextureResource>,
    bind_group: wgpu::BindGroup,
}

impl Material {
    /// Binds `textures` in order.
    ///
    /// Missing trailing textures are filled with the last one given so the
    /// bind group always matches its layout.
    pub fn new(
        device: &wgpu::Device,
        layouts: &MaterialLayouts,
        kind: MaterialKind,
        name: &str,
        mut textures: Vec<TextureResource>,
    ) -> Self {
        debug_assert!(!textures.is_empty(), "material '{}' has no textures", name);
        if textures.len() > kind.texture_count() {
            log::warn!(
                "Material '{}' got {} textures, {:?} uses {}",
                name,
                textures.len(),
                kind,
                kind.texture_count()
            );
            textures.truncate(kind.texture_count());
        }
        while textures.len() < kind.texture_count() {
            match textures.last().cloned() {
                Some(last) => textures.push(last),
                None => break,
            }
        }

        let bind_group = textures
            .iter()
            .fold(BindGroupBuilder::new(layouts.get(kind)), |builder, texture| {
                builder.texture(&texture.view).sampler(&texture.sampler)
            })
            .create(device, name);

        Self {
            name: name.to_string(),
            kind,
            textures,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn textures(&self) -> &[TextureResource] {
        &self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_pair_textures_with_samplers() {
        for kind in [
            MaterialKind::Model,
            MaterialKind::Parallax,
            MaterialKind::Billboard,
        ] {
            let builder = kind.layout_builder();
            let entries = builder.entries();
            assert_eq!(entries.len(), kind.texture_count() * 2);
            for pair in entries.chunks(2) {
                assert!(matches!(pair[0].ty, wgpu::BindingType::Texture { .. }));
                assert!(matches!(pair[1].ty, wgpu::BindingType::Sampler(_)));
                assert_eq!(pair[0].visibility, wgpu::ShaderStages::FRAGMENT);
            }
        }
    }
}
