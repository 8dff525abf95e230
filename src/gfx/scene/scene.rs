//! The demo scene: a potted plant on a table, a light cube, grass and ground

use cgmath::Vector3;

use crate::{
    config::AppConfig,
    gfx::resources::{
        material::{Material, MaterialKind, MaterialLayouts},
        texture_resource::TextureResource,
    },
    state::ProgramState,
    wgpu_utils::binding_builder::BindGroupLayoutWithDesc,
};

use super::{
    geometry::{
        self, GROUND_HALF_EXTENT, GROUND_HEIGHT, GROUND_UV_REPEAT, LIGHT_CUBE_SCALE,
    },
    object::{Geometry, Model, ObjectBinding, Transform},
};

pub const PLANT_MODEL: &str = "objects/rock/potted_plant_obj.obj";
pub const TABLE_MODEL: &str = "objects/table/table.obj";
pub const GRASS_TEXTURE: &str = "textures/grass.png";
pub const GROUND_DIFFUSE_TEXTURE: &str = "textures/bricks2.jpg";
pub const GROUND_NORMAL_TEXTURE: &str = "textures/bricks2_normal.jpg";
pub const GROUND_DEPTH_TEXTURE: &str = "textures/bricks2_disp.jpg";

/// Stand-ins for textures that fail to load.
const GRASS_FALLBACK: [u8; 4] = [70, 150, 50, 255];
const GROUND_DIFFUSE_FALLBACK: [u8; 4] = [140, 100, 80, 255];
const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];
const NO_DEPTH: [u8; 4] = [0, 0, 0, 255];

/// Every transform of one frame, vegetation already sorted back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTransforms {
    pub plant: Transform,
    pub table: Transform,
    pub light_cube: Transform,
    pub ground: Transform,
    pub vegetation: Vec<Transform>,
}

impl SceneTransforms {
    pub fn new(state: &ProgramState, vegetation: &[Vector3<f32>], eye: Vector3<f32>) -> Self {
        Self {
            plant: Transform::new(state.plant_position, state.plant_scale),
            table: Transform::new(state.table_position, state.table_scale),
            light_cube: Transform::new(state.point_light.position, LIGHT_CUBE_SCALE),
            ground: Transform::new(Vector3::new(0.0, 0.0, 0.0), 1.0),
            vegetation: geometry::sort_back_to_front(vegetation, eye)
                .into_iter()
                .map(|position| Transform::new(position, 1.0))
                .collect(),
        }
    }
}

pub struct Scene {
    pub plant: Option<Model>,
    pub table: Option<Model>,
    pub light_cube: Geometry,
    pub grass_quad: Geometry,
    pub ground: Geometry,
    pub grass_material: Material,
    pub ground_material: Material,

    pub plant_binding: ObjectBinding,
    pub table_binding: ObjectBinding,
    pub light_cube_binding: ObjectBinding,
    pub ground_binding: ObjectBinding,
    /// One binding per grass quad, filled in draw order each frame.
    pub vegetation_bindings: Vec<ObjectBinding>,
    vegetation_positions: Vec<Vector3<f32>>,
}

impl Scene {
    /// Loads models and textures. Missing models are logged and skipped;
    /// missing textures fall back to flat colors.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &AppConfig,
        material_layouts: &MaterialLayouts,
        object_layout: &BindGroupLayoutWithDesc,
    ) -> Self {
        let load_model = |relative: &str| {
            match Model::load(device, queue, material_layouts, config.asset(relative)) {
                Ok(model) => Some(model),
                Err(e) => {
                    log::error!("{}; it will not be drawn", e);
                    None
                }
            }
        };
        let plant = load_model(PLANT_MODEL);
        let table = load_model(TABLE_MODEL);

        let grass = TextureResource::from_file_or_solid(
            device,
            queue,
            config.asset(GRASS_TEXTURE),
            wgpu::AddressMode::ClampToEdge,
            GRASS_FALLBACK,
        );
        let grass_material = Material::new(
            device,
            material_layouts,
            MaterialKind::Billboard,
            "Grass",
            vec![grass],
        );

        let ground_texture = |relative: &str, fallback: [u8; 4]| {
            TextureResource::from_file_or_solid(
                device,
                queue,
                config.asset(relative),
                wgpu::AddressMode::Repeat,
                fallback,
            )
        };
        let ground_material = Material::new(
            device,
            material_layouts,
            MaterialKind::Parallax,
            "Ground",
            vec![
                ground_texture(GROUND_DIFFUSE_TEXTURE, GROUND_DIFFUSE_FALLBACK),
                ground_texture(GROUND_NORMAL_TEXTURE, FLAT_NORMAL),
                ground_texture(GROUND_DEPTH_TEXTURE, NO_DEPTH),
            ],
        );

        let vegetation_positions = geometry::vegetation_positions();
        let vegetation_bindings = (0..vegetation_positions.len())
            .map(|i| ObjectBinding::new(device, object_layout, &format!("Grass {} Bind Group", i)))
            .collect();

        Self {
            plant,
            table,
            light_cube: Geometry::new(device, &geometry::cube_vertices(), "Light Cube"),
            grass_quad: Geometry::new(device, &geometry::transparent_quad(), "Grass Quad"),
            ground: Geometry::new(
                device,
                &geometry::ground_quad(GROUND_HALF_EXTENT, GROUND_HEIGHT, GROUND_UV_REPEAT),
                "Ground",
            ),
            grass_material,
            ground_material,
            plant_binding: ObjectBinding::new(device, object_layout, "Plant Bind Group"),
            table_binding: ObjectBinding::new(device, object_layout, "Table Bind Group"),
            light_cube_binding: ObjectBinding::new(device, object_layout, "Light Cube Bind Group"),
            ground_binding: ObjectBinding::new(device, object_layout, "Ground Bind Group"),
            vegetation_bindings,
            vegetation_positions,
        }
    }

    /// Writes this frame's transforms. `eye` decides the grass draw order.
    pub fn update(&mut self, queue: &wgpu::Queue, state: &ProgramState, eye: Vector3<f32>) {
        let transforms = SceneTransforms::new(state, &self.vegetation_positions, eye);

        self.plant_binding.update(queue, &transforms.plant);
        self.table_binding.update(queue, &transforms.table);
        self.light_cube_binding.update(queue, &transforms.light_cube);
        self.ground_binding.update(queue, &transforms.ground);
        for (binding, transform) in self
            .vegetation_bindings
            .iter_mut()
            .zip(transforms.vegetation.iter())
        {
            binding.update(queue, transform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn test_transforms_follow_program_state() {
        let mut state = ProgramState::default();
        state.plant_position = vec3(1.0, 2.0, 3.0);
        state.plant_scale = 0.5;
        state.point_light.orbit(0.0);

        let transforms = SceneTransforms::new(&state, &[], vec3(0.0, 0.0, 10.0));
        assert_eq!(transforms.plant, Transform::new(vec3(1.0, 2.0, 3.0), 0.5));
        assert_eq!(transforms.table.scale, 5.0);
        assert_eq!(transforms.light_cube.position, vec3(4.0, 4.0, 0.0));
        assert_eq!(transforms.light_cube.scale, LIGHT_CUBE_SCALE);
        assert!(transforms.vegetation.is_empty());
    }

    #[test]
    fn test_vegetation_is_ordered_for_blending() {
        let state = ProgramState::default();
        let eye = vec3(0.0, 0.0, -10.0);
        let transforms = SceneTransforms::new(&state, &geometry::vegetation_positions(), eye);
        assert_eq!(transforms.vegetation.len(), 5);
        // Seen from -Z the quad at z = 0.7 is farthest
        assert_eq!(transforms.vegetation[0].position, vec3(0.0, -1.6, 0.7));
        assert_eq!(transforms.vegetation[4].position, vec3(-0.3, -1.6, -2.3));
    }
}
