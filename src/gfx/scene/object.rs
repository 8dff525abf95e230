//! Meshes, models and per-object transforms
//!
//! Models are read from Wavefront OBJ/MTL with `tobj` into CPU-side
//! [`ModelData`] first and uploaded afterwards, so loading can be tested
//! without a GPU.

use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Matrix, Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    error::{Result, TabletopError},
    gfx::resources::{
        material::{Material, MaterialKind, MaterialLayouts},
        texture_resource::{color_to_rgba8, TextureResource},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::vertex::ModelVertex;

/// Diffuse color used when a model has no material at all.
const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

/// Vertices and indices of one sub-mesh, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material_id: Option<usize>,
}

impl MeshData {
    /// Converts a triangulated, single-index `tobj` mesh.
    ///
    /// Missing normals are computed from the faces and missing UVs become
    /// zero. V is flipped because OBJ puts the texture origin bottom-left.
    pub fn from_tobj(name: &str, mesh: &tobj::Mesh) -> Self {
        let vertex_count = mesh.positions.len() / 3;
        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            calculate_vertex_normals(&mesh.positions, &mesh.indices)
        };
        let has_uvs = mesh.texcoords.len() == vertex_count * 2;

        let vertices = (0..vertex_count)
            .map(|i| ModelVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                tex_coords: if has_uvs {
                    [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect();

        Self {
            name: name.to_string(),
            vertices,
            indices: mesh.indices.clone(),
            material_id: mesh.material_id,
        }
    }
}

/// Averages the face normals around each vertex.
pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let position = |i: usize| {
        Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
    };
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertex_count];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }
        let face_normal = (position(i1) - position(i0)).cross(position(i2) - position(i0));
        if face_normal.magnitude2() <= f32::EPSILON {
            continue;
        }
        let face_normal = face_normal.normalize();
        for index in [i0, i1, i2] {
            sums[index] += face_normal;
        }
    }

    sums.into_iter()
        .flat_map(|sum| {
            let normal = if sum.magnitude2() > f32::EPSILON {
                sum.normalize()
            } else {
                Vector3::unit_y()
            };
            [normal.x, normal.y, normal.z]
        })
        .collect()
}

/// What a material wants bound: texture files and the MTL colors to fall back on.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse_texture: Option<PathBuf>,
    pub specular_texture: Option<PathBuf>,
    pub diffuse_color: [f32; 3],
    pub specular_color: [f32; 3],
}

impl MaterialData {
    fn from_tobj(material: &tobj::Material, base_dir: &Path) -> Self {
        let resolve = |name: &Option<String>| {
            name.as_ref()
                .filter(|n| !n.trim().is_empty())
                .map(|n| base_dir.join(n.trim().replace('\\', "/")))
        };
        Self {
            name: material.name.clone(),
            diffuse_texture: resolve(&material.diffuse_texture),
            specular_texture: resolve(&material.specular_texture),
            diffuse_color: material.diffuse.unwrap_or(DEFAULT_DIFFUSE),
            specular_color: material.specular.unwrap_or([0.0; 3]),
        }
    }

    fn fallback() -> Self {
        Self {
            name: "default".to_string(),
            diffuse_texture: None,
            specular_texture: None,
            diffuse_color: DEFAULT_DIFFUSE,
            specular_color: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ModelData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| TabletopError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        if models.is_empty() {
            return Err(TabletopError::EmptyModel {
                path: path.to_path_buf(),
            });
        }

        let materials = materials.unwrap_or_else(|e| {
            log::warn!("No usable MTL for {}: {}", path.display(), e);
            Vec::new()
        });
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let meshes: Vec<MeshData> = models
            .iter()
            .map(|model| MeshData::from_tobj(&model.name, &model.mesh))
            .collect();
        let materials = materials
            .iter()
            .map(|material| MaterialData::from_tobj(material, base_dir))
            .collect();

        log::info!(
            "Loaded model {} ({} meshes, {} triangles)",
            path.display(),
            meshes.len(),
            meshes.iter().map(|m| m.indices.len() / 3).sum::<usize>()
        );

        Ok(Self {
            path: path.to_path_buf(),
            meshes,
            materials,
        })
    }
}

/// Indexed geometry on the GPU.
pub struct Mesh {
    pub name: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Index into the owning model's materials.
    pub material: usize,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData, material: usize) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: data.name.clone(),
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            material,
        }
    }
}

/// Non-indexed geometry (the cube, the grass quad, the ground).
pub struct Geometry {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl Geometry {
    pub fn new<V: bytemuck::Pod>(device: &wgpu::Device, vertices: &[V], label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Model {
    /// Uploads meshes and builds one material per MTL entry.
    ///
    /// Textures that fail to load are replaced by 1x1 textures of the MTL
    /// colors. Meshes without a valid material share a plain grey one.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &MaterialLayouts,
        data: &ModelData,
    ) -> Self {
        let mut material_data = data.materials.clone();
        let fallback_index = material_data.len();
        material_data.push(MaterialData::fallback());

        let materials = material_data
            .iter()
            .map(|material| {
                let texture = |path: &Option<PathBuf>, color: [f32; 3]| {
                    let solid = color_to_rgba8(color, 1.0);
                    match path {
                        Some(path) => TextureResource::from_file_or_solid(
                            device,
                            queue,
                            path,
                            wgpu::AddressMode::Repeat,
                            solid,
                        ),
                        None => TextureResource::solid(device, queue, solid, &material.name),
                    }
                };
                let diffuse = texture(&material.diffuse_texture, material.diffuse_color);
                let specular = texture(&material.specular_texture, material.specular_color);
                Material::new(
                    device,
                    layouts,
                    MaterialKind::Model,
                    &material.name,
                    vec![diffuse, specular],
                )
            })
            .collect();

        let meshes = data
            .meshes
            .iter()
            .map(|mesh| {
                let material = mesh
                    .material_id
                    .filter(|&id| id < fallback_index)
                    .unwrap_or(fallback_index);
                Mesh::upload(device, mesh, material)
            })
            .collect();

        Self { meshes, materials }
    }

    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &MaterialLayouts,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let data = ModelData::load(path)?;
        Ok(Self::upload(device, queue, layouts, &data))
    }
}

/// Translation plus uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn new(position: Vector3<f32>, scale: f32) -> Self {
        Self { position, scale }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_scale(self.scale)
    }

    /// Inverse-transpose of the model matrix, for transforming normals.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        let model = self.model_matrix();
        model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity)
    }

    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform {
            model: self.model_matrix().into(),
            normal: self.normal_matrix().into(),
        }
    }
}

/// Per-object uniform. MUST match `ObjectData` in `lighting.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

/// Layout of the per-object bind group at slot 1.
pub fn object_bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Object Bind Group Layout")
}

/// A transform uniform buffer with its bind group.
pub struct ObjectBinding {
    ubo: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
}

impl ObjectBinding {
    pub fn new(device: &wgpu::Device, layout: &BindGroupLayoutWithDesc, label: &str) -> Self {
        let identity = Transform::new(Vector3::new(0.0, 0.0, 0.0), 1.0);
        let ubo = UniformBuffer::new_with_data(device, &identity.uniform());
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, label);
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, transform: &Transform) {
        self.ubo.update_content(queue, transform.uniform());
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Draw helpers on a render pass. The caller binds pipeline and slots 0 and 1.
pub trait DrawObject {
    fn draw_geometry(&mut self, geometry: &Geometry);
    fn draw_mesh(&mut self, mesh: &Mesh);
    /// Draws every mesh with its material bound at `material_slot`.
    fn draw_model(&mut self, model: &Model, material_slot: u32);
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_geometry(&mut self, geometry: &Geometry) {
        self.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
        self.draw(0..geometry.vertex_count, 0..1);
    }

    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_model(&mut self, model: &Model, material_slot: u32) {
        for mesh in &model.meshes {
            if let Some(material) = model.materials.get(mesh.material) {
                self.set_bind_group(material_slot, material.bind_group(), &[]);
                self.draw_mesh(mesh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, Vector4};
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tabletop-model-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_vertex_normals_of_flat_quad() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let indices = [0, 1, 2, 0, 2, 3];
        let normals = calculate_vertex_normals(&positions, &indices);
        assert_eq!(normals.len(), positions.len());
        for normal in normals.chunks(3) {
            assert!((normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertices_get_a_unit_normal() {
        let positions = [0.0; 9];
        let normals = calculate_vertex_normals(&positions, &[]);
        assert_eq!(normals, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_mesh_conversion_flips_v_and_fills_normals() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.25, 0.0, 1.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let data = MeshData::from_tobj("tri", &mesh);
        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(data.vertices[1].tex_coords, [1.0, 0.75]);
        assert_eq!(data.vertices[2].tex_coords, [0.0, 0.0]);
        for vertex in &data.vertices {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_uvs_become_zero() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let data = MeshData::from_tobj("tri", &mesh);
        assert!(data.vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]));
    }

    #[test]
    fn test_load_obj_with_material() {
        let dir = temp_dir("obj");
        fs::write(
            dir.join("tri.mtl"),
            "newmtl leaf\nKd 0.2 0.6 0.1\nKs 0.5 0.5 0.5\nmap_Kd textures/leaf.png\n",
        )
        .unwrap();
        fs::write(
            dir.join("tri.obj"),
            "mtllib tri.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\n\
             vn 0 0 1\nusemtl leaf\nf 1/1/1 2/2/1 3/3/1\n",
        )
        .unwrap();

        let data = ModelData::load(dir.join("tri.obj")).unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(data.meshes.len(), 1);
        assert_eq!(data.meshes[0].indices.len(), 3);
        assert_eq!(data.meshes[0].material_id, Some(0));
        assert_eq!(data.materials.len(), 1);

        let material = &data.materials[0];
        assert_eq!(material.name, "leaf");
        assert_eq!(material.diffuse_color, [0.2, 0.6, 0.1]);
        assert_eq!(material.specular_color, [0.5, 0.5, 0.5]);
        assert_eq!(
            material.diffuse_texture.as_deref(),
            Some(dir.join("textures/leaf.png").as_path())
        );
        assert_eq!(material.specular_texture, None);
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let path = std::env::temp_dir().join("tabletop-no-such-model.obj");
        assert!(matches!(
            ModelData::load(&path),
            Err(TabletopError::Model { .. })
        ));
    }

    #[test]
    fn test_transform_matrices() {
        let transform = Transform::new(vec3(1.0, 2.0, 3.0), 2.0);
        let moved = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(moved, Vector4::new(3.0, 2.0, 3.0, 1.0));

        // Uniform scale: the normal matrix only rescales
        let normal = transform.normal_matrix() * Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert!((normal.truncate().normalize() - vec3(0.0, 1.0, 0.0)).magnitude() < 1e-6);
    }

    #[test]
    fn test_zero_scale_normal_matrix_is_identity() {
        let transform = Transform::new(vec3(0.0, 0.0, 0.0), 0.0);
        assert_eq!(transform.normal_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_object_uniform_size() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
    }
}
