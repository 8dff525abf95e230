//! WGPU-based rendering engine for the tabletop scene
//!
//! Owns the surface, device and every frame-level GPU resource. A frame is
//! drawn in three steps:
//!
//! 1. the scene pass into a multisampled offscreen target, resolved to a
//!    single-sample texture
//! 2. a fullscreen post-process pass copying that texture to the swapchain,
//!    optionally as grayscale
//! 3. an optional UI overlay on top of the swapchain image

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    config::AppConfig,
    error::{Result, TabletopError},
    gfx::{
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform},
            material::{MaterialKind, MaterialLayouts},
            texture_resource::TextureResource,
        },
        scene::{
            object::{object_bind_group_layout, DrawObject},
            scene::Scene,
            vertex::{BillboardVertex, ModelVertex, PositionVertex, TangentVertex},
        },
    },
    wgpu_utils::binding_builder::BindGroupLayoutWithDesc,
};

use super::{
    pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager},
    post_process::PostProcess,
};

pub const LIGHT_CUBE_PIPELINE: &str = "LightCube";
pub const MODEL_PIPELINE: &str = "Model";
pub const GROUND_PIPELINE: &str = "Ground";
pub const VEGETATION_PIPELINE: &str = "Vegetation";
pub const POST_PROCESS_PIPELINE: &str = "PostProcess";

const LIGHT_CUBE_SHADER: &str = concat!(
    include_str!("shaders/lighting.wgsl"),
    include_str!("shaders/light_cube.wgsl")
);
const MODEL_SHADER: &str = concat!(
    include_str!("shaders/lighting.wgsl"),
    include_str!("shaders/model.wgsl")
);
const GROUND_SHADER: &str = concat!(
    include_str!("shaders/lighting.wgsl"),
    include_str!("shaders/ground_parallax.wgsl")
);
const VEGETATION_SHADER: &str = concat!(
    include_str!("shaders/lighting.wgsl"),
    include_str!("shaders/vegetation.wgsl")
);
const POST_PROCESS_SHADER: &str = include_str!("shaders/post_process.wgsl");

/// Whether a frame reached the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The surface could not hand out a texture; nothing was drawn.
    Skipped,
}

/// What to do when acquiring the next swapchain texture fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceRecovery {
    Reconfigure,
    Skip,
    Fatal,
}

fn surface_recovery(error: &wgpu::SurfaceError) -> SurfaceRecovery {
    match error {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Fatal,
        _ => SurfaceRecovery::Skip,
    }
}

/// Falls back to no multisampling when `requested` is unsupported.
fn choose_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    if requested <= 1 {
        return 1;
    }
    if supported(requested) {
        requested
    } else {
        log::warn!(
            "{}x MSAA is not supported by this adapter, rendering without it",
            requested
        );
        1
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Prefers a non-sRGB swapchain format; the scene target already holds
/// display-ready values.
fn choose_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    sample_count: u32,

    /// Multisampled scene color; `None` without MSAA.
    msaa_color: Option<TextureResource>,
    depth_texture: TextureResource,
    /// Single-sample scene color read by the post-process pass.
    resolve_target: TextureResource,

    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_layout: BindGroupLayoutWithDesc,
    material_layouts: MaterialLayouts,
    post_process: PostProcess,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `app_config` - MSAA and vsync settings
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        app_config: &AppConfig,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let max_dimension = device.limits().max_texture_dimension_2d;
        let (width, height) = clamp_surface_size(width, height, max_dimension);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_capabilities.formats)
            .ok_or_else(|| TabletopError::Pipeline("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(app_config.vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = choose_sample_count(app_config.msaa_samples, |count| {
            [TextureResource::SCENE_COLOR_FORMAT, TextureResource::DEPTH_FORMAT]
                .iter()
                .all(|&f| {
                    adapter
                        .get_texture_format_features(f)
                        .flags
                        .sample_count_supported(count)
                })
        });

        let (msaa_color, depth_texture, resolve_target) =
            Self::create_targets(&device, config.width, config.height, sample_count);

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let object_layout = object_bind_group_layout(&device);
        let material_layouts = MaterialLayouts::new(&device);
        let post_process = PostProcess::new(&device, &resolve_target);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        Self::register_pipelines(
            &mut pipeline_manager,
            format,
            sample_count,
            &global_bindings,
            &object_layout,
            &material_layouts,
            &post_process,
        );
        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| TabletopError::Pipeline(errors.join("; ")))?;

        log::info!(
            "Renderer ready: {}x{}, {:?}, {}x MSAA, {:?}",
            config.width,
            config.height,
            format,
            sample_count,
            config.present_mode
        );

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            sample_count,
            msaa_color,
            depth_texture,
            resolve_target,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_layout,
            material_layouts,
            post_process,
        })
    }

    fn create_targets(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> (Option<TextureResource>, TextureResource, TextureResource) {
        let msaa_color = (sample_count > 1).then(|| {
            TextureResource::create_render_target(
                device,
                width,
                height,
                TextureResource::SCENE_COLOR_FORMAT,
                sample_count,
                "Scene MSAA Color",
            )
        });
        let depth =
            TextureResource::create_depth_texture(device, width, height, sample_count, "Scene Depth");
        let resolve = TextureResource::create_render_target(
            device,
            width,
            height,
            TextureResource::SCENE_COLOR_FORMAT,
            1,
            "Scene Color",
        );
        (msaa_color, depth, resolve)
    }

    fn register_pipelines(
        manager: &mut PipelineManager,
        surface_format: TextureFormat,
        sample_count: u32,
        global_bindings: &GlobalBindings,
        object_layout: &BindGroupLayoutWithDesc,
        material_layouts: &MaterialLayouts,
        post_process: &PostProcess,
    ) {
        manager.load_shader("light_cube", LIGHT_CUBE_SHADER);
        manager.load_shader("model", MODEL_SHADER);
        manager.load_shader("ground_parallax", GROUND_SHADER);
        manager.load_shader("vegetation", VEGETATION_SHADER);
        manager.load_shader("post_process", POST_PROCESS_SHADER);

        let globals = global_bindings.bind_group_layout().clone();
        let object = object_layout.layout.clone();
        let scene_pipeline = |shader: &str, label: &str| {
            PipelineConfig::default_with_shader(shader)
                .with_label(label)
                .with_sample_count(sample_count)
                .with_depth(DepthConfig::opaque(TextureResource::DEPTH_FORMAT))
                .with_color_target(
                    TextureResource::SCENE_COLOR_FORMAT,
                    Some(wgpu::BlendState::REPLACE),
                )
        };

        manager.register_pipeline(
            LIGHT_CUBE_PIPELINE,
            scene_pipeline("light_cube", "Light Cube Pipeline")
                .with_vertex_layout(PositionVertex::desc())
                .with_bind_group_layouts(vec![globals.clone(), object.clone()]),
        );

        // OBJ winding is not guaranteed, so models are drawn double-sided.
        manager.register_pipeline(
            MODEL_PIPELINE,
            scene_pipeline("model", "Model Pipeline")
                .with_cull_mode(None)
                .with_vertex_layout(ModelVertex::desc())
                .with_bind_group_layouts(vec![
                    globals.clone(),
                    object.clone(),
                    material_layouts.layout(MaterialKind::Model).clone(),
                ]),
        );

        manager.register_pipeline(
            GROUND_PIPELINE,
            scene_pipeline("ground_parallax", "Ground Pipeline")
                .with_vertex_layout(TangentVertex::desc())
                .with_bind_group_layouts(vec![
                    globals.clone(),
                    object.clone(),
                    material_layouts.layout(MaterialKind::Parallax).clone(),
                ]),
        );

        manager.register_pipeline(
            VEGETATION_PIPELINE,
            scene_pipeline("vegetation", "Vegetation Pipeline")
                .with_cull_mode(None)
                .with_depth(DepthConfig::read_only(TextureResource::DEPTH_FORMAT))
                .with_color_target(
                    TextureResource::SCENE_COLOR_FORMAT,
                    Some(wgpu::BlendState::ALPHA_BLENDING),
                )
                .with_vertex_layout(BillboardVertex::desc())
                .with_bind_group_layouts(vec![
                    globals,
                    object,
                    material_layouts.layout(MaterialKind::Billboard).clone(),
                ]),
        );

        manager.register_pipeline(
            POST_PROCESS_PIPELINE,
            PipelineConfig::default_with_shader("post_process")
                .with_label("Post Process Pipeline")
                .with_cull_mode(None)
                .with_color_target(surface_format, Some(wgpu::BlendState::REPLACE))
                .with_bind_group_layouts(vec![post_process.bind_group_layout().clone()]),
        );
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// # Arguments
    /// * `scene` - Scene to draw, transforms already written
    /// * `clear_color` - Background color of the scene pass
    /// * `ui_callback` - Optional function that records UI draws onto the
    ///   swapchain view
    ///
    /// # Returns
    /// `Skipped` when the surface had no texture to give; only running out of
    /// memory is an error.
    pub fn render_frame<F>(
        &mut self,
        scene: &Scene,
        clear_color: [f32; 3],
        ui_callback: Option<F>,
    ) -> Result<FrameStatus>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e) => {
                return match surface_recovery(&e) {
                    SurfaceRecovery::Reconfigure => {
                        log::warn!("Surface {}; reconfiguring", e);
                        self.surface.configure(&self.device, &self.config);
                        Ok(FrameStatus::Skipped)
                    }
                    SurfaceRecovery::Skip => {
                        log::warn!("Skipping frame: {}", e);
                        Ok(FrameStatus::Skipped)
                    }
                    SurfaceRecovery::Fatal => Err(TabletopError::SurfaceOutOfMemory),
                };
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: scene into the offscreen target
        {
            let (view, resolve_target, store) = match &self.msaa_color {
                Some(msaa) => (
                    &msaa.view,
                    Some(&self.resolve_target.view),
                    wgpu::StoreOp::Discard,
                ),
                None => (&self.resolve_target.view, None, wgpu::StoreOp::Store),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color[0] as f64,
                            g: clear_color[1] as f64,
                            b: clear_color[2] as f64,
                            a: 1.0,
                        }),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.pipeline(LIGHT_CUBE_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, scene.light_cube_binding.bind_group(), &[]);
                render_pass.draw_geometry(&scene.light_cube);
            }

            if let Some(pipeline) = self.pipeline_manager.pipeline(MODEL_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                if let Some(plant) = &scene.plant {
                    render_pass.set_bind_group(1, scene.plant_binding.bind_group(), &[]);
                    render_pass.draw_model(plant, 2);
                }
                if let Some(table) = &scene.table {
                    render_pass.set_bind_group(1, scene.table_binding.bind_group(), &[]);
                    render_pass.draw_model(table, 2);
                }
            }

            if let Some(pipeline) = self.pipeline_manager.pipeline(GROUND_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, scene.ground_binding.bind_group(), &[]);
                render_pass.set_bind_group(2, scene.ground_material.bind_group(), &[]);
                render_pass.draw_geometry(&scene.ground);
            }

            // Blended last, farthest first
            if let Some(pipeline) = self.pipeline_manager.pipeline(VEGETATION_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, scene.grass_material.bind_group(), &[]);
                for binding in &scene.vegetation_bindings {
                    render_pass.set_bind_group(1, binding.bind_group(), &[]);
                    render_pass.draw_geometry(&scene.grass_quad);
                }
            }
        }

        // PASS 2: post-process onto the swapchain
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Post Process Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(POST_PROCESS_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.post_process.bind_group(), &[]);
                render_pass.draw(0..3, 0..1);
            }
        }

        // PASS 3: UI overlay (if provided)
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(FrameStatus::Presented)
    }

    /// Uploads this frame's camera, lights and shading switches.
    pub fn update_globals(&mut self, globals: GlobalUniform) {
        self.global_ubo.update_content(&self.queue, globals);
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.post_process.set_grayscale(&self.queue, grayscale);
    }

    /// Resizes the surface and all offscreen targets
    ///
    /// Zero sizes (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let (width, height) = clamp_surface_size(width, height, max_dimension);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        let (msaa_color, depth_texture, resolve_target) =
            Self::create_targets(&self.device, width, height, self.sample_count);
        self.msaa_color = msaa_color;
        self.depth_texture = depth_texture;
        self.resolve_target = resolve_target;
        self.post_process.rebind(&self.device, &self.resolve_target);
    }

    /// Width over height of the surface.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Returns reference to the wgpu device
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns reference to the wgpu command queue
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    ///
    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn material_layouts(&self) -> &MaterialLayouts {
        &self.material_layouts
    }

    pub fn object_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.object_layout
    }
}

/// Limits each side of the surface to what the device can allocate.
fn clamp_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    (
        width.clamp(1, max_dimension),
        height.clamp(1, max_dimension),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_fallback() {
        assert_eq!(choose_sample_count(4, |_| true), 4);
        assert_eq!(choose_sample_count(4, |_| false), 1);
        assert_eq!(choose_sample_count(1, |_| false), 1);
        assert_eq!(choose_sample_count(0, |_| true), 1);
    }

    #[test]
    fn test_surface_errors() {
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Lost),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Outdated),
            SurfaceRecovery::Reconfigure
        );
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::Timeout),
            SurfaceRecovery::Skip
        );
        assert_eq!(
            surface_recovery(&wgpu::SurfaceError::OutOfMemory),
            SurfaceRecovery::Fatal
        );
    }

    #[test]
    fn test_surface_format_prefers_linear() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(
            choose_surface_format(&formats),
            Some(TextureFormat::Bgra8Unorm)
        );
        assert_eq!(
            choose_surface_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn test_present_mode() {
        assert_eq!(present_mode(true), wgpu::PresentMode::Fifo);
        assert_eq!(present_mode(false), wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn test_shaders_share_lighting_block() {
        for source in [MODEL_SHADER, GROUND_SHADER, VEGETATION_SHADER, LIGHT_CUBE_SHADER] {
            assert!(source.contains("struct Globals"));
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
        assert!(!POST_PROCESS_SHADER.contains("struct Globals"));
    }

    #[test]
    fn test_surface_size_is_clamped_to_device_limit() {
        assert_eq!(clamp_surface_size(5120, 2880, 4096), (4096, 2880));
        assert_eq!(clamp_surface_size(800, 600, 4096), (800, 600));
        assert_eq!(clamp_surface_size(0, 9000, 8192), (1, 8192));
    }
}
