//! Window, event loop and per-frame orchestration

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use crate::{
    config::AppConfig,
    error::{Result, TabletopError},
    gfx::{
        rendering::{FrameStatus, RenderEngine},
        resources::{GlobalUniform, ShadingParams},
        scene::Scene,
        ui::{panel, UiManager},
    },
    input::{Command, InputController, InputListener},
    performance::FrameTimer,
    state::ProgramState,
};

type UiCallback = fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView);

pub struct TabletopApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: AppConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Option<Scene>,
    program_state: ProgramState,
    input: InputController,
    timer: FrameTimer,
    /// Set when the loop had to stop because of an error.
    fatal_error: Option<TabletopError>,
}

impl TabletopApp {
    /// Creates the event loop and loads the saved program state.
    ///
    /// A missing or malformed state file leaves the defaults in place.
    pub fn new(config: AppConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;

        let mut program_state = ProgramState::default();
        if let Err(e) = program_state.load_from_file(&config.state_path) {
            log::warn!("{}; using defaults", e);
        }

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene: None,
                program_state,
                input: InputController::new(),
                timer: FrameTimer::new(),
                fatal_error: None,
            },
        })
    }

    /// Runs until the window closes; returns the error that stopped it, if any.
    pub fn run(self) -> Result<()> {
        let TabletopApp {
            event_loop,
            mut app_state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut app_state)?;

        match app_state.fatal_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Shows a free cursor for the UI, or grabs and hides it for mouse look.
fn apply_cursor_mode(window: &Window, ui_visible: bool) {
    if ui_visible {
        if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::debug!("Could not release cursor: {}", e);
        }
        window.set_cursor_visible(true);
    } else {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("Could not grab cursor: {}", e);
        }
        window.set_cursor_visible(false);
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let (width, height) = window.inner_size().into();

        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.config,
        ))?;

        let scene = Scene::new(
            render_engine.device(),
            render_engine.queue(),
            &self.config,
            render_engine.material_layouts(),
            render_engine.object_layout(),
        );

        let ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );

        apply_cursor_mode(&window, self.program_state.imgui_enabled);

        self.window = Some(window);
        self.render_engine = Some(render_engine);
        self.scene = Some(scene);
        self.ui_manager = Some(ui_manager);
        // Loading time should not count as the first frame
        self.timer = FrameTimer::new();
        Ok(())
    }

    fn handle_command(&mut self, command: Command, event_loop: &ActiveEventLoop, window: &Window) {
        match command {
            Command::Quit => {
                log::info!("Quit requested");
                event_loop.exit();
            }
            Command::ToggleUi => {
                self.program_state.toggle_imgui();
                self.input.release_all();
                apply_cursor_mode(window, self.program_state.imgui_enabled);
                log::debug!(
                    "Debug UI {}",
                    if self.program_state.imgui_enabled {
                        "shown"
                    } else {
                        "hidden"
                    }
                );
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window: &Window) {
        let (Some(render_engine), Some(scene)) =
            (self.render_engine.as_mut(), self.scene.as_mut())
        else {
            return;
        };

        let delta_time = self.timer.tick();
        let time = self.timer.elapsed_secs();

        let state = &mut self.program_state;
        state.sync_camera_controls();
        self.input
            .update(&mut [&mut state.camera as &mut dyn InputListener]);
        state.camera.update(delta_time);
        state.point_light.orbit(time);

        let camera_uniform = state.camera.uniform(time, render_engine.aspect());
        let eye = state.camera.eye(time);
        scene.update(render_engine.queue(), state, eye);
        render_engine.update_globals(GlobalUniform::new(
            &camera_uniform,
            &state.point_light,
            &state.dir_light,
            ShadingParams {
                blinn: state.blinn,
                height_scale: state.height_scale,
                time,
                ..Default::default()
            },
        ));
        render_engine.set_grayscale(state.grayscale);

        let clear_color = state.clear_color;
        let timer = &self.timer;
        let ui_manager = self
            .ui_manager
            .as_mut()
            .filter(|_| state.imgui_enabled);

        let result = match ui_manager {
            Some(ui_manager) => render_engine.render_frame(
                scene,
                clear_color,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     view: &wgpu::TextureView| {
                        let drawn = ui_manager.draw(device, queue, encoder, window, view, |ui| {
                            panel::scene_window(ui, state);
                            panel::camera_window(ui, state, timer);
                        });
                        if let Err(e) = drawn {
                            log::error!("{}", e);
                        }
                    },
                ),
            ),
            None => render_engine.render_frame(scene, clear_color, None::<UiCallback>),
        };

        match result {
            Ok(FrameStatus::Presented) => {}
            Ok(FrameStatus::Skipped) => log::debug!("Frame skipped"),
            Err(e) => {
                log::error!("Rendering failed: {}", e);
                self.fatal_error = Some(e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Failed to start renderer: {}", e);
            self.fatal_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI sees input first
        let ui_wants_input = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                ui_manager.handle_input(&window, &event) && self.program_state.imgui_enabled
            }
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop, &window),
            WindowEvent::Focused(false) => {
                self.input.process_window_event(&event);
            }
            _ if ui_wants_input => self.input.process_captured_window_event(&event),
            _ => {
                if let Some(command) = self.input.process_window_event(&event) {
                    self.handle_command(command, event_loop, &window);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if !self.program_state.camera_mouse_update_enabled {
            return;
        }
        let ui_owns_mouse = self.program_state.imgui_enabled
            && self
                .ui_manager
                .as_ref()
                .is_some_and(|ui_manager| ui_manager.wants_mouse());
        if !ui_owns_mouse {
            self.input.process_device_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Err(e) = self.program_state.save_to_file(&self.config.state_path) {
            log::error!("{}", e);
        }
    }
}
