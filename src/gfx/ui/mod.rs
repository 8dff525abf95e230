//! Dear ImGui integration: input forwarding, frame building and drawing on
//! top of the swapchain image.

pub mod panel;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::Window,
};

use crate::error::{Result, TabletopError};

const FONT_SIZE: f32 = 16.0;

/// Whether a window event is pointer or keyboard input the UI may capture.
fn is_input_event(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
    )
}

pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Default);
        log::debug!("Window scale factor: {}", window.scale_factor());

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE * window.scale_factor() as f32,
                ..Default::default()
            }),
        }]);
        context.io_mut().font_global_scale = (1.0 / window.scale_factor()) as f32;

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Forwards a window event to ImGui.
    ///
    /// Returns true when the event is input ImGui wants for itself, in which
    /// case the camera must not see it.
    pub fn handle_input(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let wrapped: Event<()> = Event::WindowEvent {
            window_id: window.id(),
            event: event.clone(),
        };
        self.platform
            .handle_event(self.context.io_mut(), window, &wrapped);

        if !is_input_event(event) {
            return false;
        }
        let io = self.context.io();
        match event {
            WindowEvent::KeyboardInput { .. } | WindowEvent::ModifiersChanged(_) => {
                io.want_capture_keyboard
            }
            _ => io.want_capture_mouse,
        }
    }

    /// Whether ImGui currently owns the mouse, e.g. while dragging a widget.
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Builds this frame's widgets with `run_ui`.
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> Result<bool>
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .map_err(|e| TabletopError::Ui(format!("failed to prepare frame: {}", e)))?;

        let ui = self.context.frame();
        run_ui(&*ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(&*ui, window);
        }

        let io = self.context.io();
        Ok(io.want_capture_mouse || io.want_capture_keyboard)
    }

    /// Draws the last built frame over `color_attachment`, keeping its contents.
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) -> Result<()> {
        let draw_data = self.context.render();

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            log::debug!("Skipping UI draw for empty display");
            return Ok(());
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .map_err(|e| TabletopError::Ui(format!("failed to render: {}", e)))
    }

    pub fn draw<F>(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        window: &Window,
        color_attachment: &TextureView,
        run_ui: F,
    ) -> Result<()>
    where
        F: FnOnce(&imgui::Ui),
    {
        self.update_logic(window, run_ui)?;
        self.render_display_only(device, queue, encoder, color_attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_input_events_can_be_captured() {
        assert!(is_input_event(&WindowEvent::ModifiersChanged(
            winit::event::Modifiers::default()
        )));
        assert!(!is_input_event(&WindowEvent::Focused(true)));
        assert!(!is_input_event(&WindowEvent::CloseRequested));
        assert!(!is_input_event(&WindowEvent::RedrawRequested));
    }
}
