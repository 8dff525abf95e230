use cgmath::Vector3;
use imgui::{Condition, Drag, Ui};

use crate::{
    gfx::camera::CameraMode,
    performance::FrameTimer,
    state::{ProgramState, MAX_HEIGHT_SCALE},
};

const STEP: f32 = 0.03;
const STEP_FAST: f32 = 0.2;
const ATTENUATION_SPEED: f32 = 0.05;
const CAMERA_MODES: [CameraMode; 2] = [CameraMode::Orbit, CameraMode::Free];

fn format_vector(v: Vector3<f32>) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// One stepped input per component. Returns true if any changed.
fn vector_input(ui: &Ui, label: &str, value: &mut Vector3<f32>) -> bool {
    let _id = ui.push_id(label);
    ui.text(label);
    let mut changed = false;
    for (axis, component) in ["x", "y", "z"]
        .into_iter()
        .zip([&mut value.x, &mut value.y, &mut value.z])
    {
        changed |= ui
            .input_float(axis, component)
            .step(STEP)
            .step_fast(STEP_FAST)
            .build();
    }
    changed
}

fn scale_input(ui: &Ui, label: &str, value: &mut f32) -> bool {
    ui.input_float(label, value)
        .step(STEP)
        .step_fast(STEP_FAST)
        .build()
}

fn attenuation_drag(ui: &Ui, label: &str, value: &mut f32) -> bool {
    Drag::new(label)
        .range(0.0, 1.0)
        .speed(ATTENUATION_SPEED)
        .build(ui, value)
}

/// Scene tuning: colors, object placement, lighting and shading switches.
pub fn scene_window(ui: &Ui, state: &mut ProgramState) {
    ui.window("Scene")
        .size([340.0, 560.0], Condition::FirstUseEver)
        .position([10.0, 10.0], Condition::FirstUseEver)
        .build(|| {
            ui.color_edit3("Background color", &mut state.clear_color);
            ui.separator();

            vector_input(ui, "Plant position", &mut state.plant_position);
            scale_input(ui, "Plant scale", &mut state.plant_scale);
            ui.separator();

            vector_input(ui, "Table position", &mut state.table_position);
            scale_input(ui, "Table scale", &mut state.table_scale);
            ui.separator();

            ui.text("Point light attenuation");
            let light = &mut state.point_light;
            attenuation_drag(ui, "Constant", &mut light.constant);
            attenuation_drag(ui, "Linear", &mut light.linear);
            attenuation_drag(ui, "Quadratic", &mut light.quadratic);
            ui.separator();

            ui.checkbox("Blinn-Phong", &mut state.blinn);
            ui.checkbox("Grayscale", &mut state.grayscale);
            ui.slider(
                "Height scale",
                0.0,
                MAX_HEIGHT_SCALE,
                &mut state.height_scale,
            );
            ui.separator();

            ui.text("Camera mode:");
            for (i, &mode) in CAMERA_MODES.iter().enumerate() {
                ui.radio_button(mode.as_str(), &mut state.camera.mode, mode);
                if i + 1 < CAMERA_MODES.len() {
                    ui.same_line();
                }
            }
        });
}

/// Camera readout, the mouse-look switch and frame timing.
pub fn camera_window(ui: &Ui, state: &mut ProgramState, timer: &FrameTimer) {
    let display_size = ui.io().display_size;
    ui.window("Camera info")
        .size([300.0, 260.0], Condition::FirstUseEver)
        .position([display_size[0] - 310.0, 10.0], Condition::FirstUseEver)
        .build(|| {
            let camera = &state.camera.camera;
            ui.text(format!("Camera position: {}", format_vector(camera.position)));
            ui.text(format!(
                "(Yaw, Pitch): ({:.1}, {:.1})",
                camera.yaw, camera.pitch
            ));
            ui.text(format!("Camera front: {}", format_vector(camera.front)));
            ui.checkbox("Camera mouse update", &mut state.camera_mouse_update_enabled);

            ui.separator();
            let metrics = timer.metrics();
            ui.text(format!(
                "FPS: {:.0} ({:.2} ms)",
                metrics.fps, metrics.frame_time_ms
            ));
            ui.text(format!(
                "Min/Max: {:.2} / {:.2} ms",
                metrics.min_frame_time_ms, metrics.max_frame_time_ms
            ));

            let history = timer.frame_time_history();
            if !history.is_empty() {
                ui.plot_lines("##frame_times", &history)
                    .graph_size([260.0, 60.0])
                    .scale_min(0.0)
                    .scale_max(50.0)
                    .build();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn test_format_vector() {
        assert_eq!(format_vector(vec3(1.0, -0.5, 0.126)), "(1.00, -0.50, 0.13)");
    }

    #[test]
    fn test_camera_modes_listed_once() {
        assert_eq!(CAMERA_MODES.len(), 2);
        assert_ne!(CAMERA_MODES[0], CAMERA_MODES[1]);
        assert_eq!(CAMERA_MODES[0], CameraMode::default());
    }
}
