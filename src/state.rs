//! Persistent program state
//!
//! Everything the debug panel can tune lives in [`ProgramState`]. The state is
//! written to a flat text file on exit and read back on the next start.
//!
//! ## File format
//!
//! One value per line. The first eighteen lines are, in order: clear color
//! (r, g, b), the debug UI flag, plant position (x, y, z) and scale, table
//! position (x, y, z) and scale, camera position (x, y, z) and camera front
//! (x, y, z). Four optional lines may follow: the Blinn flag, the grayscale
//! flag, the parallax height scale and the camera mode (`orbit` or `free`).
//! Flags are stored as `1` or `0`. Lights are not persisted.

use std::{fs, io, path::Path};

use cgmath::{vec3, Vector3};

use crate::{
    error::{Result, TabletopError},
    gfx::camera::{CameraController, CameraManager, CameraMode, FlyCamera},
    lighting::{DirLight, PointLight},
};

/// Number of values every state file must provide.
const REQUIRED_VALUES: usize = 18;

pub const DEFAULT_HEIGHT_SCALE: f32 = 0.1;
pub const MAX_HEIGHT_SCALE: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ProgramState {
    pub clear_color: [f32; 3],
    pub imgui_enabled: bool,
    pub camera: CameraManager,
    pub camera_mouse_update_enabled: bool,

    pub plant_position: Vector3<f32>,
    pub plant_scale: f32,
    pub table_position: Vector3<f32>,
    pub table_scale: f32,

    pub blinn: bool,
    pub grayscale: bool,
    /// Depth of the parallax effect on the ground.
    pub height_scale: f32,

    pub point_light: PointLight,
    pub dir_light: DirLight,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            clear_color: [0.7, 0.0, 0.3],
            imgui_enabled: true,
            camera: CameraManager::new(
                FlyCamera::new(vec3(0.0, 0.0, 1.0)),
                CameraController::default(),
            ),
            camera_mouse_update_enabled: false,
            plant_position: vec3(0.5, 0.7, 0.1),
            plant_scale: 0.1,
            table_position: vec3(-0.6, -0.6, -0.6),
            table_scale: 5.0,
            blinn: true,
            grayscale: false,
            height_scale: DEFAULT_HEIGHT_SCALE,
            point_light: PointLight::default(),
            dir_light: DirLight::default(),
        }
    }
}

impl ProgramState {
    /// Writes the state file, creating parent directories as needed.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source: io::Error| TabletopError::StateIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.serialize()).map_err(io_error)?;

        log::info!("Saved program state to {}", path.display());
        Ok(())
    }

    /// Reads the state file.
    ///
    /// Returns `Ok(false)` and leaves the state untouched when the file does
    /// not exist. On a parse error nothing is applied.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No program state at {}, starting with defaults",
                    path.display()
                );
                return Ok(false);
            }
            Err(source) => {
                return Err(TabletopError::StateIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        self.apply_serialized(&contents)?;
        log::info!("Loaded program state from {}", path.display());
        Ok(true)
    }

    /// Renders the state in the file format described in the module docs.
    pub fn serialize(&self) -> String {
        let camera = &self.camera.camera;
        let vector = |v: Vector3<f32>| [v.x, v.y, v.z].map(|c| c.to_string());

        let mut lines: Vec<String> = self.clear_color.iter().map(f32::to_string).collect();
        lines.push(flag(self.imgui_enabled).to_string());
        lines.extend(vector(self.plant_position));
        lines.push(self.plant_scale.to_string());
        lines.extend(vector(self.table_position));
        lines.push(self.table_scale.to_string());
        lines.extend(vector(camera.position));
        lines.extend(vector(camera.front));
        lines.push(flag(self.blinn).to_string());
        lines.push(flag(self.grayscale).to_string());
        lines.push(self.height_scale.to_string());
        lines.push(self.camera.mode.as_str().to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Parses `contents` and applies it on success.
    pub fn apply_serialized(&mut self, contents: &str) -> Result<()> {
        let mut tokens = Tokens::new(contents);
        let mut next = self.clone();

        next.clear_color = [tokens.float()?, tokens.float()?, tokens.float()?];
        next.imgui_enabled = tokens.flag()?;
        next.plant_position = tokens.vector()?;
        next.plant_scale = tokens.float()?;
        next.table_position = tokens.vector()?;
        next.table_scale = tokens.float()?;
        let position = tokens.vector()?;
        let front = tokens.vector()?;
        debug_assert_eq!(tokens.consumed, REQUIRED_VALUES);

        if !tokens.is_empty() {
            next.blinn = tokens.flag()?;
        }
        if !tokens.is_empty() {
            next.grayscale = tokens.flag()?;
        }
        if !tokens.is_empty() {
            next.height_scale = tokens.float()?.clamp(0.0, MAX_HEIGHT_SCALE);
        }
        if !tokens.is_empty() {
            let (line, word) = tokens.next_token()?;
            next.camera.mode = CameraMode::parse(word).ok_or_else(|| TabletopError::StateParse {
                line,
                reason: format!("unknown camera mode {:?}", word),
            })?;
        }
        if let Some((line, extra)) = tokens.peek() {
            log::warn!(
                "Ignoring unexpected program state value {:?} at line {}",
                extra,
                line
            );
        }

        next.camera.camera.position = position;
        next.camera.camera.set_front(front);
        // Mouse look starts enabled only while the debug UI is hidden.
        next.camera_mouse_update_enabled = !next.imgui_enabled;

        *self = next;
        Ok(())
    }

    /// Shows or hides the debug UI, switching mouse look the opposite way.
    pub fn toggle_imgui(&mut self) {
        self.imgui_enabled = !self.imgui_enabled;
        self.camera_mouse_update_enabled = !self.imgui_enabled;
    }

    /// Pushes UI-owned flags into the camera controller.
    ///
    /// Only mouse look follows the flag; held movement keys keep working.
    pub fn sync_camera_controls(&mut self) {
        self.camera.controller.mouse_look_enabled = self.camera_mouse_update_enabled;
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Whitespace-separated values tagged with their 1-based line number.
struct Tokens<'a> {
    items: Vec<(usize, &'a str)>,
    position: usize,
    consumed: usize,
}

impl<'a> Tokens<'a> {
    fn new(contents: &'a str) -> Self {
        let items = contents
            .lines()
            .enumerate()
            .flat_map(|(index, line)| line.split_whitespace().map(move |word| (index + 1, word)))
            .collect();
        Self {
            items,
            position: 0,
            consumed: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.position >= self.items.len()
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.items.get(self.position).copied()
    }

    fn next_token(&mut self) -> Result<(usize, &'a str)> {
        let Some(item) = self.peek() else {
            let line = self.items.last().map(|(line, _)| line + 1).unwrap_or(1);
            return Err(TabletopError::StateParse {
                line,
                reason: format!(
                    "expected at least {} values, found {}",
                    REQUIRED_VALUES,
                    self.items.len()
                ),
            });
        };
        self.position += 1;
        self.consumed += 1;
        Ok(item)
    }

    fn float(&mut self) -> Result<f32> {
        let (line, word) = self.next_token()?;
        let value: f32 = word.parse().map_err(|_| TabletopError::StateParse {
            line,
            reason: format!("expected a number, found {:?}", word),
        })?;
        if !value.is_finite() {
            return Err(TabletopError::StateParse {
                line,
                reason: format!("value {:?} is not finite", word),
            });
        }
        Ok(value)
    }

    fn flag(&mut self) -> Result<bool> {
        let (line, word) = self.next_token()?;
        match word {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(TabletopError::StateParse {
                line,
                reason: format!("expected 0 or 1, found {:?}", word),
            }),
        }
    }

    fn vector(&mut self) -> Result<Vector3<f32>> {
        Ok(vec3(self.float()?, self.float()?, self.float()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputController, InputListener};
    use cgmath::InnerSpace;
    use std::path::PathBuf;
    use winit::keyboard::KeyCode;

    const ORIGINAL_FORMAT: &str = "0.1\n0.2\n0.3\n0\n1\n2\n3\n0.5\n-1\n-2\n-3\n4\n5\n6\n7\n1\n0\n0\n";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "tabletop-state-{}-{}.txt",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_defaults_match_scene_setup() {
        let state = ProgramState::default();
        assert_eq!(state.clear_color, [0.7, 0.0, 0.3]);
        assert!(state.imgui_enabled);
        assert_eq!(state.plant_position, vec3(0.5, 0.7, 0.1));
        assert_eq!(state.plant_scale, 0.1);
        assert_eq!(state.table_position, vec3(-0.6, -0.6, -0.6));
        assert_eq!(state.table_scale, 5.0);
        assert_eq!(state.camera.camera.position, vec3(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_original_format_is_accepted() {
        let mut state = ProgramState::default();
        state.apply_serialized(ORIGINAL_FORMAT).unwrap();

        assert_eq!(state.clear_color, [0.1, 0.2, 0.3]);
        assert!(!state.imgui_enabled);
        assert!(state.camera_mouse_update_enabled);
        assert_eq!(state.plant_position, vec3(1.0, 2.0, 3.0));
        assert_eq!(state.plant_scale, 0.5);
        assert_eq!(state.table_position, vec3(-1.0, -2.0, -3.0));
        assert_eq!(state.table_scale, 4.0);
        assert_eq!(state.camera.camera.position, vec3(5.0, 6.0, 7.0));
        assert!((state.camera.camera.front - vec3(1.0, 0.0, 0.0)).magnitude() < 1e-5);
        // Extended values keep their defaults
        assert!(state.blinn);
        assert!(!state.grayscale);
        assert_eq!(state.camera.mode, CameraMode::Orbit);
    }

    #[test]
    fn test_save_and_load_preserve_tuned_values() {
        let path = temp_path("roundtrip");
        let mut saved = ProgramState::default();
        saved.clear_color = [0.25, 0.5, 0.75];
        saved.plant_scale = 0.33;
        saved.table_position = vec3(1.5, -0.25, 2.0);
        saved.blinn = false;
        saved.grayscale = true;
        saved.height_scale = 0.2;
        saved.camera.mode = CameraMode::Free;
        saved.camera.camera.position = vec3(3.0, 1.0, -2.0);
        saved.save_to_file(&path).unwrap();

        let mut loaded = ProgramState::default();
        assert!(loaded.load_from_file(&path).unwrap());
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.clear_color, saved.clear_color);
        assert_eq!(loaded.plant_scale, saved.plant_scale);
        assert_eq!(loaded.table_position, saved.table_position);
        assert!(!loaded.blinn);
        assert!(loaded.grayscale);
        assert_eq!(loaded.height_scale, 0.2);
        assert_eq!(loaded.camera.mode, CameraMode::Free);
        assert_eq!(loaded.camera.camera.position, vec3(3.0, 1.0, -2.0));
        assert!((loaded.camera.camera.front - saved.camera.camera.front).magnitude() < 1e-5);
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let mut state = ProgramState::default();
        state.plant_scale = 0.42;
        let loaded = state
            .load_from_file(temp_path("does-not-exist"))
            .unwrap();
        assert!(!loaded);
        assert_eq!(state.plant_scale, 0.42);
    }

    #[test]
    fn test_truncated_file_is_rejected_without_changes() {
        let mut state = ProgramState::default();
        let err = state.apply_serialized("0.1\n0.2\n0.3\n1\n").unwrap_err();
        assert!(matches!(err, TabletopError::StateParse { line: 5, .. }));
        assert_eq!(state.clear_color, [0.7, 0.0, 0.3]);
    }

    #[test]
    fn test_malformed_value_names_its_line() {
        let mut state = ProgramState::default();
        let contents = ORIGINAL_FORMAT.replacen("0.5", "half", 1);
        match state.apply_serialized(&contents) {
            Err(TabletopError::StateParse { line, .. }) => assert_eq!(line, 8),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert_eq!(state.plant_scale, 0.1);
    }

    #[test]
    fn test_flags_must_be_binary() {
        let mut state = ProgramState::default();
        let contents = ORIGINAL_FORMAT.replacen("\n0\n1\n", "\n2\n1\n", 1);
        assert!(state.apply_serialized(&contents).is_err());
    }

    #[test]
    fn test_whitespace_separated_values_are_accepted() {
        let mut state = ProgramState::default();
        let single_line = ORIGINAL_FORMAT.replace('\n', " ");
        state.apply_serialized(&single_line).unwrap();
        assert_eq!(state.table_scale, 4.0);
    }

    #[test]
    fn test_height_scale_is_clamped() {
        let mut state = ProgramState::default();
        let contents = format!("{}1\n0\n9\norbit\n", ORIGINAL_FORMAT);
        state.apply_serialized(&contents).unwrap();
        assert_eq!(state.height_scale, MAX_HEIGHT_SCALE);
    }

    #[test]
    fn test_unknown_camera_mode_is_rejected() {
        let mut state = ProgramState::default();
        let contents = format!("{}1\n0\n0.1\nspinning\n", ORIGINAL_FORMAT);
        assert!(state.apply_serialized(&contents).is_err());
    }

    #[test]
    fn test_toggle_imgui_swaps_mouse_look() {
        let mut state = ProgramState::default();
        state.camera_mouse_update_enabled = false;
        state.toggle_imgui();
        assert!(!state.imgui_enabled);
        assert!(state.camera_mouse_update_enabled);
        state.toggle_imgui();
        assert!(state.imgui_enabled);
        assert!(!state.camera_mouse_update_enabled);
    }

    #[test]
    fn test_serialized_state_has_one_value_per_line() {
        let contents = ProgramState::default().serialize();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), REQUIRED_VALUES + 4);
        assert_eq!(&lines[..4], &["0.7", "0", "0.3", "1"]);
        assert_eq!(lines[REQUIRED_VALUES], "1");
        assert_eq!(lines[REQUIRED_VALUES + 3], "orbit");
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn test_held_key_moves_camera_every_frame_with_ui_visible() {
        let mut state = ProgramState::default();
        state.camera.mode = CameraMode::Free;
        assert!(state.imgui_enabled);
        assert!(!state.camera_mouse_update_enabled);
        let mut input = InputController::new();
        let start = state.camera.camera.position;

        state.sync_camera_controls();
        input.process_key(KeyCode::KeyW, true, false);
        input.update(&mut [&mut state.camera as &mut dyn InputListener]);
        state.camera.update(0.1);
        let after_first = state.camera.camera.position;
        assert!((after_first - start).magnitude() > 1e-4);

        state.sync_camera_controls();
        input.update(&mut [&mut state.camera as &mut dyn InputListener]);
        state.camera.update(0.1);
        let after_second = state.camera.camera.position;
        assert!((after_second - after_first).magnitude() > 1e-4);
        assert!(!state.camera.controller.mouse_look_enabled);
    }
}
