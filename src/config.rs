//! Compiled-in configuration.
//!
//! Every parameter of the demo lives here as a default value. Nothing is
//! read from disk or the command line; the only environment knobs are
//! `RUST_LOG` and `WGPU_BACKEND`, which are handled by `env_logger` and wgpu.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub scene: SceneConfig,
    pub lighting: LightingConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "A little OpenGL game".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub front: [f32; 3],
    pub up: [f32; 3],
    /// World units per second; scaled by the frame delta before each move.
    pub base_speed: f32,
    /// Degrees per pixel of cursor travel.
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            front: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            base_speed: crate::camera::DEFAULT_SPEED,
            sensitivity: crate::camera::DEFAULT_SENSITIVITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

/// World-space placements of everything the frame draws.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub cube_positions: Vec<[f32; 3]>,
    pub point_light_positions: Vec<[f32; 3]>,
    pub window_positions: Vec<[f32; 3]>,
    /// Offset of the grass quad drawn right after each decorative cube.
    pub grass_offset: [f32; 3],
    pub grass_ring_radius: f32,
    pub grass_ring_count: u32,
    pub outline_scale: f32,
    pub outline_colour: [f32; 4],
    pub clear_colour: wgpu::Color,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cube_positions: vec![
                [0.0, 2.0, 8.0],
                [2.0, 5.0, -15.0],
                [-1.5, -2.2, -2.5],
                [-3.8, -2.0, -12.3],
                [2.4, -0.4, -3.5],
                [-1.7, 3.0, -7.5],
                [1.3, -2.0, -2.5],
                [1.5, 2.0, -2.5],
                [1.5, 0.2, -1.5],
                [-1.3, 1.0, -1.5],
            ],
            point_light_positions: vec![
                [0.7, 0.2, 2.0],
                [2.3, -3.3, -4.0],
                [-4.0, 2.0, -12.0],
                [0.0, 0.0, -3.0],
            ],
            window_positions: vec![[3.5, 0.0, 10.48], [1.5, 0.0, 8.51]],
            grass_offset: [0.0, 0.0, -0.01],
            grass_ring_radius: 10.0,
            grass_ring_count: 40,
            outline_scale: 1.1,
            outline_colour: [0.04, 0.28, 0.26, 1.0],
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

#[derive(Debug, Clone)]
pub struct LightingConfig {
    pub directional_direction: [f32; 3],
    pub directional_ambient: f32,
    pub directional_diffuse: f32,
    pub directional_specular: f32,
    pub point_ambient: f32,
    pub point_diffuse: f32,
    pub point_specular: f32,
    pub attenuation: Attenuation,
    pub spot_ambient: f32,
    pub spot_diffuse: f32,
    pub spot_specular: f32,
    /// Inner and outer cone angles in degrees.
    pub spot_cutoff: f32,
    pub spot_outer_cutoff: f32,
    pub shininess: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            directional_direction: [-0.2, -1.0, -0.3],
            directional_ambient: 0.05,
            directional_diffuse: 0.4,
            directional_specular: 0.5,
            point_ambient: 0.2,
            point_diffuse: 0.8,
            point_specular: 1.0,
            attenuation: Attenuation {
                constant: 1.0,
                linear: 0.09,
                quadratic: 0.032,
            },
            spot_ambient: 0.2,
            spot_diffuse: 0.8,
            spot_specular: 1.0,
            spot_cutoff: 12.5,
            spot_outer_cutoff: 15.5,
            shininess: 64.0,
        }
    }
}

/// Asset file names, relative to `root`.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub container_diffuse: String,
    pub container_specular: String,
    pub grass: String,
    pub window: String,
    /// Cube map faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [String; 6],
    pub model: String,
}

impl AssetConfig {
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn skybox_paths(&self) -> Vec<PathBuf> {
        self.skybox_faces.iter().map(|face| self.path(face)).collect()
    }

    pub fn model_path(&self) -> PathBuf {
        self.path(&self.model)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        let face = |name: &str| Path::new("skybox").join(name).to_string_lossy().into_owned();
        Self {
            root: PathBuf::from("./assets"),
            container_diffuse: "textures/container2.png".to_string(),
            container_specular: "textures/container2_specular.png".to_string(),
            grass: "textures/grass.png".to_string(),
            window: "textures/blending_transparent_window.png".to_string(),
            skybox_faces: [
                face("right.jpg"),
                face("left.jpg"),
                face("top.jpg"),
                face("bottom.jpg"),
                face("front.jpg"),
                face("back.jpg"),
            ],
            model: "models/nanosuit/nanosuit.obj".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_matches_demo_layout() {
        let config = Config::default();
        assert_eq!(config.scene.cube_positions.len(), 10);
        assert_eq!(config.scene.point_light_positions.len(), 4);
        assert_eq!(config.scene.window_positions.len(), 2);
        assert_eq!(config.scene.grass_ring_count, 40);
        assert_eq!((config.window.width, config.window.height), (800, 600));
    }

    #[test]
    fn asset_paths_resolve_under_root() {
        let assets = AssetConfig {
            root: PathBuf::from("/data"),
            ..Default::default()
        };
        let faces = assets.skybox_paths();
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[0], Path::new("/data/skybox/right.jpg"));
        assert_eq!(faces[5], Path::new("/data/skybox/back.jpg"));
        assert_eq!(assets.model_path(), Path::new("/data/models/nanosuit/nanosuit.obj"));
    }
}
