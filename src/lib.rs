//! lumen
//!
//! A fly-camera 3D scene rendered with wgpu. Every frame draws a skybox,
//! point-light markers, a Phong-lit container cube with a stencil outline, an
//! imported OBJ model, decorative cubes with grass, a ring of grass
//! billboards and a couple of alpha-blended windows into an offscreen target,
//! then composites that target onto the window surface.
//!
//! High-level modules
//! - `app`: window, event loop and per-frame state
//! - `camera`: fly camera, projection and the camera uniform
//! - `config`: compiled-in scene, lighting and asset parameters
//! - `context`: GPU context owning device, targets, pipelines and assets
//! - `data_structures`: vertices, instances, textures and models
//! - `input`: input event queue drained once per frame
//! - `pipelines`: render pipelines, bind group layouts and uniforms
//! - `render`: GPU-free frame plan with pass order and pipeline state
//! - `resources`: texture, cube map and OBJ loading
//! - `timing`: frame delta clock
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod timing;

pub use app::run;
pub use config::Config;
