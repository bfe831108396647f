//! Scene data: vertices, transforms, textures and imported models.
//!
//! - `geometry` holds the hard-coded cube, skybox and screen quad vertex data
//! - `instance` holds per-draw transforms and their GPU layout
//! - `model` contains mesh and material definitions, GPU resources for imported models
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod geometry;
pub mod instance;
pub mod model;
pub mod texture;
