use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use crate::data_structures::{
    model::{self, ModelVertex},
    texture::{ColourSpace, Texture, Wrap},
};

/**
 * This module contains all logic for loading meshes and textures from external files.
 *
 * Model import is split in two: [`parse_obj`] reads the OBJ and MTL files on
 * the CPU, [`load_model_obj`] uploads the result and resolves the textures.
 */
pub mod mesh;
pub mod texture;

/// A mesh as read from disk, before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// Texture references of one material, resolved against the model's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

/// Reads an OBJ file and the MTL libraries it references.
///
/// Faces are triangulated and re-indexed so positions, normals and texture
/// coordinates share one index. Texture coordinates are flipped vertically.
/// A missing or broken MTL file only loses the materials; the meshes are kept.
pub async fn parse_obj(path: &Path) -> anyhow::Result<ObjData> {
    let obj_text = texture::load_string(path).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = dir.join(p);
            async move {
                match tokio::fs::read_to_string(&mtl_path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material library {} not readable: {e}", mtl_path.display());
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("could not parse {}: {e}", path.display()))?;

    let materials = match obj_materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("{} has no usable materials: {e}", path.display());
            Vec::new()
        }
    };

    let resolve = |file: &Option<String>| -> Option<PathBuf> {
        file.as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| dir.join(f.replace('\\', "/")))
    };
    let materials = materials
        .iter()
        .map(|m| MaterialData {
            name: m.name.clone(),
            diffuse: resolve(&m.diffuse_texture),
            specular: resolve(&m.specular_texture),
        })
        .collect();

    let meshes = models.into_iter().map(mesh::mesh_data).collect();

    Ok(ObjData { meshes, materials })
}

/// Imports an OBJ model and uploads it.
///
/// Import failures are logged and produce an empty model, which draws nothing.
/// Textures referenced by several materials are decoded once.
pub async fn load_model_obj(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> model::Model {
    let data = match parse_obj(path).await {
        Ok(data) => data,
        Err(e) => {
            log::error!("Model import failed: {e:#}");
            return model::Model::empty();
        }
    };

    let mut cache: HashMap<(PathBuf, ColourSpace), Texture> = HashMap::new();
    let mut materials = Vec::new();
    for m in &data.materials {
        let diffuse =
            cached_texture(&mut cache, m.diffuse.as_deref(), ColourSpace::Srgb, device, queue).await;
        let specular =
            cached_texture(&mut cache, m.specular.as_deref(), ColourSpace::Linear, device, queue).await;
        materials.push(model::Material::new(device, &m.name, &diffuse, &specular, layout));
    }

    let meshes: Vec<model::Mesh> = data
        .meshes
        .iter()
        .filter_map(|m| mesh::upload(device, m, path))
        .collect();

    log::info!(
        "Loaded {} with {} meshes, {} materials and {} distinct textures",
        path.display(),
        meshes.len(),
        materials.len(),
        cache.len()
    );
    model::Model { meshes, materials }
}

async fn cached_texture(
    cache: &mut HashMap<(PathBuf, ColourSpace), Texture>,
    path: Option<&Path>,
    colour_space: ColourSpace,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    let Some(path) = path else {
        return Texture::placeholder(device, queue, "missing material texture");
    };
    let key = (path.to_path_buf(), colour_space);
    if let Some(texture) = cache.get(&key) {
        return texture.clone();
    }
    let texture = texture::load_texture(path, Wrap::Repeat, colour_space, device, queue).await;
    cache.insert(key, texture.clone());
    texture
}
