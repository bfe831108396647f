use std::path::Path;

use crate::data_structures::texture::{ColourSpace, Texture, Wrap};

pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?;
    Ok(data)
}

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    let txt = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?;
    Ok(txt)
}

/// Reads and decodes an image file into a texture.
pub async fn try_load_texture(
    path: &Path,
    wrap: Wrap,
    colour_space: ColourSpace,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(path).await?;
    Texture::from_bytes(device, queue, &data, &path.to_string_lossy(), wrap, colour_space)
}

/// Like [`try_load_texture`], but a missing or undecodable image is logged and
/// replaced by the placeholder texture so drawing can go on.
pub async fn load_texture(
    path: &Path,
    wrap: Wrap,
    colour_space: ColourSpace,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match try_load_texture(path, wrap, colour_space, device, queue).await {
        Ok(texture) => {
            log::debug!("Loaded texture {}", path.display());
            texture
        }
        Err(e) => {
            log::error!("Texture failed to load at path {}: {e:#}", path.display());
            Texture::placeholder(device, queue, &path.to_string_lossy())
        }
    }
}

async fn decode(path: &Path) -> anyhow::Result<image::DynamicImage> {
    let data = load_binary(path).await?;
    let img = image::load_from_memory(&data)
        .map_err(|e| anyhow::anyhow!("could not decode {}: {e}", path.display()))?;
    Ok(img)
}

/// Loads six faces in +X, -X, +Y, -Y, +Z, -Z order into a cube map.
/// The faces are read concurrently. Any failure yields the placeholder cube.
pub async fn load_cube_map<P: AsRef<Path>>(
    faces: &[P],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    let decoded = futures::future::join_all(faces.iter().map(|p| decode(p.as_ref()))).await;
    let result = decoded
        .into_iter()
        .collect::<anyhow::Result<Vec<_>>>()
        .and_then(|images| Texture::cube_from_images(device, queue, &images, "skybox"));
    match result {
        Ok(texture) => {
            log::info!("Loaded skybox with {} faces", faces.len());
            texture
        }
        Err(e) => {
            log::error!("Cubemap texture failed to load: {e:#}");
            Texture::placeholder_cube(device, queue, "skybox placeholder")
        }
    }
}
