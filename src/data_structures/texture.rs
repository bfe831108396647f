//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around a wgpu texture with its
//! default view and sampler, together with constructors for every kind of
//! texture the frame needs: sampled 2D images, the skybox cube map, the
//! depth-stencil attachment, the offscreen colour target and the placeholder
//! used when an image fails to load.

use anyhow::*;
use image::GenericImageView;

/// How texture coordinates outside [0, 1] are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    /// Used for billboards so their transparent borders do not bleed in from the opposite edge.
    Clamp,
}

impl Wrap {
    fn address_mode(self) -> wgpu::AddressMode {
        match self {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// How the texels of an image are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColourSpace {
    /// Colour images; sampling decodes them to linear.
    #[default]
    Srgb,
    /// Data read as stored, such as specular intensity maps.
    Linear,
}

impl ColourSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColourSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColourSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU texture with a view and a sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Combined depth and stencil format; the stencil half carries the outline mask.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    /// Colour format of the offscreen target the scene is drawn into.
    pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create the depth-stencil attachment for the offscreen pass.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, Wrap::Clamp);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Create a colour target that is rendered to and later sampled by the composite pass.
    pub fn create_render_target(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, Wrap::Clamp);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 magenta texture standing in for an image that failed to load.
    ///
    /// Drawing continues with it so a missing file shows up as a loud colour
    /// instead of stopping the demo.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        Self::from_rgba(
            device,
            queue,
            &placeholder_pixel(),
            (1, 1),
            Some(label),
            Wrap::Repeat,
            ColourSpace::Srgb,
        )
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `wrap` selects repeat or clamp-to-edge addressing
    /// * `colour_space` picks an sRGB or a linear texture format
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        wrap: Wrap,
        colour_space: ColourSpace,
    ) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(device, queue, &img, Some(label), wrap, colour_space)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        wrap: Wrap,
        colour_space: ColourSpace,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        if dimensions.0 == 0 || dimensions.1 == 0 {
            bail!("image {:?} has no pixels", label.unwrap_or("<unnamed>"));
        }
        Ok(Self::from_rgba(
            device,
            queue,
            &img.to_rgba8(),
            dimensions,
            label,
            wrap,
            colour_space,
        ))
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        label: Option<&str>,
        wrap: Wrap,
        colour_space: ColourSpace,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: colour_space.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, wrap);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Build a cube map from six equally sized faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn cube_from_images(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[image::DynamicImage],
        label: &str,
    ) -> Result<Self> {
        ensure!(faces.len() == 6, "a cube map needs 6 faces, got {}", faces.len());
        let (width, height) = faces[0].dimensions();
        ensure!(width > 0 && width == height, "cube map faces must be square, got {width}x{height}");
        if let Some(face) = faces.iter().find(|f| f.dimensions() != (width, height)) {
            bail!(
                "cube map faces differ in size: {:?} vs {:?}",
                face.dimensions(),
                (width, height)
            );
        }
        let faces: Vec<image::RgbaImage> = faces.iter().map(|f| f.to_rgba8()).collect();
        Ok(Self::cube_from_rgba(device, queue, &faces, width, label))
    }

    /// A 1x1 cube map in the placeholder colour, used when a skybox face is missing.
    pub fn placeholder_cube(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        let face = image::RgbaImage::from_pixel(1, 1, image::Rgba(placeholder_pixel()));
        let faces = vec![face; 6];
        Self::cube_from_rgba(device, queue, &faces, 1, label)
    }

    fn cube_from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[image::RgbaImage],
        edge: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: edge,
                height: edge,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                },
                face,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * edge),
                    rows_per_image: Some(edge),
                },
                wgpu::Extent3d {
                    width: edge,
                    height: edge,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = create_sampler(device, Wrap::Clamp);

        Self {
            texture,
            view,
            sampler,
        }
    }
}

fn placeholder_pixel() -> [u8; 4] {
    [255, 0, 255, 255]
}

pub fn create_sampler(device: &wgpu::Device, wrap: Wrap) -> wgpu::Sampler {
    let address_mode = wrap.address_mode();
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_modes_map_to_address_modes() {
        assert_eq!(Wrap::default().address_mode(), wgpu::AddressMode::Repeat);
        assert_eq!(Wrap::Clamp.address_mode(), wgpu::AddressMode::ClampToEdge);
    }

    #[test]
    fn specular_maps_are_not_gamma_decoded() {
        assert_eq!(ColourSpace::Linear.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert!(!ColourSpace::Linear.format().is_srgb());
        assert_eq!(ColourSpace::default().format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn depth_format_has_stencil() {
        assert!(Texture::DEPTH_FORMAT.has_stencil_aspect());
        assert!(Texture::DEPTH_FORMAT.has_depth_aspect());
    }
}
