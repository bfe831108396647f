//! Render pipelines.
//!
//! One pipeline exists per [`PipelineKind`]. The fixed-function state of each
//! pipeline comes from [`PipelineKind::state`], so what the frame plan says
//! and what the GPU does cannot drift apart.
//!
//! Shader modules and pipelines are created inside a validation error scope.
//! A shader that fails to compile is logged and the (invalid) pipeline is kept;
//! draws using it then show up as missing geometry instead of stopping the demo.

use crate::{
    data_structures::texture::Texture,
    render::{PipelineKind, Target},
};

pub mod composite;
pub mod light;
pub mod lit;
pub mod outline;
pub mod skybox;
pub mod transparent;

/// Bind group layouts shared between pipelines and the resources bound to them.
#[derive(Debug)]
pub struct Layouts {
    /// The camera uniform.
    pub camera: wgpu::BindGroupLayout,
    /// The lighting uniform used by the lit shader.
    pub lighting: wgpu::BindGroupLayout,
    /// Diffuse and specular maps with their samplers.
    pub material: wgpu::BindGroupLayout,
    /// One 2D texture and its sampler.
    pub texture: wgpu::BindGroupLayout,
    /// One cube map and its sampler.
    pub cube: wgpu::BindGroupLayout,
    /// The outline colour.
    pub colour: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            camera: uniform_layout(device, "camera_bind_group_layout"),
            lighting: light::mk_bind_group_layout(device),
            material: material_layout(device),
            texture: texture_layout(device, wgpu::TextureViewDimension::D2, "texture_bind_group_layout"),
            cube: texture_layout(device, wgpu::TextureViewDimension::Cube, "cube_bind_group_layout"),
            colour: uniform_layout(device, "colour_bind_group_layout"),
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_layout(
    device: &wgpu::Device,
    view_dimension: wgpu::TextureViewDimension,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture_entry(0, view_dimension), sampler_entry(1)],
        label: Some(label),
    })
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0, wgpu::TextureViewDimension::D2),
            sampler_entry(1),
            texture_entry(2, wgpu::TextureViewDimension::D2),
            sampler_entry(3),
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// Binds `texture` against a layout made by [`Layouts`] for a single texture or cube map.
pub fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
        label: Some(label),
    })
}

/// Binds a whole uniform buffer at binding 0.
pub fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(label),
    })
}

/// All pipelines of the frame.
#[derive(Debug)]
pub struct Pipelines {
    skybox: wgpu::RenderPipeline,
    light_marker: wgpu::RenderPipeline,
    lit_marking: wgpu::RenderPipeline,
    lit: wgpu::RenderPipeline,
    grass: wgpu::RenderPipeline,
    outline: wgpu::RenderPipeline,
    window: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
}

impl Pipelines {
    /// Builds every pipeline. `surface_format` is only used by the composite,
    /// everything else renders into the offscreen target.
    pub async fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let offscreen = Texture::OFFSCREEN_FORMAT;
        Self {
            skybox: skybox::mk_skybox_pipeline(device, layouts, offscreen).await,
            light_marker: light::mk_marker_pipeline(device, layouts, offscreen).await,
            lit_marking: lit::mk_lit_pipeline(device, layouts, offscreen, PipelineKind::LitMarking).await,
            lit: lit::mk_lit_pipeline(device, layouts, offscreen, PipelineKind::Lit).await,
            grass: transparent::mk_grass_pipeline(device, layouts, offscreen).await,
            outline: outline::mk_outline_pipeline(device, layouts, offscreen).await,
            window: transparent::mk_window_pipeline(device, layouts, offscreen).await,
            composite: composite::mk_composite_pipeline(device, layouts, surface_format).await,
        }
    }

    pub fn get(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Skybox => &self.skybox,
            PipelineKind::LightMarker => &self.light_marker,
            PipelineKind::LitMarking => &self.lit_marking,
            PipelineKind::Lit => &self.lit,
            PipelineKind::Grass => &self.grass,
            PipelineKind::Outline => &self.outline,
            PipelineKind::Window => &self.window,
            PipelineKind::Composite => &self.composite,
        }
    }
}

/// Creates a pipeline layout from bind group layouts in group order.
pub fn mk_pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    let layouts: Vec<Option<&wgpu::BindGroupLayout>> =
        bind_group_layouts.iter().copied().map(Some).collect();
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &layouts,
        immediate_size: 0,
    })
}

/// Compiles a shader module, logging instead of failing when validation rejects it.
pub async fn create_shader_module(
    device: &wgpu::Device,
    shader: wgpu::ShaderModuleDescriptor<'_>,
) -> wgpu::ShaderModule {
    let label = shader.label.unwrap_or("<unnamed>").to_string();
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(shader);
    if let Some(error) = scope.pop().await {
        log::error!("Shader {label} failed to compile: {error}");
    }
    module
}

/// Builds a render pipeline whose depth, stencil and blend state follow `kind`.
///
/// Entry points are `vs_main` and `fs_main`. Culling is off: the billboards and
/// the outline are seen from both sides.
pub async fn mk_render_pipeline(
    device: &wgpu::Device,
    kind: PipelineKind,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
    shader: wgpu::ShaderModuleDescriptor<'_>,
) -> wgpu::RenderPipeline {
    let shader = create_shader_module(device, shader).await;
    let state = kind.state();
    let depth_format = match kind.target() {
        Target::Offscreen => Some(Texture::DEPTH_FORMAT),
        Target::Screen => None,
    };
    let label = format!("{kind:?} Pipeline");

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: state.blend(),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.and_then(|format| state.depth_stencil(format)),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    });
    if let Some(error) = scope.pop().await {
        log::error!("{label} is invalid and will not draw: {error}");
    }
    pipeline
}
