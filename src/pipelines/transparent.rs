use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/*
 * Grass and windows share the billboard geometry and bind groups
 * (0 texture, 1 camera) but not their shaders: grass discards nearly
 * transparent texels, windows blend every texel.
 */

pub async fn mk_grass_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Grass Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("grass.wgsl").into()),
    };
    mk_billboard_pipeline(device, layouts, color_format, PipelineKind::Grass, shader).await
}

pub async fn mk_window_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Window Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("window.wgsl").into()),
    };
    mk_billboard_pipeline(device, layouts, color_format, PipelineKind::Window, shader).await
}

async fn mk_billboard_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
    kind: PipelineKind,
    shader: wgpu::ShaderModuleDescriptor<'_>,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Billboard Pipeline Layout",
        &[&layouts.texture, &layouts.camera],
    );
    mk_render_pipeline(
        device,
        kind,
        &layout,
        color_format,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
    .await
}
