use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/// Flat-coloured silhouette drawn only outside the stencil mask.
///
/// Bind groups: 0 camera, 1 outline colour.
pub async fn mk_outline_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Outline Pipeline Layout",
        &[&layouts.camera, &layouts.colour],
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Outline Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("outline.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        PipelineKind::Outline,
        &layout,
        color_format,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
    .await
}
