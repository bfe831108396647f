use crate::{
    data_structures::{geometry::QuadVertex, model::Vertex},
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/// Draws the offscreen colour target onto the surface with a full-screen quad.
pub async fn mk_composite_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Composite Pipeline Layout", &[&layouts.texture]);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Composite Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("composite.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        PipelineKind::Composite,
        &layout,
        surface_format,
        &[QuadVertex::desc()],
        shader,
    )
    .await
}
