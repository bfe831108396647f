use crate::{
    data_structures::{geometry::PositionVertex, model::Vertex},
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/// Bind groups: 0 cube map, 1 camera. No instance buffer; the box is always centred on the eye.
pub async fn mk_skybox_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(
        device,
        "Skybox Pipeline Layout",
        &[&layouts.cube, &layouts.camera],
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        PipelineKind::Skybox,
        &layout,
        color_format,
        &[PositionVertex::desc()],
        shader,
    )
    .await
}
