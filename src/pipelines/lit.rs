use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/// The Phong pipeline shared by the primary cube, the decorative cubes and the
/// imported model. `kind` selects between the stencil-marking and plain variants.
///
/// Bind groups: 0 material, 1 camera, 2 lighting.
pub async fn mk_lit_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    debug_assert!(matches!(kind, PipelineKind::Lit | PipelineKind::LitMarking));
    let layout = mk_pipeline_layout(
        device,
        "Lit Pipeline Layout",
        &[&layouts.material, &layouts.camera, &layouts.lighting],
    );
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lit Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("lit.wgsl").into()),
    };
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
