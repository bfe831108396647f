use wgpu::util::DeviceExt;

use crate::{
    camera::Camera,
    config::LightingConfig,
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::{Layouts, mk_pipeline_layout, mk_render_pipeline},
    render::PipelineKind,
};

/// Number of point light slots in the lighting uniform.
pub const MAX_POINT_LIGHTS: usize = 4;

// Every field is a vec4 so the Rust layout matches WGSL's uniform alignment rules.

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLight {
    direction: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    position: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    /// constant, linear, quadratic
    attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLight {
    position: [f32; 4],
    direction: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    attenuation: [f32; 4],
    /// Cosines of the inner and outer cone angles.
    cutoff: [f32; 4],
}

/// Everything the lit shader needs besides the camera and the material maps.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    directional: DirectionalLight,
    points: [PointLight; MAX_POINT_LIGHTS],
    spot: SpotLight,
    /// x: material shininess, y: number of active point lights
    params: [f32; 4],
}

fn splat(v: f32) -> [f32; 4] {
    [v, v, v, 0.0]
}

fn vec4(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

impl LightingUniform {
    /// Builds the uniform from the lighting setup and the point light positions.
    /// Positions beyond [`MAX_POINT_LIGHTS`] are ignored with a warning.
    pub fn new(config: &LightingConfig, point_positions: &[[f32; 3]]) -> Self {
        if point_positions.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights configured, only the first {MAX_POINT_LIGHTS} are lit",
                point_positions.len()
            );
        }
        let attenuation = [
            config.attenuation.constant,
            config.attenuation.linear,
            config.attenuation.quadratic,
            0.0,
        ];
        let mut points = [PointLight::default(); MAX_POINT_LIGHTS];
        for (slot, position) in points.iter_mut().zip(point_positions) {
            *slot = PointLight {
                position: vec4(*position, 1.0),
                ambient: splat(config.point_ambient),
                diffuse: splat(config.point_diffuse),
                specular: splat(config.point_specular),
                attenuation,
            };
        }
        let count = point_positions.len().min(MAX_POINT_LIGHTS);

        Self {
            directional: DirectionalLight {
                direction: vec4(config.directional_direction, 0.0),
                ambient: splat(config.directional_ambient),
                diffuse: splat(config.directional_diffuse),
                specular: splat(config.directional_specular),
            },
            points,
            spot: SpotLight {
                position: [0.0, 0.0, 0.0, 1.0],
                direction: [0.0, 0.0, -1.0, 0.0],
                ambient: splat(config.spot_ambient),
                diffuse: splat(config.spot_diffuse),
                specular: splat(config.spot_specular),
                attenuation,
                cutoff: [
                    config.spot_cutoff.to_radians().cos(),
                    config.spot_outer_cutoff.to_radians().cos(),
                    0.0,
                    0.0,
                ],
            },
            params: [config.shininess, count as f32, 0.0, 0.0],
        }
    }

    /// The spotlight is a flashlight: it sits at the camera and points where it looks.
    pub fn follow_camera(&mut self, camera: &Camera) {
        self.spot.position = vec4(camera.position.into(), 1.0);
        self.spot.direction = vec4(camera.front().into(), 0.0);
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: &LightingUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lighting Buffer"),
        contents: bytemuck::cast_slice(&[*uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("lighting_bind_group_layout"),
    })
}

/// Unlit white cubes marking where the point lights are.
pub async fn mk_marker_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = mk_pipeline_layout(device, "Light Marker Pipeline Layout", &[&layouts.camera]);
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Light Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("light.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        PipelineKind::LightMarker,
        &layout,
        color_format,
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
    .await
}
