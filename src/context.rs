//! GPU and window context.
//!
//! [`Context`] owns everything that lives on the GPU for the whole run: the
//! surface, device and queue, the offscreen colour and depth-stencil targets,
//! the pipelines, the uniform buffers, the static geometry and the loaded
//! textures and model. [`Context::render`] walks a [`FramePlan`] and turns it
//! into two wgpu render passes: one offscreen, one onto the surface.

use std::{ops::Range, sync::Arc};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraUniform, Projection},
    config::Config,
    data_structures::{
        geometry,
        instance::InstanceRaw,
        model::{DrawModel, Material, Model},
        texture::{ColourSpace, Texture, Wrap},
    },
    pipelines::{
        self, Layouts, Pipelines,
        light::{self, LightingUniform},
    },
    render::{Clear, Draw, FramePlan, Geometry, OUTLINE_STENCIL, PipelineKind, Target},
    resources,
};

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct LightingResources {
    pub uniform: LightingUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Vertex buffers for the procedural geometry.
#[derive(Debug)]
struct GeometryBuffers {
    cube: wgpu::Buffer,
    billboard: wgpu::Buffer,
    skybox: wgpu::Buffer,
    screen_quad: wgpu::Buffer,
}

impl GeometryBuffers {
    fn new(device: &wgpu::Device) -> Self {
        let vertex_buffer = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        Self {
            cube: vertex_buffer("Cube Vertex Buffer", bytemuck::cast_slice(&geometry::cube())),
            billboard: vertex_buffer(
                "Billboard Vertex Buffer",
                bytemuck::cast_slice(&geometry::billboard()),
            ),
            skybox: vertex_buffer("Skybox Vertex Buffer", bytemuck::cast_slice(&geometry::skybox())),
            screen_quad: vertex_buffer(
                "Screen Quad Vertex Buffer",
                bytemuck::cast_slice(&geometry::screen_quad()),
            ),
        }
    }

    /// Buffer and vertex count of a non-indexed geometry. `None` for the model.
    fn get(&self, geometry: Geometry) -> Option<(&wgpu::Buffer, u32)> {
        match geometry {
            Geometry::Cube => Some((&self.cube, geometry::CUBE_VERTEX_COUNT)),
            Geometry::Billboard => Some((&self.billboard, geometry::QUAD_VERTEX_COUNT)),
            Geometry::Skybox => Some((&self.skybox, geometry::CUBE_VERTEX_COUNT)),
            Geometry::ScreenQuad => Some((&self.screen_quad, geometry::QUAD_VERTEX_COUNT)),
            Geometry::Model => None,
        }
    }
}

/// Textures bound by the frame, each already wrapped in its bind group.
#[derive(Debug)]
struct SceneTextures {
    container: Material,
    grass: wgpu::BindGroup,
    window: wgpu::BindGroup,
    skybox: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub camera: CameraResources,
    pub lighting: LightingResources,
    pub model: Model,
    depth_texture: Texture,
    offscreen: Texture,
    offscreen_bind_group: wgpu::BindGroup,
    outline_bind_group: wgpu::BindGroup,
    geometry: GeometryBuffers,
    textures: SceneTextures,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl Context {
    pub async fn new(window: Arc<Window>, app_config: &Config) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle_from_env());

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {}", adapter.get_info().name);

        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;
        device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
            log::error!("Uncaptured GPU error: {error}");
        }));

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The composite copies sRGB-encoded colour straight through, so prefer an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("the surface supports no formats on this adapter"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes.first().copied().unwrap_or_default(),
            alpha_mode: surface_caps.alpha_modes.first().copied().unwrap_or_default(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layouts = Layouts::new(&device);

        log::info!("Pipelines");
        let pipelines = Pipelines::new(&device, &layouts, surface_format).await;

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera = CameraResources {
            uniform: camera_uniform,
            bind_group: pipelines::uniform_bind_group(
                &device,
                &layouts.camera,
                &camera_buffer,
                "camera_bind_group",
            ),
            buffer: camera_buffer,
        };

        let lighting_uniform =
            LightingUniform::new(&app_config.lighting, &app_config.scene.point_light_positions);
        let lighting_buffer = light::mk_buffer(&device, &lighting_uniform);
        let lighting = LightingResources {
            uniform: lighting_uniform,
            bind_group: pipelines::uniform_bind_group(
                &device,
                &layouts.lighting,
                &lighting_buffer,
                "lighting_bind_group",
            ),
            buffer: lighting_buffer,
        };

        let outline_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Outline Colour Buffer"),
            contents: bytemuck::cast_slice(&app_config.scene.outline_colour),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let outline_bind_group = pipelines::uniform_bind_group(
            &device,
            &layouts.colour,
            &outline_buffer,
            "outline_bind_group",
        );

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let offscreen =
            Texture::create_render_target(&device, [config.width, config.height], "offscreen_target");
        let offscreen_bind_group =
            pipelines::texture_bind_group(&device, &layouts.texture, &offscreen, "offscreen_bind_group");

        log::info!("Loading assets from {}", app_config.assets.root.display());
        let assets = &app_config.assets;
        let container_diffuse_path = assets.path(&assets.container_diffuse);
        let container_specular_path = assets.path(&assets.container_specular);
        let grass_path = assets.path(&assets.grass);
        let window_path = assets.path(&assets.window);
        let skybox_paths = assets.skybox_paths();
        let model_path = assets.model_path();
        let (diffuse, specular, grass, window_pane, skybox, model) = futures::join!(
            resources::texture::load_texture(
                &container_diffuse_path,
                Wrap::Repeat,
                ColourSpace::Srgb,
                &device,
                &queue
            ),
            resources::texture::load_texture(
                &container_specular_path,
                Wrap::Repeat,
                ColourSpace::Linear,
                &device,
                &queue
            ),
            resources::texture::load_texture(
                &grass_path,
                Wrap::Clamp,
                ColourSpace::Srgb,
                &device,
                &queue
            ),
            resources::texture::load_texture(
                &window_path,
                Wrap::Clamp,
                ColourSpace::Srgb,
                &device,
                &queue
            ),
            resources::texture::load_cube_map(&skybox_paths, &device, &queue),
            resources::load_model_obj(&model_path, &device, &queue, &layouts.material),
        );
        if model.is_empty() {
            log::warn!("The loaded model has no meshes and will not be drawn");
        }

        let textures = SceneTextures {
            container: Material::new(&device, "container", &diffuse, &specular, &layouts.material),
            grass: pipelines::texture_bind_group(&device, &layouts.texture, &grass, "grass_bind_group"),
            window: pipelines::texture_bind_group(
                &device,
                &layouts.texture,
                &window_pane,
                "window_bind_group",
            ),
            skybox: pipelines::texture_bind_group(&device, &layouts.cube, &skybox, "skybox_bind_group"),
        };

        let geometry = GeometryBuffers::new(&device);
        let (instance_buffer, instance_capacity) = mk_instance_buffer(&device, INITIAL_INSTANCES);

        log::info!("Context ready");
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            layouts,
            pipelines,
            camera,
            lighting,
            model,
            depth_texture,
            offscreen,
            offscreen_bind_group,
            outline_bind_group,
            geometry,
            textures,
            instance_buffer,
            instance_capacity,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigures the surface and recreates the size-dependent targets.
    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.offscreen = Texture::create_render_target(&self.device, [width, height], "offscreen_target");
        self.offscreen_bind_group = pipelines::texture_bind_group(
            &self.device,
            &self.layouts.texture,
            &self.offscreen,
            "offscreen_bind_group",
        );
        log::debug!("Resized render targets to {width}x{height}");
    }

    /// Uploads this frame's camera and lighting uniforms.
    pub fn update_uniforms(&mut self, camera: &Camera, projection: &Projection) {
        self.camera.uniform.update_view_proj(camera, projection);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.lighting.uniform.follow_camera(camera);
        self.queue.write_buffer(
            &self.lighting.buffer,
            0,
            bytemuck::cast_slice(&[self.lighting.uniform]),
        );
    }

    fn write_instances(&mut self, plan: &FramePlan) {
        let instances: Vec<InstanceRaw> = plan.draws().map(|d| d.transform.to_raw()).collect();
        if instances.len() > self.instance_capacity {
            let (buffer, capacity) = mk_instance_buffer(&self.device, instances.len());
            self.instance_buffer = buffer;
            self.instance_capacity = capacity;
        }
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
    }

    /// Renders one frame and presents it.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// a timed out or occluded surface just skips the frame.
    pub fn render(&mut self, plan: &FramePlan) {
        let output = match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame) => frame,
            wgpu::CurrentSurfaceTexture::Suboptimal(frame) => {
                log::debug!("Surface is suboptimal");
                frame
            }
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => return,
            wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
                log::warn!("Surface lost or outdated, reconfiguring");
                let size = self.window.inner_size();
                self.resize(size.width, size.height);
                return;
            }
            wgpu::CurrentSurfaceTexture::Validation => {
                log::error!("Unable to acquire the next surface texture");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.write_instances(plan);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut instance_index = 0u32;
        for group in plan.target_groups() {
            let target = group[0].target;
            let clear = group.iter().find_map(|pass| pass.clear);
            let mut render_pass = self.begin_pass(&mut encoder, target, clear, &view);
            if target == Target::Offscreen {
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                render_pass.set_stencil_reference(OUTLINE_STENCIL);
            }
            for pass in group {
                for draw in &pass.draws {
                    self.draw(&mut render_pass, draw, instance_index..instance_index + 1);
                    instance_index += 1;
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        target: Target,
        clear: Option<Clear>,
        surface_view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'e> {
        let colour_load = match clear {
            Some(clear) => wgpu::LoadOp::Clear(clear.colour),
            None => wgpu::LoadOp::Load,
        };
        let (view, depth_stencil_attachment) = match target {
            Target::Offscreen => (
                &self.offscreen.view,
                Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(c.depth)),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(c.stencil)),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
            ),
            Target::Screen => (surface_view, None),
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(match target {
                Target::Offscreen => "Offscreen Pass",
                Target::Screen => "Composite Pass",
            }),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: colour_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        })
    }

    fn draw<'p>(&'p self, render_pass: &mut wgpu::RenderPass<'p>, draw: &Draw, instances: Range<u32>) {
        render_pass.set_pipeline(self.pipelines.get(draw.pipeline));
        match draw.pipeline {
            PipelineKind::Skybox => {
                render_pass.set_bind_group(0, &self.textures.skybox, &[]);
                render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            }
            PipelineKind::LightMarker => {
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
            }
            PipelineKind::Lit | PipelineKind::LitMarking => {
                render_pass.set_bind_group(0, &self.textures.container.bind_group, &[]);
                render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(2, &self.lighting.bind_group, &[]);
            }
            PipelineKind::Grass => {
                render_pass.set_bind_group(0, &self.textures.grass, &[]);
                render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            }
            PipelineKind::Window => {
                render_pass.set_bind_group(0, &self.textures.window, &[]);
                render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            }
            PipelineKind::Outline => {
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &self.outline_bind_group, &[]);
            }
            PipelineKind::Composite => {
                render_pass.set_bind_group(0, &self.offscreen_bind_group, &[]);
            }
        }

        match self.geometry.get(draw.geometry) {
            Some((buffer, vertex_count)) => {
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..vertex_count, instances);
            }
            None => {
                render_pass.draw_model_instanced(
                    &self.model,
                    &self.textures.container.bind_group,
                    instances,
                );
            }
        }
    }
}

const INITIAL_INSTANCES: usize = 128;

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> (wgpu::Buffer, usize) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    (buffer, capacity)
}
