//! Frame composition.
//!
//! A frame is described by a [`FramePlan`]: an ordered list of
//! [`PassDescriptor`]s, each naming its target, the clear it performs and the
//! draws it issues. Every draw names the [`PipelineKind`] it uses, and every
//! pipeline kind carries a fixed [`PassState`] (depth test, depth write,
//! stencil mode and blending). The same states are used to build the wgpu
//! pipelines, so the plan can be inspected in tests without touching the GPU.
//!
//! # Pass order
//!
//! 1. [`PassKind::BindOffscreen`] clears colour, depth and stencil
//! 2. [`PassKind::Skybox`] with depth writes off
//! 3. [`PassKind::LightMarkers`]
//! 4. [`PassKind::PrimaryLit`] writes stencil 1
//! 5. [`PassKind::LoadedModel`]
//! 6. [`PassKind::DecorativeCubes`], each cube followed by its grass quad
//! 7. [`PassKind::GrassRing`]
//! 8. [`PassKind::Outline`] only where stencil != 1
//! 9. [`PassKind::Windows`], blended in placement order
//! 10. [`PassKind::Composite`] copies the offscreen colour to the screen

use cgmath::Vector3;

use crate::{config::SceneConfig, data_structures::instance::Instance};

/// Which attachment set a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Offscreen colour texture plus the depth-stencil texture.
    Offscreen,
    /// The window surface. No depth or stencil attachment.
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilMode {
    /// No stencil attachment is bound.
    Disabled,
    /// Test always passes and nothing is written.
    Ignore,
    /// Test always passes and `reference` is written wherever a fragment lands.
    Mark { reference: u32 },
    /// Only fragments where the buffer differs from `reference` pass. Nothing is written.
    Outside { reference: u32 },
}

impl StencilMode {
    pub fn reference(&self) -> Option<u32> {
        match self {
            StencilMode::Mark { reference } | StencilMode::Outside { reference } => {
                Some(*reference)
            }
            StencilMode::Disabled | StencilMode::Ignore => None,
        }
    }

    pub fn writes(&self) -> bool {
        matches!(self, StencilMode::Mark { .. })
    }

    fn face(&self) -> wgpu::StencilFaceState {
        match self {
            StencilMode::Disabled | StencilMode::Ignore => wgpu::StencilFaceState::IGNORE,
            StencilMode::Mark { .. } => wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::Always,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: wgpu::StencilOperation::Replace,
            },
            StencilMode::Outside { .. } => wgpu::StencilFaceState {
                compare: wgpu::CompareFunction::NotEqual,
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: wgpu::StencilOperation::Keep,
            },
        }
    }

    /// The wgpu stencil state for this mode.
    pub fn to_wgpu(&self) -> wgpu::StencilState {
        let face = self.face();
        wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask: if self.writes() { 0xff } else { 0x00 },
        }
    }
}

/// Fixed-function state a draw runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub stencil: StencilMode,
    pub alpha_blend: bool,
}

impl PassState {
    const OPAQUE: PassState = PassState {
        depth_test: true,
        depth_write: true,
        stencil: StencilMode::Ignore,
        alpha_blend: false,
    };

    /// Depth-stencil state for a pipeline drawing into a target with `format`.
    /// `None` when the pass has neither depth nor stencil.
    pub fn depth_stencil(&self, format: wgpu::TextureFormat) -> Option<wgpu::DepthStencilState> {
        if !self.depth_test && self.stencil == StencilMode::Disabled {
            return None;
        }
        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(self.depth_write),
            depth_compare: Some(if self.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            }),
            stencil: self.stencil.to_wgpu(),
            bias: wgpu::DepthBiasState::default(),
        })
    }

    pub fn blend(&self) -> Option<wgpu::BlendState> {
        Some(if self.alpha_blend {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        })
    }
}

/// One render pipeline per shader program of the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Skybox,
    LightMarker,
    /// The lit shader while it writes the outline mask.
    LitMarking,
    Lit,
    Grass,
    Outline,
    Window,
    Composite,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 8] = [
        PipelineKind::Skybox,
        PipelineKind::LightMarker,
        PipelineKind::LitMarking,
        PipelineKind::Lit,
        PipelineKind::Grass,
        PipelineKind::Outline,
        PipelineKind::Window,
        PipelineKind::Composite,
    ];

    pub fn state(&self) -> PassState {
        match self {
            PipelineKind::Skybox => PassState {
                depth_write: false,
                ..PassState::OPAQUE
            },
            PipelineKind::LightMarker | PipelineKind::Lit => PassState::OPAQUE,
            PipelineKind::LitMarking => PassState {
                stencil: StencilMode::Mark {
                    reference: OUTLINE_STENCIL,
                },
                ..PassState::OPAQUE
            },
            PipelineKind::Grass | PipelineKind::Window => PassState {
                alpha_blend: true,
                ..PassState::OPAQUE
            },
            PipelineKind::Outline => PassState {
                stencil: StencilMode::Outside {
                    reference: OUTLINE_STENCIL,
                },
                ..PassState::OPAQUE
            },
            PipelineKind::Composite => PassState {
                depth_test: false,
                depth_write: false,
                stencil: StencilMode::Disabled,
                alpha_blend: false,
            },
        }
    }

    pub fn target(&self) -> Target {
        match self {
            PipelineKind::Composite => Target::Screen,
            _ => Target::Offscreen,
        }
    }
}

/// Stencil value written under the primary lit geometry and tested by the outline.
pub const OUTLINE_STENCIL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// The 36-vertex textured cube.
    Cube,
    /// The cube's back face, used for grass and windows.
    Billboard,
    Skybox,
    /// Every mesh of the imported model.
    Model,
    ScreenQuad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub geometry: Geometry,
    pub pipeline: PipelineKind,
    pub transform: Instance,
}

impl Draw {
    pub fn new(geometry: Geometry, pipeline: PipelineKind, transform: Instance) -> Self {
        Self {
            geometry,
            pipeline,
            transform,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    BindOffscreen,
    Skybox,
    LightMarkers,
    PrimaryLit,
    LoadedModel,
    DecorativeCubes,
    GrassRing,
    Outline,
    Windows,
    Composite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clear {
    pub colour: wgpu::Color,
    pub depth: f32,
    pub stencil: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    pub kind: PassKind,
    pub target: Target,
    pub clear: Option<Clear>,
    pub draws: Vec<Draw>,
}

impl PassDescriptor {
    fn new(kind: PassKind, target: Target, draws: Vec<Draw>) -> Self {
        Self {
            kind,
            target,
            clear: None,
            draws,
        }
    }

    /// States of the draws in this pass, in draw order.
    pub fn states(&self) -> impl Iterator<Item = PassState> + '_ {
        self.draws.iter().map(|d| d.pipeline.state())
    }
}

/// The complete, ordered description of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    passes: Vec<PassDescriptor>,
}

impl FramePlan {
    pub fn compose(scene: &SceneConfig) -> Self {
        let offscreen = |kind, draws| PassDescriptor::new(kind, Target::Offscreen, draws);

        let bind = PassDescriptor {
            clear: Some(Clear {
                colour: scene.clear_colour,
                depth: 1.0,
                stencil: 0,
            }),
            ..offscreen(PassKind::BindOffscreen, Vec::new())
        };

        let skybox = offscreen(
            PassKind::Skybox,
            vec![Draw::new(Geometry::Skybox, PipelineKind::Skybox, Instance::new())],
        );

        let markers = offscreen(
            PassKind::LightMarkers,
            scene
                .point_light_positions
                .iter()
                .map(|p| Draw::new(Geometry::Cube, PipelineKind::LightMarker, (*p).into()))
                .collect(),
        );

        let primary = offscreen(
            PassKind::PrimaryLit,
            vec![Draw::new(Geometry::Cube, PipelineKind::LitMarking, Instance::new())],
        );

        let model = offscreen(
            PassKind::LoadedModel,
            vec![Draw::new(Geometry::Model, PipelineKind::Lit, Instance::new())],
        );

        let grass_offset = Instance::from(scene.grass_offset);
        let decorative = offscreen(
            PassKind::DecorativeCubes,
            scene
                .cube_positions
                .iter()
                .flat_map(|p| {
                    let cube = Instance::from(*p);
                    let grass = &cube * &grass_offset;
                    [
                        Draw::new(Geometry::Cube, PipelineKind::Lit, cube),
                        Draw::new(Geometry::Billboard, PipelineKind::Grass, grass),
                    ]
                })
                .collect(),
        );

        let ring = offscreen(
            PassKind::GrassRing,
            grass_ring(scene.grass_ring_radius, scene.grass_ring_count)
                .map(|p| Draw::new(Geometry::Billboard, PipelineKind::Grass, p.into()))
                .collect(),
        );

        let outline = offscreen(
            PassKind::Outline,
            vec![Draw::new(
                Geometry::Cube,
                PipelineKind::Outline,
                Instance::scaled(scene.outline_scale),
            )],
        );

        // TODO: sort back to front by camera distance once overlapping windows need to blend correctly
        let windows = offscreen(
            PassKind::Windows,
            scene
                .window_positions
                .iter()
                .map(|p| Draw::new(Geometry::Billboard, PipelineKind::Window, (*p).into()))
                .collect(),
        );

        let composite = PassDescriptor {
            clear: Some(Clear {
                colour: scene.clear_colour,
                depth: 1.0,
                stencil: 0,
            }),
            ..PassDescriptor::new(
                PassKind::Composite,
                Target::Screen,
                vec![Draw::new(
                    Geometry::ScreenQuad,
                    PipelineKind::Composite,
                    Instance::new(),
                )],
            )
        };

        Self {
            passes: vec![
                bind, skybox, markers, primary, model, decorative, ring, outline, windows,
                composite,
            ],
        }
    }

    pub fn passes(&self) -> &[PassDescriptor] {
        &self.passes
    }

    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(|p| p.kind).collect()
    }

    pub fn pass(&self, kind: PassKind) -> Option<&PassDescriptor> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    /// Every draw of the frame in issue order.
    pub fn draws(&self) -> impl Iterator<Item = &Draw> {
        self.passes.iter().flat_map(|p| p.draws.iter())
    }

    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }

    /// Consecutive passes that share a target. Each group becomes one wgpu render pass.
    pub fn target_groups(&self) -> impl Iterator<Item = &[PassDescriptor]> {
        self.passes.chunk_by(|a, b| a.target == b.target)
    }
}

/// Positions on a horizontal circle: `radius * (cos t, 0, sin t)` with `t = 2 pi i / count`.
pub fn grass_ring(radius: f32, count: u32) -> impl Iterator<Item = Vector3<f32>> {
    (0..count).map(move |i| {
        let theta = std::f32::consts::TAU * i as f32 / count as f32;
        Vector3::new(radius * theta.cos(), 0.0, radius * theta.sin())
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    use super::*;

    fn plan() -> FramePlan {
        FramePlan::compose(&SceneConfig::default())
    }

    #[test]
    fn passes_follow_the_fixed_order() {
        assert_eq!(
            plan().kinds(),
            vec![
                PassKind::BindOffscreen,
                PassKind::Skybox,
                PassKind::LightMarkers,
                PassKind::PrimaryLit,
                PassKind::LoadedModel,
                PassKind::DecorativeCubes,
                PassKind::GrassRing,
                PassKind::Outline,
                PassKind::Windows,
                PassKind::Composite,
            ]
        );
    }

    #[test]
    fn only_the_first_pass_of_each_target_clears() {
        let plan = plan();
        let bind = plan.pass(PassKind::BindOffscreen).unwrap();
        let clear = bind.clear.unwrap();
        assert_eq!(clear.depth, 1.0);
        assert_eq!(clear.stencil, 0);
        assert_eq!(clear.colour, wgpu::Color::BLACK);
        let clearing: Vec<_> = plan
            .passes()
            .iter()
            .filter(|p| p.clear.is_some())
            .map(|p| p.kind)
            .collect();
        assert_eq!(clearing, vec![PassKind::BindOffscreen, PassKind::Composite]);
    }

    #[test]
    fn everything_but_the_composite_renders_offscreen() {
        let groups: Vec<_> = plan().target_groups().map(|g| (g[0].target, g.len())).collect();
        assert_eq!(groups, vec![(Target::Offscreen, 9), (Target::Screen, 1)]);
    }

    #[test]
    fn skybox_keeps_depth_test_but_never_writes_depth() {
        let plan = plan();
        let state = plan.pass(PassKind::Skybox).unwrap().states().next().unwrap();
        assert!(state.depth_test);
        assert!(!state.depth_write);
        assert!(!state.stencil.writes());
    }

    #[test]
    fn primary_geometry_marks_the_stencil() {
        let plan = plan();
        let pass = plan.pass(PassKind::PrimaryLit).unwrap();
        assert_eq!(pass.draws.len(), 1);
        let state = pass.draws[0].pipeline.state();
        assert_eq!(state.stencil, StencilMode::Mark { reference: 1 });
        let stencil = state.stencil.to_wgpu();
        assert_eq!(stencil.write_mask, 0xff);
        assert_eq!(stencil.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(stencil.front.pass_op, wgpu::StencilOperation::Replace);
    }

    #[test]
    fn only_the_primary_pass_writes_stencil() {
        let plan = plan();
        let writers: Vec<_> = plan
            .passes()
            .iter()
            .filter(|p| p.states().any(|s| s.stencil.writes()))
            .map(|p| p.kind)
            .collect();
        assert_eq!(writers, vec![PassKind::PrimaryLit]);
    }

    #[test]
    fn outline_is_scaled_and_tests_not_equal_without_writes() {
        let plan = plan();
        let pass = plan.pass(PassKind::Outline).unwrap();
        let draw = &pass.draws[0];
        assert_eq!(draw.geometry, Geometry::Cube);
        assert_relative_eq!(draw.transform.scale.x, 1.1);
        assert_relative_eq!(draw.transform.scale.z, 1.1);

        let state = draw.pipeline.state();
        assert_eq!(state.stencil, StencilMode::Outside { reference: 1 });
        let ds = state.depth_stencil(wgpu::TextureFormat::Depth24PlusStencil8).unwrap();
        assert_eq!(ds.stencil.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(ds.stencil.write_mask, 0);
    }

    #[test]
    fn every_decorative_cube_is_followed_by_its_grass() {
        let scene = SceneConfig::default();
        let plan = FramePlan::compose(&scene);
        let pass = plan.pass(PassKind::DecorativeCubes).unwrap();
        assert_eq!(pass.draws.len(), scene.cube_positions.len() * 2);
        for (pair, position) in pass.draws.chunks(2).zip(&scene.cube_positions) {
            assert_eq!(pair[0].pipeline, PipelineKind::Lit);
            assert_eq!(pair[0].geometry, Geometry::Cube);
            assert_eq!(pair[0].transform.position, Vector3::from(*position));
            assert_eq!(pair[1].pipeline, PipelineKind::Grass);
            assert_eq!(pair[1].geometry, Geometry::Billboard);
            let offset = pair[1].transform.position - pair[0].transform.position;
            assert_relative_eq!(offset.z, -0.01, epsilon = 1e-6);
        }
    }

    #[test]
    fn grass_ring_lies_on_the_circle() {
        let ring: Vec<_> = grass_ring(10.0, 40).collect();
        assert_eq!(ring.len(), 40);
        assert_relative_eq!(ring[0].x, 10.0);
        assert_relative_eq!(ring[0].z, 0.0);
        assert_relative_eq!(ring[10].x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ring[10].z, 10.0, epsilon = 1e-5);
        for p in &ring {
            assert_eq!(p.y, 0.0);
            assert_relative_eq!(p.magnitude(), 10.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn grass_ring_pass_uses_the_configured_count() {
        let plan = plan();
        let pass = plan.pass(PassKind::GrassRing).unwrap();
        assert_eq!(pass.draws.len(), 40);
        assert!(pass.states().all(|s| s.alpha_blend));
    }

    #[test]
    fn windows_are_blended_in_placement_order() {
        let scene = SceneConfig::default();
        let plan = FramePlan::compose(&scene);
        let pass = plan.pass(PassKind::Windows).unwrap();
        let positions: Vec<_> = pass.draws.iter().map(|d| d.transform.position).collect();
        let expected: Vec<_> = scene.window_positions.iter().map(|p| Vector3::from(*p)).collect();
        assert_eq!(positions, expected);
        assert!(pass.states().all(|s| s.alpha_blend && s.depth_test));
    }

    #[test]
    fn light_markers_sit_at_the_light_positions() {
        let scene = SceneConfig::default();
        let plan = FramePlan::compose(&scene);
        let pass = plan.pass(PassKind::LightMarkers).unwrap();
        assert_eq!(pass.draws.len(), scene.point_light_positions.len());
        for (draw, p) in pass.draws.iter().zip(&scene.point_light_positions) {
            assert_eq!(draw.transform.position, Vector3::from(*p));
            assert_eq!(draw.pipeline, PipelineKind::LightMarker);
        }
    }

    #[test]
    fn composite_has_no_depth_or_stencil() {
        let state = PipelineKind::Composite.state();
        assert!(state.depth_stencil(wgpu::TextureFormat::Depth24PlusStencil8).is_none());
        assert_eq!(PipelineKind::Composite.target(), Target::Screen);
    }

    #[test]
    fn pipeline_targets_match_pass_targets() {
        let plan = plan();
        for pass in plan.passes() {
            for draw in &pass.draws {
                assert_eq!(draw.pipeline.target(), pass.target, "{:?}", pass.kind);
            }
        }
    }

    #[test]
    fn draw_count_covers_every_pass() {
        // skybox + 4 markers + primary + model + 20 decorative + 40 ring + outline + 2 windows + composite
        assert_eq!(plan().draw_count(), 1 + 4 + 1 + 1 + 20 + 40 + 1 + 2 + 1);
        assert_eq!(plan().draws().count(), plan().draw_count());
    }
}
