//! Hard-coded vertex data for the demo's procedural geometry.
//!
//! The tables are written with texture coordinates whose origin is the
//! bottom-left corner of the image. wgpu samples from the top-left, so every
//! accessor flips `v` on the way out, the same way the OBJ importer does.

use super::model::{ModelVertex, Vertex};

/// Unit cube centred on the origin: position, normal, texture coordinates.
/// The first face (six vertices) is the back face at z = -0.5.
#[rustfmt::skip]
const CUBE: [[f32; 8]; 36] = [
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    [ 0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [-0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0],
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],

    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [-0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],

    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0],
    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],

    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0],
    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],

    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [-0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0],
    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],

    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0],
    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
];

pub const CUBE_VERTEX_COUNT: u32 = 36;
pub const QUAD_VERTEX_COUNT: u32 = 6;

pub fn cube() -> Vec<ModelVertex> {
    CUBE.iter()
        .map(|v| ModelVertex {
            position: [v[0], v[1], v[2]],
            normal: [v[3], v[4], v[5]],
            tex_coords: [v[6], 1.0 - v[7]],
        })
        .collect()
}

/// The billboard quad used for grass and windows: the cube's back face.
pub fn billboard() -> Vec<ModelVertex> {
    cube().into_iter().take(QUAD_VERTEX_COUNT as usize).collect()
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Skybox cube with corners at ±1. Only positions; they double as cube map directions.
pub fn skybox() -> Vec<PositionVertex> {
    #[rustfmt::skip]
    const CORNERS: [[i8; 3]; 36] = [
        [-1,  1, -1], [-1, -1, -1], [ 1, -1, -1], [ 1, -1, -1], [ 1,  1, -1], [-1,  1, -1],
        [-1, -1,  1], [-1, -1, -1], [-1,  1, -1], [-1,  1, -1], [-1,  1,  1], [-1, -1,  1],
        [ 1, -1, -1], [ 1, -1,  1], [ 1,  1,  1], [ 1,  1,  1], [ 1,  1, -1], [ 1, -1, -1],
        [-1, -1,  1], [-1,  1,  1], [ 1,  1,  1], [ 1,  1,  1], [ 1, -1,  1], [-1, -1,  1],
        [-1,  1, -1], [ 1,  1, -1], [ 1,  1,  1], [ 1,  1,  1], [-1,  1,  1], [-1,  1, -1],
        [-1, -1, -1], [-1, -1,  1], [ 1, -1, -1], [ 1, -1, -1], [-1, -1,  1], [ 1, -1,  1],
    ];
    CORNERS
        .iter()
        .map(|c| PositionVertex {
            position: [c[0] as f32, c[1] as f32, c[2] as f32],
        })
        .collect()
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl Vertex for QuadVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Two triangles covering normalized device coordinates, used to composite
/// the offscreen colour target onto the surface.
pub fn screen_quad() -> Vec<QuadVertex> {
    #[rustfmt::skip]
    const QUAD: [[f32; 4]; 6] = [
        [-1.0,  1.0,  0.0, 1.0],
        [-1.0, -1.0,  0.0, 0.0],
        [ 1.0, -1.0,  1.0, 0.0],

        [-1.0,  1.0,  0.0, 1.0],
        [ 1.0, -1.0,  1.0, 0.0],
        [ 1.0,  1.0,  1.0, 1.0],
    ];
    QUAD.iter()
        .map(|q| QuadVertex {
            position: [q[0], q[1]],
            tex_coords: [q[2], 1.0 - q[3]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_faces_with_unit_normals() {
        let cube = cube();
        assert_eq!(cube.len(), CUBE_VERTEX_COUNT as usize);
        for face in cube.chunks(6) {
            let normal = face[0].normal;
            assert!(face.iter().all(|v| v.normal == normal));
            let length: f32 = normal.iter().map(|n| n * n).sum();
            assert_eq!(length, 1.0);
            // every vertex of a face lies on the plane the normal points at
            for v in face {
                let d: f32 = v.position.iter().zip(normal).map(|(p, n)| p * n).sum();
                assert_eq!(d, 0.5);
            }
        }
    }

    #[test]
    fn billboard_is_the_back_face() {
        let quad = billboard();
        assert_eq!(quad.len(), QUAD_VERTEX_COUNT as usize);
        assert!(quad.iter().all(|v| v.position[2] == -0.5));
        assert!(quad.iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
    }

    #[test]
    fn texture_coordinates_are_flipped_for_wgpu() {
        let quad = billboard();
        // bottom-left corner of the face samples the bottom row of the image
        assert_eq!(quad[0].position, [-0.5, -0.5, -0.5]);
        assert_eq!(quad[0].tex_coords, [0.0, 1.0]);
        assert_eq!(quad[2].tex_coords, [1.0, 0.0]);
    }

    #[test]
    fn skybox_spans_unit_cube() {
        let sky = skybox();
        assert_eq!(sky.len(), 36);
        assert!(sky.iter().all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }

    #[test]
    fn screen_quad_maps_top_left_to_texture_origin() {
        let quad = screen_quad();
        assert_eq!(quad.len(), 6);
        let top_left = quad.iter().find(|v| v.position == [-1.0, 1.0]).unwrap();
        assert_eq!(top_left.tex_coords, [0.0, 0.0]);
        let bottom_right = quad.iter().find(|v| v.position == [1.0, -1.0]).unwrap();
        assert_eq!(bottom_right.tex_coords, [1.0, 1.0]);
    }
}
