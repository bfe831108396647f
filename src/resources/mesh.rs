use std::path::Path;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::model::{self, ModelVertex},
    resources::MeshData,
};

/// Converts a triangulated, single-indexed tobj mesh into vertices.
/// Missing normals or texture coordinates read as zero.
pub fn mesh_data(m: tobj::Model) -> MeshData {
    let mesh = m.mesh;
    let vertices = (0..mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
            tex_coords: [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
        })
        .collect();

    MeshData {
        name: m.name,
        vertices,
        indices: mesh.indices,
        material: mesh.material_id,
    }
}

/// Uploads one mesh. Empty meshes and meshes whose indices point past their
/// vertices are skipped with a warning.
pub fn upload(device: &wgpu::Device, data: &MeshData, file_name: &Path) -> Option<model::Mesh> {
    if data.indices.is_empty() {
        log::warn!("Mesh {} in {} has no faces", data.name, file_name.display());
        return None;
    }
    if data.indices.iter().any(|&i| i as usize >= data.vertices.len()) {
        log::warn!(
            "Mesh {} in {} indexes past its {} vertices",
            data.name,
            file_name.display(),
            data.vertices.len()
        );
        return None;
    }

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Vertex Buffer", data.name)),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Index Buffer", data.name)),
        // single_index makes one index address position, normal and texture coordinates
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Some(model::Mesh {
        name: data.name.clone(),
        vertex_buffer,
        index_buffer,
        num_elements: data.indices.len() as u32,
        // meshes without a material fall back to the default material when drawn
        material: data.material.unwrap_or(usize::MAX),
    })
}
