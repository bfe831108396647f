use std::path::{Path, PathBuf};

use lumen::resources::{ObjData, parse_obj};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn quad() -> ObjData {
    parse_obj(&fixture("quad.obj"))
        .await
        .expect("the quad fixture parses")
}

#[tokio::test]
async fn meshes_are_triangulated_and_single_indexed() {
    let data = quad().await;
    let names: Vec<_> = data.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["panel", "plain"]);

    let panel = &data.meshes[0];
    assert_eq!(panel.vertices.len(), 4);
    // one quad becomes two triangles
    assert_eq!(panel.indices.len(), 6);
    assert!(panel.indices.iter().all(|&i| (i as usize) < panel.vertices.len()));

    let plain = &data.meshes[1];
    assert_eq!(plain.vertices.len(), 3);
    assert_eq!(plain.indices.len(), 3);
}

#[tokio::test]
async fn texture_coordinates_are_flipped() {
    let data = quad().await;
    let panel = &data.meshes[0];
    let top_left = panel
        .vertices
        .iter()
        .find(|v| v.position == [-1.0, 1.0, 0.0])
        .expect("top left corner");
    assert_eq!(top_left.tex_coords, [0.0, 0.0]);
    assert_eq!(top_left.normal, [0.0, 0.0, 1.0]);

    let bottom_left = panel
        .vertices
        .iter()
        .find(|v| v.position == [-1.0, -1.0, 0.0])
        .expect("bottom left corner");
    assert_eq!(bottom_left.tex_coords, [0.0, 1.0]);
}

#[tokio::test]
async fn material_textures_resolve_next_to_the_model() {
    let data = quad().await;
    assert_eq!(data.materials.len(), 2);

    let painted = &data.materials[0];
    assert_eq!(painted.name, "painted");
    assert_eq!(
        painted.diffuse.as_deref(),
        Some(fixture("textures/painted_diffuse.png").as_path())
    );
    assert_eq!(
        painted.specular.as_deref(),
        Some(fixture("textures/painted_specular.png").as_path())
    );

    let bare = &data.materials[1];
    assert_eq!(bare.diffuse, None);
    assert_eq!(bare.specular, None);

    assert_eq!(data.meshes[0].material, Some(0));
    assert_eq!(data.meshes[1].material, Some(1));
}

#[tokio::test]
async fn missing_material_library_keeps_the_geometry() {
    let data = parse_obj(&fixture("broken_library.obj"))
        .await
        .expect("geometry still parses");
    assert!(data.materials.is_empty());
    assert_eq!(data.meshes.len(), 1);
    assert_eq!(data.meshes[0].indices.len(), 3);
    assert_eq!(data.meshes[0].material, None);
}

#[tokio::test]
async fn missing_model_is_an_error() {
    let result = parse_obj(&fixture("does_not_exist.obj")).await;
    assert!(result.is_err());
}
