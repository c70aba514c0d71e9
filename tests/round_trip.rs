use glam::{Mat4, Vec2, Vec3};
use once_cell::sync::Lazy;

use crt_scene::document::MaterialKind;
use crt_scene::host::{
    HostCamera, HostImage, HostLight, HostTexture, HostTextureKind, LightKind,
};
use crt_scene::mesh::Polygon;
use crt_scene::{
    export_scene, import_document, Document, HostMaterial, HostMesh, HostObject, HostScene,
    ObjectData, SceneError,
};

/// Every material is referenced by an object so none is dropped on export.
static FULL: Lazy<Document> = Lazy::new(|| {
    Document::from_json(
        r#"{
  "settings": {
    "background_color": [0.05, 0.1, 0.2],
    "image_settings": { "width": 320, "height": 200, "bucket_size": 16 },
    "gi_on": true,
    "reflections_on": false,
    "refractions_on": true
  },
  "camera": {
    "matrix": [0, 0, -1, 0, 1, 0, 1, 0, 0],
    "position": [3, 1.5, -2],
    "fov_degrees": 45
  },
  "lights": [
    { "intensity": 800, "position": [0, 5, 0] },
    { "intensity": 250.5, "position": [-2, 1, 3] }
  ],
  "textures": [
    { "name": "Wood", "type": "bitmap", "file_path": "/textures/wood.png" },
    { "name": "Flat", "type": "albedo", "albedo": [0.9, 0.1, 0.1] },
    { "name": "Board", "type": "checker", "color_A": [1, 1, 1], "color_B": [0, 0, 0], "square_size": 0.5 }
  ],
  "materials": [
    { "type": "diffuse", "albedo": "Wood", "smooth_shading": true, "back_face_culling": false },
    { "type": "reflective", "albedo": [0.7, 0.7, 0.75], "smooth_shading": false, "back_face_culling": true },
    { "type": "refractive", "ior": 1.33, "smooth_shading": true, "back_face_culling": false }
  ],
  "objects": [
    {
      "material_index": 0,
      "vertices": [0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0],
      "triangles": [0, 1, 2, 0, 2, 3],
      "uvs": [0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0]
    },
    { "material_index": 1, "vertices": [0, 0, 1, 2, 0, 1, 0, 2, 1], "triangles": [0, 1, 2] },
    { "material_index": 2, "vertices": [-1, -1, -1, -1, 1, -1, 1, -1, -1], "triangles": [2, 1, 0] }
  ]
}"#,
    )
    .expect("fixture parses")
});

static SMALL: Lazy<Document> = Lazy::new(|| {
    Document::from_json(
        r#"{
  "settings": {
    "background_color": [0, 0, 0],
    "image_settings": { "width": 64, "height": 64 }
  },
  "camera": { "matrix": [1, 0, 0, 0, 1, 0, 0, 0, 1], "position": [0, 0, 0] },
  "lights": [ { "intensity": 10, "position": [1, 1, 1] } ],
  "materials": [ { "type": "constant", "albedo": [1, 1, 1], "smooth_shading": false } ],
  "objects": [ { "material_index": 0, "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0], "triangles": [0, 1, 2] } ]
}"#,
    )
    .expect("fixture parses")
});

fn scene_with_camera() -> HostScene {
    let mut scene = HostScene::new();
    let camera = scene.add_object(HostObject::new(
        "Camera",
        ObjectData::Camera(HostCamera::default()),
    ));
    scene.active_camera = Some(camera);
    scene
}

#[test]
fn export_of_import_reproduces_the_document() {
    FULL.validate().unwrap();
    let mut scene = HostScene::new();
    import_document(&mut scene, &FULL).unwrap();
    let mut exported = export_scene(&scene).unwrap();

    assert!((exported.camera.fov_degrees - FULL.camera.fov_degrees).abs() < 1e-4);
    exported.camera.fov_degrees = FULL.camera.fov_degrees;
    assert_eq!(exported, *FULL);
}

/// Host scene exercising every export path: a mesh with two material slots,
/// a fake-user material, an unused material, a bitmap texture and a light
/// kind the document cannot carry.
fn authored_scene() -> HostScene {
    let mut scene = HostScene::new();
    scene.render.resolution_x = 800;
    scene.render.resolution_y = 600;
    scene.render.bucket_size = 48;
    scene.render.refractions_on = false;
    scene.render.background_color = Vec3::new(0.3, 0.3, 0.35);

    let camera = scene.add_object(
        HostObject::new("Camera", ObjectData::Camera(HostCamera { angle_x: 0.7 })).with_matrix(
            Mat4::from_translation(Vec3::new(4.0, -6.0, 3.0))
                * Mat4::from_rotation_z(0.6)
                * Mat4::from_rotation_x(1.2),
        ),
    );
    scene.active_camera = Some(camera);

    for (name, kind) in [("Bulb", LightKind::Point), ("Sun", LightKind::Sun)] {
        scene.add_object(
            HostObject::new(name, ObjectData::Light(HostLight { kind, energy: 400.0 }))
                .with_matrix(Mat4::from_translation(Vec3::new(-1.0, 2.0, 5.0))),
        );
    }

    scene.upsert_image(HostImage {
        name: "grain.png".into(),
        filepath: "/textures/grain.png".into(),
        packed: false,
    });
    scene.upsert_texture(HostTexture {
        name: "Grain".into(),
        kind: HostTextureKind::Image {
            image: Some("grain.png".into()),
        },
    });
    scene.upsert_texture(HostTexture {
        name: "Tiles".into(),
        kind: HostTextureKind::Checker {
            color_a: Vec3::ONE,
            color_b: Vec3::ZERO,
            square_size: 0.125,
        },
    });

    let mut red = HostMaterial::new("Red");
    red.texture = Some("Grain".into());
    red.smooth_shading = true;
    scene.add_material(red);
    let mut blue = HostMaterial::new("Blue");
    blue.kind = MaterialKind::Reflective;
    blue.base_color = Vec3::new(0.1, 0.2, 0.9);
    blue.use_backface_culling = true;
    scene.add_material(blue);
    scene.add_material(HostMaterial::new("Unused"));
    let mut glass = HostMaterial::new("Glass");
    glass.kind = MaterialKind::Refractive;
    glass.ior = 1.5;
    glass.use_fake_user = true;
    scene.add_material(glass);

    let mut mesh = HostMesh::from_triangles(
        vec![
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.5),
            Vec3::new(0.0, 2.0, 0.0),
        ],
        &[],
    );
    mesh.polygons = vec![
        Polygon {
            vertices: vec![0, 1, 2],
            material_index: 0,
        },
        Polygon {
            vertices: vec![0, 2, 3],
            material_index: 1,
        },
    ];
    mesh.uv_layer = Some(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.5, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    ]);
    scene.add_object(
        HostObject::new("Quad", ObjectData::Mesh(mesh))
            .with_matrix(Mat4::from_translation(Vec3::new(0.5, 1.0, -0.25)))
            .with_material_slots(["Red", "Blue"]),
    );
    scene
}

#[test]
fn exported_scene_survives_import_and_export() {
    let first = export_scene(&authored_scene()).unwrap();
    assert_eq!(first.lights.len(), 1);
    assert_eq!(first.textures.len(), 2);
    // Red, Blue, Glass in host order; Unused has no users
    assert_eq!(first.materials.len(), 3);
    assert_eq!(first.objects.len(), 1);
    assert_eq!(first.objects[0].material_index, 1);

    let mut scene = HostScene::new();
    import_document(&mut scene, &first).unwrap();
    let mut second = export_scene(&scene).unwrap();

    assert!((second.camera.fov_degrees - first.camera.fov_degrees).abs() < 1e-4);
    second.camera.fov_degrees = first.camera.fov_degrees;
    assert_eq!(second, first);
}

#[test]
fn document_survives_a_trip_through_json() {
    let text = FULL.to_json_pretty().unwrap();
    assert!(text.contains("\"color_A\""));
    assert!(text.contains("\"type\": \"refractive\""));
    assert_eq!(Document::from_json(&text).unwrap(), *FULL);
}

#[test]
fn shared_vertices_keep_their_first_uv() {
    let mut mesh = HostMesh::from_triangles(
        vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ],
        &[[0, 1, 2], [1, 3, 2]],
    );
    mesh.uv_layer = Some(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        // second triangle disagrees on vertices 1 and 2
        Vec2::new(0.5, 0.5),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.25, 0.75),
    ]);

    let mut scene = scene_with_camera();
    scene.add_material(HostMaterial::new("Grey"));
    scene.add_object(HostObject::new("Quad", ObjectData::Mesh(mesh)).with_material_slots(["Grey"]));

    let doc = export_scene(&scene).unwrap();
    let object = &doc.objects[0];
    assert_eq!(object.triangle_count(), 2);
    assert_eq!(object.triangles, vec![0, 1, 2, 1, 3, 2]);
    assert_eq!(
        object.vertices,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0, -1.0]
    );
    assert_eq!(
        object.uvs.as_deref().unwrap(),
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]
    );
}

#[test]
fn second_import_replaces_objects_but_keeps_materials() {
    let mut scene = HostScene::new();
    import_document(&mut scene, &FULL).unwrap();
    let summary = import_document(&mut scene, &SMALL).unwrap();

    assert_eq!(summary.lights_removed, 2);
    assert_eq!(summary.objects_removed, 3);
    let lights = scene.objects().iter().filter(|o| o.is_light()).count();
    let meshes = scene.objects().iter().filter(|o| o.is_mesh()).count();
    assert_eq!(lights, SMALL.lights.len());
    assert_eq!(meshes, SMALL.objects.len());

    for name in ["Material_0", "Material_1", "Material_2"] {
        assert!(scene.material(name).is_some(), "{name} was deleted");
    }
    assert!(scene.texture("Wood").is_some());
    assert_eq!(scene.render.resolution_x, 64);

    // materials left over from the first import keep their indices
    let doc = export_scene(&scene).unwrap();
    assert_eq!(doc.materials.len(), 3);
    assert_eq!(doc.materials[0], SMALL.materials[0]);
    assert_eq!(doc.materials[2], FULL.materials[2]);
    assert_eq!(doc.textures.len(), 3);
}

#[test]
fn missing_texture_reference_fails_import() {
    let mut doc = SMALL.clone();
    doc.materials[0].albedo = Some(crt_scene::document::Albedo::Texture("Wood".into()));
    let err = import_document(&mut HostScene::new(), &doc).unwrap_err();
    match err {
        SceneError::UnresolvedTextureReference { material, texture } => {
            assert_eq!(material, "Material_0");
            assert_eq!(texture, "Wood");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_material_list_fails_both_directions() {
    let mut doc = SMALL.clone();
    doc.materials.clear();
    doc.objects.clear();
    assert!(matches!(
        import_document(&mut HostScene::new(), &doc),
        Err(SceneError::NoMaterialsDefined)
    ));

    let mut scene = scene_with_camera();
    scene.add_object(HostObject::new(
        "Tri",
        ObjectData::Mesh(HostMesh::from_triangles(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            &[[0, 1, 2]],
        )),
    ));
    assert!(matches!(
        export_scene(&scene),
        Err(SceneError::NoMaterialsDefined)
    ));
}

#[test]
fn scene_without_camera_is_not_exported() {
    let mut scene = HostScene::new();
    import_document(&mut scene, &SMALL).unwrap();
    scene.active_camera = None;
    assert!(matches!(export_scene(&scene), Err(SceneError::MissingCamera)));
}

#[test]
fn packed_images_are_rejected() {
    let mut scene = scene_with_camera();
    scene.upsert_image(HostImage {
        name: "wood.png".into(),
        filepath: String::new(),
        packed: true,
    });
    scene.upsert_texture(HostTexture {
        name: "Wood".into(),
        kind: HostTextureKind::Image {
            image: Some("wood.png".into()),
        },
    });
    assert!(matches!(
        export_scene(&scene),
        Err(SceneError::PackedOrMissingExternalImage { .. })
    ));
}
