//! Applies a renderer document to the host scene.

use glam::{Mat3, Mat4, Vec3};
use log::info;

use crate::basis::{camera_to_host_basis, matrix_from_rows, to_host_basis};
use crate::document::{Camera, Document, Light, Object, Settings};
use crate::error::{Result, SceneError};
use crate::host::{HostCamera, HostLight, HostObject, HostScene, LightKind, ObjectData};
use crate::mesh::rebuild_mesh;
use crate::resolve::{import_materials, import_textures, MaterialSlots};

/// Counts of what an import changed in the host scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub lights_removed: usize,
    pub lights_created: usize,
    pub textures: usize,
    pub materials: usize,
    pub objects_removed: usize,
    pub objects_created: usize,
}

/// Applies a document to the host scene.
///
/// Lights and mesh objects are replaced wholesale; textures and materials are
/// created or updated by name and never deleted. Sections are applied in
/// document order and the first invalid entity aborts the import, leaving
/// whatever was already applied in place.
pub fn import_document(scene: &mut HostScene, document: &Document) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    apply_settings(scene, &document.settings)?;
    apply_camera(scene, &document.camera);

    summary.lights_removed = scene.remove_objects_where(HostObject::is_light);
    summary.lights_created = create_lights(scene, &document.lights);

    import_textures(scene, &document.textures)?;
    summary.textures = document.textures.len();

    if document.materials.is_empty() {
        return Err(SceneError::NoMaterialsDefined);
    }
    let slots = import_materials(scene, &document.materials)?;
    summary.materials = slots.len();

    summary.objects_removed = scene.remove_objects_where(HostObject::is_mesh);
    summary.objects_created = create_objects(scene, &document.objects, &slots)?;

    info!(
        "imported scene: {} lights (replaced {}), {} textures, {} materials, \
         {} objects (replaced {})",
        summary.lights_created,
        summary.lights_removed,
        summary.textures,
        summary.materials,
        summary.objects_created,
        summary.objects_removed
    );
    Ok(summary)
}

fn apply_settings(scene: &mut HostScene, settings: &Settings) -> Result<()> {
    settings.validate()?;
    let render = &mut scene.render;
    render.background_color = settings.background_color;
    render.resolution_x = settings.image_settings.width;
    render.resolution_y = settings.image_settings.height;
    render.bucket_size = settings.image_settings.bucket_size;
    render.gi_on = settings.gi_on;
    render.reflections_on = settings.reflections_on;
    render.refractions_on = settings.refractions_on;
    Ok(())
}

fn placement(rotation: Mat3, translation: Vec3) -> Mat4 {
    Mat4::from_cols(
        rotation.x_axis.extend(0.0),
        rotation.y_axis.extend(0.0),
        rotation.z_axis.extend(0.0),
        translation.extend(1.0),
    )
}

/// Updates the active camera, creating one when the scene has none.
fn apply_camera(scene: &mut HostScene, camera: &Camera) {
    let matrix_world = placement(
        camera_to_host_basis(matrix_from_rows(&camera.matrix)),
        to_host_basis(camera.position),
    );
    let data = HostCamera {
        angle_x: camera.fov_degrees.to_radians(),
    };

    let existing = scene.camera().map(|(object, _)| object.name.clone());
    match existing.and_then(|name| scene.object_mut(&name)) {
        Some(object) => {
            object.matrix_world = matrix_world;
            object.data = ObjectData::Camera(data);
        }
        None => {
            let name = scene.add_object(
                HostObject::new("Camera", ObjectData::Camera(data)).with_matrix(matrix_world),
            );
            scene.active_camera = Some(name);
        }
    }
}

fn create_lights(scene: &mut HostScene, lights: &[Light]) -> usize {
    for (index, light) in lights.iter().enumerate() {
        scene.add_object(
            HostObject::new(
                format!("Light_{index}"),
                ObjectData::Light(HostLight {
                    kind: LightKind::Point,
                    energy: light.intensity,
                }),
            )
            .with_matrix(Mat4::from_translation(to_host_basis(light.position))),
        );
    }
    lights.len()
}

fn create_objects(
    scene: &mut HostScene,
    objects: &[Object],
    slots: &MaterialSlots,
) -> Result<usize> {
    for (index, object) in objects.iter().enumerate() {
        object.validate(index, slots.len())?;
        let material = slots.get(object.material_index).map(str::to_string);
        let mesh = rebuild_mesh(index, object)?;
        let mut host = HostObject::new(format!("Object_{index}"), ObjectData::Mesh(mesh));
        host.material_slots = vec![material];
        scene.add_object(host);
    }
    Ok(objects.len())
}
