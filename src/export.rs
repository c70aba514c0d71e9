//! Builds a renderer document from the host scene.

use log::{debug, info};

use crate::basis::{camera_to_render_basis, matrix_to_rows, to_render_basis};
use crate::document::{Camera, Document, ImageSettings, Light, Object, Settings};
use crate::error::{Result, SceneError};
use crate::host::{HostScene, LightKind, ObjectData, RenderSettings};
use crate::mesh::{flatten_object, MaterialAssignment};
use crate::resolve::{export_materials, export_textures, MaterialIndexMap};

/// Knobs for [`export_scene_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub material_assignment: MaterialAssignment,
}

/// Builds a document from the host scene with default options.
pub fn export_scene(scene: &HostScene) -> Result<Document> {
    export_scene_with(scene, &ExportOptions::default())
}

/// Builds a complete document from the host scene.
///
/// Sections are produced in document order and the first failure aborts the
/// export; there is no partially built document.
pub fn export_scene_with(scene: &HostScene, options: &ExportOptions) -> Result<Document> {
    let settings = build_settings(&scene.render)?;
    let camera = build_camera(scene)?;
    let lights = build_lights(scene);
    let textures = export_textures(scene)?;
    let (materials, index_map) = export_materials(scene)?;
    let objects = build_objects(scene, &index_map, options.material_assignment)?;

    info!(
        "exported scene: {} lights, {} textures, {} materials, {} objects",
        lights.len(),
        textures.len(),
        materials.len(),
        objects.len()
    );

    Ok(Document {
        settings,
        camera,
        lights,
        textures,
        materials,
        objects,
    })
}

fn build_settings(render: &RenderSettings) -> Result<Settings> {
    let settings = Settings {
        background_color: render.background_color,
        image_settings: ImageSettings {
            width: render.resolution_x,
            height: render.resolution_y,
            bucket_size: render.bucket_size,
        },
        gi_on: render.gi_on,
        reflections_on: render.reflections_on,
        refractions_on: render.refractions_on,
    };
    settings.validate()?;
    Ok(settings)
}

fn build_camera(scene: &HostScene) -> Result<Camera> {
    let (object, camera) = scene.camera().ok_or(SceneError::MissingCamera)?;
    Ok(Camera {
        matrix: matrix_to_rows(camera_to_render_basis(object.rotation())),
        position: to_render_basis(object.translation()),
        fov_degrees: camera.angle_x.to_degrees(),
    })
}

fn build_lights(scene: &HostScene) -> Vec<Light> {
    scene
        .objects()
        .iter()
        .filter_map(|object| match &object.data {
            ObjectData::Light(light) if light.kind == LightKind::Point => Some(Light {
                intensity: light.energy,
                position: to_render_basis(object.translation()),
            }),
            ObjectData::Light(light) => {
                debug!("skipping {:?} light {}", light.kind, object.name);
                None
            }
            _ => None,
        })
        .collect()
}

fn build_objects(
    scene: &HostScene,
    index_map: &MaterialIndexMap,
    assignment: MaterialAssignment,
) -> Result<Vec<Object>> {
    let mut objects = Vec::new();
    for object in scene.objects() {
        let Some(mesh) = object.mesh() else {
            continue;
        };
        objects.extend(flatten_object(object, mesh, index_map, assignment)?);
    }
    Ok(objects)
}
