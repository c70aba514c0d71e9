//! Explicit entity tables standing in for the authoring application's scene.
//!
//! Embedders copy their host's cameras, lights, meshes, materials, textures
//! and images into a [`HostScene`] before exporting, and copy them back out
//! after importing. Every lookup is by name, the way the host's own data
//! blocks are addressed.

use std::path::PathBuf;

use glam::{Mat3, Mat4, Vec3};

use crate::document::MaterialKind;
use crate::mesh::HostMesh;

pub const DEFAULT_BUCKET_SIZE: u32 = 24;
pub const BUCKET_SIZE_MIN: u32 = 8;
pub const BUCKET_SIZE_MAX: u32 = 8192;

/// Render configuration stored on the host scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub bucket_size: u32,
    pub gi_on: bool,
    pub reflections_on: bool,
    pub refractions_on: bool,
    pub background_color: Vec3,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution_x: 1080,
            resolution_y: 1080,
            bucket_size: DEFAULT_BUCKET_SIZE,
            gi_on: true,
            reflections_on: true,
            refractions_on: true,
            background_color: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostLight {
    pub kind: LightKind,
    pub energy: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostCamera {
    /// Horizontal field of view in radians.
    pub angle_x: f32,
}

impl Default for HostCamera {
    fn default() -> Self {
        Self {
            angle_x: 50f32.to_radians(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Camera(HostCamera),
    Light(HostLight),
    Mesh(HostMesh),
    Empty,
}

/// Object placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    pub name: String,
    pub matrix_world: Mat4,
    pub data: ObjectData,
    /// Material per slot; polygons pick a slot by index.
    pub material_slots: Vec<Option<String>>,
}

impl HostObject {
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            name: name.into(),
            matrix_world: Mat4::IDENTITY,
            data,
            material_slots: Vec::new(),
        }
    }

    pub fn with_matrix(mut self, matrix_world: Mat4) -> Self {
        self.matrix_world = matrix_world;
        self
    }

    pub fn with_material_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.material_slots = slots.into_iter().map(|s| Some(s.into())).collect();
        self
    }

    pub fn translation(&self) -> Vec3 {
        self.matrix_world.w_axis.truncate()
    }

    pub fn rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix_world)
    }

    pub fn mesh(&self) -> Option<&HostMesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.data, ObjectData::Mesh(_))
    }

    pub fn is_light(&self) -> bool {
        matches!(self.data, ObjectData::Light(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostMaterial {
    pub name: String,
    pub kind: MaterialKind,
    pub base_color: Vec3,
    /// Name of the texture driving the base color, if any.
    pub texture: Option<String>,
    pub ior: f32,
    pub smooth_shading: bool,
    pub use_backface_culling: bool,
    /// Keeps the material alive even when no object uses it.
    pub use_fake_user: bool,
}

impl HostMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Diffuse,
            base_color: Vec3::splat(0.8),
            texture: None,
            ior: 1.45,
            smooth_shading: false,
            use_backface_culling: false,
            use_fake_user: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostTextureKind {
    Albedo {
        color: Vec3,
    },
    Edges {
        edge_color: Vec3,
        inner_color: Vec3,
        edge_width: f32,
    },
    Checker {
        color_a: Vec3,
        color_b: Vec3,
        square_size: f32,
    },
    /// Refers to an entry of the image table by name.
    Image {
        image: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostTexture {
    pub name: String,
    pub kind: HostTextureKind,
}

/// Image data block. `filepath` may be absolute, relative to the process, or
/// relative to the scene file when prefixed with `//`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostImage {
    pub name: String,
    pub filepath: String,
    /// Pixel data embedded in the scene file instead of read from disk.
    pub packed: bool,
}

/// The host scene: render settings plus one table per entity kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostScene {
    /// Location of the persisted scene file, if it has been saved.
    pub file_path: Option<PathBuf>,
    pub render: RenderSettings,
    /// Name of the object used as the scene camera.
    pub active_camera: Option<String>,
    objects: Vec<HostObject>,
    materials: Vec<HostMaterial>,
    textures: Vec<HostTexture>,
    images: Vec<HostImage>,
}

impl HostScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[HostObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&HostObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut HostObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }

    /// Adds an object, renaming it `Name.001`, `Name.002`, ... when the name
    /// is taken. Returns the name the object ended up with.
    pub fn add_object(&mut self, mut object: HostObject) -> String {
        object.name = self.unique_object_name(&object.name);
        let name = object.name.clone();
        self.objects.push(object);
        name
    }

    fn unique_object_name(&self, base: &str) -> String {
        if self.object(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}.{n:03}"))
            .find(|candidate| self.object(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Removes every object matching the predicate and returns how many
    /// were removed.
    pub fn remove_objects_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&HostObject) -> bool,
    {
        let before = self.objects.len();
        self.objects.retain(|object| !predicate(object));
        if let Some(camera) = &self.active_camera {
            if self.object(camera).is_none() {
                self.active_camera = None;
            }
        }
        before - self.objects.len()
    }

    /// Returns the active camera object, if it exists and holds camera data.
    pub fn camera(&self) -> Option<(&HostObject, &HostCamera)> {
        let object = self.object(self.active_camera.as_deref()?)?;
        match &object.data {
            ObjectData::Camera(camera) => Some((object, camera)),
            _ => None,
        }
    }

    pub fn materials(&self) -> &[HostMaterial] {
        &self.materials
    }

    pub fn material(&self, name: &str) -> Option<&HostMaterial> {
        self.materials.iter().find(|material| material.name == name)
    }

    pub fn add_material(&mut self, material: HostMaterial) {
        match self.materials.iter_mut().find(|m| m.name == material.name) {
            Some(existing) => *existing = material,
            None => self.materials.push(material),
        }
    }

    pub fn get_or_create_material(&mut self, name: &str) -> &mut HostMaterial {
        let index = match self.materials.iter().position(|m| m.name == name) {
            Some(index) => index,
            None => {
                self.materials.push(HostMaterial::new(name));
                self.materials.len() - 1
            }
        };
        &mut self.materials[index]
    }

    /// Number of references keeping a material alive: one per material slot
    /// that uses it, plus one for the fake user flag.
    pub fn material_users(&self, name: &str) -> usize {
        let slots = self
            .objects
            .iter()
            .flat_map(|object| object.material_slots.iter())
            .filter(|slot| slot.as_deref() == Some(name))
            .count();
        let fake = self
            .material(name)
            .map_or(0, |material| usize::from(material.use_fake_user));
        slots + fake
    }

    pub fn textures(&self) -> &[HostTexture] {
        &self.textures
    }

    pub fn texture(&self, name: &str) -> Option<&HostTexture> {
        self.textures.iter().find(|texture| texture.name == name)
    }

    /// Inserts the texture, replacing the settings of an existing texture
    /// with the same name in place.
    pub fn upsert_texture(&mut self, texture: HostTexture) {
        match self.textures.iter_mut().find(|t| t.name == texture.name) {
            Some(existing) => existing.kind = texture.kind,
            None => self.textures.push(texture),
        }
    }

    pub fn images(&self) -> &[HostImage] {
        &self.images
    }

    pub fn image(&self, name: &str) -> Option<&HostImage> {
        self.images.iter().find(|image| image.name == name)
    }

    pub fn upsert_image(&mut self, image: HostImage) {
        match self.images.iter_mut().find(|i| i.name == image.name) {
            Some(existing) => *existing = image,
            None => self.images.push(image),
        }
    }
}
