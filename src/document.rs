//! Renderer-facing scene document.
//!
//! These types mirror the `.crtscene` JSON layout one to one. Vectors and
//! matrices are always expressed in the renderer basis.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::host::{BUCKET_SIZE_MAX, BUCKET_SIZE_MIN, DEFAULT_BUCKET_SIZE};

/// Extension used for persisted documents.
pub const SCENE_FILE_EXTENSION: &str = "crtscene";

/// Complete scene description handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub settings: Settings,
    pub camera: Camera,
    pub lights: Vec<Light>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub objects: Vec<Object>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub background_color: Vec3,
    pub image_settings: ImageSettings,
    #[serde(default = "enabled")]
    pub gi_on: bool,
    #[serde(default = "enabled")]
    pub reflections_on: bool,
    #[serde(default = "enabled")]
    pub refractions_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_bucket_size")]
    pub bucket_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Row-major 3x3 orientation, see [`crate::basis::matrix_to_rows`].
    pub matrix: [f32; 9],
    pub position: Vec3,
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
}

/// Point light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub intensity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    #[serde(flatten)]
    pub kind: TextureKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextureKind {
    /// Flat color.
    Albedo { albedo: Vec3 },
    /// Highlights triangle edges.
    Edges {
        edge_color: Vec3,
        inner_color: Vec3,
        edge_width: f32,
    },
    Checker {
        #[serde(rename = "color_A")]
        color_a: Vec3,
        #[serde(rename = "color_B")]
        color_b: Vec3,
        square_size: f32,
    },
    /// Image stored in an external file.
    Bitmap { file_path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Diffuse,
    Reflective,
    Refractive,
    Constant,
}

impl MaterialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Reflective => "reflective",
            Self::Refractive => "refractive",
            Self::Constant => "constant",
        }
    }
}

/// Base color of a material: either inline or taken from a named texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Albedo {
    Texture(String),
    Color(Vec3),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albedo: Option<Albedo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ior: Option<f32>,
    pub smooth_shading: bool,
    #[serde(default)]
    pub back_face_culling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub material_index: usize,
    pub vertices: Vec<f32>,
    pub triangles: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<f32>>,
}

fn enabled() -> bool {
    true
}

fn default_bucket_size() -> u32 {
    DEFAULT_BUCKET_SIZE
}

fn default_fov() -> f32 {
    90.0
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let image = &self.image_settings;
        check_range("image_settings.width", image.width, 1, u32::MAX)?;
        check_range("image_settings.height", image.height, 1, u32::MAX)?;
        check_range(
            "image_settings.bucket_size",
            image.bucket_size,
            BUCKET_SIZE_MIN,
            BUCKET_SIZE_MAX,
        )
    }
}

pub(crate) fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SceneError::InvalidFieldRange {
            field,
            value: f64::from(value),
            min: f64::from(min),
            max: f64::from(max),
        })
    }
}

impl Texture {
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.name.is_empty() {
            return Err(SceneError::malformed(format!(
                "texture {index} has an empty name"
            )));
        }
        if let TextureKind::Bitmap { file_path } = &self.kind {
            if file_path.as_os_str().is_empty() {
                return Err(SceneError::malformed(format!(
                    "bitmap texture {:?} has an empty file_path",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

impl Material {
    /// Checks the albedo/ior exclusivity rules. Texture references are
    /// resolved by the caller against whichever texture table applies.
    pub fn validate(&self, index: usize) -> Result<()> {
        match (self.kind, &self.albedo, self.ior) {
            (MaterialKind::Refractive, Some(_), Some(_)) => Err(SceneError::malformed(format!(
                "refractive material {index} has both albedo and ior"
            ))),
            (MaterialKind::Refractive, _, Some(ior)) if !(ior >= 0.0) => {
                Err(SceneError::InvalidFieldRange {
                    field: "material.ior",
                    value: f64::from(ior),
                    min: 0.0,
                    max: f64::from(f32::MAX),
                })
            }
            (MaterialKind::Refractive, _, _) => Ok(()),
            (kind, None, _) => Err(SceneError::malformed(format!(
                "{} material {index} is missing an albedo",
                kind.as_str()
            ))),
            (kind, Some(_), Some(_)) => Err(SceneError::malformed(format!(
                "only refractive materials may set ior (material {index} is {})",
                kind.as_str()
            ))),
            (_, Some(_), None) => Ok(()),
        }
    }

    pub fn texture_name(&self) -> Option<&str> {
        match &self.albedo {
            Some(Albedo::Texture(name)) => Some(name),
            _ => None,
        }
    }
}

impl Object {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn validate(&self, index: usize, material_count: usize) -> Result<()> {
        if self.material_index >= material_count {
            return Err(SceneError::malformed(format!(
                "object {index} references material {} but only {material_count} exist",
                self.material_index
            )));
        }
        self.check_geometry(index)
    }

    /// Checks array lengths and triangle indices, ignoring the material.
    pub fn check_geometry(&self, index: usize) -> Result<()> {
        if self.vertices.len() % 3 != 0 {
            return Err(SceneError::malformed(format!(
                "object {index} has {} vertex components, not a multiple of 3",
                self.vertices.len()
            )));
        }
        if self.triangles.len() % 3 != 0 {
            return Err(SceneError::malformed(format!(
                "object {index} has {} triangle indices, not a multiple of 3",
                self.triangles.len()
            )));
        }
        let vertex_count = self.vertex_count();
        if let Some(bad) = self
            .triangles
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(SceneError::malformed(format!(
                "object {index} references vertex {bad} but has {vertex_count} vertices"
            )));
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != self.vertices.len() {
                return Err(SceneError::malformed(format!(
                    "object {index} has {} uv components for {} vertex components",
                    uvs.len(),
                    self.vertices.len()
                )));
            }
        }
        Ok(())
    }
}

impl Document {
    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| SceneError::malformed(err.to_string()))
    }

    /// Serializes the document with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| SceneError::malformed(err.to_string()))
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut text = self.to_json_pretty()?;
        text.push('\n');
        fs::write(path, text).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every cross-reference and size invariant, in key order.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        let mut names = HashSet::new();
        for (index, texture) in self.textures.iter().enumerate() {
            texture.validate(index)?;
            if !names.insert(texture.name.as_str()) {
                return Err(SceneError::malformed(format!(
                    "texture name {:?} is used more than once",
                    texture.name
                )));
            }
        }

        if self.materials.is_empty() {
            return Err(SceneError::NoMaterialsDefined);
        }
        for (index, material) in self.materials.iter().enumerate() {
            material.validate(index)?;
            if let Some(name) = material.texture_name() {
                if !names.contains(name) {
                    return Err(SceneError::UnresolvedTextureReference {
                        material: format!("material {index}"),
                        texture: name.to_string(),
                    });
                }
            }
        }

        for (index, object) in self.objects.iter().enumerate() {
            object.validate(index, self.materials.len())?;
        }
        Ok(())
    }
}
