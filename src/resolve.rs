//! Tables linking host materials and textures to document references.
//!
//! On export host materials become array indices and textures are referred
//! to by name. On import document indices become `Material_<i>` host
//! materials and texture names are looked up in the host texture table.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::document::{Albedo, Material, MaterialKind, Texture, TextureKind};
use crate::error::{Result, SceneError};
use crate::host::{HostImage, HostScene, HostTexture, HostTextureKind};

/// Prefix marking a path relative to the persisted scene file.
const SCENE_RELATIVE_PREFIX: &str = "//";

/// Host material name to document material index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialIndexMap {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl MaterialIndexMap {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::default();
        for name in names {
            map.insert(name.into());
        }
        map
    }

    /// Appends a material and returns its index. Existing names keep theirs.
    pub fn insert(&mut self, name: String) -> usize {
        if let Some(&index) = self.indices.get(&name) {
            return index;
        }
        let index = self.names.len();
        self.indices.insert(name.clone(), index);
        self.names.push(name);
        index
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Document material index to host material name, produced by an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialSlots {
    names: Vec<String>,
}

impl MaterialSlots {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Host name given to the material imported at `index`.
pub fn material_name(index: usize) -> String {
    format!("Material_{index}")
}

/// Collects every material in use, in host order, together with the index
/// each one received.
pub fn export_materials(scene: &HostScene) -> Result<(Vec<Material>, MaterialIndexMap)> {
    let mut materials = Vec::new();
    let mut index_map = MaterialIndexMap::default();

    for material in scene.materials() {
        if scene.material_users(&material.name) == 0 {
            debug!("skipping unused material {}", material.name);
            continue;
        }

        let albedo = match material.kind {
            MaterialKind::Refractive => None,
            _ => Some(match &material.texture {
                Some(texture) => {
                    if scene.texture(texture).is_none() {
                        return Err(SceneError::UnresolvedTextureReference {
                            material: material.name.clone(),
                            texture: texture.clone(),
                        });
                    }
                    Albedo::Texture(texture.clone())
                }
                None => Albedo::Color(material.base_color),
            }),
        };
        let exported = Material {
            kind: material.kind,
            albedo,
            ior: (material.kind == MaterialKind::Refractive).then_some(material.ior),
            smooth_shading: material.smooth_shading,
            back_face_culling: material.use_backface_culling,
        };
        exported.validate(materials.len())?;

        index_map.insert(material.name.clone());
        materials.push(exported);
    }

    if materials.is_empty() {
        return Err(SceneError::NoMaterialsDefined);
    }
    Ok((materials, index_map))
}

/// Converts every host texture, resolving bitmap images to absolute paths.
pub fn export_textures(scene: &HostScene) -> Result<Vec<Texture>> {
    scene
        .textures()
        .iter()
        .map(|texture| -> Result<Texture> {
            let kind = match &texture.kind {
                HostTextureKind::Albedo { color } => TextureKind::Albedo { albedo: *color },
                HostTextureKind::Edges {
                    edge_color,
                    inner_color,
                    edge_width,
                } => TextureKind::Edges {
                    edge_color: *edge_color,
                    inner_color: *inner_color,
                    edge_width: *edge_width,
                },
                HostTextureKind::Checker {
                    color_a,
                    color_b,
                    square_size,
                } => TextureKind::Checker {
                    color_a: *color_a,
                    color_b: *color_b,
                    square_size: *square_size,
                },
                HostTextureKind::Image { image } => TextureKind::Bitmap {
                    file_path: external_image_path(scene, &texture.name, image.as_deref())?,
                },
            };
            Ok(Texture {
                name: texture.name.clone(),
                kind,
            })
        })
        .collect()
}

fn external_image_path(scene: &HostScene, texture: &str, image: Option<&str>) -> Result<PathBuf> {
    let rejected = |reason: String| SceneError::PackedOrMissingExternalImage {
        texture: texture.to_string(),
        reason,
    };
    let name = image.ok_or_else(|| rejected("no image is assigned".into()))?;
    let image = scene
        .image(name)
        .ok_or_else(|| rejected(format!("image {name:?} does not exist")))?;
    if image.packed {
        return Err(rejected(format!(
            "image {name:?} is packed into the scene file"
        )));
    }
    if image.filepath.is_empty() {
        return Err(rejected(format!("image {name:?} has no file path")));
    }
    resolve_image_path(scene.file_path.as_deref(), &image.filepath)
}

/// Makes an image path absolute.
///
/// Relative paths, including `//`-prefixed scene-relative ones, are resolved
/// against the directory of the saved scene file, or against the current
/// directory when the scene has never been saved.
pub fn resolve_image_path(scene_file: Option<&Path>, filepath: &str) -> Result<PathBuf> {
    let relative = filepath
        .strip_prefix(SCENE_RELATIVE_PREFIX)
        .unwrap_or(filepath);
    let path = Path::new(relative);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let base = match scene_file.and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => env::current_dir().map_err(|source| SceneError::Io {
            path: PathBuf::from("."),
            source,
        })?,
    };
    Ok(base.join(path))
}

/// Creates or updates host textures by name. Textures already in the host
/// scene but absent from the document are left untouched.
pub fn import_textures(scene: &mut HostScene, textures: &[Texture]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, texture) in textures.iter().enumerate() {
        texture.validate(index)?;
        if !seen.insert(texture.name.as_str()) {
            return Err(SceneError::malformed(format!(
                "texture name {:?} is used more than once",
                texture.name
            )));
        }

        let kind = match &texture.kind {
            TextureKind::Albedo { albedo } => HostTextureKind::Albedo { color: *albedo },
            TextureKind::Edges {
                edge_color,
                inner_color,
                edge_width,
            } => HostTextureKind::Edges {
                edge_color: *edge_color,
                inner_color: *inner_color,
                edge_width: *edge_width,
            },
            TextureKind::Checker {
                color_a,
                color_b,
                square_size,
            } => HostTextureKind::Checker {
                color_a: *color_a,
                color_b: *color_b,
                square_size: *square_size,
            },
            TextureKind::Bitmap { file_path } => {
                scene.upsert_image(HostImage {
                    name: texture.name.clone(),
                    filepath: file_path.to_string_lossy().into_owned(),
                    packed: false,
                });
                HostTextureKind::Image {
                    image: Some(texture.name.clone()),
                }
            }
        };
        scene.upsert_texture(HostTexture {
            name: texture.name.clone(),
            kind,
        });
    }
    Ok(())
}

/// Creates or updates `Material_<i>` for every document material.
///
/// Each imported material is flagged with a fake user, so a later export keeps
/// it even when no object references it.
///
/// Texture references are looked up in the host scene, never created, so
/// textures must be imported first.
pub fn import_materials(scene: &mut HostScene, materials: &[Material]) -> Result<MaterialSlots> {
    let mut slots = MaterialSlots::default();
    for (index, material) in materials.iter().enumerate() {
        material.validate(index)?;
        let name = material_name(index);

        if let Some(texture) = material.texture_name() {
            if scene.texture(texture).is_none() {
                return Err(SceneError::UnresolvedTextureReference {
                    material: name,
                    texture: texture.to_string(),
                });
            }
        }

        let host = scene.get_or_create_material(&name);
        host.use_fake_user = true;
        host.kind = material.kind;
        host.smooth_shading = material.smooth_shading;
        host.use_backface_culling = material.back_face_culling;
        match &material.albedo {
            Some(Albedo::Texture(texture)) => host.texture = Some(texture.clone()),
            Some(Albedo::Color(color)) => {
                host.base_color = *color;
                host.texture = None;
            }
            None => host.texture = None,
        }
        if material.kind == MaterialKind::Refractive {
            host.ior = material.ior.unwrap_or_else(|| {
                warn!("refractive material {index} has no ior; using 1.0");
                1.0
            });
        }

        slots.names.push(name);
    }
    Ok(slots)
}
