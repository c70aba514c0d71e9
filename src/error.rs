use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building or loading a scene document.
///
/// Every variant aborts the whole operation. Imports are not rolled back, so
/// host entities mutated before the failure stay as they are.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no active camera found in the scene")]
    MissingCamera,

    #[error("the scene must use at least one material")]
    NoMaterialsDefined,

    #[error("material {material} references texture {texture:?} which does not exist")]
    UnresolvedTextureReference { material: String, texture: String },

    #[error("bitmap texture {texture:?} must reference an external image file: {reason}")]
    PackedOrMissingExternalImage { texture: String, reason: String },

    #[error("malformed scene document: {0}")]
    MalformedDocument(String),

    #[error("{field} is out of range: {value} (expected {min}..={max})")]
    InvalidFieldRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("mesh of object {object:?} is invalid: {reason}")]
    InvalidMesh { object: String, reason: String },

    #[error("unable to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SceneError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
