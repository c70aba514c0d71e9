//! Conversion between a host 3D scene graph and the flat `.crtscene`
//! document consumed by the CRT offline renderer.
//!
//! The crate exposes the building blocks used by exporter and importer
//! tooling: the coordinate basis change, the mesh flattener, the material and
//! texture resolver, and the two directions of the conversion.  The host
//! scene is modelled in memory so that the converters stay testable in
//! headless tools; the renderer itself lives behind the [`Renderer`] trait.

pub mod basis;
pub mod document;
pub mod error;
pub mod export;
pub mod host;
pub mod import;
pub mod mesh;
pub mod render;
pub mod resolve;

pub use document::{Document, SCENE_FILE_EXTENSION};
pub use error::{Result, SceneError};
pub use export::{export_scene, export_scene_with, ExportOptions};
pub use host::{HostMaterial, HostObject, HostScene, ObjectData};
pub use import::{import_document, ImportSummary};
pub use mesh::{HostMesh, MaterialAssignment};
pub use render::{render_scene, PixelBuffer, Renderer};
