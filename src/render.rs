use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::document::Document;
use crate::export::{export_scene_with, ExportOptions};
use crate::host::HostScene;

/// Bitmap paths in exported documents are absolute, so assets resolve from
/// the file system root.
pub const ASSET_ROOT: &str = "/";

/// RGBA image returned by a renderer, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

/// Offline renderer consuming a finished document.
pub trait Renderer {
    fn render(&mut self, document: &Document, asset_root: &Path) -> Result<PixelBuffer>;
}

/// Exports the host scene and hands the document to the renderer.
pub fn render_scene<R: Renderer + ?Sized>(
    scene: &HostScene,
    options: &ExportOptions,
    renderer: &mut R,
) -> Result<PixelBuffer> {
    let document = export_scene_with(scene, options).context("failed to export scene")?;
    let image = document.settings.image_settings;
    info!("rendering {}x{} image", image.width, image.height);

    let buffer = renderer
        .render(&document, Path::new(ASSET_ROOT))
        .context("renderer failed")?;

    let expected = image.width as usize * image.height as usize;
    if buffer.width != image.width
        || buffer.height != image.height
        || buffer.pixels.len() != expected
    {
        return Err(anyhow!(
            "renderer returned a {}x{} buffer with {} pixels, expected {}x{}",
            buffer.width,
            buffer.height,
            buffer.pixels.len(),
            image.width,
            image.height
        ));
    }
    Ok(buffer)
}
