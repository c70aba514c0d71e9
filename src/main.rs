use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use crt_scene::{
    export_scene_with, import_document, Document, ExportOptions, HostScene, MaterialAssignment,
};

const USAGE: &str =
    "Usage: crt-scene inspect <scene.crtscene> | crt-scene normalize <in> <out> [--split-materials]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match CliOptions::parse(env::args().skip(1))? {
        CliOptions::Inspect { path } => inspect(path),
        CliOptions::Normalize {
            input,
            output,
            split_materials,
        } => normalize(input, output, split_materials),
    }
}

fn load(path: &Path) -> Result<Document> {
    let document = Document::read_from_path(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    document
        .validate()
        .with_context(|| format!("scene {} is invalid", path.display()))?;
    Ok(document)
}

fn inspect(path: PathBuf) -> Result<()> {
    let document = load(&path)?;
    let image = document.settings.image_settings;

    println!(
        "Loaded scene with {} objects ({} lights)",
        document.objects.len(),
        document.lights.len()
    );
    println!(
        "Image {}x{} (bucket {}), {} textures, {} materials",
        image.width,
        image.height,
        image.bucket_size,
        document.textures.len(),
        document.materials.len()
    );
    for (index, object) in document.objects.iter().enumerate() {
        let material = &document.materials[object.material_index];
        println!(
            " - object {index}: {} vertices, {} triangles, material {} ({})",
            object.vertex_count(),
            object.triangle_count(),
            object.material_index,
            material.kind.as_str()
        );
    }
    Ok(())
}

fn normalize(input: PathBuf, output: PathBuf, split_materials: bool) -> Result<()> {
    let document = load(&input)?;

    let mut scene = HostScene::new();
    scene.file_path = Some(input.clone());
    let summary = import_document(&mut scene, &document)
        .with_context(|| format!("failed to import {}", input.display()))?;
    info!("{summary:?}");

    let options = ExportOptions {
        material_assignment: if split_materials {
            MaterialAssignment::SplitByMaterial
        } else {
            MaterialAssignment::LastTriangle
        },
    };
    let exported = export_scene_with(&scene, &options).context("failed to export scene")?;
    exported
        .write_to_path(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} objects, {} materials)",
        output.display(),
        exported.objects.len(),
        exported.materials.len()
    );
    Ok(())
}

enum CliOptions {
    Inspect {
        path: PathBuf,
    },
    Normalize {
        input: PathBuf,
        output: PathBuf,
        split_materials: bool,
    },
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(command) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        match command.as_str() {
            "inspect" => {
                let path = args.next().ok_or_else(|| anyhow!(USAGE))?;
                if let Some(extra) = args.next() {
                    return Err(anyhow!("Unknown argument: {extra}. {USAGE}"));
                }
                Ok(Self::Inspect { path: path.into() })
            }
            "normalize" => {
                let mut paths = Vec::new();
                let mut split_materials = false;
                for arg in args {
                    match arg.as_str() {
                        "--split-materials" => split_materials = true,
                        flag if flag.starts_with("--") => {
                            return Err(anyhow!(
                                "Unknown argument: {flag}. Expected --split-materials"
                            ));
                        }
                        _ => paths.push(PathBuf::from(&arg)),
                    }
                }
                let [input, output]: [PathBuf; 2] =
                    paths.try_into().map_err(|_| anyhow!(USAGE))?;
                Ok(Self::Normalize {
                    input,
                    output,
                    split_materials,
                })
            }
            other => Err(anyhow!("Unknown command: {other}. {USAGE}")),
        }
    }
}
