//! glTF Scene Export CLI
//!
//! Convert a JSON scene description into glTF or GLB files.

use clap::{Parser, ValueEnum};
use gltf_scene_export::{
    export_glb_blocking, export_gltf_blocking, ExportOptions, ExtensionRegistry, Scene,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gltf-scene-export")]
#[command(author, version, about = "Export a JSON scene description to glTF 2.0", long_about = None)]
struct Cli {
    /// Input JSON file containing the scene
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// File name prefix for the generated files (defaults to the input file stem)
    #[arg(short, long)]
    prefix: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "glb")]
    format: OutputFormat,

    /// Export UV sets even when no material samples them
    #[arg(long)]
    export_unused_uvs: bool,

    /// Keep root transform nodes that have no effect
    #[arg(long)]
    keep_noop_roots: bool,

    /// Wrap left-handed scenes in an explicit conversion root node
    #[arg(long)]
    conversion_nodes: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Gltf,
    Glb,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    println!("Loading scene from {:?}...", cli.input);
    let bytes = fs::read(&cli.input)?;
    let text = String::from_utf8_lossy(&bytes);
    let scene = Scene::from_json(&text)?;
    println!(
        "  Found {} nodes, {} meshes, {} materials, {} textures",
        scene.nodes.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.textures.len()
    );

    let prefix = match &cli.prefix {
        Some(prefix) => prefix.clone(),
        None => cli
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string()),
    };

    let options = ExportOptions::default()
        .with_export_unused_uvs(cli.export_unused_uvs)
        .with_remove_noop_root_nodes(!cli.keep_noop_roots)
        .with_coordinate_system_conversion_nodes(cli.conversion_nodes);

    println!("Exporting with options:");
    println!("  - Export unused UVs: {}", cli.export_unused_uvs);
    println!("  - Remove no-op root nodes: {}", !cli.keep_noop_roots);
    println!("  - Conversion root node: {}", cli.conversion_nodes);

    let registry = ExtensionRegistry::new();
    let data = match cli.format {
        OutputFormat::Gltf => export_gltf_blocking(&scene, &prefix, options, &registry)?,
        OutputFormat::Glb => export_glb_blocking(&scene, &prefix, options, &registry)?,
    };

    data.write_to_dir(&cli.output)?;
    for file in data.files() {
        println!(
            "Exported {} ({} bytes) to {:?}",
            file.name,
            file.data.len(),
            cli.output.join(&file.name)
        );
    }

    Ok(())
}
