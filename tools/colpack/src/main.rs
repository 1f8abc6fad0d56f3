use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use collision_packer::foundation::logging;
use collision_packer::prelude::*;
use std::path::{Path, PathBuf};

mod scene;
use scene::Scene;

fn main() -> Result<()> {
    logging::init_with_default("info");

    let variant_arg = Arg::new("variant")
        .long("variant")
        .value_name("grid|tree")
        .help("Override the partition variant from the scene file");

    let matches = Command::new("colpack")
        .about("Packs room collision geometry into legacy collision containers")
        .subcommand_required(true)
        .subcommand(
            Command::new("pack")
                .about("Pack a RON or TOML scene into a container")
                .arg(Arg::new("scene").required(true).value_name("SCENE"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .required(true)
                        .help("Where to write the container"),
                )
                .arg(variant_arg.clone()),
        )
        .subcommand(
            Command::new("verify")
                .about("Pack a scene and compare the result with a reference container")
                .arg(Arg::new("scene").required(true).value_name("SCENE"))
                .arg(Arg::new("reference").required(true).value_name("REFERENCE"))
                .arg(variant_arg),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the sections of a container")
                .arg(Arg::new("container").required(true).value_name("FILE")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("pack", args)) => {
            let packed = pack_scene(args)?;
            let output = PathBuf::from(required(args, "output")?);
            std::fs::write(&output, &packed.bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            print_stats(&packed.stats);
            println!("Wrote {} bytes to {}", packed.bytes.len(), output.display());
            Ok(())
        }
        Some(("verify", args)) => {
            let packed = pack_scene(args)?;
            let reference = read_file(Path::new(required(args, "reference")?))?;
            compare_containers(&reference, &packed.bytes).context("Repacked container differs")?;
            println!("Container matches reference ({} bytes)", reference.len());
            Ok(())
        }
        Some(("inspect", args)) => inspect(Path::new(required(args, "container")?)),
        _ => Err(anyhow::anyhow!("Unknown subcommand")),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing argument: {name}"))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn pack_scene(args: &ArgMatches) -> Result<PackedCollision> {
    let path = required(args, "scene")?;
    let scene = Scene::load_from_file(path).with_context(|| format!("Failed to load scene {path}"))?;
    let variant = args
        .get_one::<String>("variant")
        .map(|v| v.parse::<PartitionVariant>())
        .transpose()?;

    let packer = CollisionPacker::new(scene.pack_config(variant))?;
    log::info!("Loaded {} faces and {} portals from {path}", scene.faces.len(), scene.portals.len());
    Ok(packer.pack(&scene.faces, &scene.portals)?)
}

fn print_stats(stats: &PackStats) {
    println!("Faces:         {} (+{} portals)", stats.faces, stats.portals);
    println!("Points:        {}", stats.points);
    println!("Planes:        {}", stats.planes);
    println!("Point indices: {}", stats.point_indices);
    println!("Face indices:  {}", stats.face_indices);
    println!("Entries:       {} (largest holds {} faces)", stats.entries, stats.max_entry_faces);
    if stats.tree_nodes > 0 {
        println!("Tree nodes:    {}", stats.tree_nodes);
    }
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = read_file(path)?;
    let container = unpack(&bytes).with_context(|| format!("Failed to parse {}", path.display()))?;

    println!("{} container, {} bytes", container.variant(), bytes.len());
    for (name, offset) in container.sections() {
        println!("  {name:<18} @ {offset:#07x}");
    }
    println!("Faces:   {} ({} before the first ordinary face)", container.faces.len(), container.first_face());
    println!("Entries: {}", container.entries.len());
    for portal in container.collision_portals() {
        println!("Portal {}: {} <-> {}", portal.name, portal.node_name_1, portal.node_name_2);
    }
    Ok(())
}
