//! Inspection commands (frames, descriptor)

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::config::SpritecheckConfig;
use crate::descriptor::parse_descriptor;
use crate::frames::FrameTable;
use crate::output::{generate_output_path, save_png, scale_image};
use crate::registry::AnimRegistry;
use crate::sprite::SpriteSet;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the frames command
///
/// Frames are deduplicated on pixels only, so sprites without marker
/// sheets can be exported too.
pub fn run_frames(
    input: &Path,
    output: Option<&Path>,
    columns: Option<u32>,
    scale: u8,
    config: &SpritecheckConfig,
) -> ExitCode {
    let registry = AnimRegistry::from_config(&config.sprite);
    let set = match SpriteSet::load(input, &registry) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error: {}: {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let table = match FrameTable::from_sprite(&set, false) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if table.is_empty() {
        eprintln!("Error: {} has no frames", input.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let sheet = scale_image(table.render_sheet(columns), scale);
    let out = generate_output_path(input, "frames", "png", output);
    if let Err(e) = save_png(&sheet, &out) {
        eprintln!("Error: Failed to save {}: {}", out.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("{} unique frames from {} tiles", table.len(), table.placements.len());
    println!("Saved: {}", out.display());
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the descriptor command
pub fn run_descriptor(input: &Path, normalize: bool, config: &SpritecheckConfig) -> ExitCode {
    let bytes = match fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let registry = AnimRegistry::from_config(&config.sprite);
    let descriptor = match parse_descriptor(&bytes, &registry) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            eprintln!("Error: {}: {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if normalize {
        return match descriptor.serialize() {
            Ok(text) => {
                print!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    println!("ShadowSize: {}", descriptor.shadow_size);
    for anim in descriptor.animations() {
        let index = if anim.index >= 0 { anim.index.to_string() } else { "-".to_string() };
        match (&anim.alias_of, anim.frame_size) {
            (Some(target), _) => println!("{:>4}  {} -> {}", index, anim.name, target),
            (None, Some((w, h))) => {
                let events: Vec<String> =
                    anim.frame_events().iter().map(|(name, frame)| format!("{}={}", name, frame)).collect();
                println!(
                    "{:>4}  {} {}x{} durations {:?}{}",
                    index,
                    anim.name,
                    w,
                    h,
                    anim.durations,
                    if events.is_empty() { String::new() } else { format!(" {}", events.join(" ")) }
                );
            }
            (None, None) => println!("{:>4}  {}", index, anim.name),
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
