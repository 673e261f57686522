//! Recolor drafting command

use std::path::Path;
use std::process::ExitCode;

use crate::config::SpritecheckConfig;
use crate::output::{decode_png, generate_output_path, save_bytes, save_png};
use crate::recolor::{synthesize_portrait_recolor, synthesize_sprite_recolor, Ambiguity, SuggestedFlags};
use crate::registry::{AnimRegistry, PortraitLayout};
use crate::sprite::SpriteSet;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

fn is_png(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Execute the recolor command
pub fn run_recolor(
    previous: &Path,
    previous_recolor: &Path,
    current: &Path,
    output: Option<&Path>,
    config: &SpritecheckConfig,
) -> ExitCode {
    let inputs = [previous, previous_recolor, current];
    let pngs = inputs.iter().filter(|p| is_png(p)).count();
    match pngs {
        0 => {
            let registry = AnimRegistry::from_config(&config.sprite);
            run_sprite_recolor(inputs, output, &registry, config.sprite.max_colors)
        }
        3 => {
            let layout = PortraitLayout::from_config(&config.portrait);
            run_portrait_recolor(inputs, output, &layout, config.portrait.max_colors)
        }
        _ => {
            eprintln!("Error: Inputs must be all portraits (.png) or all sprites");
            ExitCode::from(EXIT_INVALID_ARGS)
        }
    }
}

fn run_sprite_recolor(
    [previous, previous_recolor, current]: [&Path; 3],
    output: Option<&Path>,
    registry: &AnimRegistry,
    max_colors: usize,
) -> ExitCode {
    let mut sets = Vec::with_capacity(3);
    for path in [previous, previous_recolor, current] {
        match SpriteSet::load(path, registry) {
            Ok(set) => sets.push(set),
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    let draft = match synthesize_sprite_recolor(&sets[0], &sets[1], &sets[2], max_colors) {
        Ok(draft) => draft,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let out = generate_output_path(current, "recolor", "zip", output);
    let written = draft.output.to_zip().map_err(|e| e.to_string()).and_then(|bytes| {
        save_bytes(&bytes, &out).map_err(|e| e.to_string())
    });
    if let Err(e) = written {
        eprintln!("Error: Failed to write {}: {}", out.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {}", out.display());
    report(draft.reused_frames, draft.mapped_frames, &draft.ambiguities, &draft.suggested);
    ExitCode::from(EXIT_SUCCESS)
}

fn run_portrait_recolor(
    [previous, previous_recolor, current]: [&Path; 3],
    output: Option<&Path>,
    layout: &PortraitLayout,
    max_colors: usize,
) -> ExitCode {
    let mut images = Vec::with_capacity(3);
    for path in [previous, previous_recolor, current] {
        let decoded = std::fs::read(path).map_err(|e| e.to_string()).and_then(|bytes| {
            decode_png(&bytes).map_err(|e| e.to_string())
        });
        match decoded {
            Ok(image) => images.push(image),
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    let draft = synthesize_portrait_recolor(&images[0], &images[1], &images[2], layout, max_colors);

    let out = generate_output_path(current, "recolor", "png", output);
    if let Err(e) = save_png(&draft.output, &out) {
        eprintln!("Error: Failed to write {}: {}", out.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Saved: {}", out.display());
    report(draft.reused_frames, draft.mapped_frames, &draft.ambiguities, &draft.suggested);
    ExitCode::from(EXIT_SUCCESS)
}

fn report(reused: usize, mapped: usize, ambiguities: &[Ambiguity], suggested: &SuggestedFlags) {
    println!("{} frames reused, {} recolored through the color table", reused, mapped);
    if !ambiguities.is_empty() {
        println!("Ambiguous colors ({}):", ambiguities.len());
        for ambiguity in ambiguities {
            println!("  - {}", ambiguity);
        }
    }
    if !suggested.is_empty() {
        println!("Suggested flags: {}", suggested);
    }
}
