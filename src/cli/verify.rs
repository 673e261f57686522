//! Verification commands (sprite, portrait)

use image::RgbaImage;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::config::SpritecheckConfig;
use crate::output::{decode_png, save_png};
use crate::sprite::{ArchiveError, SpriteSet};
use crate::telemetry;
use crate::verify::{
    check_locked_regions, verify_portrait, verify_portrait_recolor, verify_sprite, verify_sprite_recolor, AckFlags,
    PortraitRules, RecolorPair, SpriteRules, Submission, ValidationFailure,
};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the sprite command
pub fn run_sprite(
    input: &Path,
    original: Option<&Path>,
    current: Option<&Path>,
    locked: &[String],
    known: Option<(&Path, &Path)>,
    flags: &AckFlags,
    preview: Option<&Path>,
    config: &SpritecheckConfig,
) -> ExitCode {
    let rules = SpriteRules::from_config(config);
    let Some(bytes) = read_input(input) else {
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let result = match original {
        Some(original) => {
            let Some(original_bytes) = read_input(original) else {
                return ExitCode::from(EXIT_INVALID_ARGS);
            };
            verify_sprite_recolor(&original_bytes, &bytes, flags, &rules)
        }
        None => verify_sprite(&bytes, flags, &rules),
    };

    let notes = match result {
        Ok(notes) => notes,
        Err(failure) => return reject("sprite", input, &failure, preview),
    };
    for note in &notes {
        println!("  {}", note);
    }

    if let Some(current) = current {
        let set = match SpriteSet::from_zip(&bytes, &rules.registry) {
            Ok(set) => set,
            Err(e) => return reject("sprite", input, &e.into(), preview),
        };
        let pair = match known.map(|(a, b)| load_sprite_pair(a, b, &rules)).transpose() {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        };
        let locked: BTreeSet<String> = locked.iter().cloned().collect();
        let submission = Submission::Sprite {
            set: &set,
            registry: &rules.registry,
            recolor: pair.as_ref().map(|(original, recolor)| RecolorPair { original, recolor }),
        };
        match check_locked_regions(current, submission, &locked) {
            Ok(changed) => print_changed(&changed),
            Err(failure) => return reject("sprite", input, &failure, preview),
        }
    }

    println!("OK: {} accepted", input.display());
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the portrait command
pub fn run_portrait(
    input: &Path,
    original: Option<&Path>,
    current: Option<&Path>,
    locked: &[String],
    known: Option<(&Path, &Path)>,
    flags: &AckFlags,
    preview: Option<&Path>,
    config: &SpritecheckConfig,
) -> ExitCode {
    let rules = PortraitRules::from_config(config);
    let Some(image) = read_image(input) else {
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let result = match original {
        Some(original) => {
            let Some(original_image) = read_image(original) else {
                return ExitCode::from(EXIT_INVALID_ARGS);
            };
            verify_portrait_recolor(&original_image, &image, flags, &rules)
        }
        None => verify_portrait(&image, flags, &rules),
    };
    if let Err(failure) = result {
        return reject("portrait", input, &failure, preview);
    }

    if let Some(current) = current {
        if let Some(unknown) = locked.iter().find(|name| rules.layout.find_tile(name).is_none()) {
            eprintln!("Error: Unknown portrait tile '{}'", unknown);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        let pair = match known {
            Some((a, b)) => match (read_image(a), read_image(b)) {
                (Some(original), Some(recolor)) => Some((original, recolor)),
                _ => return ExitCode::from(EXIT_INVALID_ARGS),
            },
            None => None,
        };
        let locked: BTreeSet<String> = locked.iter().cloned().collect();
        let submission = Submission::Portrait {
            image: &image,
            layout: &rules.layout,
            recolor: pair.as_ref().map(|(original, recolor)| RecolorPair { original, recolor }),
        };
        match check_locked_regions(current, submission, &locked) {
            Ok(changed) => print_changed(&changed),
            Err(failure) => return reject("portrait", input, &failure, preview),
        }
    }

    println!("OK: {} accepted", input.display());
    ExitCode::from(EXIT_SUCCESS)
}

fn load_sprite_pair(
    original: &Path,
    recolor: &Path,
    rules: &SpriteRules,
) -> Result<(SpriteSet, SpriteSet), ArchiveError> {
    Ok((SpriteSet::load(original, &rules.registry)?, SpriteSet::load(recolor, &rules.registry)?))
}

fn read_input(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            eprintln!("Error: Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

fn read_image(path: &Path) -> Option<RgbaImage> {
    let bytes = read_input(path)?;
    match decode_png(&bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            eprintln!("Error: Cannot decode {}: {}", path.display(), e);
            None
        }
    }
}

fn print_changed(changed: &[String]) {
    if changed.is_empty() {
        println!("No changes to the current asset");
    } else {
        println!("Changed: {}", changed.join(", "));
    }
}

/// Report a rejection, write its preview and record telemetry.
fn reject(command: &str, input: &Path, failure: &ValidationFailure, preview: Option<&Path>) -> ExitCode {
    eprintln!("Rejected [{}]: {}", failure.kind, failure.message);
    if let (Some(path), Some(image)) = (preview, failure.preview.as_ref()) {
        match save_png(image, path) {
            Ok(()) => eprintln!("Preview written to {}", path.display()),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    log::info!("{} rejected with {}", input.display(), failure.kind);
    telemetry::record_failure(command, Some(input), failure);
    ExitCode::from(EXIT_ERROR)
}
