//! Command-line interface implementation
//!
//! This module parses arguments, loads configuration and dispatches to
//! submodules for the command implementations.

mod inspect;
mod recolor;
mod verify;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::telemetry;
use crate::verify::AckFlags;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Spritecheck - verify sprite and portrait submissions for a pixel-art catalog
#[derive(Parser, Debug)]
#[command(name = "spritecheck")]
#[command(about = "Verify sprite and portrait submissions for a pixel-art catalog")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: nearest spritecheck.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the palette cap for sprites and portrait tiles
    #[arg(long, global = true)]
    pub max_colors: Option<usize>,

    /// Append rejections to the telemetry log
    #[arg(long, global = true)]
    pub collect_errors: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Acknowledgements that let a submission past escapable checks.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AckArgs {
    /// Outline pixels were recolored on purpose
    #[arg(long)]
    pub lineart: bool,

    /// Portrait tiles may exceed the color cap
    #[arg(long)]
    pub overcolor: bool,

    /// Identical frames with different offsets are intended
    #[arg(long)]
    pub multioffset: bool,

    /// Flipped portraits are deliberately incomplete
    #[arg(long)]
    pub noflip: bool,

    /// Exact change in palette size a recolor introduces
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub colormod: i32,

    /// Exact palette size of a sprite over the cap
    #[arg(long)]
    pub colors: Option<usize>,
}

/// The node's accepted original and recolor, applied to the current asset
/// before the locked check.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownPairArgs {
    /// Accepted original of the node's known recolor pair
    #[arg(long, requires = "known_recolor")]
    pub known_original: Option<PathBuf>,

    /// Accepted recolor of `--known-original`
    #[arg(long, requires = "known_original")]
    pub known_recolor: Option<PathBuf>,
}

impl KnownPairArgs {
    fn paths(&self) -> Option<(&Path, &Path)> {
        Some((self.known_original.as_deref()?, self.known_recolor.as_deref()?))
    }
}

impl From<&AckArgs> for AckFlags {
    fn from(args: &AckArgs) -> Self {
        AckFlags {
            lineart: args.lineart,
            overcolor: args.overcolor,
            multioffset: args.multioffset,
            noflip: args.noflip,
            colormod: args.colormod,
            colors: args.colors,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a sprite archive (zip with AnimData.xml and sheets)
    Sprite {
        /// Submitted sprite zip
        input: PathBuf,

        /// Accepted original; verifies the input as its recolor
        #[arg(long)]
        original: Option<PathBuf>,

        /// Currently accepted sprite (directory or zip) for the locked check
        #[arg(long)]
        current: Option<PathBuf>,

        /// Locked animation names (repeat or comma-separate)
        #[arg(long, value_delimiter = ',')]
        locked: Vec<String>,

        #[command(flatten)]
        known: KnownPairArgs,

        #[command(flatten)]
        ack: AckArgs,

        /// Write the rejection preview image here
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Verify a portrait sheet (PNG)
    Portrait {
        /// Submitted portrait sheet
        input: PathBuf,

        /// Accepted original; verifies the input as its recolor
        #[arg(long)]
        original: Option<PathBuf>,

        /// Currently accepted sheet for the locked check
        #[arg(long)]
        current: Option<PathBuf>,

        /// Locked emotion names, `^` suffix for flipped (repeat or comma-separate)
        #[arg(long, value_delimiter = ',')]
        locked: Vec<String>,

        #[command(flatten)]
        known: KnownPairArgs,

        #[command(flatten)]
        ack: AckArgs,

        /// Write the rejection preview image here
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Draft a recolor of new art from a known original/recolor pair.
    /// PNG inputs are treated as portraits, anything else as sprites.
    Recolor {
        /// Previously accepted original
        previous: PathBuf,

        /// Accepted recolor of the previous original
        previous_recolor: PathBuf,

        /// New original to recolor
        current: PathBuf,

        /// Output file or directory.
        /// If omitted: {current}_recolor.{zip|png}
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the unique frames of a sprite as one image
    Frames {
        /// Sprite zip or directory
        input: PathBuf,

        /// Output PNG.
        /// If omitted: {input}_frames.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames per row (default: roughly square)
        #[arg(long)]
        columns: Option<u32>,

        /// Scale factor (1-16)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,
    },

    /// Parse an AnimData.xml and list its animations
    Descriptor {
        /// Descriptor file
        input: PathBuf,

        /// Print the descriptor re-serialized instead of the listing
        #[arg(long)]
        normalize: bool,
    },
}

/// Run the CLI after argument parsing.
pub fn run(cli: Cli) -> ExitCode {
    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let overrides = CliOverrides {
        sprite_max_colors: cli.max_colors,
        portrait_max_colors: cli.max_colors,
        collect_errors: cli.collect_errors.then_some(true),
    };
    merge_cli_overrides(&mut config, &overrides);
    if config.telemetry.collect_errors {
        telemetry::init_collector(&config.telemetry.error_log, true);
    }

    match cli.command {
        Commands::Sprite { input, original, current, locked, known, ack, preview } => verify::run_sprite(
            &input,
            original.as_deref(),
            current.as_deref(),
            &locked,
            known.paths(),
            &AckFlags::from(&ack),
            preview.as_deref(),
            &config,
        ),
        Commands::Portrait { input, original, current, locked, known, ack, preview } => verify::run_portrait(
            &input,
            original.as_deref(),
            current.as_deref(),
            &locked,
            known.paths(),
            &AckFlags::from(&ack),
            preview.as_deref(),
            &config,
        ),
        Commands::Recolor { previous, previous_recolor, current, output } => {
            recolor::run_recolor(&previous, &previous_recolor, &current, output.as_deref(), &config)
        }
        Commands::Frames { input, output, columns, scale } => {
            inspect::run_frames(&input, output.as_deref(), columns, scale, &config)
        }
        Commands::Descriptor { input, normalize } => inspect::run_descriptor(&input, normalize, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sprite_with_flags() {
        let cli = Cli::try_parse_from([
            "spritecheck",
            "sprite",
            "shiny.zip",
            "--original",
            "base.zip",
            "--locked",
            "Walk,Idle",
            "--lineart",
            "--colormod",
            "-2",
        ])
        .unwrap();
        match cli.command {
            Commands::Sprite { input, original, locked, ack, .. } => {
                assert_eq!(input, PathBuf::from("shiny.zip"));
                assert_eq!(original, Some(PathBuf::from("base.zip")));
                assert_eq!(locked, vec!["Walk".to_string(), "Idle".to_string()]);
                let flags = AckFlags::from(&ack);
                assert!(flags.lineart);
                assert_eq!(flags.colormod, -2);
                assert_eq!(flags.colors, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_known_pair_needs_both_sides() {
        assert!(Cli::try_parse_from(["spritecheck", "sprite", "s.zip", "--known-original", "a.zip"]).is_err());
        let cli = Cli::try_parse_from([
            "spritecheck",
            "portrait",
            "p.png",
            "--known-original",
            "a.png",
            "--known-recolor",
            "b.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Portrait { known, .. } => {
                assert_eq!(known.paths(), Some((Path::new("a.png"), Path::new("b.png"))));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["spritecheck", "portrait", "p.png", "--max-colors", "20", "-v"]).unwrap();
        assert_eq!(cli.max_colors, Some(20));
        assert!(cli.verbose);
    }

    #[test]
    fn test_scale_range() {
        assert!(Cli::try_parse_from(["spritecheck", "frames", "s.zip", "--scale", "0"]).is_err());
        assert!(Cli::try_parse_from(["spritecheck", "frames", "s.zip", "--scale", "4"]).is_ok());
    }
}
