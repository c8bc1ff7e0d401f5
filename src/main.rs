//! GDEMU ROM support
//!
//! Copies the Dreamcast disc images listed in config.json onto a GDEMU SD card,
//! one numbered folder per image, renaming files to what GDEMU expects.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use gdemu_romsupport::config::AppConfig;
use gdemu_romsupport::rom::{Image, RomResult, TranslateOutcome};

/// Prepare a GDEMU SD card from zip files and directories of disc images
#[derive(Parser, Debug)]
#[command(name = "gdemu-romsupport", version)]
struct Args {
    /// Configuration file (defaults to config.json in the current or executable directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only list the files each image would produce
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0;
    for (index, rom) in config.roms.iter().enumerate() {
        let dst_dir = config.slot_dir(index);
        let result = Image::open(&rom.src, rom.name.as_str()).and_then(|mut image| {
            if args.dry_run {
                list_image(&mut image, &dst_dir)
            } else {
                image.translate(&dst_dir, rom.mode).map(|outcome| match outcome {
                    TranslateOutcome::Skipped => log::info!("{}: skipped", rom.name),
                    TranslateOutcome::Translated { files } => {
                        log::info!("{}: {} files in {}", rom.name, files, dst_dir.display())
                    }
                })
            }
        });

        if let Err(e) = result {
            log::error!("Skipping rom {} ({}): {}", rom.name, rom.src.display(), e);
            failures += 1;
        }
    }

    if failures > 0 {
        log::error!("{} of {} roms failed", failures, config.roms.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn list_image(image: &mut Image, dst_dir: &std::path::Path) -> RomResult<()> {
    let mapping = image.handler_mut().mapping()?.clone();
    println!("{} -> {}", image.name(), dst_dir.display());
    for (canonical, original) in &mapping {
        println!("  {} <- {}", canonical, original);
    }
    Ok(())
}
