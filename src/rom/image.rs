//! ROM images
//!
//! An [`Image`] ties a source path and a display name to the handler that
//! knows how to present the source's files under GDEMU's names, and copies
//! them into a destination folder.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{RomError, RomResult};
use super::formats::{is_enclosed_name, RomFormat, SourceKind};
use super::handler::FormatHandler;
use super::source::{resolve_source_path, ByteSource};

/// File written next to the disc files, holding the display name
pub const NAME_FILE: &str = "name.txt";

/// What to do with a destination folder that already has content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateMode {
    /// Create the folder if needed and overwrite files with the same name
    #[default]
    Default,
    /// Leave a non-empty destination folder untouched
    SkipIfPresent,
    /// Wipe the destination folder before copying
    ForceRetranslate,
}

/// Result of translating one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateOutcome {
    Skipped,
    Translated { files: usize },
}

/// A ROM image with its detected format
#[derive(Debug)]
pub struct Image {
    name: String,
    src: PathBuf,
    handler: FormatHandler,
}

impl Image {
    /// Open a ROM from a directory or zip file and detect its format.
    ///
    /// Relative paths are resolved against the executable's directory. The
    /// name mapping is built here so malformed descriptions are reported
    /// before anything is copied.
    pub fn open(src: impl AsRef<Path>, name: impl Into<String>) -> RomResult<Self> {
        let src = resolve_source_path(src.as_ref())?;
        let name = name.into();

        let kind = SourceKind::from_path(&src)
            .ok_or_else(|| RomError::UnsupportedSourceKind(src.clone()))?;
        log::debug!("Opening {} as {:?} source", src.display(), kind);

        let source = ByteSource::new(kind, src.clone())?;
        let mut handler = FormatHandler::detect(source)?;
        handler.mapping()?;

        log::info!(
            "{}: {} image from {}",
            name,
            handler.format().display_name(),
            src.display()
        );

        Ok(Self { name, src, handler })
    }

    /// Human readable name of this ROM
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the ROM's source on the filesystem
    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn format(&self) -> RomFormat {
        self.handler.format()
    }

    pub fn handler(&self) -> &FormatHandler {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut FormatHandler {
        &mut self.handler
    }

    /// Copy the image into `dst_dir` under canonical names, plus [`NAME_FILE`]
    pub fn translate(
        &mut self,
        dst_dir: &Path,
        mode: TranslateMode,
    ) -> RomResult<TranslateOutcome> {
        if dst_dir.exists() && !dst_dir.is_dir() {
            return Err(RomError::DestinationNotDirectory(dst_dir.to_path_buf()));
        }

        match mode {
            TranslateMode::SkipIfPresent if has_content(dst_dir)? => {
                log::info!("Skipping rom {}, {} already populated", self.name, dst_dir.display());
                return Ok(TranslateOutcome::Skipped);
            }
            TranslateMode::ForceRetranslate if dst_dir.is_dir() => {
                log::debug!("Clearing {}", dst_dir.display());
                fs::remove_dir_all(dst_dir)?;
            }
            _ => {}
        }
        fs::create_dir_all(dst_dir)?;

        log::info!("Translating rom {}", self.name);
        let names = self.handler.canonical_names()?;
        if let Some(name) = names.iter().find(|name| !is_enclosed_name(name)) {
            return Err(RomError::UnsafeEntryName(name.clone()));
        }
        for name in &names {
            log::info!("Copying {} to {}", name, dst_dir.display());
            let copied = self.copy_entry(name, &dst_dir.join(name));
            self.handler.close();
            let bytes = copied?;
            log::debug!("Copied {} bytes", bytes);
        }

        fs::write(dst_dir.join(NAME_FILE), &self.name)?;

        Ok(TranslateOutcome::Translated { files: names.len() })
    }

    fn copy_entry(&mut self, name: &str, dst: &Path) -> RomResult<u64> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut reader = self.handler.open(name)?;
        let mut writer = BufWriter::new(File::create(dst)?);
        let bytes = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        Ok(bytes)
    }
}

/// True if `dir` exists and has at least one entry
fn has_content(dir: &Path) -> io::Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
