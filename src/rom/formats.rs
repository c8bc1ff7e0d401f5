//! ROM format and source kind definitions

use std::path::{Component, Path};

/// Disc description formats understood by GDEMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomFormat {
    /// GD-ROM description (.gdi) with one data file per track
    Gdi,
    /// DiscJuggler image (.cdi), a single self-contained file
    Cdi,
}

impl RomFormat {
    /// Detect the format from an entry name's extension.
    ///
    /// Matching is exact and case-sensitive: `game.GDI` is not a description file.
    pub fn from_entry_name(name: &str) -> Option<Self> {
        match Path::new(name).extension()?.to_str()? {
            "gdi" => Some(Self::Gdi),
            "cdi" => Some(Self::Cdi),
            _ => None,
        }
    }

    /// Get the display name for this format
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gdi => "GDI",
            Self::Cdi => "CDI (DiscJuggler)",
        }
    }

    /// Canonical name GDEMU expects for the description/image file
    pub fn canonical_image_name(&self) -> &'static str {
        match self {
            Self::Gdi => "disc.gdi",
            Self::Cdi => "disc.cdi",
        }
    }
}

/// How a ROM's files are stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Files live inside a single zip container
    Zip,
    /// Files live directly under a directory
    Directory,
}

impl SourceKind {
    /// Decide the source kind from the shape of a path.
    ///
    /// Existing directories win; otherwise a `.zip` extension selects the container.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(Self::Directory);
        }

        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
            .then_some(Self::Zip)
    }
}

/// Extension of an original filename including the leading dot, or "" if none
pub(crate) fn dotted_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// True if `name` is a relative path that stays inside the directory it is joined to
pub fn is_enclosed_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
