//! Format handlers
//!
//! A handler wraps a [`ByteSource`] and presents its contents under the names
//! GDEMU expects. Detection picks the variant from the source's entry names.

use std::collections::BTreeMap;
use std::io::Read;

use super::cdi::CdiHandler;
use super::error::{RomError, RomResult};
use super::formats::RomFormat;
use super::gdi::GdiHandler;
use super::source::ByteSource;

/// Canonical name -> original entry name, ordered by canonical name
pub type NameMapping = BTreeMap<String, String>;

/// Tracks the single stream a handler may have outstanding
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenSlot {
    #[default]
    Idle,
    /// Serving in-memory content
    Synthesized,
    /// Serving a stream borrowed from the byte source
    Source,
}

impl OpenSlot {
    /// Fail if a previous open has not been closed yet
    pub(crate) fn check(&self, name: &str) -> RomResult<()> {
        match self {
            Self::Idle => Ok(()),
            _ => Err(RomError::AlreadyOpen(name.to_string())),
        }
    }

    pub(crate) fn acquire_synthesized(&mut self) {
        *self = Self::Synthesized;
    }

    pub(crate) fn acquire_source(&mut self) {
        *self = Self::Source;
    }

    /// Free the slot. Returns true when the byte source must be closed too.
    pub(crate) fn release(&mut self) -> bool {
        std::mem::take(self) == Self::Source
    }
}

/// Presents a ROM's contents under canonical names
#[derive(Debug)]
pub enum FormatHandler {
    Gdi(GdiHandler),
    Cdi(CdiHandler),
}

impl FormatHandler {
    /// Inspect the source's entries and wrap it in the matching handler.
    ///
    /// Entries are scanned in sorted order so the result does not depend on
    /// how the backing store happens to enumerate them.
    pub fn detect(source: ByteSource) -> RomResult<Self> {
        let mut entries = source.list_entries()?;
        entries.sort();

        let mut found = entries
            .iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                RomFormat::from_entry_name(&entry.name).map(|format| (format, &entry.name))
            });

        let Some((format, critical_file)) = found.next() else {
            return Err(RomError::FormatUndetermined(source.path().to_path_buf()));
        };

        if found.any(|(other, _)| other != format) {
            log::warn!(
                "{} contains both GDI and CDI files, using {}",
                source.path().display(),
                critical_file
            );
        }

        log::debug!(
            "Detected {} image in {} ({})",
            format.display_name(),
            source.path().display(),
            critical_file
        );

        let critical_file = critical_file.clone();
        Ok(match format {
            RomFormat::Gdi => Self::Gdi(GdiHandler::new(source, critical_file)),
            RomFormat::Cdi => Self::Cdi(CdiHandler::new(source, critical_file)),
        })
    }

    pub fn format(&self) -> RomFormat {
        match self {
            Self::Gdi(_) => RomFormat::Gdi,
            Self::Cdi(_) => RomFormat::Cdi,
        }
    }

    /// Entry whose extension identified the format
    pub fn critical_file(&self) -> &str {
        match self {
            Self::Gdi(handler) => handler.critical_file(),
            Self::Cdi(handler) => handler.critical_file(),
        }
    }

    pub fn source(&self) -> &ByteSource {
        match self {
            Self::Gdi(handler) => handler.source(),
            Self::Cdi(handler) => handler.source(),
        }
    }

    /// Canonical name -> original entry name, built on first use
    pub fn mapping(&mut self) -> RomResult<&NameMapping> {
        match self {
            Self::Gdi(handler) => Ok(&handler.translation()?.mapping),
            Self::Cdi(handler) => handler.mapping(),
        }
    }

    /// Names that must exist in the destination layout, in a stable order
    pub fn canonical_names(&mut self) -> RomResult<Vec<String>> {
        match self {
            Self::Gdi(handler) => handler.canonical_names(),
            Self::Cdi(handler) => handler.canonical_names(),
        }
    }

    /// Open the content for one canonical name.
    ///
    /// Only one stream may be outstanding; call [`FormatHandler::close`] before
    /// opening the next one.
    pub fn open(&mut self, name: &str) -> RomResult<Box<dyn Read + '_>> {
        match self {
            Self::Gdi(handler) => handler.open(name),
            Self::Cdi(handler) => handler.open(name),
        }
    }

    /// Release the outstanding stream, if any
    pub fn close(&mut self) {
        match self {
            Self::Gdi(handler) => handler.close(),
            Self::Cdi(handler) => handler.close(),
        }
    }
}
