//! CDI image handling
//!
//! A CDI image is one self-contained file, so only that file is renamed;
//! everything else in the source is passed through under its own name.

use std::io::Read;

use super::error::{RomError, RomResult};
use super::formats::{is_enclosed_name, RomFormat};
use super::handler::{NameMapping, OpenSlot};
use super::source::{ByteSource, SourceEntry};

/// Map every file entry to itself, except the image file which becomes `disc.cdi`.
///
/// Directory entries are not content and are left out. Entries whose names
/// would land outside the destination are dropped, as is any other entry
/// already called `disc.cdi`, since that name belongs to the image file.
pub fn map_cdi_names(cdi_file: &str, entries: &[SourceEntry]) -> NameMapping {
    let image_name = RomFormat::Cdi.canonical_image_name();
    let mut mapping = NameMapping::new();
    mapping.insert(image_name.to_string(), cdi_file.to_string());

    for entry in entries.iter().filter(|entry| !entry.is_dir) {
        let name = entry.name.as_str();
        if name == cdi_file {
            continue;
        }
        if !is_enclosed_name(name) {
            log::warn!("Ignoring entry {:?}: not a plain relative name", name);
            continue;
        }
        if name == image_name {
            log::warn!("Ignoring entry {}: name is taken by {}", name, cdi_file);
            continue;
        }
        mapping.insert(name.to_string(), name.to_string());
    }

    mapping
}

#[derive(Debug)]
pub struct CdiHandler {
    source: ByteSource,
    cdi_file: String,
    mapping: Option<NameMapping>,
    slot: OpenSlot,
}

impl CdiHandler {
    pub fn new(source: ByteSource, cdi_file: String) -> Self {
        Self {
            source,
            cdi_file,
            mapping: None,
            slot: OpenSlot::default(),
        }
    }

    pub fn critical_file(&self) -> &str {
        &self.cdi_file
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    pub fn mapping(&mut self) -> RomResult<&NameMapping> {
        let mapping = match self.mapping.take() {
            Some(mapping) => mapping,
            None => map_cdi_names(&self.cdi_file, &self.source.list_entries()?),
        };
        Ok(self.mapping.insert(mapping))
    }

    pub fn canonical_names(&mut self) -> RomResult<Vec<String>> {
        Ok(self.mapping()?.keys().cloned().collect())
    }

    pub fn open(&mut self, name: &str) -> RomResult<Box<dyn Read + '_>> {
        self.slot.check(name)?;

        let original = self
            .mapping()?
            .get(name)
            .cloned()
            .ok_or_else(|| RomError::UnknownCanonicalName(name.to_string()))?;
        let reader = self.source.open(&original)?;
        self.slot.acquire_source();
        Ok(reader)
    }

    pub fn close(&mut self) {
        if self.slot.release() {
            self.source.close();
        }
    }
}
