//! GDI disc description handling
//!
//! A GDI file is a small text table: the first line holds the track count and
//! every following line describes one track as whitespace separated fields,
//! the fifth of which names the track's data file. GDEMU wants the tracks
//! named `trackNN.<ext>`, so the description is rewritten to match.

use std::io::{Cursor, Read};

use super::error::{RomError, RomResult};
use super::fields::split_fields;
use super::formats::{dotted_extension, RomFormat};
use super::handler::{NameMapping, OpenSlot};
use super::source::ByteSource;

/// Index of the filename within a track line
const FILENAME_FIELD: usize = 4;

/// Result of rewriting a GDI description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdiTranslation {
    /// Canonical name -> original entry name
    pub mapping: NameMapping,
    /// Patched description text served as `disc.gdi`
    pub patched: String,
}

/// Canonical name for the `index`-th track (1-based) with the original file's extension
pub fn track_name(index: usize, original: &str) -> String {
    format!("track{:02}{}", index, dotted_extension(original))
}

/// Parse a GDI description and compute the canonical names and the patched text.
///
/// `gdi_file` is the entry name of the description itself, mapped as `disc.gdi`.
pub fn translate_gdi(gdi_file: &str, content: &str) -> RomResult<GdiTranslation> {
    let mut lines = content.split('\n');

    let header = lines.next().unwrap_or_default().trim();
    let track_count: usize = header.parse().map_err(|_| {
        RomError::MalformedDescription(format!("invalid track count {:?} in {}", header, gdi_file))
    })?;

    let mut mapping = NameMapping::new();
    mapping.insert(RomFormat::Gdi.canonical_image_name().to_string(), gdi_file.to_string());

    let mut patched = format!("{}\n", header);

    for index in 1..=track_count {
        let line = lines.next().ok_or_else(|| {
            RomError::MalformedDescription(format!(
                "{} declares {} tracks but only has {}",
                gdi_file,
                track_count,
                index - 1
            ))
        })?;

        let mut fields = split_fields(line).map_err(|e| {
            RomError::MalformedDescription(format!("track line {} of {}: {}", index, gdi_file, e))
        })?;

        let Some(original) = fields.get_mut(FILENAME_FIELD) else {
            return Err(RomError::MalformedDescription(format!(
                "track line {} of {} has {} fields, expected at least {}",
                index,
                gdi_file,
                fields.len(),
                FILENAME_FIELD + 1
            )));
        };

        let canonical = track_name(index, original);
        log::debug!("Mapping GDI track {} -> {}", original, canonical);

        let original = std::mem::replace(original, canonical.clone());
        mapping.insert(canonical, original);

        // Quoting is not restored when re-joining
        patched.push_str(&fields.join(" "));
        patched.push('\n');
    }

    Ok(GdiTranslation { mapping, patched })
}

fn load_translation<'a>(
    cache: &'a mut Option<GdiTranslation>,
    source: &mut ByteSource,
    gdi_file: &str,
) -> RomResult<&'a GdiTranslation> {
    let translation = match cache.take() {
        Some(translation) => translation,
        None => {
            let content = read_description(source, gdi_file)?;
            let translation = translate_gdi(gdi_file, &content)?;
            log::debug!(
                "Translated {} with {} tracks",
                gdi_file,
                translation.mapping.len() - 1
            );
            translation
        }
    };
    Ok(cache.insert(translation))
}

fn read_description(source: &mut ByteSource, gdi_file: &str) -> RomResult<String> {
    let mut content = String::new();
    let read = source
        .open(gdi_file)
        .and_then(|mut reader| reader.read_to_string(&mut content).map_err(RomError::from));
    source.close();

    match read {
        Ok(_) => Ok(content),
        Err(RomError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => Err(
            RomError::MalformedDescription(format!("{} is not UTF-8 text", gdi_file)),
        ),
        Err(e) => Err(e),
    }
}

/// Handler for GDI images: tracks renamed, description synthesized
#[derive(Debug)]
pub struct GdiHandler {
    source: ByteSource,
    gdi_file: String,
    translation: Option<GdiTranslation>,
    slot: OpenSlot,
}

impl GdiHandler {
    pub fn new(source: ByteSource, gdi_file: String) -> Self {
        Self {
            source,
            gdi_file,
            translation: None,
            slot: OpenSlot::default(),
        }
    }

    pub fn critical_file(&self) -> &str {
        &self.gdi_file
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    /// Read the original description and build the translation if not done yet
    pub fn translation(&mut self) -> RomResult<&GdiTranslation> {
        load_translation(&mut self.translation, &mut self.source, &self.gdi_file)
    }

    pub fn canonical_names(&mut self) -> RomResult<Vec<String>> {
        Ok(self.translation()?.mapping.keys().cloned().collect())
    }

    pub fn open(&mut self, name: &str) -> RomResult<Box<dyn Read + '_>> {
        let Self {
            source,
            gdi_file,
            translation,
            slot,
        } = self;

        slot.check(name)?;
        let translation = load_translation(translation, source, gdi_file)?;

        if name == RomFormat::Gdi.canonical_image_name() {
            slot.acquire_synthesized();
            return Ok(Box::new(Cursor::new(translation.patched.as_bytes())));
        }

        let original = translation
            .mapping
            .get(name)
            .ok_or_else(|| RomError::UnknownCanonicalName(name.to_string()))?;
        let reader = source.open(original)?;
        slot.acquire_source();
        Ok(reader)
    }

    pub fn close(&mut self) {
        if self.slot.release() {
            self.source.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::formats::SourceKind;

    const EXAMPLE_GDI: &str =
        "2\n0 0 4 2352 track1.bin 0\n1 600 0 2352 \"track 2.raw\" 0\n";

    #[test]
    fn test_translate_example() {
        let translation = translate_gdi("game.gdi", EXAMPLE_GDI).unwrap();

        let names: Vec<&str> = translation.mapping.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["disc.gdi", "track01.bin", "track02.raw"]);
        assert_eq!(translation.mapping["disc.gdi"], "game.gdi");
        assert_eq!(translation.mapping["track01.bin"], "track1.bin");
        assert_eq!(translation.mapping["track02.raw"], "track 2.raw");
        assert_eq!(
            translation.patched,
            "2\n0 0 4 2352 track01.bin 0\n1 600 0 2352 track02.raw 0\n"
        );
    }

    #[test]
    fn test_track_position_sets_number() {
        let gdi = "3\n\
                   1 0 4 2352 a.bin 0\n\
                   2 450 0 2352 b.raw 0\n\
                   3 45000 4 2352 foo.raw 0\n";
        let translation = translate_gdi("x.gdi", gdi).unwrap();
        assert_eq!(translation.mapping.len(), 4);
        assert_eq!(translation.mapping["track03.raw"], "foo.raw");
        assert!(translation.patched.starts_with("3\n"));
    }

    #[test]
    fn test_header_is_kept_as_written() {
        let translation = translate_gdi("x.gdi", "01\r\n1 0 4 2352 data.iso 0\r\n").unwrap();
        assert_eq!(translation.patched, "01\n1 0 4 2352 track01.iso 0\n");
    }

    #[test]
    fn test_extensionless_track() {
        assert_eq!(track_name(1, "TRACK"), "track01");
        assert_eq!(track_name(12, "dir/t.bin"), "track12.bin");
    }

    #[test]
    fn test_trailing_lines_ignored() {
        let gdi = "1\n1 0 4 2352 a.bin 0\n\n# extra\n";
        let translation = translate_gdi("x.gdi", gdi).unwrap();
        assert_eq!(translation.patched, "1\n1 0 4 2352 track01.bin 0\n");
    }

    #[test]
    fn test_malformed_descriptions() {
        let malformed = [
            "",
            "two\n1 0 4 2352 a.bin 0\n",
            "-1\n",
            "2\n1 0 4 2352 a.bin 0\n",
            "1\n1 0 4 2352\n",
            "1\n",
            "1\n1 0 4 2352 \"a.bin 0\n",
        ];
        for gdi in malformed {
            assert!(
                matches!(translate_gdi("x.gdi", gdi), Err(RomError::MalformedDescription(_))),
                "expected {:?} to be rejected",
                gdi
            );
        }
    }

    #[test]
    fn test_zero_tracks() {
        let translation = translate_gdi("x.gdi", "0\n").unwrap();
        assert_eq!(translation.mapping.len(), 1);
        assert_eq!(translation.patched, "0\n");
    }

    fn example_handler(dir: &std::path::Path) -> GdiHandler {
        std::fs::write(dir.join("game.gdi"), EXAMPLE_GDI).unwrap();
        std::fs::write(dir.join("track1.bin"), [1u8; 32]).unwrap();
        std::fs::write(dir.join("track 2.raw"), [2u8; 32]).unwrap();
        let source = ByteSource::new(SourceKind::Directory, dir.to_path_buf()).unwrap();
        GdiHandler::new(source, "game.gdi".to_string())
    }

    #[test]
    fn test_handler_open_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = example_handler(dir.path());

        let mut patched = String::new();
        handler.open("disc.gdi").unwrap().read_to_string(&mut patched).unwrap();
        handler.close();
        assert_eq!(patched, "2\n0 0 4 2352 track01.bin 0\n1 600 0 2352 track02.raw 0\n");

        let mut data = Vec::new();
        handler.open("track02.raw").unwrap().read_to_end(&mut data).unwrap();
        handler.close();
        assert_eq!(data, vec![2u8; 32]);
    }

    #[test]
    fn test_handler_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut handler = example_handler(dir.path());
        assert!(matches!(handler.open("game.gdi"), Err(RomError::UnknownCanonicalName(_))));
        // A failed open leaves the slot free
        assert!(handler.open("track01.bin").is_ok());
    }

    #[test]
    fn test_handler_non_utf8_description() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game.gdi"), [b'1', b'\n', 0xFF, 0xFE]).unwrap();
        let source = ByteSource::new(SourceKind::Directory, dir.path().to_path_buf()).unwrap();
        let mut handler = GdiHandler::new(source, "game.gdi".to_string());
        assert!(matches!(handler.canonical_names(), Err(RomError::MalformedDescription(_))));
    }
}
