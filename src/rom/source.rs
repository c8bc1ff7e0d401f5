//! Byte sources
//!
//! A uniform "named byte stream" view over the two ways a ROM can be stored:
//! entries inside a zip container, or files directly under a directory.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use super::error::{RomError, RomResult};
use super::formats::SourceKind;

type ZipReader = ZipArchive<BufReader<File>>;

/// Resolve a source path to an absolute path.
///
/// Relative paths are taken relative to the directory holding the running
/// executable, not the current working directory.
pub fn resolve_source_path(path: &Path) -> RomResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let exe_path = std::env::current_exe()?;
    let exe_dir = exe_path.parent().unwrap_or(Path::new("/"));
    Ok(exe_dir.join(path))
}

/// One name listed by a byte source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceEntry {
    pub name: String,
    /// Zip directory member or sub-directory; never opened as a stream
    pub is_dir: bool,
}

impl SourceEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// A named, openable byte stream store
#[derive(Debug)]
pub enum ByteSource {
    Zip(ZipSource),
    Directory(DirectorySource),
}

impl ByteSource {
    /// Open a source of the given kind rooted at `path`
    pub fn new(kind: SourceKind, path: PathBuf) -> RomResult<Self> {
        match kind {
            SourceKind::Zip => ZipSource::new(path).map(Self::Zip),
            SourceKind::Directory => DirectorySource::new(path).map(Self::Directory),
        }
    }

    /// Absolute path of the backing file or directory
    pub fn path(&self) -> &Path {
        match self {
            Self::Zip(source) => &source.path,
            Self::Directory(source) => &source.root,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Zip(_) => SourceKind::Zip,
            Self::Directory(_) => SourceKind::Directory,
        }
    }

    /// List every entry name at the top level of the source, in enumeration order
    pub fn list_entries(&self) -> RomResult<Vec<SourceEntry>> {
        match self {
            Self::Zip(source) => source.list_entries(),
            Self::Directory(source) => source.list_entries(),
        }
    }

    /// Open one entry for reading.
    ///
    /// The returned stream borrows the source; the underlying handle stays held
    /// until [`ByteSource::close`] is called.
    pub fn open(&mut self, entry: &str) -> RomResult<Box<dyn Read + '_>> {
        match self {
            Self::Zip(source) => source.open(entry),
            Self::Directory(source) => source.open(entry),
        }
    }

    /// Release the stream opened by the most recent `open`. No-op if nothing is open.
    pub fn close(&mut self) {
        match self {
            Self::Zip(source) => source.close(),
            Self::Directory(source) => source.close(),
        }
    }
}

/// Entries stored inside a zip container
pub struct ZipSource {
    path: PathBuf,
    archive: Option<ZipReader>,
}

impl std::fmt::Debug for ZipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipSource")
            .field("path", &self.path)
            .field("open", &self.archive.is_some())
            .finish()
    }
}

impl ZipSource {
    /// Create a zip source, checking that the container can be read at all
    pub fn new(path: PathBuf) -> RomResult<Self> {
        Self::read_archive(&path)?;
        Ok(Self {
            path,
            archive: None,
        })
    }

    fn read_archive(path: &Path) -> RomResult<ZipReader> {
        let unreadable = |reason: String| RomError::UnreadableSource {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| unreadable(e.to_string()))
    }

    fn list_entries(&self) -> RomResult<Vec<SourceEntry>> {
        let mut archive = Self::read_archive(&self.path)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            entries.push(SourceEntry {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
            });
        }
        Ok(entries)
    }

    // Every open re-reads the container so no decoder state is shared between entries.
    fn open(&mut self, entry: &str) -> RomResult<Box<dyn Read + '_>> {
        log::debug!("Opening {} from {}", entry, self.path.display());
        let archive = Self::read_archive(&self.path)?;
        // Only hold on to the archive once the member is known to exist
        let index = archive.index_for_name(entry).ok_or(ZipError::FileNotFound)?;
        let archive = self.archive.insert(archive);
        Ok(Box::new(archive.by_index(index)?))
    }

    fn close(&mut self) {
        self.archive = None;
    }
}

/// Files stored directly under a directory (non-recursive)
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    file: Option<BufReader<File>>,
}

impl DirectorySource {
    pub fn new(root: PathBuf) -> RomResult<Self> {
        fs::read_dir(&root).map_err(|e| RomError::UnreadableSource {
            path: root.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { root, file: None })
    }

    fn list_entries(&self) -> RomResult<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let is_dir = entry.path().is_dir();
            match entry.file_name().into_string() {
                Ok(name) => entries.push(SourceEntry { name, is_dir }),
                Err(name) => log::warn!(
                    "Ignoring non UTF-8 entry {:?} in {}",
                    name,
                    self.root.display()
                ),
            }
        }
        Ok(entries)
    }

    fn open(&mut self, entry: &str) -> RomResult<Box<dyn Read + '_>> {
        let path = self.root.join(entry);
        log::debug!("Opening {}", path.display());
        let file = self.file.insert(BufReader::new(File::open(path)?));
        Ok(Box::new(file))
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Write a deflate-compressed zip with the given members
    pub(crate) fn create_test_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_entry(source: &mut ByteSource, entry: &str) -> Vec<u8> {
        let mut data = Vec::new();
        source.open(entry).unwrap().read_to_end(&mut data).unwrap();
        source.close();
        data
    }

    #[test]
    fn test_zip_source() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("game.zip");
        create_test_zip(&zip_path, &[("image.cdi", b"CDIDATA"), ("readme.txt", b"hi")]);

        let mut source = ByteSource::new(SourceKind::Zip, zip_path.clone()).unwrap();
        assert_eq!(source.kind(), SourceKind::Zip);
        assert_eq!(source.path(), zip_path.as_path());

        let mut entries = source.list_entries().unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![SourceEntry::file("image.cdi"), SourceEntry::file("readme.txt")]
        );

        assert_eq!(read_entry(&mut source, "image.cdi"), b"CDIDATA");
        assert_eq!(read_entry(&mut source, "readme.txt"), b"hi");
    }

    #[test]
    fn test_zip_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("game.zip");
        create_test_zip(&zip_path, &[("image.cdi", b"CDIDATA")]);

        let mut source = ByteSource::new(SourceKind::Zip, zip_path).unwrap();
        assert!(matches!(source.open("nope.bin"), Err(RomError::Zip(_))));
        // Nothing is left held after a failed open
        let ByteSource::Zip(zip) = &source else {
            panic!("expected a zip source");
        };
        assert!(zip.archive.is_none());
        assert_eq!(read_entry(&mut source, "image.cdi"), b"CDIDATA");
    }

    #[test]
    fn test_zip_directory_members() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("game.zip");
        let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("extras/", options).unwrap();
        zip.start_file("image.cdi", options).unwrap();
        zip.write_all(b"CDI").unwrap();
        zip.finish().unwrap();

        let source = ByteSource::new(SourceKind::Zip, zip_path).unwrap();
        let mut entries = source.list_entries().unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![SourceEntry::dir("extras/"), SourceEntry::file("image.cdi")]
        );
    }

    #[test]
    fn test_corrupt_zip_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"this is not a zip file").unwrap();

        let result = ByteSource::new(SourceKind::Zip, zip_path);
        assert!(matches!(result, Err(RomError::UnreadableSource { .. })));
    }

    #[test]
    fn test_missing_zip_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = ByteSource::new(SourceKind::Zip, dir.path().join("missing.zip"));
        assert!(matches!(result, Err(RomError::UnreadableSource { .. })));
    }

    #[test]
    fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game.gdi"), b"0\n").unwrap();
        std::fs::write(dir.path().join("track01.bin"), [0xAA; 16]).unwrap();
        std::fs::create_dir(dir.path().join("extras")).unwrap();

        let mut source = ByteSource::new(SourceKind::Directory, dir.path().to_path_buf()).unwrap();
        let mut entries = source.list_entries().unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                SourceEntry::dir("extras"),
                SourceEntry::file("game.gdi"),
                SourceEntry::file("track01.bin"),
            ]
        );

        assert_eq!(read_entry(&mut source, "track01.bin"), vec![0xAA; 16]);
        assert_eq!(read_entry(&mut source, "game.gdi"), b"0\n");
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ByteSource::new(SourceKind::Directory, dir.path().to_path_buf()).unwrap();
        source.close();
        source.close();
    }

    #[test]
    fn test_resolve_source_path() {
        let absolute = Path::new("/roms/game.zip");
        assert_eq!(resolve_source_path(absolute).unwrap(), absolute);

        let resolved = resolve_source_path(Path::new("roms/game.zip")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("roms/game.zip"));

        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert!(resolved.starts_with(exe_dir));
    }
}
