//! ROM image handling
//!
//! Reads Dreamcast disc images stored as zip files or plain directories and
//! presents them under the fixed names GDEMU expects (`disc.gdi`/`disc.cdi`,
//! `trackNN.<ext>`).

mod cdi;
mod error;
mod fields;
mod formats;
mod gdi;
mod handler;
mod image;
mod source;

pub use cdi::{map_cdi_names, CdiHandler};
pub use error::{RomError, RomResult};
pub use fields::{split_fields, FieldError};
pub use formats::{is_enclosed_name, RomFormat, SourceKind};
pub use gdi::{track_name, translate_gdi, GdiHandler, GdiTranslation};
pub use handler::{FormatHandler, NameMapping};
pub use image::{Image, TranslateMode, TranslateOutcome, NAME_FILE};
pub use source::{resolve_source_path, ByteSource, DirectorySource, SourceEntry, ZipSource};
