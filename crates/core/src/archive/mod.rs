//! VAT-note archives.
//!
//! Per-declaration VAT notes and transfer documents are downloaded into a month directory,
//! which is then compressed into `{YYYY-MM}-{dutyParty}-vatnote.zip` next to it.

mod compress;
mod error;
mod vat_note;

pub use compress::zip_dir;
pub use error::ArchiveError;
pub use vat_note::{Downloader, HttpDownloader, VatDocument, VatNoteArchive, VatNoteArchiver};
