//! Archive downloading and extraction.
//!
//! Archives are fetched over HTTP into the staging directory and unpacked
//! next to themselves, one dependency at a time.

mod archive;
mod file;

pub use archive::{ArchiveExtractor, ArchiveFormat};
pub use file::FileDownloader;
