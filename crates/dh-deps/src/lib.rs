pub mod catalog;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod installer;
pub mod setup;
pub mod system;

pub use catalog::{artifact_filename, download_url, Catalog, DependencySpec};
pub use config::{PlatformConfig, PlatformOverrides, Settings, SettingsLoader};
pub use downloader::{ArchiveExtractor, ArchiveFormat, FileDownloader};
pub use error::{Result, SetupError};
pub use installer::{InstallReport, LibraryInstaller};
pub use setup::{Setup, SetupBuilder, SetupReport};
