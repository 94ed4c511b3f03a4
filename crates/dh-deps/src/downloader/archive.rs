//! Archive extraction (tar.gz and zip).
//!
//! Every entry is checked against the destination before a single byte of
//! it is written. Extraction goes into a hidden staging directory next to
//! the final location; the staging directory is removed on any failure, so
//! a rejected archive never leaves a half-populated tree behind.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::config::OperatingSystem;
use crate::{Result, SetupError};

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Format used by the archives published for `os`
    pub fn for_os(os: OperatingSystem) -> Self {
        if os.is_windows() {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Archive extractor
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract `archive_path` into `dest_dir` and rename its top-level
    /// directory to `key`
    ///
    /// Returns the path of the normalized tree, `dest_dir/key`. A previous
    /// tree at that location is replaced.
    pub fn extract(
        archive_path: &Path,
        dest_dir: &Path,
        key: &str,
        format: ArchiveFormat,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir)?;

        let staging = tempfile::Builder::new()
            .prefix(".extract-")
            .tempdir_in(dest_dir)?;
        let root = staging.path().canonicalize()?;

        log::debug!(
            "Extracting {} ({}) into {}",
            archive_path.display(),
            format.extension(),
            root.display()
        );

        match format {
            ArchiveFormat::TarGz => Self::extract_tar_gz(archive_path, &root, key)?,
            ArchiveFormat::Zip => Self::extract_zip(archive_path, &root, key)?,
        }

        let target = Self::normalize_top_level(staging.path(), dest_dir, key)?;

        staging.close()?;
        Ok(target)
    }

    /// Extract a gzipped tar archive
    fn extract_tar_gz(archive_path: &Path, root: &Path, key: &str) -> Result<()> {
        let file = File::open(archive_path)
            .map_err(|e| SetupError::extraction(key, format!("Failed to open archive: {}", e)))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let mut archive = tar::Archive::new(decoder);
        archive.set_overwrite(true);

        let entries = archive
            .entries()
            .map_err(|e| SetupError::extraction(key, format!("Failed to read tar: {}", e)))?;

        for entry in entries {
            let mut entry = entry
                .map_err(|e| SetupError::extraction(key, format!("Failed to read tar entry: {}", e)))?;

            let name = entry
                .path()
                .map_err(|e| SetupError::extraction(key, format!("Invalid path in tar: {}", e)))?
                .into_owned();

            let Some(outpath) = resolve_entry(root, &name) else {
                return Err(security_error(key, &name));
            };
            if outpath == root {
                continue;
            }

            ensure_parent_inside(root, &outpath, key, &name)?;

            let entry_type = entry.header().entry_type();
            if entry_type.is_symlink() || entry_type.is_hard_link() {
                let link = entry
                    .link_name()
                    .map_err(|e| SetupError::extraction(key, format!("Invalid link in tar: {}", e)))?
                    .ok_or_else(|| SetupError::extraction(key, format!("Link without target: {}", name.display())))?
                    .into_owned();

                // Symlinks resolve from the directory they really land in, which
                // may differ from the entry name once earlier links are followed.
                // Hard links resolve from the archive root.
                let base = if entry_type.is_symlink() {
                    match outpath.parent() {
                        Some(parent) => parent.canonicalize()?,
                        None => return Err(security_error(key, &name)),
                    }
                } else {
                    root.to_path_buf()
                };
                if link.is_absolute() || !is_within_directory(root, &normalize_lexically(&base.join(&link))) {
                    return Err(security_error(key, &name));
                }
            }

            let unpacked = entry.unpack_in(root).map_err(|e| {
                SetupError::extraction(key, format!("Failed to extract {}: {}", name.display(), e))
            })?;
            if !unpacked {
                return Err(security_error(key, &name));
            }

            if entry_type.is_symlink() {
                if let Ok(target) = outpath.canonicalize() {
                    if !is_within_directory(root, &target) {
                        return Err(security_error(key, &name));
                    }
                }
            }
        }

        Ok(())
    }

    /// Extract a zip archive
    fn extract_zip(archive_path: &Path, root: &Path, key: &str) -> Result<()> {
        let file = File::open(archive_path)
            .map_err(|e| SetupError::extraction(key, format!("Failed to open archive: {}", e)))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| SetupError::extraction(key, format!("Failed to open zip: {}", e)))?;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| SetupError::extraction(key, format!("Failed to read zip entry: {}", e)))?;

            let name = PathBuf::from(file.name());

            let Some(outpath) = resolve_entry(root, &name) else {
                return Err(security_error(key, &name));
            };
            if outpath == root {
                continue;
            }

            ensure_parent_inside(root, &outpath, key, &name)?;

            if file.is_dir() {
                fs::create_dir_all(&outpath)?;
                continue;
            }

            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile).map_err(|e| {
                SetupError::extraction(key, format!("Failed to extract {}: {}", name.display(), e))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
                }
            }
        }

        Ok(())
    }

    /// Move the extracted tree out of staging, renaming the single
    /// `key*` top-level directory to exactly `key`
    fn normalize_top_level(staging: &Path, dest_dir: &Path, key: &str) -> Result<PathBuf> {
        let pattern = format!(
            "{}/{}*",
            glob::Pattern::escape(&staging.to_string_lossy()),
            glob::Pattern::escape(key)
        );
        let matches: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| SetupError::extraction(key, format!("Invalid directory pattern: {}", e)))?
            .filter_map(|p| p.ok())
            .filter(|p| p.is_dir())
            .collect();

        let top_level = match matches.as_slice() {
            [single] => single.clone(),
            [] => {
                return Err(SetupError::extraction(
                    key,
                    format!("archive has no top-level directory starting with '{}'", key),
                ))
            }
            many => {
                let names: Vec<String> = many
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect();
                return Err(SetupError::extraction(
                    key,
                    format!("ambiguous top-level directories: {}", names.join(", ")),
                ));
            }
        };

        let target = dest_dir.join(key);
        remove_existing(&target)?;
        fs::rename(&top_level, &target)?;

        if let Some(original) = top_level.file_name() {
            if original != key {
                log::debug!("Renamed {} to {}", original.to_string_lossy(), key);
            }
        }

        // Anything else the archive carried at top level is merged beside it
        for entry in fs::read_dir(staging)? {
            let entry = entry?;
            merge_into(&entry.path(), &dest_dir.join(entry.file_name()), key)?;
        }

        Ok(target)
    }
}

/// Move `source` to `dest`, merging directories into existing ones
///
/// Existing files are overwritten. Existing directories are never removed, so
/// trees extracted for other dependencies survive.
fn merge_into(source: &Path, dest: &Path, key: &str) -> Result<()> {
    let existing = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::rename(source, dest)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let source_is_dir = fs::symlink_metadata(source)?.is_dir();

    match (source_is_dir, existing.is_dir()) {
        (true, true) => {
            for entry in fs::read_dir(source)? {
                let entry = entry?;
                merge_into(&entry.path(), &dest.join(entry.file_name()), key)?;
            }
            Ok(())
        }
        (false, false) => {
            fs::remove_file(dest)?;
            fs::rename(source, dest)?;
            Ok(())
        }
        _ => Err(SetupError::extraction(
            key,
            format!("{} conflicts with an existing entry", dest.display()),
        )),
    }
}

/// Lexically resolve an archive entry name against `root`
///
/// Returns `None` when the name is absolute or climbs out of `root`.
fn resolve_entry(root: &Path, name: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();

    for component in name.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let resolved = root.join(relative);
    is_within_directory(root, &resolved).then_some(resolved)
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

fn is_within_directory(directory: &Path, target: &Path) -> bool {
    target.starts_with(directory)
}

/// Check that whatever already exists on the way to `outpath` really lives
/// under `root`, then create the missing parent directories
///
/// Catches entries that would be written through a symlink extracted earlier.
fn ensure_parent_inside(root: &Path, outpath: &Path, key: &str, name: &Path) -> Result<()> {
    let Some(parent) = outpath.parent() else {
        return Err(security_error(key, name));
    };

    let mut existing = parent;
    while !existing.exists() {
        existing = match existing.parent() {
            Some(p) => p,
            None => return Err(security_error(key, name)),
        };
    }

    if !is_within_directory(root, &existing.canonicalize()?) {
        return Err(security_error(key, name));
    }

    fs::create_dir_all(parent)?;

    if !is_within_directory(root, &parent.canonicalize()?) {
        return Err(security_error(key, name));
    }

    Ok(())
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn security_error(key: &str, name: &Path) -> SetupError {
    SetupError::Security {
        key: key.to_string(),
        entry: name.display().to_string(),
    }
}
