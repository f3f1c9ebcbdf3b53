//! Zip archive access for build artifacts.
//!
//! A build artifact is a zip whose `package.zip` entry is itself a zip holding
//! the site. Archives are always opened from a local path, so an inner archive
//! is written out with [`extract`] before it is opened on its own.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::DeploymentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub is_dir: bool,
    pub bytes: Vec<u8>,
}

/// A file written out of an archive, keyed by its normalized relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub relative_path: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

fn open(archive_path: &Path) -> Result<ZipArchive<fs::File>, DeploymentError> {
    let file = fs::File::open(archive_path).map_err(|error| {
        DeploymentError::extraction(format!(
            "failed to open archive '{}': {error}",
            archive_path.display()
        ))
    })?;
    ZipArchive::new(file)
        .map_err(|error| DeploymentError::extraction(format!("invalid zip archive: {error}")))
}

fn read_error(name: &str, error: impl std::fmt::Display) -> DeploymentError {
    DeploymentError::extraction(format!("failed to read archive entry '{name}': {error}"))
}

fn write_error(path: &Path, error: io::Error) -> DeploymentError {
    DeploymentError::extraction(format!("failed to write '{}': {error}", path.display()))
}

pub fn list_entries(archive_path: &Path) -> Result<Vec<ArchiveEntry>, DeploymentError> {
    let mut archive = open(archive_path)?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|error| read_error(&format!("#{index}"), error))?;
        let name = file.name().to_string();
        let is_dir = file.is_dir();
        let mut bytes = Vec::new();
        if !is_dir {
            file.read_to_end(&mut bytes)
                .map_err(|error| read_error(&name, error))?;
        }
        entries.push(ArchiveEntry {
            name,
            is_dir,
            bytes,
        });
    }

    Ok(entries)
}

/// Writes the entry named exactly `entry_name` into `dest_dir` and returns the
/// written path.
pub fn extract(
    archive_path: &Path,
    entry_name: &str,
    dest_dir: &Path,
) -> Result<PathBuf, DeploymentError> {
    let mut archive = open(archive_path)?;
    let mut file = match archive.by_name(entry_name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(DeploymentError::extraction(format!(
                "{entry_name} not found"
            )));
        }
        Err(error) => return Err(read_error(entry_name, error)),
    };

    let file_name = Path::new(entry_name).file_name().ok_or_else(|| {
        DeploymentError::extraction(format!("entry '{entry_name}' has no file name"))
    })?;
    fs::create_dir_all(dest_dir).map_err(|error| write_error(dest_dir, error))?;
    let target = dest_dir.join(file_name);
    let mut output = fs::File::create(&target).map_err(|error| write_error(&target, error))?;
    io::copy(&mut file, &mut output).map_err(|error| write_error(&target, error))?;

    Ok(target)
}

/// Extracts every non-directory entry below `dest_dir`, recreating nested
/// directories as needed. Two entries that normalize to the same relative path
/// are rejected.
pub fn extract_files(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, DeploymentError> {
    let mut archive = open(archive_path)?;
    let mut files = Vec::new();
    let mut seen = BTreeSet::new();

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|error| read_error(&format!("#{index}"), error))?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let Some(relative_path) = normalize_entry_path(&name) else {
            return Err(DeploymentError::extraction(format!(
                "archive entry '{name}' escapes the extraction directory"
            )));
        };
        if !seen.insert(relative_path.clone()) {
            return Err(DeploymentError::extraction(format!(
                "archive entry '{name}' duplicates '{relative_path}'"
            )));
        }

        let target = dest_dir.join(&relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|error| write_error(parent, error))?;
        }

        // Declared sizes come from the archive header and are not trusted.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|error| read_error(&name, error))?;
        fs::write(&target, &bytes).map_err(|error| write_error(&target, error))?;

        files.push(ExtractedFile {
            relative_path,
            path: target,
            bytes,
        });
    }

    Ok(files)
}

/// Turns an entry name into a forward-slash relative path. Returns `None` when
/// the name would resolve outside the extraction directory.
pub fn normalize_entry_path(name: &str) -> Option<String> {
    let unified = name.replace('\\', "/");
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ if part.contains(':') => return None,
            _ => parts.push(part),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
