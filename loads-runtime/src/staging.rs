//! Include-file bundles.
//!
//! Auxiliary files needed by a scenario are packed into a single relocatable blob and unpacked
//! into the per-run working directory, keeping their permissions.
use crate::error::StagingError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Bundle {
    entries: Vec<BundleEntry>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct BundleEntry {
    /// Path relative to the unpack location, `/` separated.
    name: String,
    mode: u32,
    contents: Vec<u8>,
}

/// Expand `patterns` relative to `location`. Wildcards (`*`, `?`) are only honoured in the last
/// path component.
pub fn glob(patterns: &[String], location: impl AsRef<Path>) -> Result<Vec<PathBuf>, StagingError> {
    let location = location.as_ref();
    let mut found = vec![];

    for pattern in patterns {
        let pattern = Path::new(pattern);
        let basedir = location.join(pattern.parent().unwrap_or_else(|| Path::new("")));
        let Some(basename) = pattern.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let matcher = wildcard_regex(basename)?;

        let mut matches: Vec<_> = fs::read_dir(&basedir)?
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| matcher.is_match(name))
            })
            .map(|entry| entry.path())
            .collect();
        matches.sort();
        found.extend(matches);
    }

    Ok(found)
}

fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

/// Pack every file matched by `patterns` into a bundle. Matched directories are included
/// recursively under their own name.
pub fn pack_include_files(
    patterns: &[String],
    location: impl AsRef<Path>,
) -> Result<Vec<u8>, StagingError> {
    let mut bundle = Bundle::default();

    for path in glob(patterns, location)? {
        let basedir = path.parent().unwrap_or_else(|| Path::new(""));
        if path.is_dir() {
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() {
                    bundle.entries.push(store_file(basedir, entry.path())?);
                }
            }
        } else {
            bundle.entries.push(store_file(basedir, &path)?);
        }
    }

    debug!("Packed {} include file(s)", bundle.entries.len());
    Ok(bincode::serialize(&bundle)?)
}

fn store_file(basedir: &Path, path: &Path) -> Result<BundleEntry, StagingError> {
    let relative = path.strip_prefix(basedir).unwrap_or(path);
    let name = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    trace!("Storing {name}");

    Ok(BundleEntry {
        name,
        mode: file_mode(path)?,
        contents: fs::read(path)?,
    })
}

/// Materialize a bundle produced by [`pack_include_files`] under `location`.
pub fn unpack_include_files(data: &[u8], location: impl AsRef<Path>) -> Result<(), StagingError> {
    let location = location.as_ref();
    let bundle: Bundle = bincode::deserialize(data)?;

    for entry in bundle.entries {
        let relative = Path::new(entry.name.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StagingError::UnsafePath(entry.name));
        }

        let path = location.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &entry.contents)?;
        if entry.mode != 0 {
            set_file_mode(&path, entry.mode)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> std::io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> std::io::Result<u32> {
    Ok(0)
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
