//! Partial discovery and registration

use crate::resolve::{bounded, read_source};
use crate::template::strip_bom;
use crate::{Result, ViewError};
use handlebars::Handlebars;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// A partial read from disk, ready to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSource {
    /// Registration name: path relative to the partials root, `/`-separated,
    /// extension removed
    pub name: String,
    /// File the partial came from
    pub path: PathBuf,
    /// Template source, BOM removed
    pub source: String,
}

/// Derive the registration name for a partial file
pub fn partial_name(root: &Path, file: &Path, extension: &str) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let name = joined.strip_suffix(extension)?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Find every partial file below `root`, sorted by path
pub async fn scan_partials(root: &Path, extension: &str, timeout: Duration) -> Result<Vec<PathBuf>> {
    let meta = tokio::time::timeout(timeout, tokio::fs::metadata(root))
        .await
        .map_err(|_| ViewError::timed_out(root))?;
    match meta {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(ViewError::configuration(format!(
                "partials path {} is not a directory",
                root.display()
            )))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ViewError::configuration(format!(
                "partials directory {} does not exist",
                root.display()
            )))
        }
        Err(err) => return Err(ViewError::io(root, err)),
    }

    let walk_root = root.to_path_buf();
    let extension = extension.to_string();
    let walk = tokio::task::spawn_blocking(move || -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&walk_root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(extension.as_str())
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    });
    let scan = async move {
        match walk.await {
            Ok(result) => result,
            Err(err) => Err(io::Error::other(err)),
        }
    };
    bounded(root, timeout, scan).await
}

/// Scan and read every partial below `root`
///
/// Fails on the first unreadable file; nothing is returned for a partially
/// read directory.
pub async fn load_partials(
    root: &Path,
    extension: &str,
    timeout: Duration,
) -> Result<Vec<PartialSource>> {
    let files = scan_partials(root, extension, timeout).await?;
    let mut partials = Vec::with_capacity(files.len());
    for path in files {
        let Some(name) = partial_name(root, &path, extension) else {
            continue;
        };
        let source = read_source(&path, timeout).await.map_err(|err| {
            tracing::error!(partial = %name, path = %path.display(), error = %err, "failed to read partial");
            err
        })?;
        partials.push(PartialSource {
            name,
            path,
            source: strip_bom(&source).to_string(),
        });
    }
    Ok(partials)
}

/// Register loaded partials with the engine
///
/// All-or-nothing from the caller's point of view: the registry is only
/// handed back on success.
pub(crate) fn register_partials(
    registry: &mut Handlebars<'static>,
    partials: &[PartialSource],
) -> Result<usize> {
    for partial in partials {
        registry
            .register_partial(&partial.name, &partial.source)
            .map_err(|e| {
                tracing::error!(partial = %partial.name, path = %partial.path.display(), "failed to compile partial");
                ViewError::syntax(partial.path.display().to_string(), e)
            })?;
        tracing::debug!(partial = %partial.name, "registered partial");
    }
    Ok(partials.len())
}
