//! Template path resolution and file reads

use crate::{Result, ViewError};
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Run a filesystem operation on `path` under `timeout`
pub(crate) async fn bounded<T, F>(path: &Path, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ViewError::io(path, err)),
        Err(_) => Err(ViewError::timed_out(path)),
    }
}

/// Read a template file as UTF-8 text
pub(crate) async fn read_source(path: &Path, timeout: Duration) -> Result<String> {
    bounded(path, timeout, tokio::fs::read_to_string(path)).await
}

async fn stat(path: &Path, timeout: Duration) -> Result<Option<std::fs::Metadata>> {
    match tokio::time::timeout(timeout, tokio::fs::metadata(path)).await {
        Ok(Ok(meta)) => Ok(Some(meta)),
        Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Ok(Err(err)) => Err(ViewError::io(path, err)),
        Err(_) => Err(ViewError::timed_out(path)),
    }
}

/// Resolve a view or layout identifier inside `dir`
///
/// `dir/name` is tried first: a directory resolves to its `index<ext>`. A
/// name without an extension gets `extension` appended; a name that already
/// has one is used as-is.
pub async fn resolve_template(
    dir: &Path,
    name: &str,
    extension: &str,
    timeout: Duration,
) -> Result<PathBuf> {
    let relative = Path::new(name);
    if name.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ViewError::not_found(name, dir.join(name)));
    }

    let joined = dir.join(relative);
    let candidate = match stat(&joined, timeout).await? {
        Some(meta) if meta.is_dir() => joined.join(format!("index{extension}")),
        _ if relative.extension().is_some() => joined,
        _ => {
            let mut with_ext = joined.into_os_string();
            with_ext.push(extension);
            PathBuf::from(with_ext)
        }
    };

    match stat(&candidate, timeout).await? {
        Some(meta) if meta.is_file() => {
            tracing::debug!(name, path = %candidate.display(), "resolved template");
            Ok(candidate)
        }
        _ => Err(ViewError::not_found(name, candidate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("index.html"), "index").unwrap();
        fs::write(dir.path().join("about.hbs"), "about").unwrap();
        fs::write(dir.path().join("blog/index.html"), "blog").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_appends_extension() {
        let dir = fixture();
        let path = resolve_template(dir.path(), "index", ".html", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("index.html"));
    }

    #[tokio::test]
    async fn test_keeps_explicit_extension() {
        let dir = fixture();
        let path = resolve_template(dir.path(), "about.hbs", ".html", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("about.hbs"));
    }

    #[tokio::test]
    async fn test_directory_resolves_to_index() {
        let dir = fixture();
        let path = resolve_template(dir.path(), "blog", ".html", TIMEOUT)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("blog/index.html"));
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let dir = fixture();
        let err = resolve_template(dir.path(), "missing", ".html", TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let dir = fixture();
        for name in ["../secret", "/etc/passwd", ""] {
            let err = resolve_template(dir.path(), name, ".html", TIMEOUT)
                .await
                .unwrap_err();
            assert!(err.is_not_found(), "{name} should not resolve");
        }
    }

    #[tokio::test]
    async fn test_read_source_missing_is_io_error() {
        let dir = fixture();
        let err = read_source(&dir.path().join("nope.html"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewError::Io { .. }));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let err = bounded(
            Path::new("/slow/partials"),
            Duration::from_millis(10),
            std::future::pending::<io::Result<()>>(),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ViewError::Io { ref source, .. } if source.kind() == io::ErrorKind::TimedOut)
        );
    }
}
