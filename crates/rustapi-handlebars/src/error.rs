//! Error types for view rendering

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for view operations
pub type Result<T, E = ViewError> = std::result::Result<T, E>;

/// Error type for view resolution, compilation and rendering
#[derive(Error, Debug)]
pub enum ViewError {
    /// Invalid configuration: missing partials directory, bad option values,
    /// rejected helper names
    #[error("View configuration error: {0}")]
    Configuration(String),

    /// A view or layout could not be found after path resolution
    #[error("Template not found: {name} (looked for {})", path.display())]
    TemplateNotFound {
        /// The identifier that was requested
        name: String,
        /// The last path that was checked
        path: PathBuf,
    },

    /// A template failed to compile
    #[error("Template syntax error in {name}: {source}")]
    TemplateSyntax {
        /// Path or label of the template
        name: String,
        /// Underlying Handlebars error
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// Filesystem failure while scanning or reading templates
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or scanned
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A compiled template failed while rendering (helper failure,
    /// missing partial, strict-mode lookup)
    #[error("Template render error: {0}")]
    Render(String),

    /// Locals or data could not be turned into a template context
    #[error("Template context serialization error: {0}")]
    Serialization(String),
}

impl ViewError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a template not found error
    pub fn not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::TemplateNotFound {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Create a syntax error for the template labelled `name`
    pub fn syntax(name: impl Into<String>, source: handlebars::TemplateError) -> Self {
        Self::TemplateSyntax {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error for an operation on `path` that exceeded its deadline
    pub fn timed_out(path: impl Into<PathBuf>) -> Self {
        Self::io(
            path,
            io::Error::new(io::ErrorKind::TimedOut, "template I/O timed out"),
        )
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Whether this error means a template file was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }
}

impl From<handlebars::RenderError> for ViewError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_is_io_with_timed_out_kind() {
        match ViewError::timed_out("/tmp/views") {
            ViewError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/tmp/views"));
                assert_eq!(source.kind(), io::ErrorKind::TimedOut);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn not_found_message_names_the_checked_path() {
        let err = ViewError::not_found("index", "/srv/views/index.html");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Template not found: index (looked for /srv/views/index.html)"
        );
    }
}
