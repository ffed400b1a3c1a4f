//! Renderer configuration

use crate::helpers::ViewHelper;
use crate::{Result, ViewError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default template file extension
pub const DEFAULT_EXTENSION: &str = ".html";
/// Default name of the layout wrapped around every view
pub const DEFAULT_LAYOUT: &str = "main";
/// Default number of compiled templates kept in the cache
pub const DEFAULT_CACHE_CAPACITY: usize = 100;
/// Default deadline for a single directory scan or file read
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the view renderer
///
/// Built once at setup and read-only afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use rustapi_handlebars::ViewConfig;
///
/// let config = ViewConfig::new("./web")
///     .extension("hbs")
///     .default_layout("site")
///     .cache(!cfg!(debug_assertions));
/// ```
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Directory holding the view, layout and partial subdirectories
    pub root: PathBuf,
    /// Template file extension, always stored with a leading dot
    pub extension: String,
    /// Views subdirectory, relative to `root`
    pub view_path: String,
    /// Layouts subdirectory, relative to `root`
    pub layout_path: String,
    /// Partials subdirectory, relative to `root`
    pub partial_path: String,
    /// Layout applied when a render call does not pick one
    pub default_layout: Option<String>,
    /// Whether compiled views and layouts are cached
    pub cache: bool,
    /// Maximum number of cached compiled templates
    pub cache_capacity: usize,
    /// Deadline for each directory scan or file read
    pub io_timeout: Duration,
    /// Whether to fail on undefined variables
    pub strict_mode: bool,
    /// Helpers registered with the engine, by name
    pub helpers: BTreeMap<String, ViewHelper>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            extension: DEFAULT_EXTENSION.to_string(),
            view_path: "views".to_string(),
            layout_path: "layouts".to_string(),
            partial_path: "partials".to_string(),
            default_layout: Some(DEFAULT_LAYOUT.to_string()),
            cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            io_timeout: DEFAULT_IO_TIMEOUT,
            strict_mode: false,
            helpers: BTreeMap::new(),
        }
    }
}

impl ViewConfig {
    /// Create a new config rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set the template file extension (`"hbs"` and `".hbs"` are equivalent)
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = normalize_extension(&extension.into());
        self
    }

    /// Set the views subdirectory
    pub fn view_path(mut self, path: impl Into<String>) -> Self {
        self.view_path = path.into();
        self
    }

    /// Set the layouts subdirectory
    pub fn layout_path(mut self, path: impl Into<String>) -> Self {
        self.layout_path = path.into();
        self
    }

    /// Set the partials subdirectory
    pub fn partial_path(mut self, path: impl Into<String>) -> Self {
        self.partial_path = path.into();
        self
    }

    /// Set the default layout
    pub fn default_layout(mut self, name: impl Into<String>) -> Self {
        self.default_layout = Some(name.into());
        self
    }

    /// Render views without a layout unless a call asks for one
    pub fn no_default_layout(mut self) -> Self {
        self.default_layout = None;
        self
    }

    /// Enable or disable the compiled-template cache
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Set the cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the I/O deadline
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Register a helper under `name`
    pub fn helper(mut self, name: impl Into<String>, helper: ViewHelper) -> Self {
        self.helpers.insert(name.into(), helper);
        self
    }

    /// Absolute-or-relative directory holding the views
    pub fn views_dir(&self) -> PathBuf {
        self.root.join(&self.view_path)
    }

    /// Directory holding the layouts
    pub fn layouts_dir(&self) -> PathBuf {
        self.root.join(&self.layout_path)
    }

    /// Directory holding the partials
    pub fn partials_dir(&self) -> PathBuf {
        self.root.join(&self.partial_path)
    }

    /// Check option values before the renderer is built
    pub fn validate(&self) -> Result<()> {
        if self.extension.len() < 2 || !self.extension.starts_with('.') {
            return Err(ViewError::configuration(format!(
                "invalid template extension {:?}",
                self.extension
            )));
        }
        if self.cache && self.cache_capacity == 0 {
            return Err(ViewError::configuration(
                "cache_capacity must be greater than zero when caching is enabled",
            ));
        }
        if self.io_timeout.is_zero() {
            return Err(ViewError::configuration("io_timeout must be non-zero"));
        }
        for (label, dir) in [
            ("view_path", &self.view_path),
            ("layout_path", &self.layout_path),
            ("partial_path", &self.partial_path),
        ] {
            if Path::new(dir).is_absolute() {
                return Err(ViewError::configuration(format!(
                    "{label} must be relative to root, got {dir:?}"
                )));
            }
        }
        if matches!(self.default_layout.as_deref(), Some("")) {
            return Err(ViewError::configuration(
                "default_layout must not be empty; use no_default_layout() instead",
            ));
        }
        Ok(())
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}

#[cfg(feature = "config")]
mod env {
    use super::*;
    use serde::Deserialize;

    /// `VIEW_*` environment variables
    #[derive(Debug, Default, Deserialize)]
    struct EnvViewConfig {
        root: Option<PathBuf>,
        extension: Option<String>,
        view_path: Option<String>,
        layout_path: Option<String>,
        partial_path: Option<String>,
        default_layout: Option<String>,
        cache: Option<bool>,
        cache_capacity: Option<usize>,
        io_timeout_ms: Option<u64>,
        strict_mode: Option<bool>,
    }

    impl ViewConfig {
        /// Load configuration from `VIEW_*` environment variables, after
        /// reading a `.env` file if one exists
        ///
        /// Unset variables keep their defaults. An empty `VIEW_DEFAULT_LAYOUT`
        /// disables the default layout.
        pub fn from_env() -> Result<Self> {
            let _ = dotenvy::dotenv();
            let env: EnvViewConfig = envy::prefixed("VIEW_")
                .from_env()
                .map_err(|e| ViewError::configuration(e.to_string()))?;

            let mut config = Self::default();
            if let Some(root) = env.root {
                config.root = root;
            }
            if let Some(ext) = env.extension {
                config = config.extension(ext);
            }
            if let Some(path) = env.view_path {
                config.view_path = path;
            }
            if let Some(path) = env.layout_path {
                config.layout_path = path;
            }
            if let Some(path) = env.partial_path {
                config.partial_path = path;
            }
            match env.default_layout.as_deref() {
                Some("") => config.default_layout = None,
                Some(name) => config.default_layout = Some(name.to_string()),
                None => {}
            }
            if let Some(cache) = env.cache {
                config.cache = cache;
            }
            if let Some(capacity) = env.cache_capacity {
                config.cache_capacity = capacity;
            }
            if let Some(ms) = env.io_timeout_ms {
                config.io_timeout = Duration::from_millis(ms);
            }
            if let Some(strict) = env.strict_mode {
                config.strict_mode = strict;
            }
            Ok(config)
        }
    }
}
