//! Per-render options

use crate::{Result, ViewError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Key in the locals that selects a layout for one render
pub const LAYOUT_KEY: &str = "layout";
/// Key under which a layout sees the rendered view
pub const BODY_KEY: &str = "body";

/// Which layout wraps the rendered view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Layout {
    /// The configured default layout, if any
    #[default]
    Default,
    /// A layout by name, resolved inside the layouts directory
    Named(String),
    /// No layout; the view output is returned as-is
    None,
}

impl Layout {
    /// Interpret a `layout` value taken from the locals
    ///
    /// A string names a layout (an empty string disables it), `false` and
    /// `null` disable it, `true` keeps the configured default.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) if name.is_empty() => Ok(Self::None),
            Value::String(name) => Ok(Self::Named(name.clone())),
            Value::Bool(false) | Value::Null => Ok(Self::None),
            Value::Bool(true) => Ok(Self::Default),
            other => Err(ViewError::serialization_error(format!(
                "`layout` must be a string or false, got {other}"
            ))),
        }
    }

    /// Resolve to a layout name given the configured default
    pub fn resolve(self, default: Option<&str>) -> Option<String> {
        match self {
            Self::Default => default.map(str::to_string),
            Self::Named(name) => Some(name),
            Self::None => None,
        }
    }
}

/// Options for a single render call, overriding the renderer configuration
///
/// # Example
///
/// ```rust,ignore
/// use rustapi_handlebars::RenderOptions;
///
/// let options = RenderOptions::new()
///     .layout("admin")
///     .data("year", &2024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Inline template used instead of looking up the view file
    pub body: Option<String>,
    /// Layout override; `None` falls back to the configured default
    pub layout: Option<Layout>,
    /// Auxiliary values visible to templates; the locals win on conflicts
    pub data: Map<String, Value>,
    /// Per-call cache override; `Some(false)` always reads from disk
    pub cache: Option<bool>,
}

impl RenderOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `template` instead of the named view
    pub fn body(mut self, template: impl Into<String>) -> Self {
        self.body = Some(template.into());
        self
    }

    /// Wrap the view in the named layout
    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(Layout::Named(name.into()));
        self
    }

    /// Render without a layout
    pub fn no_layout(mut self) -> Self {
        self.layout = Some(Layout::None);
        self
    }

    /// Add an auxiliary value
    pub fn data<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Result<Self> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Override caching for this call
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }
}

/// Turn serializable locals into a mutable map
///
/// `null` (e.g. `()` or `None`) becomes an empty map; anything that is not
/// a JSON object is rejected.
pub fn into_locals<T: Serialize + ?Sized>(locals: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(locals)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ViewError::serialization_error(format!(
            "locals must serialize to an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_from_value() {
        assert_eq!(
            Layout::from_value(&json!("admin")).unwrap(),
            Layout::Named("admin".into())
        );
        assert_eq!(Layout::from_value(&json!(false)).unwrap(), Layout::None);
        assert_eq!(Layout::from_value(&json!(null)).unwrap(), Layout::None);
        assert_eq!(Layout::from_value(&json!("")).unwrap(), Layout::None);
        assert_eq!(Layout::from_value(&json!(true)).unwrap(), Layout::Default);
        assert!(matches!(
            Layout::from_value(&json!(3)),
            Err(ViewError::Serialization(_))
        ));
    }

    #[test]
    fn test_layout_resolve() {
        assert_eq!(Layout::Default.resolve(Some("main")).as_deref(), Some("main"));
        assert_eq!(Layout::Default.resolve(None), None);
        assert_eq!(
            Layout::Named("x".into()).resolve(Some("main")).as_deref(),
            Some("x")
        );
        assert_eq!(Layout::None.resolve(Some("main")), None);
    }

    #[test]
    fn test_into_locals() {
        #[derive(Serialize)]
        struct Page {
            title: &'static str,
        }

        let map = into_locals(&Page { title: "Home" }).unwrap();
        assert_eq!(map["title"], json!("Home"));
        assert!(into_locals(&()).unwrap().is_empty());
        assert!(matches!(
            into_locals(&vec![1, 2]),
            Err(ViewError::Serialization(_))
        ));
    }

    #[test]
    fn test_options_builder() {
        let options = RenderOptions::new()
            .no_layout()
            .cache(false)
            .data("year", &2024)
            .unwrap();
        assert_eq!(options.layout, Some(Layout::None));
        assert_eq!(options.cache, Some(false));
        assert_eq!(options.data["year"], json!(2024));
    }
}
