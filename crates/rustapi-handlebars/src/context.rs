//! Locals builder for views

use crate::options::LAYOUT_KEY;
use crate::{Result, ViewError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Builder for the locals passed to a render call
///
/// This provides a fluent API for building view data without
/// needing to create a struct for simple cases.
///
/// # Example
///
/// ```rust,ignore
/// use rustapi_handlebars::ContextBuilder;
///
/// let locals = ContextBuilder::new()
///     .insert("name", "Alice")
///     .insert("age", &30)
///     .insert_if("admin", &true, |_| user.is_admin())
///     .layout("dashboard")
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct ContextBuilder {
    locals: Map<String, Value>,
    error: Option<ViewError>,
}

impl ContextBuilder {
    /// Create a new context builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value into the locals
    ///
    /// The first value that fails to serialize is reported by [`build`](Self::build).
    pub fn insert<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.locals.insert(key.into(), value);
            }
            Err(err) => {
                self.error.get_or_insert(err.into());
            }
        }
        self
    }

    /// Insert a value if a condition is met
    pub fn insert_if<T: Serialize + ?Sized, F>(
        self,
        key: impl Into<String>,
        value: &T,
        condition: F,
    ) -> Self
    where
        F: FnOnce(&T) -> bool,
    {
        if condition(value) {
            self.insert(key, value)
        } else {
            self
        }
    }

    /// Insert a value if it's Some
    pub fn insert_some<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: Option<&T>,
    ) -> Self {
        if let Some(v) = value {
            self.insert(key, v)
        } else {
            self
        }
    }

    /// Extend with the fields of a serializable struct
    pub fn extend<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let additional = crate::options::into_locals(value)?;
        self.locals.extend(additional);
        Ok(self)
    }

    /// Wrap this render in the named layout
    pub fn layout(mut self, name: impl Into<String>) -> Self {
        self.locals
            .insert(LAYOUT_KEY.to_string(), Value::String(name.into()));
        self
    }

    /// Render without any layout
    pub fn no_layout(mut self) -> Self {
        self.locals.insert(LAYOUT_KEY.to_string(), Value::Bool(false));
        self
    }

    /// Build the locals
    pub fn build(self) -> Result<Map<String, Value>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.locals),
        }
    }
}
