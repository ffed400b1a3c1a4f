//! User-registered template helpers
//!
//! A helper is a plain Rust closure taking the evaluated helper parameters and
//! returning a single JSON value. It is wrapped into a Handlebars
//! [`HelperDef`] when the renderer is initialized.
//!
//! ```rust,ignore
//! use rustapi_handlebars::{ViewConfig, ViewHelper};
//! use serde_json::json;
//!
//! let config = ViewConfig::new("./web").helper(
//!     "add",
//!     ViewHelper::with_arity(2, |args| {
//!         let a = args[0].as_i64().unwrap_or_default();
//!         let b = args[1].as_i64().unwrap_or_default();
//!         Ok(json!(a + b))
//!     }),
//! );
//! ```

use crate::{Result, ViewError};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Names reserved by the Handlebars built-in helpers
const BUILTIN_HELPERS: &[&str] = &[
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte",
    "and", "or", "not", "len",
];

/// Error returned by a helper function
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HelperError(pub String);

impl HelperError {
    /// Create a helper error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Signature shared by every helper
pub type HelperFn = dyn Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync;

/// A named-function helper callable from templates as `{{name arg1 arg2}}`
#[derive(Clone)]
pub struct ViewHelper {
    func: Arc<HelperFn>,
    arity: Option<usize>,
}

impl ViewHelper {
    /// Create a variadic helper
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            arity: None,
        }
    }

    /// Create a helper that must be called with exactly `arity` parameters
    pub fn with_arity<F>(arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            arity: Some(arity),
        }
    }

    /// The required number of parameters, if fixed
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Invoke the helper directly
    pub fn call(&self, args: &[Value]) -> Result<Value, HelperError> {
        if let Some(expected) = self.arity {
            if args.len() != expected {
                return Err(HelperError(format!(
                    "expected {} argument(s), got {}",
                    expected,
                    args.len()
                )));
            }
        }
        (self.func)(args)
    }
}

impl fmt::Debug for ViewHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHelper")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Check that `name` can be registered as a helper
pub(crate) fn validate_helper_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ViewError::configuration("helper name must not be empty"));
    }
    if name.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '#' | '/' | '>')) {
        return Err(ViewError::configuration(format!(
            "helper name {name:?} contains characters not allowed in a template expression"
        )));
    }
    if BUILTIN_HELPERS.contains(&name) {
        return Err(ViewError::configuration(format!(
            "helper name {name:?} shadows a built-in Handlebars helper"
        )));
    }
    Ok(())
}

/// Register every helper with the engine, returning how many were registered
pub(crate) fn register_helpers<'a>(
    registry: &mut Handlebars<'static>,
    helpers: impl IntoIterator<Item = (&'a String, &'a ViewHelper)>,
) -> Result<usize> {
    let mut count = 0;
    for (name, helper) in helpers {
        validate_helper_name(name)?;
        registry.register_helper(
            name,
            Box::new(HelperAdapter {
                name: name.clone(),
                helper: helper.clone(),
            }),
        );
        count += 1;
    }
    Ok(count)
}

/// Bridges a [`ViewHelper`] into the Handlebars helper interface
struct HelperAdapter {
    name: String,
    helper: ViewHelper,
}

impl HelperDef for HelperAdapter {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let args: Vec<Value> = h.params().iter().map(|p| p.value().clone()).collect();
        self.helper
            .call(&args)
            .map(ScopedJson::Derived)
            .map_err(|e| {
                RenderErrorReason::Other(format!("helper `{}` failed: {}", self.name, e)).into()
            })
    }
}
