//! # rustapi-handlebars
//!
//! Handlebars view rendering for the RustAPI framework.
//!
//! This crate renders server-side HTML from a directory of Handlebars
//! templates, wrapping views in layouts and exposing partials and
//! user-defined helpers to every template.
//!
//! ## Features
//!
//! - **Views and Layouts**: `views/<name>.html` rendered inside `layouts/<name>.html`
//!   through `{{{body}}}`, selectable per render
//! - **Partials**: everything below `partials/` registered at startup as `{{> name}}`
//! - **Helpers**: plain Rust closures callable as `{{add 2 3}}`
//! - **Compiled-Template Cache**: bounded LRU cache keyed by file path
//! - **Tower Middleware**: `ViewLayer` installs a per-request `ViewContext`
//!
//! ## Layout on disk
//!
//! ```text
//! web/
//! ├── views/index.html
//! ├── layouts/main.html
//! └── partials/nav/top.html      -> {{> nav/top}}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rustapi_handlebars::{setup, RenderOptions, View, ViewConfig, ViewContext, ViewHelper};
//! use serde_json::json;
//!
//! let views = setup(
//!     ViewConfig::new("./web").helper(
//!         "add",
//!         ViewHelper::with_arity(2, |args| {
//!             Ok(json!(args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0)))
//!         }),
//!     ),
//! )
//! .await?;
//!
//! let app = tower::ServiceBuilder::new()
//!     .layer(views)
//!     .service_fn(|req: http::Request<()>| async move {
//!         let ctx = req.extensions().get::<ViewContext>().cloned().unwrap();
//!         let view = ctx
//!             .render("index", &json!({ "name": "Atomic" }), RenderOptions::new())
//!             .await
//!             .unwrap_or_else(View::error);
//!         Ok::<_, std::convert::Infallible>(view.into_response())
//!     });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod context;
mod error;
mod helpers;
mod middleware;
mod options;
mod partials;
mod renderer;
mod resolve;
mod template;
mod view;

pub use cache::{RenderStats, TemplateCache};
pub use config::{
    ViewConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_EXTENSION, DEFAULT_IO_TIMEOUT, DEFAULT_LAYOUT,
};
pub use context::ContextBuilder;
pub use error::{Result, ViewError};
pub use helpers::{HelperError, HelperFn, ViewHelper};
pub use middleware::{setup, ViewContext, ViewLayer, ViewService, ViewState};
pub use options::{into_locals, Layout, RenderOptions, BODY_KEY, LAYOUT_KEY};
pub use partials::{load_partials, partial_name, scan_partials, PartialSource};
pub use renderer::Renderer;
pub use resolve::resolve_template;
pub use template::{strip_bom, CompiledTemplate};
pub use view::{View, HTML_CONTENT_TYPE};

// Re-export the JSON value type used for locals and helper arguments
pub use serde_json::{Map, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        setup, ContextBuilder, Layout, RenderOptions, Renderer, View, ViewConfig, ViewContext,
        ViewError, ViewHelper, ViewLayer, ViewState,
    };
}
