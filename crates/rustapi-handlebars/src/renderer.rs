//! The render pipeline
//!
//! A [`Renderer`] owns the Handlebars registry (helpers and partials), the
//! compiled-template cache and the configuration. It is cheap to clone and
//! meant to be built once at startup and shared by every request.

use crate::cache::{RenderStats, StatCounters, TemplateCache};
use crate::config::ViewConfig;
use crate::helpers::register_helpers;
use crate::options::{into_locals, Layout, RenderOptions, BODY_KEY, LAYOUT_KEY};
use crate::partials::{load_partials, register_partials};
use crate::resolve::{read_source, resolve_template};
use crate::template::CompiledTemplate;
use crate::{Result, ViewError};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handlebars view renderer with layouts, partials and a compiled-template cache
///
/// # Example
///
/// ```rust,ignore
/// use rustapi_handlebars::{Renderer, RenderOptions, ViewConfig};
/// use serde_json::json;
///
/// let renderer = Renderer::initialize(ViewConfig::new("./web")).await?;
/// let html = renderer
///     .render("index", &json!({ "name": "Atomic" }), RenderOptions::new())
///     .await?;
/// ```
#[derive(Clone)]
pub struct Renderer {
    inner: Arc<Inner>,
}

struct Inner {
    config: ViewConfig,
    registry: Handlebars<'static>,
    cache: Option<TemplateCache>,
    partials: Vec<String>,
    stats: StatCounters,
}

impl Renderer {
    /// Build a renderer: register helpers, allocate the cache and register
    /// every partial found below the partials directory
    ///
    /// Returns only after all partials are registered. Any failure aborts
    /// initialization.
    ///
    /// # Errors
    ///
    /// [`ViewError::Configuration`](crate::ViewError::Configuration) for invalid
    /// options or a missing partials directory,
    /// [`ViewError::TemplateSyntax`](crate::ViewError::TemplateSyntax) for a
    /// partial that does not compile, [`ViewError::Io`](crate::ViewError::Io)
    /// for an unreadable partial.
    ///
    /// A relative `root` is made absolute against the current directory, so
    /// cached templates keep pointing at the same files if the process later
    /// changes directory.
    pub async fn initialize(mut config: ViewConfig) -> Result<Self> {
        config.validate()?;
        if config.root.is_relative() {
            let cwd = std::env::current_dir().map_err(|e| ViewError::io(&config.root, e))?;
            config.root = cwd.join(&config.root);
        }
        tracing::debug!(root = %config.root.display(), "initializing view renderer");

        let mut registry = Handlebars::new();
        registry.set_strict_mode(config.strict_mode);

        let helper_count = register_helpers(&mut registry, &config.helpers)?;
        if helper_count > 0 {
            tracing::info!(count = helper_count, "registered template helpers");
        }

        let cache = if config.cache {
            Some(TemplateCache::new(config.cache_capacity)?)
        } else {
            None
        };

        let partials_dir = config.partials_dir();
        let partials = load_partials(&partials_dir, &config.extension, config.io_timeout).await?;
        let partial_count = register_partials(&mut registry, &partials)?;
        tracing::info!(
            count = partial_count,
            dir = %partials_dir.display(),
            "registered partials"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                partials: partials.into_iter().map(|p| p.name).collect(),
                config,
                registry,
                cache,
                stats: StatCounters::default(),
            }),
        })
    }

    /// The configuration this renderer was built with
    pub fn config(&self) -> &ViewConfig {
        &self.inner.config
    }

    /// Names of the registered partials, sorted by file path
    pub fn partial_names(&self) -> &[String] {
        &self.inner.partials
    }

    /// Cache and compile counters
    pub fn stats(&self) -> RenderStats {
        self.inner.stats.snapshot()
    }

    /// Number of templates currently cached (zero when caching is off)
    pub async fn cached_templates(&self) -> usize {
        match &self.inner.cache {
            Some(cache) => cache.len().await,
            None => 0,
        }
    }

    /// Resolve a view name to its file
    pub async fn resolve_view(&self, name: &str) -> Result<PathBuf> {
        let config = &self.inner.config;
        resolve_template(&config.views_dir(), name, &config.extension, config.io_timeout).await
    }

    /// Resolve a layout name to its file
    pub async fn resolve_layout(&self, name: &str) -> Result<PathBuf> {
        let config = &self.inner.config;
        resolve_template(&config.layouts_dir(), name, &config.extension, config.io_timeout).await
    }

    /// Load the compiled template for `path`, going through the cache when enabled
    pub async fn get_template(&self, path: &Path) -> Result<Arc<CompiledTemplate>> {
        self.load(path, self.inner.config.cache).await
    }

    async fn load(&self, path: &Path, use_cache: bool) -> Result<Arc<CompiledTemplate>> {
        let cache = match (&self.inner.cache, use_cache) {
            (Some(cache), true) => cache,
            _ => return self.compile_file(path).await,
        };

        if let Some(hit) = cache.get(path).await {
            self.inner.stats.record_hit();
            tracing::debug!(path = %path.display(), "template cache hit");
            return Ok(hit);
        }

        self.inner.stats.record_miss();
        tracing::debug!(path = %path.display(), "template cache miss");
        let compiled = self.compile_file(path).await?;
        cache.insert(path.to_path_buf(), compiled.clone()).await;
        Ok(compiled)
    }

    async fn compile_file(&self, path: &Path) -> Result<Arc<CompiledTemplate>> {
        let source = read_source(path, self.inner.config.io_timeout).await?;
        self.compile(path.display().to_string(), &source)
    }

    fn compile(&self, name: String, source: &str) -> Result<Arc<CompiledTemplate>> {
        let compiled = CompiledTemplate::compile(name, source)?;
        self.inner.stats.record_compile();
        Ok(Arc::new(compiled))
    }

    /// Render `view` with `locals`, wrapped in the effective layout
    ///
    /// The layout is taken from `locals.layout` (removed before rendering),
    /// then `options.layout`, then the configured default. The view and the
    /// layout are loaded concurrently; the view is fully rendered before the
    /// layout, which sees the view output as `{{{body}}}`.
    ///
    /// A local named `body` reaches the view like any other value, but inside
    /// the layout it is replaced by the rendered view.
    pub async fn render<T: Serialize + ?Sized>(
        &self,
        view: &str,
        locals: &T,
        options: RenderOptions,
    ) -> Result<String> {
        let config = &self.inner.config;
        let RenderOptions {
            body,
            layout,
            data,
            cache,
        } = options;

        let mut locals = into_locals(locals)?;
        let layout = match locals.remove(LAYOUT_KEY) {
            Some(value) => Layout::from_value(&value)?,
            None => layout.unwrap_or_default(),
        };
        let layout_name = layout.resolve(config.default_layout.as_deref());
        let use_cache = cache.unwrap_or(config.cache);

        let mut context = data;
        context.extend(locals);

        let load_view = async {
            match body {
                Some(template) => self.compile(format!("inline body for {view}"), &template),
                None => {
                    let path = self.resolve_view(view).await?;
                    self.load(&path, use_cache).await
                }
            }
        };
        let load_layout = async {
            match &layout_name {
                Some(name) => {
                    let path = self.resolve_layout(name).await?;
                    self.load(&path, use_cache).await.map(Some)
                }
                None => Ok(None),
            }
        };
        let (view_template, layout_template) = tokio::try_join!(load_view, load_layout)?;

        let mut context = Value::Object(context);
        let html = view_template.render(&self.inner.registry, &context)?;

        let Some(layout_template) = layout_template else {
            return Ok(html);
        };
        if let Value::Object(map) = &mut context {
            map.insert(BODY_KEY.to_string(), Value::String(html));
        }
        layout_template.render(&self.inner.registry, &context)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.inner.config)
            .field("partials", &self.inner.partials)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["views", "layouts", "partials"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("views/index.html"), "<h1>{{name}}</h1>").unwrap();
        fs::write(
            dir.path().join("layouts/main.html"),
            "<html><body>{{{body}}}</body></html>",
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_layout_wraps_view() {
        let dir = site();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path())).await.unwrap();
        let html = renderer
            .render("index", &json!({ "name": "Atomic" }), RenderOptions::new())
            .await
            .unwrap();
        assert_eq!(html, "<html><body><h1>Atomic</h1></body></html>");
    }

    #[tokio::test]
    async fn test_layout_key_removed_from_locals() {
        let dir = site();
        fs::write(dir.path().join("views/show.html"), "[{{layout}}]").unwrap();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path())).await.unwrap();

        let html = renderer
            .render("show", &json!({ "layout": false }), RenderOptions::new())
            .await
            .unwrap();
        assert_eq!(html, "[]");
    }

    #[tokio::test]
    async fn test_inline_body_skips_view_lookup() {
        let dir = site();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path())).await.unwrap();
        let html = renderer
            .render(
                "does-not-exist",
                &json!({ "name": "inline" }),
                RenderOptions::new().body("<p>{{name}}</p>"),
            )
            .await
            .unwrap();
        assert_eq!(html, "<html><body><p>inline</p></body></html>");
    }

    #[tokio::test]
    async fn test_missing_default_layout_is_not_found() {
        let dir = site();
        fs::remove_file(dir.path().join("layouts/main.html")).unwrap();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path())).await.unwrap();
        let err = renderer
            .render("index", &json!({}), RenderOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ViewError::TemplateNotFound { ref name, .. } if name == "main"));
    }

    #[tokio::test]
    async fn test_per_call_cache_bypass() {
        let dir = site();
        let config = ViewConfig::new(dir.path()).no_default_layout();
        let renderer = Renderer::initialize(config).await.unwrap();

        for _ in 0..2 {
            renderer
                .render("index", &json!({}), RenderOptions::new().cache(false))
                .await
                .unwrap();
        }
        assert_eq!(renderer.stats().compiles, 2);
        assert_eq!(renderer.cached_templates().await, 0);
    }

    #[tokio::test]
    async fn test_data_visible_but_locals_win() {
        let dir = site();
        fs::write(dir.path().join("views/data.html"), "{{year}} {{name}}").unwrap();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path()).no_default_layout())
            .await
            .unwrap();

        let options = RenderOptions::new()
            .data("year", &2024)
            .unwrap()
            .data("name", "from-data")
            .unwrap();
        let html = renderer
            .render("data", &json!({ "name": "from-locals" }), options)
            .await
            .unwrap();
        assert_eq!(html, "2024 from-locals");
    }

    #[tokio::test]
    async fn test_body_local_shadowed_in_layout() {
        let dir = site();
        fs::write(dir.path().join("views/echo.html"), "{{body}}").unwrap();
        fs::write(dir.path().join("layouts/echo.html"), "L:{{{body}}}").unwrap();
        let renderer = Renderer::initialize(ViewConfig::new(dir.path())).await.unwrap();

        let html = renderer
            .render("echo", &json!({ "body": "<b>" }), RenderOptions::new().layout("echo"))
            .await
            .unwrap();
        assert_eq!(html, "L:&lt;b&gt;");
    }

    #[tokio::test]
    async fn test_relative_root_is_made_absolute() {
        let dir = tempfile::Builder::new()
            .prefix("relative-root")
            .tempdir_in(".")
            .unwrap();
        for sub in ["views", "partials"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join("views/index.html"), "hi").unwrap();
        let relative = Path::new(".").join(dir.path().file_name().unwrap());

        let renderer = Renderer::initialize(ViewConfig::new(relative).no_default_layout())
            .await
            .unwrap();
        assert!(renderer.config().root.is_absolute());

        let path = renderer.resolve_view("index").await.unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("views/index.html"));
    }
}
