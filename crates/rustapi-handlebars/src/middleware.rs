//! Tower middleware that makes the renderer available to handlers
//!
//! [`ViewLayer`] installs a [`ViewContext`] in the extensions of every request
//! that does not already carry one. Handlers pull it out and call
//! [`ViewContext::render`].
//!
//! # Example
//!
//! ```rust,ignore
//! use rustapi_handlebars::{setup, ViewConfig};
//! use tower::ServiceBuilder;
//!
//! let views = setup(ViewConfig::new("./web")).await?;
//! let service = ServiceBuilder::new().layer(views).service(app);
//! ```

use crate::options::into_locals;
use crate::{Renderer, RenderOptions, Result, View, ViewConfig};
use http::Request;
use serde::Serialize;
use serde_json::{Map, Value};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Initialize a renderer from `config` and wrap it in a [`ViewLayer`]
///
/// The renderer is built once here; every service produced by the layer
/// shares it.
pub async fn setup(config: ViewConfig) -> Result<ViewLayer> {
    let renderer = Renderer::initialize(config).await?;
    Ok(ViewLayer::new(renderer))
}

/// Request-scoped values merged into the locals of every render
///
/// Insert it into the request extensions from an earlier middleware to expose
/// data such as the current user to all views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState(pub Map<String, Value>);

impl ViewState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.0.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }
}

/// Render handle installed in each request's extensions
#[derive(Debug, Clone)]
pub struct ViewContext {
    renderer: Renderer,
    state: ViewState,
}

impl ViewContext {
    /// Create a context for one request
    pub fn new(renderer: Renderer, state: ViewState) -> Self {
        Self { renderer, state }
    }

    /// The shared renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Request-scoped state merged into every render
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Mutable access to the request-scoped state
    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    /// Render `view` with `locals` merged with the request state
    ///
    /// State values replace locals with the same key.
    pub async fn render<T: Serialize + ?Sized>(
        &self,
        view: &str,
        locals: &T,
        options: RenderOptions,
    ) -> Result<View> {
        let mut locals = into_locals(locals)?;
        locals.extend(self.state.0.clone());
        let html = self.renderer.render(view, &locals, options).await?;
        Ok(View::from_html(html))
    }
}

/// Layer installing a [`ViewContext`] on every request
#[derive(Debug, Clone)]
pub struct ViewLayer {
    renderer: Renderer,
}

impl ViewLayer {
    /// Create a layer from an initialized renderer
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }

    /// The renderer shared by all requests
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

impl<S> Layer<S> for ViewLayer {
    type Service = ViewService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewService {
            inner,
            renderer: self.renderer.clone(),
        }
    }
}

/// Service produced by [`ViewLayer`]
#[derive(Debug, Clone)]
pub struct ViewService<S> {
    inner: S,
    renderer: Renderer,
}

impl<S, B> Service<Request<B>> for ViewService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        // another layer already owns rendering for this request
        if req.extensions().get::<ViewContext>().is_none() {
            let state = req.extensions().get::<ViewState>().cloned().unwrap_or_default();
            req.extensions_mut()
                .insert(ViewContext::new(self.renderer.clone(), state));
        }
        self.inner.call(req)
    }
}
