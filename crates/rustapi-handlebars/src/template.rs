//! Compiled templates

use crate::{Result, ViewError};
use handlebars::{Context, Handlebars, RenderContext, Renderable, StringOutput, Template};
use serde_json::Value;
use std::fmt;

const BOM: char = '\u{feff}';

/// Remove a leading byte-order mark
pub fn strip_bom(source: &str) -> &str {
    source.strip_prefix(BOM).unwrap_or(source)
}

/// A template source paired with its compiled form
///
/// Immutable once created; shared between renders through `Arc`.
pub struct CompiledTemplate {
    name: String,
    source: String,
    template: Template,
}

impl CompiledTemplate {
    /// Compile `source`, labelling errors with `name`
    ///
    /// A leading BOM is stripped before compilation.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let source = strip_bom(source).to_string();
        let mut template =
            Template::compile(&source).map_err(|e| ViewError::syntax(name.clone(), e))?;
        template.name = Some(name.clone());
        Ok(Self {
            name,
            source,
            template,
        })
    }

    /// Label used in errors, usually the absolute file path
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template source with any BOM removed
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against `registry`, which supplies helpers and partials
    pub fn render(&self, registry: &Handlebars<'static>, data: &Value) -> Result<String> {
        let ctx = Context::wraps(data)?;
        let mut rc = RenderContext::new(None);
        let mut out = StringOutput::new();
        self.template.render(registry, &ctx, &mut rc, &mut out)?;
        out.into_string()
            .map_err(|e| ViewError::Render(format!("{}: {}", self.name, e)))
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{feff}<p>hi</p>"), "<p>hi</p>");
        assert_eq!(strip_bom("<p>hi</p>"), "<p>hi</p>");
        assert_eq!(strip_bom(""), "");
    }

    #[test]
    fn test_compile_and_render() {
        let registry = Handlebars::new();
        let tpl = CompiledTemplate::compile("greeting", "\u{feff}Hello, {{name}}!").unwrap();
        assert_eq!(tpl.source(), "Hello, {{name}}!");

        let out = tpl.render(&registry, &json!({ "name": "World" })).unwrap();
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_escapes_by_default() {
        let registry = Handlebars::new();
        let tpl = CompiledTemplate::compile("t", "{{v}}|{{{v}}}").unwrap();
        let out = tpl.render(&registry, &json!({ "v": "<b>" })).unwrap();
        assert_eq!(out, "&lt;b&gt;|<b>");
    }

    #[test]
    fn test_syntax_error() {
        let err = CompiledTemplate::compile("broken.html", "{{#if ok}}never closed").unwrap_err();
        match err {
            ViewError::TemplateSyntax { name, .. } => assert_eq!(name, "broken.html"),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_uses_registry_partials() {
        let mut registry = Handlebars::new();
        registry.register_partial("nav", "<nav>{{title}}</nav>").unwrap();
        let tpl = CompiledTemplate::compile("page", "{{> nav}}<main></main>").unwrap();
        let out = tpl.render(&registry, &json!({ "title": "Home" })).unwrap();
        assert_eq!(out, "<nav>Home</nav><main></main>");
    }
}
