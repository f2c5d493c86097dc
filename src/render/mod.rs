//! Template environments.
//!
//! Sections render through a shared environment without auto-escaping so
//! format fragments can pass markup through their data. Documents get their
//! own HTML-escaping environment rooted at a templates directory.

pub mod filters;

use minijinja::{path_loader, AutoEscape, Environment};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::path::Path;

use crate::error::Result;

static SECTION_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    filters::register(&mut env);
    env
});

/// Render an inline section template.
pub fn render_fragment<S: Serialize>(source: &str, data: &S) -> Result<String> {
    Ok(SECTION_ENV.render_str(source, data)?)
}

/// Environment for document templates under `templates_dir`.
pub fn document_env(templates_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(templates_dir));
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    filters::register(&mut env);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn fragments_do_not_escape() {
        let out = render_fragment("{{ html }}", &context! { html => "<b>x</b>" }).unwrap();
        assert_eq!(out, "<b>x</b>");
    }

    #[test]
    fn document_env_escapes_inline_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = document_env(dir.path());
        let out = env
            .render_str("<p>{{ name }}</p>", context! { name => "A & B" })
            .unwrap();
        assert_eq!(out, "<p>A &amp; B</p>");
    }

    #[test]
    fn syntax_errors_surface_as_template_errors() {
        let err = render_fragment("{% if %}", &context! {}).unwrap_err();
        assert!(matches!(err, crate::ReportError::Template(_)));
    }
}
