//! Single-template documents and the shared page/export behaviour.

mod base;
mod factories;
mod party;

pub use base::{BaseDocument, RenderCache, BASE_CSS, DEFAULT_HTML_NAME, DEFAULT_PDF_NAME};
pub use factories::{
    compute_invoice, compute_quote, create_delivery_note, create_invoice, create_quote,
    create_receipt, DeliveryItem, DeliveryNoteRequest, InvoiceRequest, InvoiceTotals, LineItem,
    PaymentInfo, PricedLine, QuoteRequest, QuoteTotals, ReceiptRequest, VatLine,
    DEFAULT_CURRENCY, DEFAULT_TAX_RATE,
};
pub use party::Party;

use log::debug;
use minijinja::ErrorKind;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::RenderContext;
use crate::error::{ReportError, Result};
use crate::render;

/// Layout classes for invoices, quotes, receipts and delivery notes.
pub const DOCUMENT_CSS: &str = include_str!("document.css");

const NO_TEMPLATE: &str = "<div class='document'><p>No template specified</p></div>";

/// Where a document's template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template text.
    Inline(String),
    /// File stem or file name under the templates directory.
    Named(String),
}

impl TemplateSource {
    /// Text containing `<` is treated as an inline template, anything else
    /// as a file name.
    pub fn detect(template: impl Into<String>) -> Self {
        let template = template.into();
        if template.contains('<') {
            TemplateSource::Inline(template)
        } else {
            TemplateSource::Named(template)
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TemplateSource::Inline(s) | TemplateSource::Named(s) => s.is_empty(),
        }
    }
}

/// One template rendered against one data set.
#[derive(Debug, Clone, Default)]
pub struct Document {
    title: String,
    template: Option<TemplateSource>,
    data: Value,
    css: String,
    global_css: String,
    templates_dir: Option<PathBuf>,
    cache: RenderCache,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data: Value::Object(Map::new()),
            ..Default::default()
        }
    }

    pub fn template(mut self, source: TemplateSource) -> Self {
        self.template = Some(source);
        self
    }

    pub fn inline(self, source: impl Into<String>) -> Self {
        self.template(TemplateSource::Inline(source.into()))
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        self.template(TemplateSource::Named(name.into()))
    }

    /// Template context. Anything serializing to a JSON object works.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Appended after the built-in document CSS.
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    pub fn with_global_css(mut self, css: impl Into<String>) -> Self {
        self.global_css = css.into();
        self
    }

    /// Look up named templates here instead of the configured directory.
    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    pub fn template_source(&self) -> Option<&TemplateSource> {
        self.template.as_ref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    fn templates_dir(&self, ctx: &RenderContext) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| ctx.settings().templates_dir())
    }
}

impl BaseDocument for Document {
    fn title(&self) -> &str {
        &self.title
    }

    fn global_css(&self) -> &str {
        &self.global_css
    }

    fn cache(&self) -> &RenderCache {
        &self.cache
    }

    fn render_css(&self, _ctx: &RenderContext) -> Result<String> {
        if self.css.is_empty() {
            Ok(DOCUMENT_CSS.to_string())
        } else {
            Ok(format!("{DOCUMENT_CSS}\n{}", self.css))
        }
    }

    fn render_content(&self, ctx: &RenderContext) -> Result<String> {
        let Some(source) = self.template.as_ref().filter(|t| !t.is_empty()) else {
            return Ok(NO_TEMPLATE.to_string());
        };
        let dir = self.templates_dir(ctx);
        let env = render::document_env(&dir);

        match source {
            TemplateSource::Inline(text) => Ok(env.render_str(text, &self.data)?),
            TemplateSource::Named(name) => {
                let file = if name.ends_with(".html") {
                    name.clone()
                } else {
                    format!("{name}.html")
                };
                debug!("Rendering template {file} from {}", dir.display());
                let template = env.get_template(&file).map_err(|e| match e.kind() {
                    ErrorKind::TemplateNotFound => ReportError::TemplateNotFound {
                        name: file.clone(),
                        dir: dir.clone(),
                    },
                    _ => ReportError::Template(e),
                })?;
                Ok(template.render(&self.data)?)
            }
        }
    }
}

/// Sorted stems of the `*.html` files in `dir`; empty if it does not exist.
/// Partials named `_*.html` are left out.
pub fn available_templates(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "html"))
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .filter(|name| !name.starts_with('_'))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_uses_angle_bracket() {
        assert_eq!(
            TemplateSource::detect("<p>{{ x }}</p>"),
            TemplateSource::Inline("<p>{{ x }}</p>".into())
        );
        assert_eq!(
            TemplateSource::detect("invoice"),
            TemplateSource::Named("invoice".into())
        );
    }

    #[test]
    fn css_is_appended_after_document_css() {
        let ctx = RenderContext::default().without_pdf();
        let doc = Document::new("t").with_css(".x { color: red; }");
        let css = doc.render_css(&ctx).unwrap();
        assert!(css.starts_with(DOCUMENT_CSS));
        assert!(css.ends_with("\n.x { color: red; }"));
    }
}
