//! Sections: the atomic renderable blocks of a page.

mod kinds;

pub use kinds::{Footer, Header, Kpi, KpiChange, Kpis, Table, Text, Trend};

use log::debug;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::format::{FormatRegistry, Slot};
use crate::render;

/// Payload of a section. Decides which format slot supplies the default
/// template and CSS, and what the template sees as its context.
#[derive(Debug, Clone)]
pub enum SectionKind {
    Generic(Map<String, Value>),
    Header(Header),
    Footer(Footer),
    Table(Table),
    Text(Text),
    Kpis(Kpis),
}

impl SectionKind {
    pub fn slot(&self) -> Slot {
        match self {
            SectionKind::Generic(_) => Slot::Section,
            SectionKind::Header(_) => Slot::Header,
            SectionKind::Footer(_) => Slot::Footer,
            SectionKind::Table(_) => Slot::Table,
            SectionKind::Text(_) => Slot::Text,
            SectionKind::Kpis(_) => Slot::Kpi,
        }
    }

    fn context(&self) -> Value {
        match self {
            SectionKind::Generic(data) => Value::Object(data.clone()),
            SectionKind::Header(h) => serde_json::to_value(h).unwrap_or_default(),
            SectionKind::Footer(f) => serde_json::to_value(f).unwrap_or_default(),
            SectionKind::Table(t) => t.context(),
            SectionKind::Text(t) => serde_json::json!({ "title": t.title, "content": t.content }),
            SectionKind::Kpis(k) => k.context(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    kind: SectionKind,
    template: Option<String>,
    css: Option<String>,
    css_class: String,
    format_name: Option<String>,
}

impl Section {
    fn with_kind(name: impl Into<String>, kind: SectionKind, css_class: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            template: None,
            css: None,
            css_class: css_class.to_string(),
            format_name: None,
        }
    }

    /// Free-form section rendered through the format's `section` slot unless
    /// a template is given.
    pub fn new(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self::with_kind(name, SectionKind::Generic(data), "")
    }

    pub fn header(header: Header) -> Self {
        Self::with_kind("header", SectionKind::Header(header), "")
    }

    pub fn footer(footer: Footer) -> Self {
        Self::with_kind("footer", SectionKind::Footer(footer), "")
    }

    pub fn table(name: impl Into<String>, table: Table) -> Self {
        Self::with_kind(name, SectionKind::Table(table), "table")
    }

    pub fn text(name: impl Into<String>, text: Text) -> Self {
        Self::with_kind(name, SectionKind::Text(text), "text")
    }

    pub fn kpis(name: impl Into<String>, kpis: Kpis) -> Self {
        Self::with_kind(name, SectionKind::Kpis(kpis), "kpi")
    }

    /// Template source overriding the format's. An empty string counts as unset.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// CSS overriding the format's. `Some("")` means no CSS at all.
    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = class.into();
        self
    }

    pub fn format(mut self, format_name: impl Into<String>) -> Self {
        self.format_name = Some(format_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SectionKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut SectionKind {
        &mut self.kind
    }

    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    pub(crate) fn inherit_format(&mut self, format_name: Option<&str>) {
        if self.format_name.is_none() {
            self.format_name = format_name.map(str::to_string);
        }
    }

    fn template_source(&self, formats: &FormatRegistry) -> Result<String> {
        if let Some(t) = self.template.as_deref().filter(|t| !t.is_empty()) {
            return Ok(t.to_string());
        }
        let format = formats.templates(self.format_name())?;
        Ok(format.slot(self.kind.slot()).html.clone())
    }

    /// Rendered HTML wrapped in the section container, or an empty string
    /// when neither the section nor its format supplies a template.
    pub fn render(&self, formats: &FormatRegistry) -> Result<String> {
        let source = self.template_source(formats)?;
        if source.is_empty() {
            debug!("Section '{}' has no template", self.name);
            return Ok(String::new());
        }
        let content = render::render_fragment(&source, &self.kind.context())?;

        let mut classes = format!("section section-{}", self.name);
        if !self.css_class.is_empty() {
            classes.push(' ');
            classes.push_str(&self.css_class);
        }
        Ok(format!("<div class=\"{classes}\">\n{content}\n</div>"))
    }

    pub fn render_css(&self, formats: &FormatRegistry) -> Result<String> {
        let css = match &self.css {
            Some(css) => css.clone(),
            None => formats.templates(self.format_name())?.slot(self.kind.slot()).css.clone(),
        };
        if css.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("/* Section: {} */\n{css}", self.name))
    }
}
