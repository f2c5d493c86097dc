use serde_json::{Map, Value};

use crate::error::Result;
use crate::format::FormatRegistry;
use crate::section::{Footer, Header, Section};

/// Fields for a generic section built in place by [`Page::add_inline_section`].
#[derive(Debug, Clone, Default)]
pub struct InlineSection {
    /// Defaults to `section_{index}`.
    pub name: Option<String>,
    pub template: Option<String>,
    pub data: Map<String, Value>,
    pub css: Option<String>,
    pub format_name: Option<String>,
}

/// One page of a report: optional header and footer around ordered sections.
#[derive(Debug, Clone, Default)]
pub struct Page {
    header: Option<Section>,
    footer: Option<Section>,
    sections: Vec<Section>,
    css: String,
    page_number: usize,
    format_name: Option<String>,
}

impl Page {
    pub(crate) fn new(page_number: usize, format_name: Option<String>) -> Self {
        Self {
            page_number,
            format_name,
            ..Default::default()
        }
    }

    /// 1-based, fixed when the page was added to its report.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn set_css(&mut self, css: impl Into<String>) -> &mut Self {
        self.css = css.into();
        self
    }

    pub fn set_header(&mut self, header: Header) -> &mut Self {
        self.set_header_section(Section::header(header))
    }

    /// Install a prebuilt header section, e.g. one with a custom template.
    pub fn set_header_section(&mut self, mut section: Section) -> &mut Self {
        section.inherit_format(self.format_name.as_deref());
        self.header = Some(section);
        self
    }

    pub fn set_footer(&mut self, footer: Footer) -> &mut Self {
        self.set_footer_section(Section::footer(footer))
    }

    pub fn set_footer_section(&mut self, mut section: Section) -> &mut Self {
        section.inherit_format(self.format_name.as_deref());
        self.footer = Some(section);
        self
    }

    pub fn add_section(&mut self, mut section: Section) -> &mut Self {
        section.inherit_format(self.format_name.as_deref());
        self.sections.push(section);
        self
    }

    pub fn add_inline_section(&mut self, inline: InlineSection) -> &mut Self {
        let name = inline
            .name
            .unwrap_or_else(|| format!("section_{}", self.sections.len()));
        let mut section = Section::new(name, inline.data);
        if let Some(template) = inline.template {
            section = section.template(template);
        }
        if let Some(css) = inline.css {
            section = section.css(css);
        }
        if let Some(format_name) = inline.format_name {
            section = section.format(format_name);
        }
        self.add_section(section)
    }

    pub fn header(&self) -> Option<&Section> {
        self.header.as_ref()
    }

    pub fn footer(&self) -> Option<&Section> {
        self.footer.as_ref()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Page CSS, then header, footer and sections; empty parts are skipped.
    pub fn render_css(&self, formats: &FormatRegistry) -> Result<String> {
        let mut parts = Vec::new();
        if !self.css.is_empty() {
            parts.push(format!("/* Page CSS */\n{}", self.css));
        }
        for section in self.header.iter().chain(self.footer.iter()).chain(&self.sections) {
            let css = section.render_css(formats)?;
            if !css.is_empty() {
                parts.push(css);
            }
        }
        Ok(parts.join("\n\n"))
    }

    /// Sections that render to nothing leave no trace in the output.
    pub fn render(&self, formats: &FormatRegistry) -> Result<String> {
        let mut parts = vec!["<div class=\"page\">".to_string()];
        let push = |section: &Section, parts: &mut Vec<String>| -> Result<()> {
            let html = section.render(formats)?;
            if !html.is_empty() {
                parts.push(html);
            }
            Ok(())
        };
        if let Some(header) = &self.header {
            push(header, &mut parts)?;
        }
        parts.push("<div class=\"page-content\">".to_string());
        for section in &self.sections {
            push(section, &mut parts)?;
        }
        parts.push("</div>".to_string());
        if let Some(footer) = &self.footer {
            push(footer, &mut parts)?;
        }
        parts.push("</div>".to_string());
        Ok(parts.join("\n"))
    }
}
