//! Fluent construction of reports from plain data.

use chrono::Local;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::context::RenderContext;
use crate::document::{BaseDocument, DEFAULT_HTML_NAME, DEFAULT_PDF_NAME};
use crate::error::{ReportError, Result};
use crate::page::Page;
use crate::report::Report;
use crate::section::{Footer, Header, Kpi, KpiChange, Kpis, Section, Table, Text};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub title: String,
    pub subtitle: String,
    pub logo: String,
    /// Empty means today.
    pub date: String,
}

impl HeaderConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = logo.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    fn to_header(&self) -> Header {
        let date = if self.date.is_empty() {
            Local::now().format("%Y-%m-%d").to_string()
        } else {
            self.date.clone()
        };
        Header::new(&self.title)
            .subtitle(&self.subtitle)
            .logo(&self.logo)
            .date(date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterConfig {
    pub left: String,
    pub center: String,
    pub right: String,
}

impl FooterConfig {
    pub fn new(
        left: impl Into<String>,
        center: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            left: left.into(),
            center: center.into(),
            right: right.into(),
        }
    }

    fn to_footer(&self) -> Footer {
        Footer::new(&self.left, &self.center, &self.right)
    }
}

/// Sections shown on one page, by name, with optional header and footer
/// replacing the layout-wide ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub header: Option<HeaderConfig>,
    pub footer: Option<FooterConfig>,
    pub sections: Vec<String>,
}

impl PageLayout {
    pub fn new<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Presentation for data handed to [`ReportBuilder::from_data_layout`].
/// With no `pages` everything lands on a single page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    pub format_name: Option<String>,
    pub header: Option<HeaderConfig>,
    pub footer: Option<FooterConfig>,
    pub pages: Vec<PageLayout>,
    pub global_css: String,
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
    format_name: Option<String>,
    header: Option<HeaderConfig>,
    footer: Option<FooterConfig>,
    sections: Vec<Section>,
    pages: Vec<PageLayout>,
    global_css: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new("Report")
    }
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            format_name: None,
            header: None,
            footer: None,
            sections: Vec::new(),
            pages: Vec::new(),
            global_css: String::new(),
        }
    }

    /// Without a format the context's default applies.
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format_name = Some(name.into());
        self
    }

    pub fn header(mut self, header: HeaderConfig) -> Self {
        self.header = Some(header);
        self
    }

    pub fn footer(mut self, footer: FooterConfig) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn add_table(self, name: impl Into<String>, table: Table) -> Self {
        self.add_section(Section::table(name, table))
    }

    pub fn add_kpis(self, name: impl Into<String>, kpis: Kpis) -> Self {
        self.add_section(Section::kpis(name, kpis))
    }

    pub fn add_text(self, name: impl Into<String>, text: Text) -> Self {
        self.add_section(Section::text(name, text))
    }

    /// Any prebuilt section, e.g. one carrying its own template.
    pub fn add_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Appended to the global CSS, one rule block per call.
    pub fn css(mut self, css: &str) -> Self {
        self.global_css.push('\n');
        self.global_css.push_str(css);
        self
    }

    /// Split sections over several pages. See [`PageLayout`].
    pub fn page(mut self, layout: PageLayout) -> Self {
        self.pages.push(layout);
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn build(&self) -> Report {
        let mut report = Report::new(&self.title).with_global_css(self.global_css.trim());
        if let Some(name) = &self.format_name {
            report = report.format(name);
        }

        if self.pages.is_empty() {
            let page = report.add_page();
            self.decorate(page, None);
            for section in &self.sections {
                page.add_section(self.with_format(section));
            }
            return report;
        }

        let mut placed = vec![false; self.sections.len()];
        for layout in &self.pages {
            let page = report.add_page();
            self.decorate(page, Some(layout));
            for name in &layout.sections {
                match self.sections.iter().position(|s| s.name() == name) {
                    Some(i) => {
                        page.add_section(self.with_format(&self.sections[i]));
                        placed[i] = true;
                    }
                    None => warn!("Page layout names unknown section '{name}'"),
                }
            }
        }
        let leftovers: Vec<&Section> = self
            .sections
            .iter()
            .zip(&placed)
            .filter(|(_, placed)| !**placed)
            .map(|(section, _)| section)
            .collect();
        if let Some(last) = report.page_mut(self.pages.len() - 1) {
            for section in leftovers {
                debug!("Section '{}' not in any page layout, adding to last page", section.name());
                last.add_section(self.with_format(section));
            }
        }
        report
    }

    fn decorate(&self, page: &mut Page, layout: Option<&PageLayout>) {
        let header = layout.and_then(|l| l.header.as_ref()).or(self.header.as_ref());
        if let Some(header) = header {
            page.set_header(header.to_header());
        }
        let footer = layout.and_then(|l| l.footer.as_ref()).or(self.footer.as_ref());
        if let Some(footer) = footer {
            page.set_footer(footer.to_footer());
        }
    }

    fn with_format(&self, section: &Section) -> Section {
        let mut section = section.clone();
        section.inherit_format(self.format_name.as_deref());
        section
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String> {
        self.build().render(ctx)
    }

    /// HTML with common element styles written inline, for mail clients
    /// that drop `<style>` blocks.
    pub fn render_inline(&self, ctx: &RenderContext) -> Result<String> {
        Ok(inline_styles(&self.render(ctx)?))
    }

    /// Body of the inline-styled HTML, ready to paste into a rich editor.
    pub fn to_clipboard_html(&self, ctx: &RenderContext) -> Result<String> {
        let html = self.render_inline(ctx)?;
        Ok(match body_of(&html) {
            Some(body) => body.trim().to_string(),
            None => html,
        })
    }

    pub fn export_html(&self, ctx: &RenderContext, path: Option<&Path>) -> Result<PathBuf> {
        self.build().export_html(ctx, path, DEFAULT_HTML_NAME)
    }

    pub fn export_pdf(&self, ctx: &RenderContext, path: Option<&Path>) -> Result<PathBuf> {
        self.build().export_pdf(ctx, path, DEFAULT_PDF_NAME)
    }

    pub fn preview(&self, ctx: &RenderContext, browser: Option<&str>) -> Result<PathBuf> {
        self.build().preview(ctx, browser)
    }

    /// Turn named data into sections by shape:
    ///
    /// - a list of objects that all have `label` and `value` becomes KPIs
    /// - any other list of objects becomes a table keyed by the first
    ///   object's fields
    /// - an object with `headers` and `rows` becomes a table (`title` and
    ///   `footer` optional)
    /// - a string, or any other object, becomes text
    ///
    /// Other values are skipped.
    pub fn from_data_layout(
        title: impl Into<String>,
        data: &Map<String, Value>,
        layout: ReportLayout,
    ) -> Result<Self> {
        let mut builder = ReportBuilder::new(title);
        builder.format_name = layout.format_name;
        builder.header = layout.header;
        builder.footer = layout.footer;
        builder.pages = layout.pages;
        builder.global_css = layout.global_css;

        for (name, value) in data {
            builder = match value {
                Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                    if items.iter().all(is_kpi) {
                        let kpis = items.iter().map(kpi_from_value).collect();
                        builder.add_kpis(name, Kpis::new(kpis))
                    } else {
                        builder.add_table(name, table_from_records(items))
                    }
                }
                Value::Object(obj) if obj.contains_key("headers") && obj.contains_key("rows") => {
                    builder.add_table(name, table_from_object(name, obj)?)
                }
                Value::Object(_) => builder.add_text(name, Text::new(value.to_string())),
                Value::String(s) => builder.add_text(name, Text::new(s)),
                _ => {
                    debug!("Skipping data '{name}': no section shape for {value}");
                    builder
                }
            };
        }
        Ok(builder)
    }
}

fn is_kpi(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("label") && o.contains_key("value"))
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kpi_from_value(value: &Value) -> Kpi {
    let field = |key: &str| value.get(key).map(plain).filter(|s| !s.is_empty());
    let mut kpi = Kpi::new(field("label").unwrap_or_default(), field("value").unwrap_or_default());
    kpi.change = match value.get("change") {
        Some(Value::Number(n)) => n.as_f64().map(KpiChange::Percent),
        Some(Value::String(s)) if !s.is_empty() => Some(KpiChange::Label(s.clone())),
        _ => None,
    };
    kpi.description = field("description");
    kpi.color_class = field("color_class").or_else(|| field("color"));
    kpi
}

fn table_from_records(records: &[Value]) -> Table {
    let headers: Vec<String> = records
        .first()
        .and_then(Value::as_object)
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|h| record.get(h).cloned().unwrap_or_else(|| Value::String(String::new())))
                .collect()
        })
        .collect();
    Table::new(headers, rows)
}

fn table_from_object(name: &str, obj: &Map<String, Value>) -> Result<Table> {
    let bad = |what: &str, value: &Value| {
        ReportError::invalid(&format!("{name}.{what}"), &value.to_string(), "a list")
    };
    let headers_value = &obj["headers"];
    let headers: Vec<String> = headers_value
        .as_array()
        .ok_or_else(|| bad("headers", headers_value))?
        .iter()
        .map(plain)
        .collect();
    let rows_value = &obj["rows"];
    let rows = rows_value
        .as_array()
        .ok_or_else(|| bad("rows", rows_value))?
        .iter()
        .map(|row| match row {
            Value::Array(cells) => Ok(cells.clone()),
            other => Err(bad("rows", other)),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut table = Table::new(headers, rows);
    if let Some(title) = obj.get("title").map(plain) {
        table = table.title(title);
    }
    if let Some(Value::Array(footer)) = obj.get("footer") {
        table = table.footer_row(footer.clone());
    }
    Ok(table)
}

struct InlineRule {
    tag: Regex,
    style: &'static str,
}

static INLINE_RULES: Lazy<Vec<InlineRule>> = Lazy::new(|| {
    [
        ("table", "width:100%;border-collapse:collapse;font-family:Arial,sans-serif;"),
        ("th", "background:#f0f0f0;padding:8px;text-align:left;border-bottom:2px solid #ddd;"),
        ("td", "padding:8px;border-bottom:1px solid #eee;"),
        ("h1", "font-size:24px;color:#333;margin-bottom:10px;"),
        ("h2", "font-size:18px;color:#333;margin-bottom:8px;"),
        ("h3", "font-size:14px;color:#333;margin-bottom:6px;"),
        ("p", "margin-bottom:10px;line-height:1.5;"),
    ]
    .into_iter()
    .filter_map(|(tag, style)| match InlineRule::new(tag, style) {
        Ok(rule) => Some(rule),
        Err(err) => {
            warn!("Skipping inline style for <{tag}>: {err}");
            None
        }
    })
    .collect()
});

impl InlineRule {
    fn new(tag: &str, style: &'static str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(&format!(r"<{tag}(\s[^>]*)?>"))?,
            style,
        })
    }
}

/// Content between the opening and closing `<body>` tags.
fn body_of(html: &str) -> Option<&str> {
    let open = html.find("<body")?;
    let start = open + html[open..].find('>')? + 1;
    let end = start + html[start..].find("</body>")?;
    Some(&html[start..end])
}

/// Add a `style` attribute to tables, cells, headings and paragraphs that
/// don't carry one already.
pub fn inline_styles(html: &str) -> String {
    if !html.contains("<style") {
        return html.to_string();
    }
    let mut out = html.to_string();
    for rule in INLINE_RULES.iter() {
        out = rule
            .tag
            .replace_all(&out, |caps: &Captures| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                if attrs.contains("style=") {
                    return caps[0].to_string();
                }
                let open = &caps[0][..caps[0].len() - 1 - attrs.len()];
                format!("{open}{attrs} style=\"{}\">", rule.style)
            })
            .into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_styles_skip_lookalike_tags() {
        let html = "<style></style><thead><tr><th class=\"x\">A</th></tr></thead><pre>p</pre>";
        let out = inline_styles(html);
        assert!(out.contains("<thead>"));
        assert!(out.contains("<pre>"));
        assert!(out.contains("<th class=\"x\" style=\"background:#f0f0f0;"));
    }

    #[test]
    fn inline_styles_keep_existing_style() {
        let html = "<style></style><p style=\"color:red\">x</p><p>y</p>";
        let out = inline_styles(html);
        assert!(out.contains("<p style=\"color:red\">x</p>"));
        assert!(out.contains("<p style=\"margin-bottom:10px;line-height:1.5;\">y</p>"));
    }

    #[test]
    fn every_inline_rule_compiles() {
        assert_eq!(INLINE_RULES.len(), 7);
    }

    #[test]
    fn body_of_extracts_inner_html() {
        let html = "<html><body class=\"x\">\n<p>hi</p>\n</body></html>";
        assert_eq!(body_of(html), Some("\n<p>hi</p>\n"));
        assert_eq!(body_of("<p>no body</p>"), None);
    }

    #[test]
    fn html_without_styles_is_untouched() {
        assert_eq!(inline_styles("<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn kpis_accept_numbers() {
        let kpi = kpi_from_value(&json!({"label": "Sales", "value": 50, "change": -3.5}));
        assert_eq!(kpi.value, "50");
        assert_eq!(kpi.change, Some(KpiChange::Percent(-3.5)));
    }

    #[test]
    fn records_become_rows_in_key_order() {
        let records = vec![
            json!({"name": "A", "qty": 1}),
            json!({"qty": 2, "name": "B", "extra": true}),
        ];
        let table = table_from_records(&records);
        assert_eq!(table.headers, vec!["name", "qty"]);
        assert_eq!(table.rows[1], vec![json!("B"), json!(2)]);
    }

    #[test]
    fn header_date_defaults_to_today() {
        let header = HeaderConfig::new("T").to_header();
        assert_eq!(header.date, Local::now().format("%Y-%m-%d").to_string());
        let header = HeaderConfig::new("T").date("2025-01-01").to_header();
        assert_eq!(header.date, "2025-01-01");
    }
}
