use chrono::Local;
use log::{info, warn};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::context::RenderContext;
use crate::error::{ReportError, Result};
use crate::pdf::{inject_print_css, PdfOptions};
use crate::viewer;

/// Print-ready stylesheet shared by every report and document.
pub const BASE_CSS: &str = r#"/* Reset & Base */
*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }

:root {
    --primary-color: #2563eb;
    --text-color: #1e293b;
    --text-muted: #64748b;
    --border-color: #e2e8f0;
    --bg-light: #f8fafc;
    --page-width: 210mm;
    --page-height: 297mm;
    --page-margin: 15mm;
}

html { font-size: 10pt; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
    font-size: 10pt;
    line-height: 1.5;
    color: var(--text-color);
    background: #fff;
}

/* Page Structure */
.page {
    width: var(--page-width);
    min-height: var(--page-height);
    padding: var(--page-margin);
    margin: 0 auto 20px;
    background: white;
    box-shadow: 0 2px 8px rgba(0,0,0,0.1);
    position: relative;
    page-break-after: always;
}
.page:last-child { page-break-after: auto; }
.page-content { min-height: calc(var(--page-height) - 2 * var(--page-margin) - 40mm); }

.section { margin-bottom: 20px; }

/* Typography */
h1, h2, h3, h4 { font-weight: 600; line-height: 1.25; margin-bottom: 0.5em; }
h1 { font-size: 20pt; }
h2 { font-size: 16pt; border-bottom: 2px solid var(--primary-color); padding-bottom: 0.25em; }
h3 { font-size: 13pt; }
p { margin-bottom: 1em; }

/* Tables */
table { width: 100%; border-collapse: collapse; margin: 1em 0; }
th, td { padding: 8px 12px; text-align: left; border-bottom: 1px solid var(--border-color); }
th { background: var(--bg-light); font-weight: 600; }
.table-bordered th, .table-bordered td { border: 1px solid var(--border-color); }

/* Layout */
.card { border: 1px solid var(--border-color); border-radius: 4px; padding: 15px; margin-bottom: 15px; }
.row { display: flex; flex-wrap: wrap; margin: 0 -10px; }
.col-6 { flex: 0 0 50%; max-width: 50%; padding: 0 10px; }
.col-12 { flex: 0 0 100%; max-width: 100%; padding: 0 10px; }

/* Utilities */
.text-right { text-align: right; }
.text-center { text-align: center; }
.text-muted { color: var(--text-muted); }
.font-bold { font-weight: 700; }
.font-mono { font-family: 'Consolas', 'Monaco', monospace; }
.mb-2 { margin-bottom: 10px; }
.mb-4 { margin-bottom: 20px; }
.mt-4 { margin-top: 20px; }
.info-box { background: var(--bg-light); padding: 10px; border-radius: 4px; font-size: 9pt; }

@media print {
    body { background: none; }
    .page { width: 100%; min-height: auto; padding: 0; margin: 0; box-shadow: none; }
    .no-print { display: none !important; }
}
@page { size: A4 portrait; margin: 15mm; }

.page-break { page-break-after: always; }
.avoid-break { page-break-inside: avoid; }"#;

pub const DEFAULT_HTML_NAME: &str = "document.html";
pub const DEFAULT_PDF_NAME: &str = "document.pdf";

/// Last HTML produced by [`BaseDocument::render`].
#[derive(Debug, Clone, Default)]
pub struct RenderCache(RefCell<Option<String>>);

impl RenderCache {
    pub fn get(&self) -> Option<String> {
        self.0.borrow().clone()
    }

    fn store(&self, html: &str) {
        *self.0.borrow_mut() = Some(html.to_string());
    }

    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }
}

/// Shared behaviour of reports and single-template documents: wrapping
/// content in a standalone HTML page and writing it out.
pub trait BaseDocument {
    fn title(&self) -> &str;

    fn global_css(&self) -> &str;

    /// Body markup.
    fn render_content(&self, ctx: &RenderContext) -> Result<String>;

    /// Component CSS, without the base sheet.
    fn render_css(&self, ctx: &RenderContext) -> Result<String>;

    fn cache(&self) -> &RenderCache;

    /// Complete HTML page. Always re-renders; the result is kept as
    /// [`last_rendered`](Self::last_rendered).
    fn render(&self, ctx: &RenderContext) -> Result<String> {
        let mut css_parts = vec![BASE_CSS.to_string()];
        let doc_css = self.render_css(ctx)?;
        if !doc_css.is_empty() {
            css_parts.push(format!("/* Document CSS */\n{doc_css}"));
        }
        if !self.global_css().is_empty() {
            css_parts.push(format!("/* Global CSS */\n{}", self.global_css()));
        }
        let all_css = css_parts.join("\n\n");
        let content = self.render_content(ctx)?;
        let title = minijinja::HtmlEscape(self.title()).to_string();

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{all_css}
    </style>
</head>
<body>
{content}
</body>
</html>"#
        );
        self.cache().store(&html);
        Ok(html)
    }

    fn last_rendered(&self) -> Option<String> {
        self.cache().get()
    }

    /// Write the HTML page. `path` may be a file, an existing directory
    /// (joined with `filename`) or `None` for the configured output dir.
    fn export_html(
        &self,
        ctx: &RenderContext,
        path: Option<&Path>,
        filename: &str,
    ) -> Result<PathBuf> {
        let html = self.render(ctx)?;
        let target = output_path(ctx, path, filename);
        write_atomic(&target, html.as_bytes())?;
        info!("HTML saved: {}", target.display());
        Ok(target)
    }

    /// Convert through the context's PDF renderer and write the bytes.
    fn export_pdf(
        &self,
        ctx: &RenderContext,
        path: Option<&Path>,
        filename: &str,
    ) -> Result<PathBuf> {
        let renderer = ctx.pdf().ok_or_else(|| ReportError::PdfUnavailable {
            renderer: "pdf".to_string(),
            hint: "No PDF renderer is configured for this context.".to_string(),
        })?;
        if !renderer.is_available() {
            return Err(ReportError::PdfUnavailable {
                renderer: renderer.name().to_string(),
                hint: renderer.install_hint(),
            });
        }

        let options = PdfOptions::from_settings(ctx.settings());
        let html = inject_print_css(&self.render(ctx)?, &options);
        let bytes = renderer.html_to_pdf(&html, &options)?;
        let target = output_path(ctx, path, filename);
        write_atomic(&target, &bytes)?;
        info!("PDF saved: {}", target.display());
        Ok(target)
    }

    /// Write to the preview directory and open in a browser. Failing to
    /// launch the browser is logged, not returned.
    fn preview(&self, ctx: &RenderContext, browser: Option<&str>) -> Result<PathBuf> {
        let target = viewer::preview_dir().join(format!("report_{}.html", std::process::id()));
        let path = self.export_html(ctx, Some(&target), DEFAULT_HTML_NAME)?;
        if let Err(e) = viewer::open_path(&path, browser) {
            warn!("Could not open preview: {e}");
        }
        Ok(path)
    }

    fn preview_pdf(&self, ctx: &RenderContext, pdf_viewer: Option<&str>) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let target = viewer::preview_dir().join(format!("preview_{stamp}.pdf"));
        let path = self.export_pdf(ctx, Some(&target), DEFAULT_PDF_NAME)?;
        if let Err(e) = viewer::open_path(&path, pdf_viewer) {
            warn!("Could not open PDF viewer: {e}");
        }
        Ok(path)
    }
}

pub(crate) fn output_path(ctx: &RenderContext, path: Option<&Path>, filename: &str) -> PathBuf {
    match path {
        None => ctx.settings().output_dir().join(filename),
        Some(p) if p.is_dir() => p.join(filename),
        Some(p) => p.to_path_buf(),
    }
}

/// Write through a sibling temp file so a failed export leaves nothing behind.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let export_err = |source: std::io::Error| ReportError::Export {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(export_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(export_err)?;
    tmp.write_all(bytes).map_err(export_err)?;
    tmp.persist(path).map_err(|e| export_err(e.error))?;
    Ok(())
}
