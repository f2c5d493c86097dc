//! HTML to PDF conversion through an external renderer.

mod wkhtml;

pub use wkhtml::WkHtmlToPdf;

use crate::config::{Orientation, PageSize, Settings};
use crate::error::Result;

pub const DEFAULT_MARGIN: &str = "15mm";

/// Page setup handed to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margin: String,
    pub zoom: f64,
    pub optimize_images: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: DEFAULT_MARGIN.to_string(),
            zoom: 1.0,
            optimize_images: true,
        }
    }
}

impl PdfOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size(),
            orientation: settings.orientation(),
            margin: DEFAULT_MARGIN.to_string(),
            zoom: settings.pdf_zoom(),
            optimize_images: settings.pdf_optimize_images(),
        }
    }
}

/// Something that turns a complete HTML document into PDF bytes.
pub trait PdfRenderer {
    /// Executable or library name, used in error messages.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Install instructions shown when the renderer is missing.
    fn install_hint(&self) -> String {
        format!("Install '{}' and make sure it is on PATH.", self.name())
    }

    fn html_to_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>>;
}

/// `@page` rules and print helpers for the given page setup.
pub fn print_css(options: &PdfOptions) -> String {
    let (width, height) = options.page_size.oriented(options.orientation);
    format!(
        r#"@page {{
    size: {width} {height};
    margin: {margin};
}}

.page-break {{ page-break-after: always; break-after: page; }}
.page-break-before {{ page-break-before: always; break-before: page; }}
.avoid-break {{ page-break-inside: avoid; break-inside: avoid; }}

@media print {{
    body {{
        -webkit-print-color-adjust: exact !important;
        print-color-adjust: exact !important;
    }}
    .no-print {{ display: none !important; }}
}}"#,
        margin = options.margin
    )
}

/// Insert print CSS just before `</head>`, or prepend it if there is none.
pub fn inject_print_css(html: &str, options: &PdfOptions) -> String {
    let block = format!("<style>\n{}\n</style>\n", print_css(options));
    match html.find("</head>") {
        Some(idx) => format!("{}{}{}", &html[..idx], block, &html[idx..]),
        None => format!("{block}{html}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_css_uses_oriented_size() {
        let options = PdfOptions {
            page_size: PageSize::Letter,
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        let css = print_css(&options);
        assert!(css.contains("size: 11in 8.5in;"));
        assert!(css.contains("margin: 15mm;"));
    }

    #[test]
    fn print_css_lands_inside_head() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = inject_print_css(html, &PdfOptions::default());
        let style = out.find("<style>").unwrap();
        assert!(style < out.find("</head>").unwrap());
        assert!(out.contains("size: 210mm 297mm;"));
    }
}
