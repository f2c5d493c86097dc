use log::debug;
use std::fs;
use std::process::Command;

use super::{PdfOptions, PdfRenderer};
use crate::config::{Orientation, PageSize, Settings};
use crate::error::{ReportError, Result};

/// Shells out to `wkhtmltopdf` (or a compatible command).
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    command: String,
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

impl WkHtmlToPdf {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pdf_command())
    }

    fn args(options: &PdfOptions) -> Vec<String> {
        let page_size = match options.page_size {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        };
        let orientation = match options.orientation {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        };
        let image_quality = if options.optimize_images { "85" } else { "100" };

        let mut args: Vec<String> = vec![
            "--quiet".into(),
            "--enable-local-file-access".into(),
            "--encoding".into(),
            "utf-8".into(),
            "--page-size".into(),
            page_size.into(),
            "--orientation".into(),
            orientation.into(),
            "--zoom".into(),
            options.zoom.to_string(),
            "--image-quality".into(),
            image_quality.into(),
        ];
        for flag in ["-T", "-B", "-L", "-R"] {
            args.push(flag.into());
            args.push(options.margin.clone());
        }
        args
    }
}

impl PdfRenderer for WkHtmlToPdf {
    fn name(&self) -> &str {
        &self.command
    }

    fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn install_hint(&self) -> String {
        "Install wkhtmltopdf (https://wkhtmltopdf.org) or point REPORTKIT_PDF_COMMAND at a compatible binary."
            .to_string()
    }

    fn html_to_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        if !self.is_available() {
            return Err(ReportError::PdfUnavailable {
                renderer: self.command.clone(),
                hint: self.install_hint(),
            });
        }

        let temp_dir = std::env::temp_dir().join("reportkit");
        fs::create_dir_all(&temp_dir)?;

        let input = tempfile::Builder::new()
            .prefix("render_")
            .suffix(".html")
            .tempfile_in(&temp_dir)?;
        fs::write(input.path(), html)?;
        let output = tempfile::Builder::new()
            .prefix("render_")
            .suffix(".pdf")
            .tempfile_in(&temp_dir)?;

        debug!("Running {} on {}", self.command, input.path().display());
        let result = Command::new(&self.command)
            .args(Self::args(options))
            .arg(input.path())
            .arg(output.path())
            .output()?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ReportError::PdfGeneration(stderr.trim().to_string()));
        }

        let bytes = fs::read(output.path())?;
        if bytes.is_empty() {
            return Err(ReportError::PdfGeneration(format!(
                "{} produced no output",
                self.command
            )));
        }
        Ok(bytes)
    }
}
