use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::Key;
use crate::error::{ReportError, Result};

/// Contents of `reportkit.toml`. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub pdf: PdfSection,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PathsSection {
    #[serde(default)]
    pub templates_dir: Option<String>,
    #[serde(default)]
    pub formats_dir: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub assets_dir: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ReportSection {
    #[serde(default)]
    pub default_format: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct PdfSection {
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub optimize_images: Option<bool>,
    #[serde(default)]
    pub command: Option<String>,
}

impl ConfigFile {
    /// Parse a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ReportError::ConfigParse {
            path: PathBuf::from(path),
            source: e,
        })
    }

    /// Write the file back as TOML. Comments are not preserved.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Store an already validated value under the table that holds `key`.
    pub(crate) fn assign(&mut self, key: Key, value: String) {
        match key {
            Key::TemplatesDir => self.paths.templates_dir = Some(value),
            Key::FormatsDir => self.paths.formats_dir = Some(value),
            Key::OutputDir => self.paths.output_dir = Some(value),
            Key::AssetsDir => self.paths.assets_dir = Some(value),
            Key::DefaultFormat => self.report.default_format = Some(value),
            Key::Locale => self.report.locale = Some(value),
            Key::PageSize => self.report.page_size = Some(value),
            Key::Orientation => self.report.orientation = Some(value),
            Key::PdfZoom => self.pdf.zoom = value.parse().ok(),
            Key::PdfOptimizeImages => self.pdf.optimize_images = value.parse().ok(),
            Key::PdfCommand => self.pdf.command = Some(value),
        }
    }
}

/// Template content for `reportkit config init`
pub const CONFIG_TEMPLATE: &str = r#"# reportkit configuration
# Priority: environment variables > programmatic overrides > this file > defaults
# Relative paths are resolved against the directory holding the package.

[paths]
# templates_dir = "./templates"
# formats_dir = "./formats"
# output_dir = "./reports"
# assets_dir = "./assets"

[report]
default_format = "default"
page_size = "A4"        # A4, A3, LETTER, LEGAL
orientation = "portrait" # portrait, landscape
locale = "es_ES"

[pdf]
zoom = 1.0
optimize_images = true
# command = "wkhtmltopdf"
"#;
