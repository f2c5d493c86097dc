use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Format '{name}' not found. Available: {}", available.join(", "))]
    FormatNotFound { name: String, available: Vec<String> },

    #[error("Template '{name}' not found in {}", dir.display())]
    TemplateNotFound { name: String, dir: PathBuf },

    #[error("Asset not found: '{0}'")]
    AssetNotFound(String),

    #[error("PDF export unavailable: '{renderer}' not found. {hint}")]
    PdfUnavailable { renderer: String, hint: String },

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Invalid value '{value}' for {key}. Valid: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownSetting(String),

    #[error("Failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config file already exists: {}. Use --force to overwrite.", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open viewer: {0}")]
    Viewer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub(crate) fn invalid(key: &str, value: &str, expected: &str) -> Self {
        ReportError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
