//! Settings resolution.
//!
//! Every setting is resolved independently, highest priority first:
//!
//! 1. its `REPORTKIT_*` environment variable
//! 2. a programmatic override set on [`Settings`]
//! 3. the TOML config file (read lazily on first use)
//! 4. a hardcoded default
//!
//! `Settings` is a plain value: build one, adjust it, and hand it to a
//! [`RenderContext`](crate::RenderContext).

mod file;
mod page;

pub use file::{ConfigFile, PathsSection, PdfSection, ReportSection, CONFIG_TEMPLATE};
pub use page::{Orientation, PageSize};

use log::{debug, info, warn};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

pub const ENV_PREFIX: &str = "REPORTKIT";
pub const CONFIG_FILE_NAME: &str = "reportkit.toml";
pub const CONFIG_FILE_ENV: &str = "REPORTKIT_CONFIG_FILE";

/// Names of every resolvable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    TemplatesDir,
    FormatsDir,
    OutputDir,
    AssetsDir,
    DefaultFormat,
    Locale,
    PageSize,
    Orientation,
    PdfZoom,
    PdfOptimizeImages,
    PdfCommand,
}

impl Key {
    pub const ALL: [Key; 11] = [
        Key::TemplatesDir,
        Key::FormatsDir,
        Key::OutputDir,
        Key::AssetsDir,
        Key::DefaultFormat,
        Key::Locale,
        Key::PageSize,
        Key::Orientation,
        Key::PdfZoom,
        Key::PdfOptimizeImages,
        Key::PdfCommand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Key::TemplatesDir => "templates_dir",
            Key::FormatsDir => "formats_dir",
            Key::OutputDir => "output_dir",
            Key::AssetsDir => "assets_dir",
            Key::DefaultFormat => "default_format",
            Key::Locale => "locale",
            Key::PageSize => "page_size",
            Key::Orientation => "orientation",
            Key::PdfZoom => "pdf_zoom",
            Key::PdfOptimizeImages => "pdf_optimize_images",
            Key::PdfCommand => "pdf_command",
        }
    }

    /// e.g. `REPORTKIT_PAGE_SIZE`
    pub fn env_var(self) -> String {
        format!("{}_{}", ENV_PREFIX, self.name().to_uppercase())
    }

    pub fn parse(name: &str) -> Result<Key> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| ReportError::UnknownSetting(name.to_string()))
    }
}

#[derive(Debug, Clone)]
enum EnvSource {
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, var: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(var).ok(),
            EnvSource::Fixed(vars) => vars.get(var).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
struct Overrides {
    templates_dir: Option<PathBuf>,
    formats_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    default_format: Option<String>,
    locale: Option<String>,
    page_size: Option<PageSize>,
    orientation: Option<Orientation>,
    pdf_zoom: Option<f64>,
    pdf_optimize_images: Option<bool>,
    pdf_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    base_dir: PathBuf,
    env: EnvSource,
    overrides: Overrides,
    file: OnceCell<ConfigFile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Settings anchored at the package root, reading the process environment.
    pub fn new() -> Self {
        Self::with_base_dir(env!("CARGO_MANIFEST_DIR"))
    }

    /// Settings whose defaults and config-file paths are anchored at `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            env: EnvSource::Process,
            overrides: Overrides::default(),
            file: OnceCell::new(),
        }
    }

    /// Replace the process environment with a fixed set of variables.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // --- Paths ---

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(
            Key::TemplatesDir,
            self.overrides.templates_dir.as_ref(),
            self.file().paths.templates_dir.as_deref(),
            "templates",
        )
    }

    pub fn formats_dir(&self) -> PathBuf {
        self.resolve_path(
            Key::FormatsDir,
            self.overrides.formats_dir.as_ref(),
            self.file().paths.formats_dir.as_deref(),
            "formats",
        )
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(
            Key::OutputDir,
            self.overrides.output_dir.as_ref(),
            self.file().paths.output_dir.as_deref(),
            "output",
        )
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.resolve_path(
            Key::AssetsDir,
            self.overrides.assets_dir.as_ref(),
            self.file().paths.assets_dir.as_deref(),
            "assets",
        )
    }

    pub fn set_templates_dir(&mut self, path: impl AsRef<Path>) {
        let path = from_cwd(path.as_ref());
        info!("Templates directory set to: {}", path.display());
        self.overrides.templates_dir = Some(path);
    }

    pub fn set_formats_dir(&mut self, path: impl AsRef<Path>) {
        let path = from_cwd(path.as_ref());
        info!("Formats directory set to: {}", path.display());
        self.overrides.formats_dir = Some(path);
    }

    pub fn set_output_dir(&mut self, path: impl AsRef<Path>) {
        let path = from_cwd(path.as_ref());
        info!("Output directory set to: {}", path.display());
        self.overrides.output_dir = Some(path);
    }

    pub fn set_assets_dir(&mut self, path: impl AsRef<Path>) {
        let path = from_cwd(path.as_ref());
        info!("Assets directory set to: {}", path.display());
        self.overrides.assets_dir = Some(path);
    }

    // --- Report settings ---

    pub fn default_format(&self) -> String {
        self.resolve(
            Key::DefaultFormat,
            |s| Ok(s.to_string()),
            self.overrides.default_format.as_ref(),
            non_empty(&self.file().report.default_format).map(|s| Ok(s.to_string())),
            "default".to_string(),
        )
    }

    pub fn locale(&self) -> String {
        self.resolve(
            Key::Locale,
            |s| Ok(s.to_string()),
            self.overrides.locale.as_ref(),
            non_empty(&self.file().report.locale).map(|s| Ok(s.to_string())),
            "es_ES".to_string(),
        )
    }

    pub fn page_size(&self) -> PageSize {
        self.resolve(
            Key::PageSize,
            |s| s.parse(),
            self.overrides.page_size.as_ref(),
            non_empty(&self.file().report.page_size).map(|s| s.parse()),
            PageSize::A4,
        )
    }

    pub fn orientation(&self) -> Orientation {
        self.resolve(
            Key::Orientation,
            |s| s.parse(),
            self.overrides.orientation.as_ref(),
            non_empty(&self.file().report.orientation).map(|s| s.parse()),
            Orientation::Portrait,
        )
    }

    pub fn set_default_format(&mut self, name: impl Into<String>) {
        let name = name.into();
        info!("Default format set to: {name}");
        self.overrides.default_format = Some(name);
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        let locale = locale.into();
        info!("Locale set to: {locale}");
        self.overrides.locale = Some(locale);
    }

    /// Accepts A4, A3, LETTER or LEGAL in any case.
    pub fn set_page_size(&mut self, value: &str) -> Result<()> {
        let size: PageSize = value.parse()?;
        info!("Page size set to: {size}");
        self.overrides.page_size = Some(size);
        Ok(())
    }

    /// Accepts portrait or landscape in any case.
    pub fn set_orientation(&mut self, value: &str) -> Result<()> {
        let orientation: Orientation = value.parse()?;
        info!("Orientation set to: {orientation}");
        self.overrides.orientation = Some(orientation);
        Ok(())
    }

    // --- PDF options ---

    pub fn pdf_zoom(&self) -> f64 {
        self.resolve(
            Key::PdfZoom,
            parse_zoom,
            self.overrides.pdf_zoom.as_ref(),
            self.file().pdf.zoom.map(check_zoom),
            1.0,
        )
    }

    pub fn pdf_optimize_images(&self) -> bool {
        self.resolve(
            Key::PdfOptimizeImages,
            |s| parse_bool(Key::PdfOptimizeImages, s),
            self.overrides.pdf_optimize_images.as_ref(),
            self.file().pdf.optimize_images.map(Ok),
            true,
        )
    }

    /// External HTML-to-PDF executable.
    pub fn pdf_command(&self) -> String {
        self.resolve(
            Key::PdfCommand,
            |s| Ok(s.to_string()),
            self.overrides.pdf_command.as_ref(),
            non_empty(&self.file().pdf.command).map(|s| Ok(s.to_string())),
            "wkhtmltopdf".to_string(),
        )
    }

    pub fn set_pdf_zoom(&mut self, zoom: f64) -> Result<()> {
        let zoom = check_zoom(zoom)?;
        info!("PDF zoom set to: {zoom}");
        self.overrides.pdf_zoom = Some(zoom);
        Ok(())
    }

    pub fn set_pdf_optimize_images(&mut self, optimize: bool) {
        info!("PDF optimize images set to: {optimize}");
        self.overrides.pdf_optimize_images = Some(optimize);
    }

    pub fn set_pdf_command(&mut self, command: impl Into<String>) {
        let command = command.into();
        info!("PDF command set to: {command}");
        self.overrides.pdf_command = Some(command);
    }

    // --- Generic access ---

    /// Set any setting from its string form, validating it first.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match Key::parse(key)? {
            Key::TemplatesDir => self.set_templates_dir(value),
            Key::FormatsDir => self.set_formats_dir(value),
            Key::OutputDir => self.set_output_dir(value),
            Key::AssetsDir => self.set_assets_dir(value),
            Key::DefaultFormat => self.set_default_format(value),
            Key::Locale => self.set_locale(value),
            Key::PageSize => self.set_page_size(value)?,
            Key::Orientation => self.set_orientation(value)?,
            Key::PdfZoom => self.set_pdf_zoom(parse_zoom(value)?)?,
            Key::PdfOptimizeImages => {
                self.set_pdf_optimize_images(parse_bool(Key::PdfOptimizeImages, value)?)
            }
            Key::PdfCommand => self.set_pdf_command(value),
        }
        Ok(())
    }

    /// Resolved value of any setting, rendered as a string.
    pub fn get(&self, key: &str) -> Result<String> {
        Ok(self.value_of(Key::parse(key)?))
    }

    fn value_of(&self, key: Key) -> String {
        match key {
            Key::TemplatesDir => self.templates_dir().display().to_string(),
            Key::FormatsDir => self.formats_dir().display().to_string(),
            Key::OutputDir => self.output_dir().display().to_string(),
            Key::AssetsDir => self.assets_dir().display().to_string(),
            Key::DefaultFormat => self.default_format(),
            Key::Locale => self.locale(),
            Key::PageSize => self.page_size().to_string(),
            Key::Orientation => self.orientation().to_string(),
            Key::PdfZoom => self.pdf_zoom().to_string(),
            Key::PdfOptimizeImages => self.pdf_optimize_images().to_string(),
            Key::PdfCommand => self.pdf_command(),
        }
    }

    /// Drop every override and forget the loaded config file.
    pub fn reset(&mut self) {
        self.overrides = Overrides::default();
        self.file = OnceCell::new();
        info!("Configuration reset to defaults");
    }

    // --- Config file ---

    /// `REPORTKIT_CONFIG_FILE`, or `reportkit.toml` in the base directory.
    pub fn config_file_path(&self) -> PathBuf {
        match self.env.get(CONFIG_FILE_ENV) {
            Some(raw) => from_cwd(Path::new(&raw)),
            None => self.base_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Validate `value`, apply it, and write it into the config file so
    /// later runs pick it up. Returns the file written.
    pub fn persist(&mut self, key: &str, value: &str) -> Result<PathBuf> {
        self.set(key, value)?;
        let key = Key::parse(key)?;
        if self.env.get(&key.env_var()).is_some() {
            warn!("{} is set and takes precedence over the config file", key.env_var());
        }
        let stored = match key {
            Key::TemplatesDir | Key::FormatsDir | Key::OutputDir | Key::AssetsDir => {
                from_cwd(Path::new(value)).display().to_string()
            }
            Key::PageSize => value.parse::<PageSize>()?.to_string(),
            Key::Orientation => value.parse::<Orientation>()?.to_string(),
            Key::PdfZoom => parse_zoom(value)?.to_string(),
            Key::PdfOptimizeImages => parse_bool(key, value)?.to_string(),
            Key::DefaultFormat | Key::Locale | Key::PdfCommand => value.to_string(),
        };
        let path = self.config_file_path();
        let mut file = if path.exists() {
            ConfigFile::load(&path)?
        } else {
            ConfigFile::default()
        };
        file.assign(key, stored);
        file.save(&path)?;
        self.file = OnceCell::from(file);
        info!("Saved {} to {}", key.name(), path.display());
        Ok(path)
    }

    /// Load an explicit config file, replacing whatever was loaded before.
    /// A missing file is logged and ignored.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file not found: {}", path.display());
            return Ok(());
        }
        let parsed = ConfigFile::load(path)?;
        self.file = OnceCell::from(parsed);
        info!("Configuration loaded from: {}", path.display());
        Ok(())
    }

    fn file(&self) -> &ConfigFile {
        self.file.get_or_init(|| {
            let path = self.config_file_path();
            if !path.exists() {
                debug!("No config file at {}", path.display());
                return ConfigFile::default();
            }
            match ConfigFile::load(&path) {
                Ok(parsed) => {
                    debug!("Configuration loaded from: {}", path.display());
                    parsed
                }
                Err(e) => {
                    warn!("Failed to load config: {e}");
                    ConfigFile::default()
                }
            }
        })
    }

    /// Every resolved value plus the environment variables currently set.
    pub fn snapshot(&self) -> ResolvedSettings {
        let values = Key::ALL
            .into_iter()
            .map(|k| (k.name().to_string(), self.value_of(k)))
            .collect();
        let env_overrides = Key::ALL
            .into_iter()
            .map(Key::env_var)
            .chain(std::iter::once(CONFIG_FILE_ENV.to_string()))
            .filter_map(|var| self.env.get(&var).map(|v| (var, v)))
            .collect();
        ResolvedSettings {
            values,
            config_file: self.config_file_path(),
            config_file_data: self.file().clone(),
            env_overrides,
        }
    }

    fn resolve_path(
        &self,
        key: Key,
        over: Option<&PathBuf>,
        from_file: Option<&str>,
        default: &str,
    ) -> PathBuf {
        if let Some(raw) = self.env.get(&key.env_var()) {
            return from_cwd(Path::new(&raw));
        }
        if let Some(path) = over {
            return path.clone();
        }
        if let Some(raw) = from_file.filter(|s| !s.trim().is_empty()) {
            let path = Path::new(raw);
            return if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.base_dir.join(path)
            };
        }
        self.base_dir.join(default)
    }

    fn resolve<T: Clone>(
        &self,
        key: Key,
        parse: impl Fn(&str) -> Result<T>,
        over: Option<&T>,
        from_file: Option<Result<T>>,
        default: T,
    ) -> T {
        if let Some(raw) = self.env.get(&key.env_var()) {
            match parse(&raw) {
                Ok(value) => return value,
                Err(e) => warn!("Ignoring {}: {e}", key.env_var()),
            }
        }
        if let Some(value) = over {
            return value.clone();
        }
        match from_file {
            Some(Ok(value)) => return value,
            Some(Err(e)) => warn!("Ignoring {} from config file: {e}", key.name()),
            None => {}
        }
        default
    }
}

/// Output of [`Settings::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    pub values: BTreeMap<String, String>,
    pub config_file: PathBuf,
    pub config_file_data: ConfigFile,
    pub env_overrides: BTreeMap<String, String>,
}

fn from_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn parse_zoom(raw: &str) -> Result<f64> {
    let zoom: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ReportError::invalid("pdf_zoom", raw, "a positive number"))?;
    check_zoom(zoom)
}

fn check_zoom(zoom: f64) -> Result<f64> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(zoom)
    } else {
        Err(ReportError::invalid(
            "pdf_zoom",
            &zoom.to_string(),
            "a positive number",
        ))
    }
}

fn parse_bool(key: Key, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ReportError::invalid(key.name(), raw, "true, false, 1, 0, yes, no")),
    }
}
