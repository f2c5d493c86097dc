use crate::config::Settings;
use crate::error::Result;
use crate::format::FormatRegistry;
use crate::pdf::{PdfRenderer, WkHtmlToPdf};

enum PdfBackend {
    /// Built from `pdf_command`; rebuilt whenever settings change.
    Configured(WkHtmlToPdf),
    Custom(Box<dyn PdfRenderer>),
    Disabled,
}

/// Everything rendering and export need: resolved settings, the format
/// registry and an optional PDF backend.
pub struct RenderContext {
    settings: Settings,
    formats: FormatRegistry,
    pdf: PdfBackend,
}

impl RenderContext {
    /// Formats come from the configured directory and the PDF backend from
    /// the configured command.
    pub fn new(settings: Settings) -> Self {
        let formats = FormatRegistry::from_settings(&settings);
        let pdf = PdfBackend::Configured(WkHtmlToPdf::from_settings(&settings));
        Self {
            settings,
            formats,
            pdf,
        }
    }

    /// Use `renderer` for PDF export. It is kept across `update_settings`.
    pub fn with_pdf_renderer(mut self, renderer: Box<dyn PdfRenderer>) -> Self {
        self.pdf = PdfBackend::Custom(renderer);
        self
    }

    pub fn without_pdf(mut self) -> Self {
        self.pdf = PdfBackend::Disabled;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn pdf(&self) -> Option<&dyn PdfRenderer> {
        match &self.pdf {
            PdfBackend::Configured(wkhtml) => Some(wkhtml),
            PdfBackend::Custom(renderer) => Some(renderer.as_ref()),
            PdfBackend::Disabled => None,
        }
    }

    /// Validate and switch the default format for this context.
    pub fn set_default_format(&mut self, name: &str) -> Result<()> {
        self.formats.set_default_format(name)?;
        self.settings.set_default_format(name);
        Ok(())
    }

    /// Rebuild the format registry and the configured PDF backend after
    /// settings changed.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings);
        self.formats = FormatRegistry::from_settings(&self.settings);
        if let PdfBackend::Configured(_) = self.pdf {
            self.pdf = PdfBackend::Configured(WkHtmlToPdf::from_settings(&self.settings));
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Settings::new())
    }
}
