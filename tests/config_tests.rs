mod common;

use std::fs;

use reportkit::config::{ConfigFile, CONFIG_FILE_NAME, CONFIG_TEMPLATE};
use reportkit::pdf::{PdfOptions, PdfRenderer};
use reportkit::{Orientation, PageSize, RenderContext, ReportError, Settings};
use tempfile::TempDir;

fn isolated(dir: &TempDir) -> Settings {
    Settings::with_base_dir(dir.path()).with_env_vars(Vec::<(String, String)>::new())
}

#[test]
fn test_full_precedence_chain() {
    let dir = TempDir::new().unwrap();
    common::write(
        &dir.path().join(CONFIG_FILE_NAME),
        "[report]\ndefault_format = \"minimal\"\norientation = \"landscape\"\n",
    );

    // default
    let settings = isolated(&dir);
    assert_eq!(settings.page_size(), PageSize::A4);
    // file
    assert_eq!(settings.default_format(), "minimal");
    assert_eq!(settings.orientation(), Orientation::Landscape);

    // override beats file
    let mut settings = isolated(&dir);
    settings.set_default_format("corporate");
    assert_eq!(settings.default_format(), "corporate");

    // env beats override
    let settings = settings.with_env_vars([("REPORTKIT_DEFAULT_FORMAT", "default")]);
    assert_eq!(settings.default_format(), "default");
    assert_eq!(settings.orientation(), Orientation::Landscape);
}

#[test]
fn test_env_paths_are_used_verbatim_when_absolute() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("elsewhere");
    let mut settings = isolated(&dir).with_env_vars([(
        "REPORTKIT_OUTPUT_DIR",
        out.display().to_string(),
    )]);
    settings.set_output_dir(dir.path().join("ignored"));
    assert_eq!(settings.output_dir(), out);
}

#[test]
fn test_config_file_location_from_env() {
    let dir = TempDir::new().unwrap();
    let custom = dir.path().join("conf/custom.toml");
    common::write(&custom, "[report]\nlocale = \"it_IT\"\n");

    let settings = isolated(&dir).with_env_vars([(
        "REPORTKIT_CONFIG_FILE",
        custom.display().to_string(),
    )]);
    assert_eq!(settings.config_file_path(), custom);
    assert_eq!(settings.locale(), "it_IT");
}

#[test]
fn test_load_from_file_replaces_file_values() {
    let dir = TempDir::new().unwrap();
    common::write(&dir.path().join(CONFIG_FILE_NAME), "[report]\nlocale = \"fr_FR\"\n");
    let other = dir.path().join("other.toml");
    common::write(&other, "[pdf]\nzoom = 1.25\n");

    let mut settings = isolated(&dir);
    assert_eq!(settings.locale(), "fr_FR");
    settings.load_from_file(&other).unwrap();
    assert_eq!(settings.locale(), "es_ES");
    assert_eq!(settings.pdf_zoom(), 1.25);
}

#[test]
fn test_malformed_config_file() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.toml");
    common::write(&bad, "[report\nlocale = ");

    let mut settings = isolated(&dir);
    let err = settings.load_from_file(&bad).unwrap_err();
    assert!(matches!(err, ReportError::ConfigParse { ref path, .. } if path == &bad));

    // the lazily loaded default file only warns
    fs::copy(&bad, dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(isolated(&dir).locale(), "es_ES");
}

#[test]
fn test_invalid_file_value_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    common::write(
        &dir.path().join(CONFIG_FILE_NAME),
        "[report]\npage_size = \"B9\"\n[pdf]\nzoom = -1.0\n",
    );
    let settings = isolated(&dir);
    assert_eq!(settings.page_size(), PageSize::A4);
    assert_eq!(settings.pdf_zoom(), 1.0);
}

#[test]
fn test_persist_keeps_existing_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    common::write(&path, "[report]\nlocale = \"pt_PT\"\n");

    let mut settings = isolated(&dir);
    settings.persist("orientation", "LANDSCAPE").unwrap();
    settings.persist("pdf_optimize_images", "no").unwrap();

    let file = ConfigFile::load(&path).unwrap();
    assert_eq!(file.report.locale.as_deref(), Some("pt_PT"));
    assert_eq!(file.report.orientation.as_deref(), Some("landscape"));
    assert_eq!(file.pdf.optimize_images, Some(false));

    let fresh = isolated(&dir);
    assert_eq!(fresh.orientation(), Orientation::Landscape);
    assert!(!fresh.pdf_optimize_images());
}

#[test]
fn test_shipped_template_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    common::write(&path, CONFIG_TEMPLATE);
    ConfigFile::load(&path).unwrap();

    let settings = isolated(&dir);
    assert_eq!(settings.default_format(), "default");
    assert_eq!(settings.page_size(), PageSize::A4);
}

#[test]
fn test_context_follows_settings_changes() {
    let dir = TempDir::new().unwrap();
    let mut ctx = common::context(&dir);
    assert_eq!(ctx.formats().active(), "default");

    ctx.set_default_format("minimal").unwrap();
    assert_eq!(ctx.settings().default_format(), "minimal");
    assert!(ctx.set_default_format("neon").is_err());
    assert_eq!(ctx.formats().active(), "minimal");

    let empty = dir.path().join("no-formats");
    ctx.update_settings(|s| s.set_formats_dir(&empty));
    assert_eq!(ctx.formats().formats_dir(), empty.as_path());
    assert!(ctx.formats().available_formats().is_empty());
}

struct FixedRenderer;

impl PdfRenderer for FixedRenderer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn html_to_pdf(&self, html: &str, _options: &PdfOptions) -> reportkit::Result<Vec<u8>> {
        Ok(html.as_bytes().to_vec())
    }
}

#[test]
fn test_pdf_command_change_rebuilds_backend() {
    let dir = TempDir::new().unwrap();
    let mut ctx = RenderContext::new(isolated(&dir));
    assert_eq!(ctx.pdf().unwrap().name(), "wkhtmltopdf");

    ctx.update_settings(|s| s.set_pdf_command("reportkit-other-cmd"));
    assert_eq!(ctx.settings().pdf_command(), "reportkit-other-cmd");
    assert_eq!(ctx.pdf().unwrap().name(), "reportkit-other-cmd");
}

#[test]
fn test_explicit_pdf_choice_survives_settings_changes() {
    let dir = TempDir::new().unwrap();
    let mut ctx = RenderContext::new(isolated(&dir)).with_pdf_renderer(Box::new(FixedRenderer));
    ctx.update_settings(|s| s.set_pdf_command("reportkit-other-cmd"));
    assert_eq!(ctx.pdf().unwrap().name(), "fixed");

    let mut ctx = RenderContext::new(isolated(&dir)).without_pdf();
    ctx.update_settings(|s| s.set_pdf_command("reportkit-other-cmd"));
    assert!(ctx.pdf().is_none());
}

#[test]
fn test_pdf_renderer_reflects_command() {
    let dir = TempDir::new().unwrap();
    let mut settings = isolated(&dir);
    settings.set_pdf_command("reportkit-test-no-such-binary");
    let ctx = RenderContext::new(settings);
    let pdf = ctx.pdf().unwrap();
    assert!(!pdf.is_available());
}
