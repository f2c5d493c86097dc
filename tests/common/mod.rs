#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use reportkit::{RenderContext, Settings};
use tempfile::TempDir;

pub fn package_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Settings rooted in `dir` that ignore the process environment, using the
/// shipped formats and templates.
pub fn settings(dir: &TempDir) -> Settings {
    let mut settings =
        Settings::with_base_dir(dir.path()).with_env_vars(Vec::<(String, String)>::new());
    settings.set_formats_dir(package_dir().join("formats"));
    settings.set_templates_dir(package_dir().join("templates"));
    settings.set_output_dir(dir.path().join("out"));
    settings
}

pub fn context(dir: &TempDir) -> RenderContext {
    RenderContext::new(settings(dir)).without_pdf()
}

/// Context over a formats directory holding a single empty `default` format.
pub fn bare_context(dir: &TempDir) -> RenderContext {
    let formats = dir.path().join("formats");
    fs::create_dir_all(formats.join("default")).unwrap();
    let mut settings = settings(dir);
    settings.set_formats_dir(&formats);
    RenderContext::new(settings).without_pdf()
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
