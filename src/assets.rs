use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{ReportError, Result};

const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
];

/// Finds images and stylesheets and inlines them so exported HTML stays
/// self-contained.
#[derive(Debug, Default)]
pub struct AssetManager {
    dirs: Vec<PathBuf>,
    data_uris: RefCell<HashMap<String, String>>,
}

impl AssetManager {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            data_uris: RefCell::default(),
        }
    }

    /// Searches the configured assets directory.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(vec![settings.assets_dir()])
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Duplicates are ignored.
    pub fn add_directory(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    /// Absolute paths that exist are returned as-is; anything else is
    /// looked up in each search directory in order.
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() && path.exists() {
            return Ok(path.to_path_buf());
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| ReportError::AssetNotFound(name.to_string()))
    }

    /// `data:<mime>;base64,...` URI for use in `<img src>`. Cached per name.
    pub fn to_base64(&self, name: &str) -> Result<String> {
        if let Some(uri) = self.data_uris.borrow().get(name) {
            return Ok(uri.clone());
        }
        let path = self.find(name)?;
        let bytes = fs::read(&path)?;
        let uri = format!("data:{};base64,{}", mime_type(&path), STANDARD.encode(bytes));
        debug!("Encoded asset {} ({} bytes)", path.display(), uri.len());
        self.data_uris
            .borrow_mut()
            .insert(name.to_string(), uri.clone());
        Ok(uri)
    }

    /// Like [`to_base64`](Self::to_base64) but returns `fallback` when the
    /// asset is missing.
    pub fn to_base64_or(&self, name: &str, fallback: &str) -> Result<String> {
        match self.to_base64(name) {
            Err(ReportError::AssetNotFound(_)) => Ok(fallback.to_string()),
            other => other,
        }
    }

    pub fn read_css(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.find(name)?)?)
    }

    /// Stylesheet wrapped in a `<style>` element.
    pub fn embed_css(&self, name: &str) -> Result<String> {
        Ok(format!("<style>\n{}\n</style>", self.read_css(name)?))
    }

    pub fn clear_cache(&self) {
        self.data_uris.borrow_mut().clear();
    }
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match IMAGE_TYPES.iter().find(|(known, _)| *known == ext) {
        Some((_, mime)) => *mime,
        None => match ext.as_str() {
            "css" => "text/css",
            "html" | "htm" => "text/html",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // 1x1 red PNG
    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn assets() -> (TempDir, AssetManager) {
        let dir = TempDir::new().unwrap();
        let png = STANDARD.decode(PNG).unwrap();
        fs::write(dir.path().join("test.png"), &png).unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("images/logo.png"), &png).unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();
        let manager = AssetManager::new(vec![dir.path().to_path_buf()]);
        (dir, manager)
    }

    #[test]
    fn finds_nested_and_absolute_paths() {
        let (dir, manager) = assets();
        assert!(manager.find("images/logo.png").unwrap().exists());
        let absolute = dir.path().join("test.png");
        assert_eq!(manager.find(absolute.to_str().unwrap()).unwrap(), absolute);
    }

    #[test]
    fn missing_asset_is_not_found() {
        let (_dir, manager) = assets();
        let err = manager.find("nope.png").unwrap_err();
        assert!(matches!(err, ReportError::AssetNotFound(name) if name == "nope.png"));
        assert_eq!(manager.to_base64_or("nope.png", "x").unwrap(), "x");
    }

    #[test]
    fn data_uri_has_mime_and_payload() {
        let (_dir, manager) = assets();
        let uri = manager.to_base64("test.png").unwrap();
        assert_eq!(uri, format!("data:image/png;base64,{PNG}"));
    }

    #[test]
    fn data_uris_are_cached_until_cleared() {
        let (dir, manager) = assets();
        manager.to_base64("test.png").unwrap();
        fs::remove_file(dir.path().join("test.png")).unwrap();
        assert!(manager.to_base64("test.png").is_ok());
        manager.clear_cache();
        assert!(manager.to_base64("test.png").is_err());
    }

    #[test]
    fn embeds_css() {
        let (_dir, manager) = assets();
        assert_eq!(
            manager.embed_css("style.css").unwrap(),
            "<style>\nbody { color: red; }\n</style>"
        );
    }

    #[test]
    fn add_directory_skips_duplicates() {
        let mut manager = AssetManager::default();
        manager.add_directory("/a");
        manager.add_directory("/a");
        assert_eq!(manager.dirs().len(), 1);
    }
}
