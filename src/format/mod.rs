//! Named visual themes.
//!
//! A format is a directory under the formats dir holding up to twelve files,
//! `{header,footer,section,table,kpi,text}.{html,css}`. Missing files are
//! empty slots; only a missing directory is an error.

use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Settings;
use crate::error::{ReportError, Result};

/// Which part of a format a section reads its defaults from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Header,
    Footer,
    Section,
    Table,
    Kpi,
    Text,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::Header,
        Slot::Footer,
        Slot::Section,
        Slot::Table,
        Slot::Kpi,
        Slot::Text,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            Slot::Header => "header",
            Slot::Footer => "footer",
            Slot::Section => "section",
            Slot::Table => "table",
            Slot::Kpi => "kpi",
            Slot::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePair {
    pub html: String,
    pub css: String,
}

/// All slots of one format, loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct FormatTemplates {
    pub name: String,
    pub header: TemplatePair,
    pub footer: TemplatePair,
    pub section: TemplatePair,
    pub table: TemplatePair,
    pub kpi: TemplatePair,
    pub text: TemplatePair,
}

impl FormatTemplates {
    pub fn slot(&self, slot: Slot) -> &TemplatePair {
        match slot {
            Slot::Header => &self.header,
            Slot::Footer => &self.footer,
            Slot::Section => &self.section,
            Slot::Table => &self.table,
            Slot::Kpi => &self.kpi,
            Slot::Text => &self.text,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut TemplatePair {
        match slot {
            Slot::Header => &mut self.header,
            Slot::Footer => &mut self.footer,
            Slot::Section => &mut self.section,
            Slot::Table => &mut self.table,
            Slot::Kpi => &mut self.kpi,
            Slot::Text => &mut self.text,
        }
    }

    fn load(name: &str, dir: &Path) -> Result<Self> {
        let mut templates = FormatTemplates {
            name: name.to_string(),
            ..Default::default()
        };
        for slot in Slot::ALL {
            let pair = templates.slot_mut(slot);
            pair.html = read_optional(&dir.join(format!("{}.html", slot.file_stem())))?;
            pair.css = read_optional(&dir.join(format!("{}.css", slot.file_stem())))?;
        }
        Ok(templates)
    }
}

fn read_optional(path: &Path) -> Result<String> {
    if path.is_file() {
        Ok(fs::read_to_string(path)?)
    } else {
        Ok(String::new())
    }
}

/// Resolves format names to their templates, memoizing each one.
#[derive(Debug)]
pub struct FormatRegistry {
    formats_dir: PathBuf,
    active: String,
    cache: RefCell<HashMap<String, Rc<FormatTemplates>>>,
}

impl FormatRegistry {
    pub fn new(formats_dir: impl Into<PathBuf>, active: impl Into<String>) -> Self {
        Self {
            formats_dir: formats_dir.into(),
            active: active.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Registry over the configured formats dir, active on the configured default.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.formats_dir(), settings.default_format())
    }

    pub fn formats_dir(&self) -> &Path {
        &self.formats_dir
    }

    /// Format used when a section, page or report names none.
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Sorted names of every non-hidden subdirectory of the formats dir.
    pub fn available_formats(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.formats_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| !n.starts_with('_') && !n.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    /// Switch the active format. Fails if no such directory exists.
    pub fn set_default_format(&mut self, name: &str) -> Result<()> {
        self.check_exists(name)?;
        self.active = name.to_string();
        self.invalidate();
        info!("Default format set to: {name}");
        Ok(())
    }

    /// Templates for `name`, or for the active format when `None`.
    pub fn templates(&self, name: Option<&str>) -> Result<Rc<FormatTemplates>> {
        let name = name.unwrap_or(self.active.as_str());
        if let Some(hit) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(hit));
        }
        let dir = self.check_exists(name)?;
        debug!("Loading format '{name}' from {}", dir.display());
        let loaded = Rc::new(FormatTemplates::load(name, &dir)?);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&loaded));
        Ok(loaded)
    }

    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Sorted file names present in a format directory.
    pub fn format_files(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.check_exists(name)?;
        let mut files: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        files.sort();
        Ok(files)
    }

    fn check_exists(&self, name: &str) -> Result<PathBuf> {
        let dir = self.formats_dir.join(name);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(ReportError::FormatNotFound {
                name: name.to_string(),
                available: self.available_formats(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_format(root: &TempDir, name: &str, files: &[(&str, &str)]) {
        let fdir = root.path().join(name);
        fs::create_dir_all(&fdir).unwrap();
        for (file, content) in files {
            fs::write(fdir.join(file), content).unwrap();
        }
    }

    #[test]
    fn missing_files_are_empty_slots() {
        let dir = TempDir::new().unwrap();
        add_format(&dir, "default", &[("table.html", "<table></table>")]);
        let registry = FormatRegistry::new(dir.path(), "default");
        let t = registry.templates(None).unwrap();
        assert_eq!(t.table.html, "<table></table>");
        assert_eq!(t.table.css, "");
        assert_eq!(t.slot(Slot::Kpi), &TemplatePair::default());
    }

    #[test]
    fn hidden_and_underscore_dirs_are_not_listed() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "_base", ".git"] {
            add_format(&dir, name, &[]);
        }
        let registry = FormatRegistry::new(dir.path(), "alpha");
        assert_eq!(registry.available_formats(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn switching_to_unknown_format_lists_available() {
        let dir = TempDir::new().unwrap();
        add_format(&dir, "default", &[]);
        let mut registry = FormatRegistry::new(dir.path(), "default");
        let err = registry.set_default_format("fancy").unwrap_err();
        match err {
            ReportError::FormatNotFound { name, available } => {
                assert_eq!(name, "fancy");
                assert_eq!(available, vec!["default"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.active(), "default");
    }

    #[test]
    fn cache_survives_until_invalidated() {
        let dir = TempDir::new().unwrap();
        add_format(&dir, "default", &[("text.css", "a")]);
        let registry = FormatRegistry::new(dir.path(), "default");
        assert_eq!(registry.templates(None).unwrap().text.css, "a");
        fs::write(dir.path().join("default/text.css"), "b").unwrap();
        assert_eq!(registry.templates(None).unwrap().text.css, "a");
        registry.invalidate();
        assert_eq!(registry.templates(None).unwrap().text.css, "b");
    }
}
