//! Hand files to the system browser or PDF viewer.

use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ReportError, Result};

const BROWSERS: [(&str, &[&str]); 5] = [
    ("chrome", &["chrome", "google-chrome", "google-chrome-stable", "chromium"]),
    ("firefox", &["firefox"]),
    ("edge", &["msedge", "microsoft-edge"]),
    ("safari", &["safari"]),
    ("opera", &["opera"]),
];

/// Scratch directory used by previews.
pub fn preview_dir() -> PathBuf {
    std::env::temp_dir().join("reportkit")
}

/// Open `path` with `command`, or with the platform's default opener.
pub fn open_path(path: &Path, command: Option<&str>) -> Result<()> {
    if !path.exists() {
        return Err(ReportError::Viewer(format!(
            "file not found: {}",
            path.display()
        )));
    }

    if let Some(cmd) = command {
        debug!("Opening {} with {cmd}", path.display());
        Command::new(cmd)
            .arg(path)
            .spawn()
            .map_err(|e| ReportError::Viewer(format!("{cmd}: {e}")))?;
        return Ok(());
    }

    open_default(path)
}

#[cfg(target_os = "macos")]
fn open_default(path: &Path) -> Result<()> {
    Command::new("open")
        .arg(path)
        .spawn()
        .map_err(|e| ReportError::Viewer(format!("open: {e}")))?;
    Ok(())
}

#[cfg(target_os = "windows")]
fn open_default(path: &Path) -> Result<()> {
    Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .spawn()
        .map_err(|e| ReportError::Viewer(format!("start: {e}")))?;
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn open_default(path: &Path) -> Result<()> {
    for opener in ["xdg-open", "gnome-open", "kde-open"] {
        if !on_path(opener) {
            continue;
        }
        debug!("Opening {} with {opener}", path.display());
        Command::new(opener)
            .arg(path)
            .spawn()
            .map_err(|e| ReportError::Viewer(format!("{opener}: {e}")))?;
        return Ok(());
    }
    Err(ReportError::Viewer(
        "no suitable file opener found on this system".to_string(),
    ))
}

fn on_path(cmd: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(cmd);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

/// Browsers found on PATH, by friendly name.
pub fn available_browsers() -> Vec<&'static str> {
    BROWSERS
        .iter()
        .filter(|(_, commands)| commands.iter().any(|c| on_path(c)))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let err = open_path(Path::new("/definitely/not/here.html"), None).unwrap_err();
        assert!(matches!(err, ReportError::Viewer(_)));
    }

    #[test]
    fn unknown_command_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = open_path(file.path(), Some("reportkit-no-such-viewer")).unwrap_err();
        assert!(err.to_string().contains("reportkit-no-such-viewer"));
    }
}
