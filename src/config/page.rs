use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};

/// Standard paper sizes accepted by the page-size setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [PageSize::A4, PageSize::A3, PageSize::Letter, PageSize::Legal];

    pub fn name(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
            PageSize::Letter => "LETTER",
            PageSize::Legal => "LEGAL",
        }
    }

    /// CSS (width, height) in portrait.
    pub fn dimensions(self) -> (&'static str, &'static str) {
        match self {
            PageSize::A4 => ("210mm", "297mm"),
            PageSize::A3 => ("297mm", "420mm"),
            PageSize::Letter => ("8.5in", "11in"),
            PageSize::Legal => ("8.5in", "14in"),
        }
    }

    pub fn oriented(self, orientation: Orientation) -> (&'static str, &'static str) {
        let (w, h) = self.dimensions();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    fn accepted() -> String {
        Self::ALL
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for PageSize {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|size| size.name() == upper)
            .ok_or_else(|| ReportError::invalid("page_size", s, &Self::accepted()))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn name(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl FromStr for Orientation {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(ReportError::invalid("orientation", s, "portrait, landscape")),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("letter".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert_eq!(" a3 ".parse::<PageSize>().unwrap(), PageSize::A3);
        assert_eq!(PageSize::Legal.to_string(), "LEGAL");
    }

    #[test]
    fn page_size_rejects_unknown_names() {
        let err = "A5".parse::<PageSize>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("A5"));
        assert!(msg.contains("A4, A3, LETTER, LEGAL"));
    }

    #[test]
    fn orientation_normalizes_to_lowercase() {
        assert_eq!("LANDSCAPE".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn landscape_swaps_dimensions() {
        assert_eq!(PageSize::A4.oriented(Orientation::Landscape), ("297mm", "210mm"));
        assert_eq!(PageSize::Letter.oriented(Orientation::Portrait), ("8.5in", "11in"));
    }
}
