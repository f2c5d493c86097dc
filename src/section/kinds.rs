use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Report header: title block with optional logo and date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// URL or data URI.
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub date: String,
    /// Extra template variables; these win over the named fields.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = logo.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub left_text: String,
    #[serde(default)]
    pub center_text: String,
    #[serde(default)]
    pub right_text: String,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl Footer {
    pub fn new(
        left_text: impl Into<String>,
        center_text: impl Into<String>,
        right_text: impl Into<String>,
    ) -> Self {
        Self {
            left_text: left_text.into(),
            center_text: center_text.into(),
            right_text: right_text.into(),
            extra: Map::new(),
        }
    }
}

/// Tabular data. Rows may be wider than the header list; templates pad
/// the header row up to `column_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub footer_row: Option<Vec<Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            headers,
            rows,
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn footer_row(mut self, footer: Vec<Value>) -> Self {
        self.footer_row = Some(footer);
        self
    }

    /// Widest of the header row, every data row and the footer row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(self.footer_row.iter().map(Vec::len))
            .fold(self.headers.len(), usize::max)
    }

    pub(crate) fn context(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "headers": self.headers,
            "rows": self.rows,
            "footer_row": self.footer_row,
            "column_count": self.column_count(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Text {
    #[serde(default)]
    pub title: String,
    /// May contain HTML; rendered unescaped.
    pub content: String,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            content: content.into(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Percentage change (`12.5` renders as `+12.5%`) or a free label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiChange {
    Percent(f64),
    Label(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl KpiChange {
    pub fn display(&self) -> String {
        match self {
            KpiChange::Percent(p) if *p > 0.0 => format!("+{p}%"),
            KpiChange::Percent(p) => format!("{p}%"),
            KpiChange::Label(s) => s.clone(),
        }
    }

    pub fn trend(&self) -> Trend {
        match self {
            KpiChange::Percent(p) if *p > 0.0 => Trend::Up,
            KpiChange::Percent(p) if *p < 0.0 => Trend::Down,
            KpiChange::Percent(_) => Trend::Flat,
            KpiChange::Label(s) if s.trim_start().starts_with('+') => Trend::Up,
            KpiChange::Label(s) if s.trim_start().starts_with('-') => Trend::Down,
            KpiChange::Label(_) => Trend::Flat,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub change: Option<KpiChange>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_class: Option<String>,
}

impl Kpi {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn change(mut self, change: KpiChange) -> Self {
        self.change = Some(change);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color_class(mut self, class: impl Into<String>) -> Self {
        self.color_class = Some(class.into());
        self
    }
}

/// What a KPI template sees for each item.
#[derive(Serialize)]
struct KpiView<'a> {
    label: &'a str,
    value: &'a str,
    change: Option<&'a KpiChange>,
    change_display: Option<String>,
    trend: Option<Trend>,
    description: Option<&'a str>,
    color_class: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kpis {
    #[serde(default)]
    pub title: String,
    pub items: Vec<Kpi>,
}

impl Kpis {
    pub fn new(items: Vec<Kpi>) -> Self {
        Self {
            title: String::new(),
            items,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub(crate) fn context(&self) -> Value {
        let kpis: Vec<KpiView<'_>> = self
            .items
            .iter()
            .map(|k| KpiView {
                label: &k.label,
                value: &k.value,
                change: k.change.as_ref(),
                change_display: k.change.as_ref().map(KpiChange::display),
                trend: k.change.as_ref().map(KpiChange::trend),
                description: k.description.as_deref(),
                color_class: k.color_class.as_deref(),
            })
            .collect();
        serde_json::json!({ "title": self.title, "kpis": kpis })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_count_covers_wide_rows() {
        let table = Table::new(
            vec!["A".into()],
            vec![vec![json!(1), json!(2), json!(3)], vec![json!(4)]],
        );
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.context()["footer_row"], Value::Null);
    }

    #[test]
    fn kpi_change_trend_and_display() {
        assert_eq!(KpiChange::Percent(15.0).display(), "+15%");
        assert_eq!(KpiChange::Percent(-5.5).trend(), Trend::Down);
        assert_eq!(KpiChange::Percent(0.0).trend(), Trend::Flat);
        assert_eq!(KpiChange::Label("+3 pts".into()).trend(), Trend::Up);
    }

    #[test]
    fn kpi_change_deserializes_untagged() {
        let kpi: Kpi = serde_json::from_value(json!({
            "label": "Revenue", "value": "10K", "change": 12
        }))
        .unwrap();
        assert_eq!(kpi.change, Some(KpiChange::Percent(12.0)));
        let kpi: Kpi = serde_json::from_value(json!({
            "label": "Churn", "value": "2%", "change": "stable"
        }))
        .unwrap();
        assert_eq!(kpi.change, Some(KpiChange::Label("stable".into())));
    }

    #[test]
    fn header_extra_overrides_fields() {
        let mut header = Header::new("Q1");
        header.extra.insert("title".into(), json!("Override"));
        let ctx = serde_json::to_value(&header).unwrap();
        assert_eq!(ctx["title"], "Override");
    }
}
