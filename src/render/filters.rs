//! Formatting filters available in every template.

use chrono::{Local, NaiveDate, NaiveDateTime};
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, State};
use std::fmt::Write;

const DATE_INPUTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_INPUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn register(env: &mut Environment<'static>) {
    env.add_filter("currency", currency);
    env.add_filter("format_number", format_number);
    env.add_filter("percentage", percentage);
    env.add_filter("format_date", format_date);
    env.add_filter("format_datetime", format_datetime);
    env.add_filter("truncate_text", truncate_text);
    env.add_filter("nl2br", nl2br);
    env.add_filter("default_if_none", default_if_none);
    env.add_function("now", now);
}

fn as_number(value: &Value) -> Option<f64> {
    if let Some(s) = value.as_str() {
        return s.trim().parse().ok();
    }
    f64::try_from(value.clone()).ok()
}

fn is_missing(value: &Value) -> bool {
    value.is_none() || value.is_undefined()
}

/// `1234.5` -> `1.234,50` (European separators).
pub fn group_number(num: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, num.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if num < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

fn currency(value: Value, symbol: Option<String>, decimals: Option<usize>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    match as_number(&value) {
        Some(num) => format!(
            "{} {}",
            group_number(num, decimals.unwrap_or(2)),
            symbol.as_deref().unwrap_or("€")
        ),
        None => value.to_string(),
    }
}

fn format_number(value: Value, decimals: Option<usize>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    match as_number(&value) {
        Some(num) => group_number(num, decimals.unwrap_or(2)),
        None => value.to_string(),
    }
}

fn percentage(value: Value, decimals: Option<usize>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    match as_number(&value) {
        Some(num) => format!("{:.*}%", decimals.unwrap_or(1), num),
        None => value.to_string(),
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_INPUTS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn strftime(value: Value, fmt: &str) -> String {
    if is_missing(&value) {
        return String::new();
    }
    let raw = value.to_string();
    let Some(parsed) = parse_datetime(&raw) else {
        return raw;
    };
    // chrono reports bad specifiers through fmt::Error
    let mut out = String::new();
    match write!(out, "{}", parsed.format(fmt)) {
        Ok(()) => out,
        Err(_) => raw,
    }
}

fn format_date(value: Value, fmt: Option<String>) -> String {
    strftime(value, fmt.as_deref().unwrap_or("%d/%m/%Y"))
}

fn format_datetime(value: Value, fmt: Option<String>) -> String {
    strftime(value, fmt.as_deref().unwrap_or("%d/%m/%Y %H:%M"))
}

/// Cuts at a word boundary and appends `...` when longer than `length` chars.
pub fn truncate(text: &str, length: usize) -> String {
    const SUFFIX: &str = "...";
    if text.chars().count() <= length {
        return text.to_string();
    }
    let keep = length.saturating_sub(SUFFIX.len());
    let cut: String = text.chars().take(keep).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{cut}{SUFFIX}")
}

fn truncate_text(value: Value, length: Option<usize>) -> String {
    if is_missing(&value) {
        return String::new();
    }
    truncate(&value.to_string(), length.unwrap_or(100))
}

fn nl2br(state: &State, value: Value) -> Value {
    if is_missing(&value) {
        return Value::from("");
    }
    let text = value.to_string();
    match state.auto_escape() {
        AutoEscape::None => Value::from(text.replace('\n', "<br>\n")),
        _ => {
            let escaped = minijinja::HtmlEscape(&text).to_string();
            Value::from_safe_string(escaped.replace('\n', "<br>\n"))
        }
    }
}

fn default_if_none(value: Value, default: Option<Value>) -> Value {
    if is_missing(&value) {
        default.unwrap_or_else(|| Value::from(""))
    } else {
        value
    }
}

fn now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
