//! Interactive terminal transformer
//!
//! `<gray time> <LEVEL> (<name>) <bold msg> { remaining: 'fields' }`

use crate::core::fields::ABSENT_SENTINEL;
use crate::core::timestamp::to_iso8601;
use crate::core::transformer::escape_control;
use crate::core::{FieldValue, Fields, LogRecord, Severity, Transformer};
use colored::Color;
use std::fmt::Write;

/// Terminal color for a severity
pub fn level_color(level: Severity) -> Color {
    match level {
        Severity::Trace => Color::BrightBlack,
        Severity::Debug => Color::Blue,
        Severity::Info => Color::Green,
        Severity::Warn => Color::Yellow,
        Severity::Error => Color::Red,
        Severity::Fatal => Color::BrightRed,
        Severity::Silent => Color::White,
    }
}

/// Human-oriented single line output
///
/// Color is decided per instance. `colored`'s process-wide override does not
/// affect it.
#[derive(Debug, Clone, Copy)]
pub struct PrettyTransformer {
    colors: bool,
}

impl PrettyTransformer {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> bool {
        self.colors
    }
}

impl Default for PrettyTransformer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Transformer for PrettyTransformer {
    fn transform(&self, record: &LogRecord) -> String {
        let time = to_iso8601(&record.time);
        let level = format!("{:5}", record.level.label());

        let mut line = if self.colors {
            format!(
                "{} {}",
                paint(&time, &Color::BrightBlack.to_fg_str()),
                paint(&level, &level_color(record.level).to_fg_str())
            )
        } else {
            format!("{} {}", time, level)
        };

        if let Some(name) = record.name() {
            let _ = write!(line, " ({})", escape_control(name));
        }
        if let Some(msg) = &record.msg {
            let msg = escape_control(msg);
            if self.colors {
                let _ = write!(line, " {}", paint(&msg, BOLD));
            } else {
                let _ = write!(line, " {}", msg);
            }
        }

        let mut rest: Vec<(&str, FieldValue)> = record
            .data
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        let ctx: Fields = record
            .ctx
            .iter()
            .filter(|(k, _)| k.as_str() != "name")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !ctx.is_empty() {
            rest.push(("ctx", FieldValue::Map(ctx)));
        }
        if !rest.is_empty() {
            line.push(' ');
            inspect_entries(rest.iter().map(|(k, v)| (*k, v)), &mut line);
        }

        line
    }

    fn name(&self) -> &str {
        "pretty"
    }
}

const BOLD: &str = "1";

fn paint(text: &str, style: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", style, text)
}

fn inspect_entries<'a>(entries: impl Iterator<Item = (&'a str, &'a FieldValue)>, out: &mut String) {
    let mut empty = true;
    out.push('{');
    for (key, value) in entries {
        out.push_str(if empty { " " } else { ", " });
        empty = false;
        inspect_key(key, out);
        out.push_str(": ");
        inspect(value, out);
    }
    out.push_str(if empty { "}" } else { " }" });
}

fn inspect_key(key: &str, out: &mut String) {
    let bare = !key.is_empty()
        && !key.starts_with(|c: char| c.is_ascii_digit())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if bare {
        out.push_str(key);
    } else {
        inspect_string(key, out);
    }
}

fn inspect_string(s: &str, out: &mut String) {
    out.push('\'');
    out.push_str(&escape_control(s).replace('\'', "\\'"));
    out.push('\'');
}

fn inspect(value: &FieldValue, out: &mut String) {
    match value {
        FieldValue::Absent => out.push_str(ABSENT_SENTINEL),
        FieldValue::Null => out.push_str("null"),
        FieldValue::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        FieldValue::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        FieldValue::Float(f) => {
            let _ = write!(out, "{}", f);
        }
        FieldValue::String(s) => inspect_string(s, out),
        FieldValue::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                inspect(item, out);
            }
            out.push_str(" ]");
        }
        FieldValue::Map(fields) => {
            inspect_entries(fields.iter().map(|(k, v)| (k.as_str(), v)), out)
        }
        FieldValue::Error(_) | FieldValue::Native(_) => {
            if let Some(err) = value.normalized_error() {
                let _ = write!(out, "[{}]", escape_control(&err.to_string()));
            }
        }
    }
}
