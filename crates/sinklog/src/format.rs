//! Record rendering
//!
//! A [`Record`] is one log call after field attachment. File and in-memory
//! sinks write it as a JSON object on one line; the console sink writes a
//! short human-readable line.

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use sinklog_core::{
    Fields, Level, CONSOLE_TIME_FORMAT, ERROR_FIELD, LEVEL_FIELD, MESSAGE_FIELD, TIME_FIELD,
    TIME_FORMAT,
};
use std::fmt::Write as _;

/// A single log event ready to be written
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: Level,
    pub time: DateTime<Local>,
    /// Fields attached to the logger
    pub attached: &'a Fields,
    /// Fields supplied at the call site
    pub fields: &'a Fields,
    pub error: Option<String>,
    pub message: &'a str,
}

impl<'a> Record<'a> {
    pub fn new(level: Level, message: &'a str, attached: &'a Fields, fields: &'a Fields) -> Self {
        Self {
            level,
            time: Local::now(),
            attached,
            fields,
            error: None,
            message,
        }
    }

    pub fn with_error<E: ToString + ?Sized>(mut self, err: &E) -> Self {
        self.error = Some(err.to_string());
        self
    }

    /// The `time` field value
    pub fn timestamp(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }

    /// Attached and call-site fields in output order, call-site winning on collision
    pub fn iter_fields(&self) -> impl Iterator<Item = (&'a String, &'a Value)> + '_ {
        let attached = self
            .attached
            .iter()
            .filter(move |(k, _)| !self.fields.contains_key(k.as_str()));
        attached
            .chain(self.fields.iter())
            .filter(move |(k, _)| !self.is_reserved(k))
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == LEVEL_FIELD
            || key == TIME_FIELD
            || key == MESSAGE_FIELD
            || (key == ERROR_FIELD && self.error.is_some())
    }

    /// Render as one JSON line terminated by `\n`
    pub fn to_json_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Render as one console line terminated by `\n`
    pub fn to_console_line(&self, color: bool) -> String {
        let mut line = String::with_capacity(64 + self.message.len());
        let time = self.time.format(CONSOLE_TIME_FORMAT).to_string();
        let tag = self.level.short();

        if color {
            let _ = write!(
                line,
                "{} {} {}",
                time.as_str().dimmed(),
                colored_tag(self.level, tag),
                self.message
            );
        } else {
            let _ = write!(line, "{} {} {}", time, tag, self.message);
        }

        for (key, value) in self.iter_fields() {
            let value = console_value(value);
            if color {
                let _ = write!(line, " {}{}", format!("{}=", key).cyan(), value);
            } else {
                let _ = write!(line, " {}={}", key, value);
            }
        }

        if let Some(err) = &self.error {
            if color {
                let _ = write!(
                    line,
                    " {}{}",
                    format!("{}=", ERROR_FIELD).red(),
                    err.as_str().red()
                );
            } else {
                let _ = write!(line, " {}={}", ERROR_FIELD, err);
            }
        }

        line.push('\n');
        line
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(LEVEL_FIELD, &self.level)?;
        for (key, value) in self
            .attached
            .iter()
            .filter(|(k, _)| !self.fields.contains_key(k.as_str()) && !self.is_reserved(k))
        {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(TIME_FIELD, &self.timestamp())?;
        for (key, value) in self.fields.iter().filter(|(k, _)| !self.is_reserved(k)) {
            map.serialize_entry(key, value)?;
        }
        if let Some(err) = &self.error {
            map.serialize_entry(ERROR_FIELD, err)?;
        }
        map.serialize_entry(MESSAGE_FIELD, self.message)?;
        map.end()
    }
}

fn colored_tag(level: Level, tag: &str) -> colored::ColoredString {
    match level {
        Level::Trace => tag.magenta(),
        Level::Debug => tag.yellow(),
        Level::Info => tag.green(),
        Level::Warn => tag.red(),
        Level::Error | Level::Fatal => tag.red().bold(),
    }
}

fn console_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(char::is_whitespace) => format!("{:?}", s),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sinklog_core::fields;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 18, 10, 24, 0).unwrap()
    }

    #[test]
    fn test_json_line_shape_and_order() {
        let attached = fields! { "project" => "billing" };
        let call = fields! { "user" => "alice" };
        let mut record = Record::new(Level::Info, "started", &attached, &call);
        record.time = fixed_time();

        let line = String::from_utf8(record.to_json_line().unwrap()).unwrap();
        assert_eq!(
            line,
            "{\"level\":\"info\",\"project\":\"billing\",\"time\":\"2024-07-18 10:24:00\",\"user\":\"alice\",\"message\":\"started\"}\n"
        );
    }

    #[test]
    fn test_call_fields_win_over_attached() {
        let attached = fields! { "id" => 1, "keep" => true };
        let call = fields! { "id" => 2 };
        let record = Record::new(Level::Warn, "m", &attached, &call);

        let value: Value = serde_json::from_slice(&record.to_json_line().unwrap()).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["keep"], true);

        let ids = record.iter_fields().filter(|(k, _)| k.as_str() == "id").count();
        assert_eq!(ids, 1);
    }

    #[test]
    fn test_reserved_keys_are_not_duplicated() {
        let attached = fields! { "time" => "yesterday" };
        let call = fields! { "message" => "shadow", "error" => "caller" };
        let record = Record::new(Level::Error, "real", &attached, &call)
            .with_error(&std::io::Error::new(std::io::ErrorKind::Other, "disk full"));

        let line = String::from_utf8(record.to_json_line().unwrap()).unwrap();
        assert_eq!(line.matches("\"time\":").count(), 1);
        assert_eq!(line.matches("\"message\":").count(), 1);
        assert_eq!(line.matches("\"error\":").count(), 1);

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "real");
        assert_eq!(value["error"], "disk full");
    }

    #[test]
    fn test_caller_error_field_kept_without_error() {
        let attached = Fields::new();
        let call = fields! { "error" => "from caller" };
        let record = Record::new(Level::Error, "m", &attached, &call);

        let value: Value = serde_json::from_slice(&record.to_json_line().unwrap()).unwrap();
        assert_eq!(value["error"], "from caller");
    }

    #[test]
    fn test_console_line_plain() {
        let attached = fields! { "project" => "billing" };
        let call = fields! { "note" => "two words", "n" => 3 };
        let mut record = Record::new(Level::Debug, "hello", &attached, &call);
        record.time = fixed_time();

        let line = record.to_console_line(false);
        assert_eq!(line, "10:24:00 DBG hello project=billing n=3 note=\"two words\"\n");
    }
}
