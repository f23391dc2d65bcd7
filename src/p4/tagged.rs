//! Parsing of `p4 -Mj -ztag` output.
//!
//! Every line is one JSON object. Objects carrying `severity` and `data` are
//! server messages; everything else is a tagged record.

use serde_json::{Map, Value};

use super::P4Error;

/// Server message severity (`E_INFO`, `E_WARN`, `E_FAILED`, `E_FATAL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=1 => Severity::Info,
            2 => Severity::Warning,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    pub fn is_error(self) -> bool {
        self >= Severity::Error
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

/// Tagged record with string fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaggedLine {
    Record(Record),
    Message(Message),
}

/// Parse one output line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<TaggedLine>, P4Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(line)
        .map_err(|e| P4Error::Malformed(format!("{e}: {line}")))?;
    let Value::Object(fields) = value else {
        return Err(P4Error::Malformed(line.to_string()));
    };

    if let (Some(severity), Some(data)) = (fields.get("severity"), fields.get("data")) {
        let level = match severity {
            Value::Number(n) => n.as_i64().unwrap_or(4),
            Value::String(s) => s.trim().parse().unwrap_or(4),
            _ => 4,
        };
        let text = data.as_str().unwrap_or_default().trim_end().to_string();
        return Ok(Some(TaggedLine::Message(Message {
            severity: Severity::from_level(level),
            text,
        })));
    }

    Ok(Some(TaggedLine::Record(Record(fields))))
}

/// Split a complete command output into records and messages
pub fn parse_output(output: &str) -> Result<(Vec<Record>, Vec<Message>), P4Error> {
    let mut records = Vec::new();
    let mut messages = Vec::new();

    for line in output.lines() {
        match parse_line(line)? {
            Some(TaggedLine::Record(record)) => records.push(record),
            Some(TaggedLine::Message(message)) => messages.push(message),
            None => {}
        }
    }

    Ok((records, messages))
}
