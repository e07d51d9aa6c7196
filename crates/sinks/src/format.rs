//! Line format templates
//!
//! The format string is compiled once into segments; rendering a record
//! is a single pass with no re-parsing. Per-record specifiers
//! (`%client_id`, `%ip`) take their values from the dispatch context,
//! not the payload.
//!
//! Supported specifiers: `%datetime`, `%level`, `%vlevel`, `%logger`,
//! `%msg`, `%file`, `%line`, `%func`, `%thread`, `%client_id`, `%ip`.
//! Unknown specifiers are kept literal.

use std::fmt::Write as _;

use chrono::DateTime;

use crate::RecordContext;

/// One compiled piece of a format string
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Datetime,
    Level,
    VerboseLevel,
    Logger,
    Msg,
    File,
    Line,
    Func,
    Thread,
    ClientId,
    Ip,
}

/// Specifier table, longest name first so prefixes don't shadow
const SPECIFIERS: &[(&str, Segment)] = &[
    ("client_id", Segment::ClientId),
    ("datetime", Segment::Datetime),
    ("vlevel", Segment::VerboseLevel),
    ("logger", Segment::Logger),
    ("thread", Segment::Thread),
    ("level", Segment::Level),
    ("line", Segment::Line),
    ("file", Segment::File),
    ("func", Segment::Func),
    ("msg", Segment::Msg),
    ("ip", Segment::Ip),
];

/// A compiled line format
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    segments: Vec<Segment>,
}

impl FormatTemplate {
    /// Compile a format string
    pub fn parse(format: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;

        'outer: while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];

            // "%%" escapes a literal percent
            if let Some(stripped) = rest.strip_prefix('%') {
                literal.push('%');
                rest = stripped;
                continue;
            }

            for (name, segment) in SPECIFIERS {
                if let Some(stripped) = rest.strip_prefix(name) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment.clone());
                    rest = stripped;
                    continue 'outer;
                }
            }

            // Unknown specifier stays literal
            literal.push('%');
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Render one record
    pub fn render(&self, record: &RecordContext<'_>) -> String {
        let req = record.request;
        let mut out = String::with_capacity(64 + req.msg.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Datetime => {
                    // Fall back to the receive time when the client sent
                    // no timestamp
                    let secs = if req.datetime > 0 {
                        req.datetime
                    } else {
                        req.date_received
                    };
                    match DateTime::from_timestamp(secs as i64, 0) {
                        Some(dt) => {
                            let _ = write!(out, "{}", dt.format("%Y-%m-%d %H:%M:%S"));
                        }
                        None => {
                            let _ = write!(out, "{secs}");
                        }
                    }
                }
                Segment::Level => out.push_str(req.level.as_str()),
                Segment::VerboseLevel => {
                    let _ = write!(out, "{}", req.verbose_level);
                }
                Segment::Logger => out.push_str(&req.logger_id),
                Segment::Msg => out.push_str(&req.msg),
                Segment::File => out.push_str(&req.file),
                Segment::Line => {
                    let _ = write!(out, "{}", req.line);
                }
                Segment::Func => out.push_str(&req.func),
                Segment::Thread => out.push_str(&req.thread),
                Segment::ClientId => out.push_str(record.client_id),
                Segment::Ip => out.push_str(record.ip_addr),
            }
        }

        out
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
