use chrono::format::{Item, StrftimeItems};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write;

use super::record::Record;

/// Template used by the console handler when the caller does not supply one.
pub const DEFAULT_FMT: &str = "%(asctime)s - %(levelname)s - %(message)s";

/// strftime pattern for `%(asctime)s` when no date format is configured.
pub const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S,%3f";

static FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"%%|%\((?P<field>\w+)\)(?P<flags>[#0+ -]*)(?P<width>\d+)?(?:\.(?P<precision>\d+))?(?P<conv>[diouxXeEfFgGcrsa])",
    )
    .expect("field pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("invalid format '{0}': no %(field) placeholder found")]
    NoFields(String),
    #[error("invalid format '{template}': stray '%' at byte {position}")]
    Malformed { template: String, position: usize },
    #[error("unknown format field '{0}'")]
    UnknownField(String),
    #[error("conversion '%{conv}' is not supported for field '{field}'")]
    UnsupportedConversion { field: String, conv: char },
    #[error("invalid date format '{0}'")]
    InvalidDateFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    LevelName,
    LevelNo,
    Message,
    AscTime,
    Created,
    Msecs,
    Process,
    Thread,
    ThreadName,
}

impl Field {
    fn parse(name: &str) -> Option<Field> {
        let field = match name {
            "name" => Field::Name,
            "levelname" => Field::LevelName,
            "levelno" => Field::LevelNo,
            "message" => Field::Message,
            "asctime" => Field::AscTime,
            "created" => Field::Created,
            "msecs" => Field::Msecs,
            "process" => Field::Process,
            "thread" => Field::Thread,
            "threadName" => Field::ThreadName,
            _ => return None,
        };
        Some(field)
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::LevelNo | Field::Created | Field::Msecs | Field::Process
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Int,
    Float,
}

#[derive(Debug, Clone)]
struct FieldSpec {
    field: Field,
    left_align: bool,
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Field(FieldSpec),
}

enum Value<'a> {
    Str(Cow<'a, str>),
    Int(i64),
    Float(f64),
}

/// Renders records through a `%(field)s`-style template.
///
/// Templates are parsed once at construction, so every placeholder problem
/// surfaces as a `FormatError` there rather than while emitting.
#[derive(Debug, Clone)]
pub struct Formatter {
    fmt: String,
    datefmt: Option<String>,
    segments: Vec<Segment>,
}

impl Formatter {
    pub fn new(fmt: &str, datefmt: Option<&str>) -> Result<Self, FormatError> {
        if let Some(datefmt) = datefmt {
            if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
                return Err(FormatError::InvalidDateFormat(datefmt.to_string()));
            }
        }

        let mut segments = Vec::new();
        let mut fields = 0;
        let mut last = 0;

        for caps in FIELD_PATTERN.captures_iter(fmt) {
            let Some(whole) = caps.get(0) else { continue };
            push_literal(&mut segments, fmt, last, whole.start())?;
            last = whole.end();

            let Some(name) = caps.name("field") else {
                append_literal(&mut segments, "%");
                continue;
            };
            let field = Field::parse(name.as_str())
                .ok_or_else(|| FormatError::UnknownField(name.as_str().to_string()))?;
            let conv = caps
                .name("conv")
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or('s');
            let conversion = match conv {
                's' | 'r' | 'a' => Conversion::Str,
                'd' | 'i' | 'u' if field.is_numeric() => Conversion::Int,
                'f' | 'F' if field.is_numeric() => Conversion::Float,
                _ => {
                    return Err(FormatError::UnsupportedConversion {
                        field: name.as_str().to_string(),
                        conv,
                    })
                }
            };
            let flags = caps.name("flags").map(|m| m.as_str()).unwrap_or("");
            segments.push(Segment::Field(FieldSpec {
                field,
                left_align: flags.contains('-'),
                zero_pad: flags.contains('0'),
                width: caps.name("width").and_then(|m| m.as_str().parse().ok()),
                precision: caps.name("precision").and_then(|m| m.as_str().parse().ok()),
                conversion,
            }));
            fields += 1;
        }
        push_literal(&mut segments, fmt, last, fmt.len())?;

        if fields == 0 {
            return Err(FormatError::NoFields(fmt.to_string()));
        }

        Ok(Self {
            fmt: fmt.to_string(),
            datefmt: datefmt.map(str::to_string),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.fmt
    }

    pub fn datefmt(&self) -> Option<&str> {
        self.datefmt.as_deref()
    }

    /// Render `record` into a single line (without trailing newline).
    pub fn format(&self, record: &Record) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(spec) => {
                    let value = self.value_of(spec.field, record);
                    out.push_str(&render(spec, value));
                }
            }
        }
        out
    }

    /// Render the record's timestamp with the configured date format.
    pub fn format_time(&self, record: &Record) -> String {
        let pattern = self.datefmt.as_deref().unwrap_or(DEFAULT_DATEFMT);
        let mut out = String::new();
        let _ = write!(out, "{}", record.created.format(pattern));
        out
    }

    fn value_of<'a>(&self, field: Field, record: &'a Record) -> Value<'a> {
        match field {
            Field::Name => Value::Str(Cow::Borrowed(&record.name)),
            Field::LevelName => Value::Str(Cow::Borrowed(record.level.name())),
            Field::LevelNo => Value::Int(i64::from(record.level.as_u8())),
            Field::Message => Value::Str(Cow::Borrowed(&record.message)),
            Field::AscTime => Value::Str(Cow::Owned(self.format_time(record))),
            Field::Created => Value::Float(record.created_secs()),
            Field::Msecs => Value::Float(f64::from(record.msecs())),
            Field::Process => Value::Int(i64::from(record.process)),
            Field::Thread => Value::Str(Cow::Borrowed(&record.thread)),
            Field::ThreadName => Value::Str(Cow::Borrowed(&record.thread_name)),
        }
    }
}

impl Default for Formatter {
    /// Message-only formatter.
    fn default() -> Self {
        Self {
            fmt: "%(message)s".to_string(),
            datefmt: None,
            segments: vec![Segment::Field(FieldSpec {
                field: Field::Message,
                left_align: false,
                zero_pad: false,
                width: None,
                precision: None,
                conversion: Conversion::Str,
            })],
        }
    }
}

fn push_literal(
    segments: &mut Vec<Segment>,
    fmt: &str,
    start: usize,
    end: usize,
) -> Result<(), FormatError> {
    let text = &fmt[start..end];
    if let Some(offset) = text.find('%') {
        return Err(FormatError::Malformed {
            template: fmt.to_string(),
            position: start + offset,
        });
    }
    if !text.is_empty() {
        append_literal(segments, text);
    }
    Ok(())
}

fn append_literal(segments: &mut Vec<Segment>, text: &str) {
    match segments.last_mut() {
        Some(Segment::Literal(existing)) => existing.push_str(text),
        _ => segments.push(Segment::Literal(text.to_string())),
    }
}

fn render(spec: &FieldSpec, value: Value<'_>) -> String {
    let body = match (spec.conversion, value) {
        (Conversion::Int, Value::Int(i)) => i.to_string(),
        (Conversion::Int, Value::Float(f)) => (f.trunc() as i64).to_string(),
        (Conversion::Float, Value::Int(i)) => format!("{:.*}", spec.precision.unwrap_or(6), i as f64),
        (Conversion::Float, Value::Float(f)) => format!("{:.*}", spec.precision.unwrap_or(6), f),
        (_, value) => {
            let text = match value {
                Value::Str(s) => s.into_owned(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
            };
            match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
    };

    let Some(width) = spec.width else { return body };
    let len = body.chars().count();
    if len >= width {
        return body;
    }
    let fill = width - len;
    if spec.left_align {
        format!("{}{}", body, " ".repeat(fill))
    } else if spec.zero_pad && spec.conversion != Conversion::Str {
        match body.strip_prefix('-') {
            Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
            None => format!("{}{}", "0".repeat(fill), body),
        }
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}
