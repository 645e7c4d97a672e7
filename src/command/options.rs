/*!
Option schema + raw argument validation.

Flow:
  RawArgs (JSON object)  --validate(defs)-->  ParsedArgs
  ParsedArgs  --CommandOptions::from_args-->  typed Options

Rules:
  - Keys may be given as `name` or `--name`.
  - null / blank strings / empty arrays count as absent.
  - Missing required options are reported together, in declaration order,
    before any value is type-checked.
  - Unrecognized keys are ignored (logged at debug).

Coercion mirrors the CLI's primitive coercion: numbers may arrive as strings,
lists may arrive as comma separated strings.
*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::command::error::ValidationError;

/// Raw argument map as received from the caller.
pub type RawArgs = Map<String, Value>;

/* ---- Schema ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Guid,
    DateTime,
    Integer,
    StringList,
    NumberList,
    Choice(&'static [&'static str]),
}

impl OptionKind {
    /// Human description of the expected shape, used in validation messages.
    pub fn expected(&self) -> String {
        match self {
            OptionKind::String => "a string".into(),
            OptionKind::Guid => "a GUID".into(),
            OptionKind::DateTime => "an RFC 3339 timestamp".into(),
            OptionKind::Integer => "an integer".into(),
            OptionKind::StringList => "a list of strings".into(),
            OptionKind::NumberList => "a list of numbers".into(),
            OptionKind::Choice(choices) => format!("one of: {}", choices.join(", ")),
        }
    }

    /// JSON schema fragment for MCP tool input schemas.
    pub fn json_schema(&self) -> Value {
        match self {
            OptionKind::String => serde_json::json!({"type": "string"}),
            OptionKind::Guid => serde_json::json!({"type": "string", "format": "uuid"}),
            OptionKind::DateTime => serde_json::json!({"type": "string", "format": "date-time"}),
            OptionKind::Integer => serde_json::json!({"type": "integer"}),
            OptionKind::StringList => {
                serde_json::json!({"type": "array", "items": {"type": "string"}})
            }
            OptionKind::NumberList => {
                serde_json::json!({"type": "array", "items": {"type": "number"}})
            }
            OptionKind::Choice(choices) => serde_json::json!({"type": "string", "enum": choices}),
        }
    }
}

/// One recognized option of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDef {
    pub name: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    pub description: &'static str,
}

impl OptionDef {
    pub const fn required(name: &'static str, kind: OptionKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: OptionKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Typed options for one command.
pub trait CommandOptions: Sized + Send + 'static {
    /// Recognized options, in declaration order.
    fn definitions() -> Vec<OptionDef>;

    /// Build the typed value from already validated arguments.
    fn from_args(args: &ParsedArgs) -> Result<Self, ValidationError>;

    /// Validate a raw map and build the typed value in one step.
    fn parse(raw: &RawArgs) -> Result<Self, ValidationError> {
        let args = validate(&Self::definitions(), raw)?;
        Self::from_args(&args)
    }
}

/* ---- Parsed values ---- */

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    Integer(i64),
    StringList(Vec<String>),
    NumberList(Vec<f64>),
}

/// Arguments that passed validation, keyed by option name.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    values: HashMap<&'static str, OptionValue>,
}

impl ParsedArgs {
    pub fn string(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(OptionValue::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn guid(&self, name: &str) -> Option<Uuid> {
        match self.values.get(name) {
            Some(OptionValue::Guid(g)) => Some(*g),
            _ => None,
        }
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.values.get(name) {
            Some(OptionValue::DateTime(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn string_list(&self, name: &str) -> Option<Vec<String>> {
        match self.values.get(name) {
            Some(OptionValue::StringList(v)) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn number_list(&self, name: &str) -> Option<Vec<f64>> {
        match self.values.get(name) {
            Some(OptionValue::NumberList(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Fetch a required string. Validation already guarantees presence;
    /// absence here means the options type and its definitions disagree.
    pub fn require_string(&self, name: &'static str) -> Result<String, ValidationError> {
        self.string(name)
            .ok_or_else(|| ValidationError::MissingRequired(vec![name.to_string()]))
    }

    pub fn require_datetime(&self, name: &'static str) -> Result<DateTime<Utc>, ValidationError> {
        self.datetime(name)
            .ok_or_else(|| ValidationError::MissingRequired(vec![name.to_string()]))
    }

    pub fn require_string_list(&self, name: &'static str) -> Result<Vec<String>, ValidationError> {
        self.string_list(name)
            .ok_or_else(|| ValidationError::MissingRequired(vec![name.to_string()]))
    }
}

/* ---- Validation ---- */

/// Validate `raw` against `defs`.
pub fn validate(defs: &[OptionDef], raw: &RawArgs) -> Result<ParsedArgs, ValidationError> {
    let normalized = normalize_keys(raw);

    let missing: Vec<String> = defs
        .iter()
        .filter(|d| d.required && !is_present(d, normalized.get(d.name).copied()))
        .map(|d| d.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingRequired(missing));
    }

    for key in normalized.keys() {
        if !defs.iter().any(|d| d.name == *key) {
            tracing::debug!(option = %key, "ignoring unrecognized option");
        }
    }

    let mut values = HashMap::new();
    for def in defs {
        if let Some(raw_value) = normalized.get(def.name).copied()
            && is_present(def, Some(raw_value))
        {
            let parsed = coerce(def, raw_value)?;
            values.insert(def.name, parsed);
        }
    }
    Ok(ParsedArgs { values })
}

/// Strip leading `--`, drop absent-equivalent values.
fn normalize_keys(raw: &RawArgs) -> HashMap<String, &Value> {
    let mut out = HashMap::new();
    for (k, v) in raw {
        if is_absent(v) {
            continue;
        }
        let key = k.trim().trim_start_matches("--").to_string();
        out.insert(key, v);
    }
    out
}

fn is_absent(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// List options whose items are all blank count as absent.
fn is_present(def: &OptionDef, v: Option<&Value>) -> bool {
    let Some(v) = v else {
        return false;
    };
    match (def.kind, v) {
        (OptionKind::StringList | OptionKind::NumberList, Value::String(s)) => {
            !split_list(s).is_empty()
        }
        (OptionKind::StringList | OptionKind::NumberList, Value::Array(items)) => {
            items.iter().any(|i| !is_absent(i))
        }
        _ => true,
    }
}

fn coerce(def: &OptionDef, v: &Value) -> Result<OptionValue, ValidationError> {
    let invalid = || ValidationError::invalid(def.name, def.kind.expected());
    match def.kind {
        OptionKind::String => match v {
            Value::String(s) => Ok(OptionValue::String(s.trim().to_string())),
            Value::Number(n) => Ok(OptionValue::String(n.to_string())),
            Value::Bool(b) => Ok(OptionValue::String(b.to_string())),
            _ => Err(invalid()),
        },
        OptionKind::Guid => v
            .as_str()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(OptionValue::Guid)
            .ok_or_else(invalid),
        OptionKind::DateTime => v
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|d| OptionValue::DateTime(d.with_timezone(&Utc)))
            .ok_or_else(invalid),
        OptionKind::Integer => match v {
            Value::Number(n) => n.as_i64().map(OptionValue::Integer).ok_or_else(invalid),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(OptionValue::Integer)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        OptionKind::StringList => match v {
            Value::Array(items) => items
                .iter()
                .filter(|i| !is_absent(i))
                .map(|i| match i {
                    Value::String(s) => Ok(s.trim().to_string()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::StringList),
            Value::String(s) => Ok(OptionValue::StringList(split_list(s))),
            _ => Err(invalid()),
        },
        OptionKind::NumberList => match v {
            Value::Array(items) => items
                .iter()
                .filter(|i| !is_absent(i))
                .map(|i| match i {
                    Value::Number(n) => n.as_f64().ok_or_else(invalid),
                    Value::String(s) => parse_number(s).ok_or_else(invalid),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::NumberList),
            Value::String(s) => split_list(s)
                .iter()
                .map(|p| parse_number(p).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::NumberList),
            _ => Err(invalid()),
        },
        OptionKind::Choice(choices) => {
            let s = v.as_str().ok_or_else(invalid)?.trim();
            choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(s))
                .map(|c| OptionValue::String((*c).to_string()))
                .ok_or_else(invalid)
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Reject a time range whose end precedes its start.
pub fn check_time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(s), Some(e)) = (start, end)
        && e < s
    {
        return Err(ValidationError::invalid(
            "end-time",
            "a time after --start-time",
        ));
    }
    Ok(())
}
