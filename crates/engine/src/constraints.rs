//! Constraint evaluation and validator composition.
//!
//! Every check runs on canonical scalars produced by
//! [`unwrap_scalars`](crate::values::unwrap_scalars), so callers may pass a
//! raw input, a content object, a select option, or an array of those.
//! Absent and empty values never fail a constraint; only
//! [`Validator::Required`] rejects them.

use attrform_interchange::{Constraint, ConstraintType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use time::UtcOffset;

use crate::temporal::{self, LocalZone};
use crate::values::{scalar_text, unwrap_scalars};

pub const REQUIRED_MESSAGE: &str = "Required Field";
pub const INTEGER_MESSAGE: &str = "Value must be an integer";
pub const FLOAT_MESSAGE: &str = "Value must be a number";
pub const DATE_MESSAGE: &str = "Value must be a date (YYYY-MM-DD)";
pub const TIME_MESSAGE: &str = "Value must be a time (HH:MM or HH:MM:SS)";
pub const DATETIME_MESSAGE: &str = "Value must be a date and time";
pub const BASE64_MESSAGE: &str = "Value must be base64 encoded";

/// One field-level check.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    Required,
    Integer,
    Float,
    Date,
    Time,
    DateTime,
    Base64,
    /// Declarative constraints; wall-clock date-times are read in `zone`.
    Constraints {
        constraints: Vec<Constraint>,
        zone: LocalZone,
    },
}

impl Validator {
    pub fn check(&self, value: &Value) -> Option<String> {
        let scalars = unwrap_scalars(value);
        match self {
            Validator::Required => scalars.is_empty().then(|| REQUIRED_MESSAGE.to_string()),
            Validator::Integer => first_failure(&scalars, INTEGER_MESSAGE, is_integer),
            Validator::Float => first_failure(&scalars, FLOAT_MESSAGE, is_float),
            Validator::Date => first_failure(&scalars, DATE_MESSAGE, |s| {
                scalar_text(s).is_some_and(|t| temporal::parse_date(&t).is_some())
            }),
            Validator::Time => first_failure(&scalars, TIME_MESSAGE, |s| {
                scalar_text(s).is_some_and(|t| temporal::parse_time(&t).is_some())
            }),
            Validator::DateTime => first_failure(&scalars, DATETIME_MESSAGE, |s| {
                scalar_text(s)
                    .is_some_and(|t| temporal::parse_instant(&t, UtcOffset::UTC).is_some())
            }),
            Validator::Base64 => first_failure(&scalars, BASE64_MESSAGE, |s| {
                s.as_str().is_some_and(|t| BASE64.decode(t.trim()).is_ok())
            }),
            Validator::Constraints { constraints, zone } => {
                validate_in_zone(value, constraints, *zone)
            }
        }
    }
}

fn first_failure(scalars: &[Value], message: &str, ok: impl Fn(&Value) -> bool) -> Option<String> {
    scalars
        .iter()
        .any(|s| !ok(s))
        .then(|| message.to_string())
}

fn is_integer(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_float(v: &Value) -> bool {
    match v {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(|f| f.is_finite()),
        _ => false,
    }
}

/// Run validators left to right and return the first failure.
///
/// `None` entries are conditionally disabled validators and are skipped.
pub fn compose_validators(validators: &[Option<Validator>], value: &Value) -> Option<String> {
    validators.iter().flatten().find_map(|v| v.check(value))
}

/// Check a value against constraints, reading wall-clock date-times in the
/// host time zone.
pub fn validate(value: &Value, constraints: &[Constraint]) -> Option<String> {
    validate_in_zone(value, constraints, LocalZone::Host)
}

/// Check a value against constraints.
///
/// Returns the first failing constraint's message.
pub fn validate_in_zone(
    value: &Value,
    constraints: &[Constraint],
    zone: LocalZone,
) -> Option<String> {
    let scalars = unwrap_scalars(value);
    if scalars.is_empty() {
        return None;
    }
    constraints.iter().find_map(|c| {
        scalars
            .iter()
            .find_map(|s| check_constraint(c, s, zone))
    })
}

fn check_constraint(c: &Constraint, scalar: &Value, zone: LocalZone) -> Option<String> {
    match c.constraint_type {
        ConstraintType::Range => check_range(c, scalar),
        ConstraintType::RegExp => check_regexp(c, scalar),
        ConstraintType::DateTime => check_datetime(c, scalar, zone),
    }
}

// ──────────────────────────────────────────────
// Range
// ──────────────────────────────────────────────

fn to_decimal(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn bounds_message(from: Option<&Value>, to: Option<&Value>) -> String {
    let show = |v: &Value| scalar_text(v).unwrap_or_else(|| v.to_string());
    match (from, to) {
        (Some(f), Some(t)) => format!("Value must be between {} and {}", show(f), show(t)),
        (Some(f), None) => format!("Value must be at least {}", show(f)),
        (None, Some(t)) => format!("Value must be at most {}", show(t)),
        (None, None) => "Value is out of range".to_string(),
    }
}

fn bound<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

fn check_range(c: &Constraint, scalar: &Value) -> Option<String> {
    let from = bound(&c.data, "from");
    let to = bound(&c.data, "to");
    let fail = || {
        Some(
            c.error_message
                .clone()
                .unwrap_or_else(|| bounds_message(from, to)),
        )
    };

    let Some(n) = to_decimal(scalar) else {
        return fail();
    };
    if from.and_then(to_decimal).is_some_and(|min| n < min)
        || to.and_then(to_decimal).is_some_and(|max| n > max)
    {
        return fail();
    }
    None
}

// ──────────────────────────────────────────────
// RegExp
// ──────────────────────────────────────────────

/// Split an optionally `/`-delimited pattern into body and flags.
fn pattern_parts(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            return (&rest[..end], &rest[end + 1..]);
        }
    }
    (raw, "")
}

fn compile_full_match(body: &str, flags: &str) -> Result<Regex, regex::Error> {
    let inline: String = flags
        .chars()
        .filter(|f| matches!(f, 'i' | 'm' | 's'))
        .collect();
    let prefix = if inline.is_empty() {
        String::new()
    } else {
        format!("(?{})", inline)
    };
    Regex::new(&format!("^{}(?:{})$", prefix, body))
}

fn check_regexp(c: &Constraint, scalar: &Value) -> Option<String> {
    let raw = c.data.as_str().unwrap_or_default();
    let (body, flags) = pattern_parts(raw);
    let message = || {
        c.error_message
            .clone()
            .unwrap_or_else(|| format!("Value must conform to /{}/", body))
    };

    let re = match compile_full_match(body, flags) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(target: "attrform::constraints", pattern = raw, error = %e, "invalid pattern");
            return Some(format!("Invalid pattern /{}/", body));
        }
    };

    let text = scalar_text(scalar).unwrap_or_else(|| scalar.to_string());
    (!re.is_match(&text)).then(message)
}

// ──────────────────────────────────────────────
// DateTime
// ──────────────────────────────────────────────

fn check_datetime(c: &Constraint, scalar: &Value, zone: LocalZone) -> Option<String> {
    let from = bound(&c.data, "from");
    let to = bound(&c.data, "to");
    let fail = || {
        Some(
            c.error_message
                .clone()
                .unwrap_or_else(|| bounds_message(from, to)),
        )
    };
    let instant = |v: &Value| {
        v.as_str()
            .and_then(|s| temporal::parse_instant(s, zone))
    };

    let Some(at) = instant(scalar) else {
        return fail();
    };
    if from.and_then(instant).is_some_and(|min| at < min)
        || to.and_then(instant).is_some_and(|max| at > max)
    {
        return fail();
    }
    None
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
