//! Raw token coercion.
//!
//! Each raw filter token may start with a comparison prefix. The prefix
//! grammar depends on the field's [`TypeTag`]:
//!
//! - numeric and date types accept `<=`, `>=`, `!=`, `<`, `>` (two-character
//!   prefixes are tried first). Dates also read a leading `-` as `!=`;
//!   numbers only do so for `-null`, since `-5` is a negative number.
//! - string and object types accept `!=` and `-` as not-equal.
//! - bool and array tokens carry no operator.
//!
//! The remainder is converted into the field's BSON representation. The
//! literal `null` stays `null` for every type except bool and array.
//! Conversion is lenient: unparseable input becomes the type's zero value
//! and a warning is logged.

use bson::{Bson, DateTime};
use chrono::{NaiveDate, NaiveDateTime};

use crate::operator::{Operator, OperatorToken};
use crate::types::TypeTag;

pub(crate) const NULL: &str = "null";

const COMPARISON_PREFIXES: [(&str, Operator); 5] = [
    ("<=", Operator::Lte),
    (">=", Operator::Gte),
    ("!=", Operator::Ne),
    ("<", Operator::Lt),
    (">", Operator::Gt),
];

/// Naive formats tried after RFC 3339; the result is taken as UTC.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strip a comparison prefix, longest match first.
pub fn split_comparison(token: &str) -> OperatorToken<'_> {
    for (prefix, operator) in COMPARISON_PREFIXES {
        if let Some(value) = token.strip_prefix(prefix) {
            return OperatorToken { operator, value };
        }
    }
    OperatorToken::bare(token)
}

/// Strip a not-equal prefix (`!=` or `-`).
pub fn split_negation(token: &str) -> OperatorToken<'_> {
    match token.strip_prefix("!=").or_else(|| token.strip_prefix('-')) {
        Some(value) => OperatorToken {
            operator: Operator::Ne,
            value,
        },
        None => OperatorToken::bare(token),
    }
}

/// Extract the operator from `token` and convert the remainder for `tag`.
pub fn coerce(token: &str, tag: TypeTag) -> (OperatorToken<'_>, Bson) {
    match tag {
        TypeTag::Bool => (OperatorToken::bare(token), Bson::Boolean(parse_bool(token))),
        TypeTag::Int | TypeTag::Long | TypeTag::Decimal | TypeTag::Double => {
            let mut parsed = split_comparison(token);
            if parsed.operator.is_none() && token.strip_prefix('-') == Some(NULL) {
                parsed = OperatorToken {
                    operator: Operator::Ne,
                    value: NULL,
                };
            }
            let value = if parsed.value == NULL {
                Bson::Null
            } else {
                parse_number(parsed.value, tag)
            };
            (parsed, value)
        }
        TypeTag::Date | TypeTag::Timestamp => {
            let mut parsed = split_comparison(token);
            if parsed.operator.is_none() {
                if let Some(value) = token.strip_prefix('-') {
                    parsed = OperatorToken {
                        operator: Operator::Ne,
                        value,
                    };
                }
            }
            let value = if parsed.value == NULL {
                Bson::Null
            } else {
                Bson::DateTime(parse_date(parsed.value).unwrap_or_else(|| {
                    tracing::warn!(type_tag = %tag, token, "unparseable date, using epoch");
                    DateTime::from_millis(0)
                }))
            };
            (parsed, value)
        }
        TypeTag::String | TypeTag::Object => {
            let parsed = split_negation(token);
            let value = if parsed.value == NULL {
                Bson::Null
            } else {
                Bson::String(parsed.value.to_string())
            };
            (parsed, value)
        }
        TypeTag::Array => (OperatorToken::bare(token), Bson::String(token.to_string())),
    }
}

fn parse_bool(token: &str) -> bool {
    match token {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
        "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
        _ => {
            tracing::warn!(token, "unparseable bool, using false");
            false
        }
    }
}

/// Parse a number at the width `tag` names, falling back to zero.
fn parse_number(raw: &str, tag: TypeTag) -> Bson {
    let parsed = match tag {
        TypeTag::Int => parse_integer(raw)
            .and_then(|v| i32::try_from(v).ok())
            .map(Bson::Int32),
        TypeTag::Long => parse_integer(raw)
            .and_then(|v| i64::try_from(v).ok())
            .map(Bson::Int64),
        TypeTag::Decimal => raw
            .parse::<f32>()
            .ok()
            .map(|v| Bson::Double(f64::from(v))),
        TypeTag::Double => raw.parse::<f64>().ok().map(Bson::Double),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!(type_tag = %tag, token = raw, "unparseable number, using zero");
        match tag {
            TypeTag::Int => Bson::Int32(0),
            TypeTag::Long => Bson::Int64(0),
            _ => Bson::Double(0.0),
        }
    })
}

/// Signed integer with optional `0x`, `0o` or `0b` radix prefix.
fn parse_integer(raw: &str) -> Option<i128> {
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let lower = unsigned.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        (10, lower.as_str())
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a timestamp: RFC 3339, then naive date-times and plain dates as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(DateTime::from_millis(dt.timestamp_millis()));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| DateTime::from_millis(naive.and_utc().timestamp_millis()))
}
