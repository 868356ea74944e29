//! Per-field clause compilation.
//!
//! Turns one field's raw tokens into a filter fragment. Numeric and date
//! fields are operator-aware and group several conditions under a logical
//! operator; string fields always use `$in` for several values and pattern
//! matching for a single one.

use bson::{Bson, Document};

use crate::coerce::{NULL, coerce, split_negation};
use crate::merge::merge;
use crate::operator::{LogicalOperator, Operator};
use crate::types::TypeTag;

/// Compile `tokens` for `field` according to `tag`.
///
/// An `object` tag compiles each token as a sub-field existence check.
/// Returns an empty document when there is nothing to filter on.
pub fn compile_field<S: AsRef<str>>(
    field: &str,
    tokens: &[S],
    tag: TypeTag,
    logical: LogicalOperator,
) -> Document {
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
    if tokens.is_empty() {
        return Document::new();
    }

    match tag {
        TypeTag::Bool => tokens.iter().fold(Document::new(), |acc, token| {
            merge(acc, fragment(field, coerce(token, tag).1))
        }),
        TypeTag::Int
        | TypeTag::Long
        | TypeTag::Decimal
        | TypeTag::Double
        | TypeTag::Date
        | TypeTag::Timestamp => compile_comparable(field, &tokens, tag, logical),
        TypeTag::String => compile_string(field, &tokens),
        TypeTag::Object => compile_exists(field, &tokens),
        TypeTag::Array => compile_array(field, &tokens),
    }
}

fn compile_comparable(
    field: &str,
    tokens: &[&str],
    tag: TypeTag,
    logical: LogicalOperator,
) -> Document {
    let mut conditions = Vec::new();
    let mut bare = Vec::new();
    for token in tokens {
        let (parsed, value) = coerce(token, tag);
        match parsed.operator.key() {
            Some(key) => conditions.push((key, value)),
            None => bare.push(value),
        }
    }

    if tokens.len() == 1 {
        return match conditions.pop() {
            Some((key, value)) => fragment(field, condition(key, value)),
            None => fragment(field, bare.pop().unwrap_or(Bson::Null)),
        };
    }

    if conditions.is_empty() {
        return fragment(field, condition("$in", Bson::Array(bare)));
    }

    let mut group: Vec<Bson> = conditions
        .into_iter()
        .map(|(key, value)| Bson::Document(fragment(field, condition(key, value))))
        .collect();
    if !bare.is_empty() {
        group.push(Bson::Document(fragment(
            field,
            condition("$in", Bson::Array(bare)),
        )));
    }

    fragment(logical.key(), Bson::Array(group))
}

fn compile_string(field: &str, tokens: &[&str]) -> Document {
    if let [token] = tokens {
        return compile_pattern(field, token);
    }

    let values = tokens
        .iter()
        .map(|t| Bson::String((*t).to_string()))
        .collect();
    fragment(field, condition("$in", Bson::Array(values)))
}

/// Interpret a single string token: negation, null, quoted exact match,
/// `*` wildcards, or a literal.
fn compile_pattern(field: &str, token: &str) -> Document {
    let negated = split_negation(token);
    if negated.operator == Operator::Ne {
        let value = if negated.value == NULL {
            Bson::Null
        } else {
            Bson::String(negated.value.to_string())
        };
        return fragment(field, condition("$ne", value));
    }

    if token == NULL {
        return fragment(field, Bson::Null);
    }

    if let Some(inner) = token
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return fragment(field, regex(&format!("^{}$", regex::escape(inner)), None));
    }

    let leading = token.starts_with('*');
    let trailing = token.len() > 1 && token.ends_with('*');
    let body = &token[usize::from(leading)..token.len() - usize::from(trailing)];
    if !(leading || trailing) || !body.chars().any(|c| c.is_alphanumeric() || c == '_') {
        return fragment(field, Bson::String(token.to_string()));
    }

    let body = regex::escape(body);
    let pattern = match (leading, trailing) {
        (true, true) => body,
        (false, true) => format!("^{body}"),
        _ => format!("{body}$"),
    };
    fragment(field, regex(&pattern, Some("i")))
}

fn compile_exists(field: &str, tokens: &[&str]) -> Document {
    tokens.iter().fold(Document::new(), |acc, token| {
        let parsed = split_negation(token);
        if parsed.value.is_empty() {
            return acc;
        }
        let path = format!("{field}.{}", parsed.value);
        let exists = parsed.operator.is_none();
        merge(acc, fragment(&path, condition("$exists", Bson::Boolean(exists))))
    })
}

fn compile_array(field: &str, tokens: &[&str]) -> Document {
    if let [token] = tokens {
        return fragment(field, Bson::String((*token).to_string()));
    }

    let values = tokens
        .iter()
        .map(|t| Bson::String((*t).to_string()))
        .collect();
    fragment(field, Bson::Array(values))
}

fn fragment(key: &str, value: impl Into<Bson>) -> Document {
    let mut doc = Document::new();
    doc.insert(key, value.into());
    doc
}

fn condition(operator: &str, value: Bson) -> Document {
    fragment(operator, value)
}

fn regex(pattern: &str, options: Option<&str>) -> Document {
    let mut doc = fragment("$regex", Bson::String(pattern.to_string()));
    if let Some(options) = options {
        doc.insert("$options", options);
    }
    doc
}
