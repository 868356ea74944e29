use bson::{Bson, Document};
use regex::Regex;

use crate::operator::LogicalOperator;

/// A compiled filter uses a key or value shape the query engine would reject.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterShapeError(pub String);

impl std::fmt::Display for FilterShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed filter: {}", self.0)
    }
}

impl std::error::Error for FilterShapeError {}

/// Check that a filter document only uses the operator vocabulary the
/// compiler emits.
///
/// - Top-level `$and` / `$or` / `$nor` / `$not` hold non-empty arrays of filter documents
/// - `{ "field": value }` is implicit equality, whatever the value
/// - `{ "field": { "$op": v } }` accepts `$eq`, `$ne`, `$lt`, `$lte`, `$gt`, `$gte`,
///   `$in` (array) and `$exists` (boolean)
/// - `$regex` must be a compilable pattern, with `$options` drawn from `imsx`
///
/// An empty document is a valid, match-everything filter.
pub fn check_shape(doc: &Document) -> Result<(), FilterShapeError> {
    for (key, value) in doc {
        if LogicalOperator::from_key(key).is_some() {
            check_group(key, value)?;
        } else if key.starts_with('$') {
            return Err(FilterShapeError(format!("{key} is not a grouping operator")));
        } else {
            check_condition(key, value)?;
        }
    }
    Ok(())
}

fn check_group(key: &str, value: &Bson) -> Result<(), FilterShapeError> {
    let Bson::Array(members) = value else {
        return Err(FilterShapeError(format!("{key} expects a list of filters")));
    };
    if members.is_empty() {
        return Err(FilterShapeError(format!("{key} has no filters to combine")));
    }
    members.iter().try_for_each(|member| match member {
        Bson::Document(sub) => check_shape(sub),
        other => Err(FilterShapeError(format!(
            "{key} holds a {:?} where a filter was expected",
            other.element_type()
        ))),
    })
}

fn check_condition(field: &str, value: &Bson) -> Result<(), FilterShapeError> {
    // sub-documents keyed by plain names are equality on an embedded document
    match value {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
            check_operators(field, ops)
        }
        _ => Ok(()),
    }
}

/// Comparison, membership and existence operators may share a document
/// with `$regex` once `merge` has folded two fragments for the same path.
fn check_operators(field: &str, ops: &Document) -> Result<(), FilterShapeError> {
    let mut pattern = None;
    let mut options = None;

    for (op, value) in ops {
        match (op.as_str(), value) {
            ("$eq" | "$ne" | "$lt" | "$lte" | "$gt" | "$gte", _) => {}
            ("$in", Bson::Array(_)) => {}
            ("$in", _) => {
                return Err(FilterShapeError(format!("{field}: $in needs a list of values")));
            }
            ("$exists", Bson::Boolean(_)) => {}
            ("$exists", _) => {
                return Err(FilterShapeError(format!("{field}: $exists needs true or false")));
            }
            ("$regex", Bson::String(p)) => pattern = Some(p.as_str()),
            ("$regex", _) => {
                return Err(FilterShapeError(format!("{field}: $regex needs a pattern string")));
            }
            ("$options", Bson::String(o)) => options = Some(o.as_str()),
            ("$options", _) => {
                return Err(FilterShapeError(format!("{field}: $options needs a flag string")));
            }
            (other, _) => {
                return Err(FilterShapeError(format!("{field}: {other} is not a filter operator")));
            }
        }
    }

    match (pattern, options) {
        (Some(pattern), options) => check_pattern(field, pattern, options.unwrap_or("")),
        (None, Some(_)) => Err(FilterShapeError(format!("{field}: $options given with no $regex"))),
        (None, None) => Ok(()),
    }
}

fn check_pattern(field: &str, pattern: &str, options: &str) -> Result<(), FilterShapeError> {
    if let Some(flag) = options.chars().find(|c| !"imsx".contains(*c)) {
        return Err(FilterShapeError(format!("{field}: regex flag {flag:?} is not supported")));
    }
    let compiled = if options.is_empty() {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("(?{options}){pattern}"))
    };
    compiled
        .map(drop)
        .map_err(|e| FilterShapeError(format!("{field}: pattern does not compile: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn shape_error(filter: Document) -> String {
        check_shape(&filter).unwrap_err().0
    }

    #[test]
    fn empty_and_plain_equality_pass() {
        assert!(check_shape(&doc! {}).is_ok());
        assert!(check_shape(&doc! { "status": "active", "age": 30 }).is_ok());
        assert!(check_shape(&doc! { "address": { "city": "Austin" } }).is_ok());
    }

    #[test]
    fn logical_groups_recurse() {
        let filter = doc! {
            "$and": [{ "n": { "$gte": 1 } }, { "n": { "$in": [2, 4] } }],
            "o.a": { "$exists": false },
        };
        assert!(check_shape(&filter).is_ok());

        let err = shape_error(doc! { "$or": [{ "n": { "$between": 1 } }] });
        assert_eq!(err, "n: $between is not a filter operator");
    }

    #[test]
    fn logical_groups_need_filter_lists() {
        assert_eq!(shape_error(doc! { "$and": [] }), "$and has no filters to combine");
        assert_eq!(
            shape_error(doc! { "$nor": { "a": 1 } }),
            "$nor expects a list of filters"
        );
        assert!(shape_error(doc! { "$not": [1] }).contains("where a filter was expected"));
    }

    #[test]
    fn unknown_top_level_operator_fails() {
        assert_eq!(
            shape_error(doc! { "$where": "true" }),
            "$where is not a grouping operator"
        );
    }

    #[test]
    fn operator_value_types() {
        assert_eq!(
            shape_error(doc! { "n": { "$in": 1 } }),
            "n: $in needs a list of values"
        );
        assert_eq!(
            shape_error(doc! { "o.a": { "$exists": "yes" } }),
            "o.a: $exists needs true or false"
        );
    }

    #[test]
    fn regex_checks() {
        assert!(check_shape(&doc! { "s": { "$regex": "^value", "$options": "i" } }).is_ok());
        assert!(check_shape(&doc! { "s": { "$regex": "^value$" } }).is_ok());

        assert!(shape_error(doc! { "s": { "$regex": "[oops" } }).contains("does not compile"));
        assert_eq!(
            shape_error(doc! { "s": { "$regex": "a", "$options": "q" } }),
            "s: regex flag 'q' is not supported"
        );
        assert_eq!(
            shape_error(doc! { "s": { "$options": "i" } }),
            "s: $options given with no $regex"
        );
        assert_eq!(
            shape_error(doc! { "s": { "$regex": 5 } }),
            "s: $regex needs a pattern string"
        );
    }

    #[test]
    fn regex_shares_a_document_with_other_operators() {
        let merged = doc! { "o.a": { "$exists": true, "$regex": "^a", "$options": "i" } };
        assert!(check_shape(&merged).is_ok());

        let merged = doc! { "s": { "$ne": null, "$regex": "x$" } };
        assert!(check_shape(&merged).is_ok());

        assert_eq!(
            shape_error(doc! { "s": { "$regex": "a", "$near": 1 } }),
            "s: $near is not a filter operator"
        );
    }
}
