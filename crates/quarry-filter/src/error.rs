use thiserror::Error;

/// Errors raised while compiling filters or find options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Strict validation found a field path the schema does not declare.
    #[error("field {field} does not exist in collection {collection}")]
    UnknownField { field: String, collection: String },
}

impl QueryError {
    pub(crate) fn unknown_field(field: &str, collection: &str) -> Self {
        QueryError::UnknownField {
            field: field.to_string(),
            collection: collection.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_message() {
        let err = QueryError::unknown_field("nofield", "things");
        assert_eq!(
            err.to_string(),
            "field nofield does not exist in collection things"
        );
    }
}
