use serde::{Deserialize, Serialize};

use crate::operator::LogicalOperator;

/// Settings a [`FilterCompiler`](crate::FilterCompiler) is built with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub collection: String,
    /// Reject filter, sort and projection fields the schema does not declare.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl CompilerConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn logical_operator(mut self, logical_operator: LogicalOperator) -> Self {
        self.logical_operator = logical_operator;
        self
    }
}
