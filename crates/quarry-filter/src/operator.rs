use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator carried by a raw filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    None,
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
}

impl Operator {
    /// The query document key, or `None` for a bare value.
    pub fn key(self) -> Option<&'static str> {
        match self {
            Operator::None => None,
            Operator::Lt => Some("$lt"),
            Operator::Lte => Some("$lte"),
            Operator::Gt => Some("$gt"),
            Operator::Gte => Some("$gte"),
            Operator::Ne => Some("$ne"),
        }
    }

    pub fn is_none(self) -> bool {
        self == Operator::None
    }
}

/// An operator stripped from the front of a raw token, and what remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorToken<'a> {
    pub operator: Operator,
    pub value: &'a str,
}

impl<'a> OperatorToken<'a> {
    pub fn bare(value: &'a str) -> Self {
        Self {
            operator: Operator::None,
            value,
        }
    }
}

/// Combinator used when a field yields several operator-bearing conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    #[default]
    And,
    Not,
    Nor,
    Or,
}

impl LogicalOperator {
    pub fn key(self) -> &'static str {
        match self {
            LogicalOperator::And => "$and",
            LogicalOperator::Not => "$not",
            LogicalOperator::Nor => "$nor",
            LogicalOperator::Or => "$or",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(LogicalOperator::And),
            "$not" => Some(LogicalOperator::Not),
            "$nor" => Some(LogicalOperator::Nor),
            "$or" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix('$').unwrap_or(s);
        match name.to_ascii_lowercase().as_str() {
            "and" => Ok(LogicalOperator::And),
            "not" => Ok(LogicalOperator::Not),
            "nor" => Ok(LogicalOperator::Nor),
            "or" => Ok(LogicalOperator::Or),
            _ => Err(format!("unknown logical operator: {s}")),
        }
    }
}
