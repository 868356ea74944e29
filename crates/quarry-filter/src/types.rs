use std::fmt;
use std::str::FromStr;

/// Logical type of a field path, named after the `bsonType` keywords of a
/// collection's JSON schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Bool,
    Date,
    Timestamp,
    Int,
    Long,
    Decimal,
    Double,
    Array,
    Object,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Bool => "bool",
            TypeTag::Date => "date",
            TypeTag::Timestamp => "timestamp",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Decimal => "decimal",
            TypeTag::Double => "double",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
        }
    }

    /// Types whose tokens accept the `<`, `<=`, `>`, `>=` and `!=` prefixes.
    pub fn is_comparable(self) -> bool {
        matches!(
            self,
            TypeTag::Date
                | TypeTag::Timestamp
                | TypeTag::Int
                | TypeTag::Long
                | TypeTag::Decimal
                | TypeTag::Double
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a `bsonType` name has no [`TypeTag`] counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeName(pub String);

impl fmt::Display for UnknownTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown bson type: {}", self.0)
    }
}

impl std::error::Error for UnknownTypeName {}

impl FromStr for TypeTag {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TypeTag::String),
            "bool" => Ok(TypeTag::Bool),
            "date" => Ok(TypeTag::Date),
            "timestamp" => Ok(TypeTag::Timestamp),
            "int" => Ok(TypeTag::Int),
            "long" => Ok(TypeTag::Long),
            "decimal" => Ok(TypeTag::Decimal),
            "double" => Ok(TypeTag::Double),
            "array" => Ok(TypeTag::Array),
            "object" => Ok(TypeTag::Object),
            other => Err(UnknownTypeName(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for tag in [
            TypeTag::String,
            TypeTag::Bool,
            TypeTag::Date,
            TypeTag::Timestamp,
            TypeTag::Int,
            TypeTag::Long,
            TypeTag::Decimal,
            TypeTag::Double,
            TypeTag::Array,
            TypeTag::Object,
        ] {
            assert_eq!(tag.as_str().parse::<TypeTag>(), Ok(tag));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "objectId".parse::<TypeTag>().unwrap_err();
        assert_eq!(err.to_string(), "unknown bson type: objectId");
    }

    #[test]
    fn comparable_types() {
        assert!(TypeTag::Int.is_comparable());
        assert!(TypeTag::Timestamp.is_comparable());
        assert!(!TypeTag::String.is_comparable());
        assert!(!TypeTag::Array.is_comparable());
    }
}
