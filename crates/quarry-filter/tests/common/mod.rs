#![allow(dead_code)]

use quarry_filter::{CompilerConfig, FieldTypeMap, FilterCompiler, RawFilterMap, TypeTag};

pub const COLLECTION: &str = "things";

pub const THINGS_SCHEMA: &str = r#"{
    "$jsonSchema": {
        "bsonType": "object",
        "required": ["thingID", "created", "name"],
        "properties": {
            "thingID": { "bsonType": "string", "description": "primary identifier" },
            "created": { "bsonType": "date" },
            "name": { "bsonType": "string" },
            "disabled": { "bsonType": "bool" },
            "kind": { "enum": ["A", "B", "C"] },
            "rank": { "bsonType": "int", "minimum": 0, "maximum": 100 },
            "extra": { "bsonType": "object" },
            "authors": {
                "bsonType": "array",
                "items": {
                    "bsonType": "object",
                    "properties": {
                        "name": { "bsonType": "string" },
                        "email": { "bsonType": "string" }
                    }
                }
            },
            "tags": { "bsonType": "array", "items": { "bsonType": "string" } },
            "detail": {
                "bsonType": "object",
                "properties": {
                    "blobs": { "bsonType": "array" },
                    "seen": { "bsonType": "date" },
                    "deeper": {
                        "bsonType": "object",
                        "properties": {
                            "label": { "bsonType": "string" },
                            "score": { "bsonType": "double" }
                        }
                    }
                }
            },
            "notAMap": "not a property definition"
        }
    }
}"#;

/// Field types `THINGS_SCHEMA` resolves to.
pub fn things_field_types() -> Vec<(&'static str, TypeTag)> {
    vec![
        ("thingID", TypeTag::String),
        ("created", TypeTag::Date),
        ("name", TypeTag::String),
        ("disabled", TypeTag::Bool),
        ("kind", TypeTag::Object),
        ("rank", TypeTag::Int),
        ("extra", TypeTag::Object),
        ("authors", TypeTag::Object),
        ("authors.name", TypeTag::String),
        ("authors.email", TypeTag::String),
        ("tags", TypeTag::String),
        ("detail", TypeTag::Object),
        ("detail.blobs", TypeTag::Array),
        ("detail.seen", TypeTag::Date),
        ("detail.deeper", TypeTag::Object),
        ("detail.deeper.label", TypeTag::String),
        ("detail.deeper.score", TypeTag::Double),
    ]
}

/// A lenient compiler over an explicit field table.
pub fn compiler_for(types: &[(&str, TypeTag)]) -> FilterCompiler {
    FilterCompiler::with_field_types(
        CompilerConfig::new(COLLECTION),
        types.iter().map(|(k, v)| (*k, *v)).collect::<FieldTypeMap>(),
    )
}

/// `(field, "tok1,tok2")` pairs, split on commas like `filter[field]=tok1,tok2`.
pub fn raw(entries: &[(&str, &str)]) -> RawFilterMap {
    entries
        .iter()
        .map(|(field, tokens)| {
            (
                field.to_string(),
                tokens.split(',').map(str::to_string).collect(),
            )
        })
        .collect()
}

pub fn date(raw: &str) -> bson::DateTime {
    quarry_filter::coerce::parse_date(raw).unwrap()
}
