//! Schema resolution: flattens a collection's JSON schema into a lookup
//! table from dotted field path to [`TypeTag`].
//!
//! Schemas arrive in several encodings (a `bson::Document`, a
//! `serde_json::Value`, serialized JSON text or bytes). Each one is first
//! normalized into a [`SchemaNode`] tree so the walker only ever sees one
//! shape. Resolution never fails: branches it cannot read are skipped.

use std::collections::{BTreeMap, HashMap, HashSet};

use bson::{Bson, Document};
use serde_json::Value;

use crate::types::TypeTag;

/// Canonical in-memory form of a schema description.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Map(BTreeMap<String, SchemaNode>),
    List(Vec<SchemaNode>),
    Text(String),
    /// Numbers, booleans, nulls and anything else the walker has no use for.
    Scalar,
}

impl SchemaNode {
    fn get(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Map(map) => map.get(key),
            _ => None,
        }
    }

    fn as_map(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match self {
            SchemaNode::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&Value> for SchemaNode {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => SchemaNode::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), SchemaNode::from(v)))
                    .collect(),
            ),
            Value::Array(items) => SchemaNode::List(items.iter().map(SchemaNode::from).collect()),
            Value::String(s) => SchemaNode::Text(s.clone()),
            _ => SchemaNode::Scalar,
        }
    }
}

impl From<&Bson> for SchemaNode {
    fn from(value: &Bson) -> Self {
        match value {
            Bson::Document(doc) => SchemaNode::from(doc),
            Bson::Array(items) => SchemaNode::List(items.iter().map(SchemaNode::from).collect()),
            Bson::String(s) => SchemaNode::Text(s.clone()),
            _ => SchemaNode::Scalar,
        }
    }
}

impl From<&Document> for SchemaNode {
    fn from(doc: &Document) -> Self {
        SchemaNode::Map(
            doc.iter()
                .map(|(k, v)| (k.to_string(), SchemaNode::from(v)))
                .collect(),
        )
    }
}

/// Trait for schema encodings that can be normalized into a [`SchemaNode`].
///
/// Implemented for [`bson::Document`], [`serde_json::Value`], JSON text
/// (`&str`, `String`) and JSON bytes (`&[u8]`, `Vec<u8>`).
pub trait IntoSchemaNode {
    fn into_schema_node(self) -> SchemaNode;
}

impl IntoSchemaNode for SchemaNode {
    fn into_schema_node(self) -> SchemaNode {
        self
    }
}

impl IntoSchemaNode for &Document {
    fn into_schema_node(self) -> SchemaNode {
        SchemaNode::from(self)
    }
}

impl IntoSchemaNode for Document {
    fn into_schema_node(self) -> SchemaNode {
        SchemaNode::from(&self)
    }
}

impl IntoSchemaNode for &Value {
    fn into_schema_node(self) -> SchemaNode {
        SchemaNode::from(self)
    }
}

impl IntoSchemaNode for Value {
    fn into_schema_node(self) -> SchemaNode {
        SchemaNode::from(&self)
    }
}

impl IntoSchemaNode for &str {
    fn into_schema_node(self) -> SchemaNode {
        match serde_json::from_str::<Value>(self) {
            Ok(value) => SchemaNode::from(&value),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable schema json, no fields resolved");
                SchemaNode::Scalar
            }
        }
    }
}

impl IntoSchemaNode for String {
    fn into_schema_node(self) -> SchemaNode {
        self.as_str().into_schema_node()
    }
}

impl IntoSchemaNode for &[u8] {
    fn into_schema_node(self) -> SchemaNode {
        match serde_json::from_slice::<Value>(self) {
            Ok(value) => SchemaNode::from(&value),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable schema json, no fields resolved");
                SchemaNode::Scalar
            }
        }
    }
}

impl IntoSchemaNode for Vec<u8> {
    fn into_schema_node(self) -> SchemaNode {
        self.as_slice().into_schema_node()
    }
}

/// Resolved dotted-path to [`TypeTag`] table. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypeMap {
    types: HashMap<String, TypeTag>,
    /// Paths declared only through `enum`, recorded as `object`.
    opaque: HashSet<String>,
}

impl FieldTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a schema in any supported encoding.
    pub fn resolve(schema: impl IntoSchemaNode) -> Self {
        let root = schema.into_schema_node();
        let root = match root.get("$jsonSchema") {
            Some(inner @ SchemaNode::Map(_)) => inner,
            _ => &root,
        };

        let mut map = Self::new();
        if let Some(properties) = root.get("properties").and_then(SchemaNode::as_map) {
            map.walk_properties("", properties);
        }
        map
    }

    pub fn get(&self, path: &str) -> Option<TypeTag> {
        self.types.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.types.contains_key(path)
    }

    /// True when the path was declared through `enum` with no `bsonType`.
    pub fn is_opaque(&self, path: &str) -> bool {
        self.opaque.contains(path)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TypeTag)> {
        self.types.iter().map(|(path, tag)| (path.as_str(), *tag))
    }

    fn walk_properties(&mut self, prefix: &str, properties: &BTreeMap<String, SchemaNode>) {
        for (name, entry) in properties {
            let Some(entry_map) = entry.as_map() else {
                continue;
            };
            let path = format!("{prefix}{name}");

            match entry_map.get("bsonType") {
                Some(declared) => {
                    if let Some(tag) = type_name(declared) {
                        let tag = if tag == TypeTag::Array {
                            entry
                                .get("items")
                                .and_then(|items| items.get("bsonType"))
                                .and_then(type_name)
                                .unwrap_or(TypeTag::Array)
                        } else {
                            tag
                        };
                        self.types.insert(path.clone(), tag);
                    }
                }
                None if entry_map.contains_key("enum") => {
                    self.types.insert(path.clone(), TypeTag::Object);
                    self.opaque.insert(path.clone());
                }
                None => {}
            }

            let nested = format!("{path}.");
            if let Some(sub) = entry_map.get("properties").and_then(SchemaNode::as_map) {
                self.walk_properties(&nested, sub);
            }
            if let Some(sub) = entry
                .get("items")
                .and_then(|items| items.get("properties"))
                .and_then(SchemaNode::as_map)
            {
                self.walk_properties(&nested, sub);
            }
        }
    }
}

impl<S: Into<String>> FromIterator<(S, TypeTag)> for FieldTypeMap {
    fn from_iter<I: IntoIterator<Item = (S, TypeTag)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            opaque: HashSet::new(),
        }
    }
}

/// Read a `bsonType` value: a single name, or a list where the first
/// recognized name wins.
fn type_name(node: &SchemaNode) -> Option<TypeTag> {
    match node {
        SchemaNode::Text(name) => name.parse().ok(),
        SchemaNode::List(names) => names.iter().find_map(|n| match n {
            SchemaNode::Text(name) => name.parse().ok(),
            _ => None,
        }),
        _ => None,
    }
}

/// Resolve a schema into a [`FieldTypeMap`].
pub fn resolve(schema: impl IntoSchemaNode) -> FieldTypeMap {
    FieldTypeMap::resolve(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn flat_properties() {
        let map = resolve(doc! {
            "bsonType": "object",
            "properties": {
                "name": { "bsonType": "string" },
                "age": { "bsonType": "int", "minimum": 0 },
            }
        });
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("name"), Some(TypeTag::String));
        assert_eq!(map.get("age"), Some(TypeTag::Int));
    }

    #[test]
    fn json_schema_wrapper_is_unwrapped() {
        let map = resolve(doc! {
            "$jsonSchema": {
                "bsonType": "object",
                "properties": { "created": { "bsonType": "date" } }
            }
        });
        assert_eq!(map.get("created"), Some(TypeTag::Date));
    }

    #[test]
    fn nested_properties_use_dotted_paths() {
        let map = resolve(doc! {
            "properties": {
                "outer": {
                    "bsonType": "object",
                    "properties": {
                        "inner": {
                            "properties": { "leaf": { "bsonType": "double" } }
                        }
                    }
                }
            }
        });
        assert_eq!(map.get("outer"), Some(TypeTag::Object));
        assert_eq!(map.get("outer.inner"), None);
        assert_eq!(map.get("outer.inner.leaf"), Some(TypeTag::Double));
    }

    #[test]
    fn array_items_type_replaces_array_tag() {
        let map = resolve(doc! {
            "properties": {
                "tags": { "bsonType": "array", "items": { "bsonType": "string" } },
                "blobs": { "bsonType": "array" },
            }
        });
        assert_eq!(map.get("tags"), Some(TypeTag::String));
        assert_eq!(map.get("blobs"), Some(TypeTag::Array));
    }

    #[test]
    fn array_item_properties_are_walked() {
        let map = resolve(doc! {
            "properties": {
                "authors": {
                    "bsonType": "array",
                    "items": {
                        "bsonType": "object",
                        "properties": { "email": { "bsonType": "string" } }
                    }
                }
            }
        });
        assert_eq!(map.get("authors"), Some(TypeTag::Object));
        assert_eq!(map.get("authors.email"), Some(TypeTag::String));
    }

    #[test]
    fn enum_without_type_is_opaque_object() {
        let map = resolve(doc! {
            "properties": { "status": { "enum": ["A", "B"] } }
        });
        assert_eq!(map.get("status"), Some(TypeTag::Object));
        assert!(map.is_opaque("status"));
    }

    #[test]
    fn bson_type_list_takes_first_known_name() {
        let map = resolve(doc! {
            "properties": { "nick": { "bsonType": ["null", "string"] } }
        });
        assert_eq!(map.get("nick"), Some(TypeTag::String));
    }

    #[test]
    fn unknown_type_names_and_odd_shapes_are_skipped() {
        let map = resolve(doc! {
            "properties": {
                "_id": { "bsonType": "objectId" },
                "notAMap": "just a string",
                "count": 3,
            }
        });
        assert!(map.is_empty());
    }

    #[test]
    fn malformed_json_resolves_to_empty_map() {
        assert!(resolve("{ not json").is_empty());
        assert!(resolve(b"[1, 2".as_slice()).is_empty());
    }

    #[test]
    fn missing_properties_resolves_to_empty_map() {
        assert!(resolve(doc! { "bsonType": "object" }).is_empty());
        assert!(resolve(doc! { "properties": "nope" }).is_empty());
    }
}
