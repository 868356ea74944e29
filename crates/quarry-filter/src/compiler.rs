use std::collections::BTreeMap;

use bson::Document;

use crate::clause::compile_field;
use crate::config::CompilerConfig;
use crate::error::QueryError;
use crate::merge::merge;
use crate::operator::LogicalOperator;
use crate::options::{self, FindOptions, QueryOptions};
use crate::schema::{FieldTypeMap, IntoSchemaNode};
use crate::types::TypeTag;

/// Dotted field path to its raw, already comma-split tokens.
///
/// Fields compile in key order, which fixes the order of grouped conditions.
pub type RawFilterMap = BTreeMap<String, Vec<String>>;

/// Compiles raw filter maps into typed filter documents for one collection.
///
/// The resolved [`FieldTypeMap`] is the only state and is never mutated, so
/// a compiler can be shared across threads and called concurrently.
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    config: CompilerConfig,
    field_types: FieldTypeMap,
}

impl FilterCompiler {
    pub fn new(collection: impl Into<String>, schema: impl IntoSchemaNode) -> Self {
        Self::from_config(CompilerConfig::new(collection), schema)
    }

    pub fn from_config(config: CompilerConfig, schema: impl IntoSchemaNode) -> Self {
        Self::with_field_types(config, FieldTypeMap::resolve(schema))
    }

    pub fn with_field_types(config: CompilerConfig, field_types: FieldTypeMap) -> Self {
        Self {
            config,
            field_types,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn field_types(&self) -> &FieldTypeMap {
        &self.field_types
    }

    /// Compile using the configured logical operator.
    pub fn compile(&self, raw: &RawFilterMap) -> Result<Document, QueryError> {
        self.compile_with(raw, self.config.logical_operator)
    }

    /// Compile, grouping multi-operator fields under `logical`.
    ///
    /// In strict mode the first unknown field aborts the whole compile. In
    /// lenient mode unknown fields contribute nothing.
    pub fn compile_with(
        &self,
        raw: &RawFilterMap,
        logical: LogicalOperator,
    ) -> Result<Document, QueryError> {
        raw.iter().try_fold(Document::new(), |filter, (field, tokens)| {
            let Some(tag) = self.field_types.get(field) else {
                if self.config.strict {
                    return Err(QueryError::unknown_field(field, &self.config.collection));
                }
                tracing::debug!(
                    field = %field,
                    collection = %self.config.collection,
                    "skipping filter on undeclared field"
                );
                return Ok(filter);
            };

            // enum-only fields hold values, not sub-documents
            let tag = if tag == TypeTag::Object && self.field_types.is_opaque(field) {
                TypeTag::String
            } else {
                tag
            };

            let fragment = compile_field(field, tokens.as_slice(), tag, logical);
            tracing::trace!(field = %field, type_tag = %tag, ?fragment, "compiled filter field");
            Ok(merge(filter, fragment))
        })
    }

    /// Build pagination, projection and sort options, validating field names
    /// in strict mode.
    pub fn find_options(&self, query: &QueryOptions) -> Result<FindOptions, QueryError> {
        options::build(query, |field| self.check_field(field))
    }

    fn check_field(&self, field: &str) -> Result<(), QueryError> {
        if self.config.strict && !self.field_types.contains(field) {
            return Err(QueryError::unknown_field(field, &self.config.collection));
        }
        Ok(())
    }
}
