pub mod clause;
pub mod coerce;
mod compiler;
mod config;
mod error;
mod merge;
mod operator;
mod options;
pub mod schema;
mod shape;
mod sort;
mod types;

pub use clause::compile_field;
pub use coerce::coerce;
pub use compiler::{FilterCompiler, RawFilterMap};
pub use config::CompilerConfig;
pub use error::QueryError;
pub use merge::merge;
pub use operator::{LogicalOperator, Operator, OperatorToken};
pub use options::{FindOptions, QueryOptions};
pub use schema::{FieldTypeMap, IntoSchemaNode, SchemaNode, resolve};
pub use shape::{FilterShapeError, check_shape};
pub use sort::{Sort, SortDirection};
pub use types::{TypeTag, UnknownTypeName};
