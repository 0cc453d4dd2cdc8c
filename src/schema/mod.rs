//! Column type model and record schema registry

pub mod column;
pub mod column_type;
pub mod record_schema;
pub mod registry;

pub use column::Column;
pub use column_type::{ColumnType, CompositeType, EnumType, ForeignKey, ScalarType};
pub use record_schema::{RecordSchema, RecordSchemaBuilder, DEFAULT_SCHEMA};
