//! Process-wide record schema registry
//!
//! Each host type is described once; later lookups share the same
//! `Arc<RecordSchema>`.

use super::record_schema::RecordSchema;
use crate::core::Result;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

lazy_static! {
    static ref SCHEMAS: RwLock<HashMap<TypeId, Arc<RecordSchema>>> = RwLock::new(HashMap::new());
}

/// Register `T` using `describe`, or return the schema registered earlier.
///
/// `describe` runs without holding the registry lock, so it may register the
/// record types it references. If two callers race, the first stored schema wins.
pub fn register<T: 'static>(describe: impl FnOnce() -> Result<RecordSchema>) -> Result<Arc<RecordSchema>> {
    if let Some(schema) = lookup::<T>() {
        return Ok(schema);
    }

    let schema = Arc::new(describe()?);
    let mut schemas = SCHEMAS.write();
    let stored = schemas.entry(TypeId::of::<T>()).or_insert_with(|| {
        tracing::debug!(
            host_type = type_name::<T>(),
            table = %schema.qualified_table(),
            "registered record type"
        );
        Arc::clone(&schema)
    });
    Ok(Arc::clone(stored))
}

/// The schema registered for `T`, if any
pub fn lookup<T: 'static>() -> Option<Arc<RecordSchema>> {
    SCHEMAS.read().get(&TypeId::of::<T>()).cloned()
}
