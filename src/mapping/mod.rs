//! Mapping engine: records, CRUD, typed models and scoped mutation

pub mod engine;
pub mod model;
pub mod mutate;
pub mod record;
pub mod statements;

pub use engine::{Conversion, TableOptions};
pub use model::Model;
pub use mutate::{mutate, Persist};
pub use record::Record;
