//! archdsm core: fact model, fact graph, ancestry and the SQLite fact store

pub mod model;
pub mod graph;
pub mod ancestry;
pub mod builder;
pub mod store;
pub mod error;

#[cfg(test)]
pub mod tests;

#[cfg(test)]
pub mod test_utils;

pub use model::{CONSTRUCTOR_NAMES, EntityId, ContentId, EntityKind, DepKind, Position, SourceSpan, Entity, Dep};
pub use graph::FactGraph;
pub use ancestry::FileIndex;
pub use builder::FactGraphBuilder;
pub use store::{LoadReport, load_fact_base, read_fact_graph, write_fact_base, write_filtered_copy, create_schema, insert_fact_graph};
pub use error::{FactError, FactResult};
