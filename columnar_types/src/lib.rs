//! Closed logical type system, type-erased value variant, identifier
//! newtypes, and row/position primitives shared by `attribute_vector`,
//! `columnar_storage`, `storage_manager` and `query_engine`.

pub mod error;
pub mod ids;
pub mod row;
pub mod variant;

pub use error::{Error, Result};
pub use ids::{ChunkID, ChunkOffset, ColumnID, ValueID};
pub use row::{PosList, RowID};
pub use variant::{resolve_data_type, ColumnValue, LogicalType, TypeVisitor, Variant};
