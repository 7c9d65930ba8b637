//! Indirection segment: addresses another table's column through a
//! position list, never copying the referenced values.

use std::sync::Arc;

use columnar_types::{ChunkID, ColumnID, PosList, Variant};
use observability_deps::tracing::trace;

use crate::error::Result;
use crate::segment::Segment;
use crate::table::Table;

/// A segment whose values live in another table. `TableScan` is the only
/// producer of these (spec.md §4.I): every output column of a scan is a
/// `ReferenceSegment` sharing one `PosList`.
#[derive(Debug, Clone)]
pub struct ReferenceSegment {
    referenced_table: Arc<Table>,
    referenced_column_id: ColumnID,
    pos_list: Arc<PosList>,
}

impl ReferenceSegment {
    /// Builds a reference segment, flattening reference chains so this
    /// segment always points directly at a `Value` or `Dictionary` segment
    /// (spec.md §4.D, scenario S5: scanning the output of a prior scan must
    /// not produce a reference-to-a-reference).
    ///
    /// If chunk 0's segment at `referenced_column_id` is itself a
    /// `Reference`, this segment is redirected to point at *that* segment's
    /// own target instead of at it.
    pub fn new(
        referenced_table: Arc<Table>,
        referenced_column_id: ColumnID,
        pos_list: Arc<PosList>,
    ) -> Result<Self> {
        let (referenced_table, referenced_column_id) = referenced_table
            .with_chunk(ChunkID(0), |chunk| {
                match chunk.get_segment(referenced_column_id) {
                    Ok(Segment::Reference(inner)) => (
                        Arc::clone(inner.referenced_table()),
                        inner.referenced_column_id(),
                    ),
                    _ => (Arc::clone(&referenced_table), referenced_column_id),
                }
            })
            .unwrap_or((referenced_table, referenced_column_id));

        Ok(Self {
            referenced_table,
            referenced_column_id,
            pos_list,
        })
    }

    /// Resolves `offset` through the position list into the referenced
    /// table. Like the other segment variants' `get`, this is the source's
    /// flagged `operator[]` slow path, not a scan's chunk-dispatching one.
    pub fn get(&self, offset: usize) -> Variant {
        trace!(offset, "ReferenceSegment::get direct index access");
        let row = self
            .pos_list
            .get(offset)
            .expect("offset must be in bounds for this segment's position list");
        self.referenced_table
            .with_chunk(row.chunk_id, |chunk| {
                chunk
                    .get(self.referenced_column_id, usize::from(row.chunk_offset))
                    .expect("position list row must address an existing row")
            })
            .expect("position list row must address an existing chunk")
    }

    pub fn size(&self) -> usize {
        self.pos_list.len()
    }

    /// A reference segment's own footprint: the table/column pointer is
    /// shared, so only the `PosList` (shared across every column of one
    /// scan's output) counts, and only once per `Arc` owner in practice —
    /// this is a per-segment estimate, not a whole-table accounting.
    pub fn estimate_memory_usage(&self) -> usize {
        self.pos_list.len() * std::mem::size_of::<columnar_types::RowID>()
    }

    pub fn referenced_table(&self) -> &Arc<Table> {
        &self.referenced_table
    }

    pub fn referenced_column_id(&self) -> ColumnID {
        self.referenced_column_id
    }

    pub fn pos_list(&self) -> &Arc<PosList> {
        &self.pos_list
    }
}
