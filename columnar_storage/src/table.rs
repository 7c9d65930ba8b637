//! `Table`: an ordered list of chunks sharing one column schema, with
//! append-only row ingestion and per-chunk dictionary compression.

use std::thread;

use columnar_types::{ChunkID, ColumnID, LogicalType, Variant};
use observability_deps::tracing::debug;
use parking_lot::RwLock;
use snafu::{ensure, OptionExt};

use crate::chunk::Chunk;
use crate::error::{ChunkNotFound, ColumnNotFound, NonEmptyTableSchemaChange, Result};
use crate::segment::dictionary::DictionarySegmentData;
use crate::segment::value::ValueSegmentData;
use crate::segment::{DictionarySegment, Segment, ValueSegment};

/// A columnar table: a fixed schema plus a growing list of fixed-capacity
/// chunks.
///
/// Chunks are guarded by one reader-writer lock (spec.md §5): readers
/// (`with_chunk`, `row_count`, scans) take the shared lock; `append` and
/// `compress_chunk` take the exclusive lock only for as long as it takes to
/// push a row or swap in a freshly compressed chunk.
#[derive(Debug)]
pub struct Table {
    max_chunk_size: u32,
    column_names: Vec<String>,
    column_types: Vec<LogicalType>,
    chunks: RwLock<Vec<Chunk>>,
}

impl Table {
    /// A freshly constructed table always holds exactly one, empty chunk
    /// (spec.md §3), so `chunk_count() >= 1` is an invariant from the start.
    pub fn new(max_chunk_size: u32) -> Self {
        Self {
            max_chunk_size,
            column_names: Vec::new(),
            column_types: Vec::new(),
            chunks: RwLock::new(vec![Chunk::empty()]),
        }
    }

    /// Builds a table around a single, already-constructed chunk, with the
    /// given schema and `max_chunk_size` set to that chunk's row count.
    ///
    /// This is the constructor `TableScan` (query_engine) uses to wrap its
    /// `ReferenceSegment` output: the scan builds the reference chunk
    /// itself (segment construction is a storage-layer concern, not an
    /// operator one), then hands it here to get back a schema-bearing
    /// `Table` like any other (spec.md §4.I step 4). `max_chunk_size` is
    /// set to the pos list's length because a scan result is always
    /// exactly one chunk (spec.md's Output contract); it plays no role in
    /// appending further rows to a reference-only table, which never
    /// happens.
    pub fn from_single_chunk(
        column_names: Vec<String>,
        column_types: Vec<LogicalType>,
        chunk: Chunk,
    ) -> Self {
        let max_chunk_size = chunk.size() as u32;
        Self {
            max_chunk_size,
            column_names,
            column_types,
            chunks: RwLock::new(vec![chunk]),
        }
    }

    pub fn max_chunk_size(&self) -> u32 {
        self.max_chunk_size
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_name(&self, column_id: ColumnID) -> &str {
        &self.column_names[usize::from(column_id)]
    }

    pub fn column_type(&self, column_id: ColumnID) -> LogicalType {
        self.column_types[usize::from(column_id)]
    }

    pub fn column_types(&self) -> &[LogicalType] {
        &self.column_types
    }

    pub fn column_id_by_name(&self, name: &str) -> Result<ColumnID> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .map(ColumnID::from)
            .context(ColumnNotFound { name })
    }

    pub fn row_count(&self) -> u64 {
        self.chunks.read().iter().map(|c| c.size() as u64).sum()
    }

    pub fn chunk_count(&self) -> ChunkID {
        ChunkID(self.chunks.read().len() as u32)
    }

    /// Adds a new column. Fails once the table holds any row (spec.md §3,
    /// B2): schema changes are only legal on an empty table.
    pub fn add_column(&mut self, name: impl Into<String>, type_tag: &str) -> Result<()> {
        let row_count = self.row_count();
        ensure!(row_count == 0, NonEmptyTableSchemaChange { row_count });

        let logical_type = LogicalType::from_tag(type_tag)?;
        self.column_names.push(name.into());
        self.column_types.push(logical_type);

        let mut chunks = self.chunks.write();
        for chunk in chunks.iter_mut() {
            chunk.add_segment(new_value_segment(logical_type));
        }
        Ok(())
    }

    /// Appends a row to the last chunk, opening a fresh chunk first if the
    /// last one is already at `max_chunk_size` (spec.md §4.E, B3).
    pub fn append(&self, values: &[Variant]) -> Result<()> {
        let mut chunks = self.chunks.write();
        if chunks.last().map(|c| c.size() as u32) == Some(self.max_chunk_size) {
            let mut new_chunk = Chunk::empty();
            for &logical_type in &self.column_types {
                new_chunk.add_segment(new_value_segment(logical_type));
            }
            chunks.push(new_chunk);
        }
        chunks
            .last_mut()
            .expect("Table always holds at least one chunk")
            .append(values)
    }

    /// Runs `f` against chunk `chunk_id` while holding the shared read
    /// lock.
    pub fn with_chunk<R>(&self, chunk_id: ChunkID, f: impl FnOnce(&Chunk) -> R) -> Result<R> {
        let chunks = self.chunks.read();
        let chunk = chunks.get(usize::from(chunk_id)).context(ChunkNotFound {
            chunk_id: chunk_id.get(),
        })?;
        Ok(f(chunk))
    }

    /// Replaces every segment of `chunks[chunk_id]` with a freshly built
    /// `DictionarySegment`, one per column (spec.md §4.E.1).
    ///
    /// Per-column dictionary construction runs on its own scoped thread
    /// (spec.md's Design Notes §9: "thread-per-column compression"); all
    /// threads are joined before the exclusive lock is taken, so the only
    /// work done under the write lock is the `Vec<Segment>` swap itself —
    /// concurrent readers observe either the fully-old or the fully-new
    /// chunk, never a partially replaced one.
    pub fn compress_chunk(&self, chunk_id: ChunkID) -> Result<()> {
        let (column_count, original_columns) = {
            let chunks = self.chunks.read();
            let chunk = chunks.get(usize::from(chunk_id)).context(ChunkNotFound {
                chunk_id: chunk_id.get(),
            })?;
            let column_count = chunk.column_count();
            let original_columns = (0..column_count)
                .map(|c| -> Result<Vec<Variant>> {
                    (0..chunk.size())
                        .map(|o| chunk.get(ColumnID::from(c), o))
                        .collect()
                })
                .collect::<Result<Vec<_>>>()?;
            (column_count, original_columns)
        };

        debug!(
            chunk_id = chunk_id.get(),
            column_count, "compressing chunk columns in parallel"
        );

        let column_types = self.column_types.clone();
        let new_segments: Vec<Segment> = thread::scope(|scope| {
            let handles: Vec<_> = original_columns
                .into_iter()
                .zip(column_types.into_iter())
                .map(|(values, logical_type)| {
                    scope.spawn(move || build_dictionary_segment(logical_type, values))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("dictionary-compression thread panicked"))
                .collect()
        });

        let mut chunks = self.chunks.write();
        chunks[usize::from(chunk_id)] = Chunk::from_segments(new_segments);
        Ok(())
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.chunks.read().iter().map(|c| c.estimate_memory_usage()).sum()
    }
}

/// Builds a fresh, empty `ValueSegment` of the type named by `logical_type`.
///
/// The Rust rendering of the source's `make_shared_by_data_type<BaseSegment,
/// ValueSegment>(type)` factory call: an exhaustive match over the closed
/// type set stands in for the runtime-dispatched template instantiation.
fn new_value_segment(logical_type: LogicalType) -> Segment {
    Segment::Value(match logical_type {
        LogicalType::Int32 => ValueSegment::Int32(ValueSegmentData::new()),
        LogicalType::Int64 => ValueSegment::Int64(ValueSegmentData::new()),
        LogicalType::Float32 => ValueSegment::Float32(ValueSegmentData::new()),
        LogicalType::Float64 => ValueSegment::Float64(ValueSegmentData::new()),
        LogicalType::String => ValueSegment::String(ValueSegmentData::new()),
    })
}

/// Builds a `DictionarySegment` from a column's already-decoded original
/// values (spec.md §4.E.1). Each match arm turbofishes `T` concretely for
/// `DictionarySegmentData::build`, so the cast-and-sort work is written
/// once and instantiated per logical type rather than duplicated by hand.
fn build_dictionary_segment(logical_type: LogicalType, values: Vec<Variant>) -> Segment {
    fn build<T: columnar_types::ColumnValue>(values: Vec<Variant>) -> Vec<T> {
        values
            .iter()
            .map(|v| T::type_cast(v).expect("value already belongs to this column's type"))
            .collect()
    }

    Segment::Dictionary(match logical_type {
        LogicalType::Int32 => DictionarySegment::Int32(DictionarySegmentData::build(build(values))),
        LogicalType::Int64 => DictionarySegment::Int64(DictionarySegmentData::build(build(values))),
        LogicalType::Float32 => {
            DictionarySegment::Float32(DictionarySegmentData::build(build(values)))
        }
        LogicalType::Float64 => {
            DictionarySegment::Float64(DictionarySegmentData::build(build(values)))
        }
        LogicalType::String => DictionarySegment::String(DictionarySegmentData::build(build(values))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[i32]) -> Vec<Variant> {
        values.iter().map(|&v| Variant::Int32(v)).collect()
    }

    #[test]
    fn fresh_table_has_one_empty_chunk() {
        let table = Table::new(2);
        assert_eq!(table.chunk_count(), ChunkID(1));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn add_column_rejected_after_append() {
        let mut table = Table::new(2);
        table.add_column("a", "int").unwrap();
        table.append(&row(&[1])).unwrap();
        assert!(table.add_column("b", "int").is_err());
    }

    #[test]
    fn append_opens_new_chunk_when_full() {
        let mut table = Table::new(2);
        table.add_column("a", "int").unwrap();
        table.append(&row(&[1])).unwrap();
        table.append(&row(&[2])).unwrap();
        assert_eq!(table.chunk_count(), ChunkID(1));
        table.append(&row(&[3])).unwrap();
        assert_eq!(table.chunk_count(), ChunkID(2));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn compress_chunk_preserves_decoded_values() {
        let mut table = Table::new(10);
        table.add_column("a", "int").unwrap();
        table.add_column("b", "string").unwrap();
        for (a, b) in [(4, "Hello,"), (6, "world"), (3, "!"), (1, "Hello,")] {
            table
                .append(&[Variant::Int32(a), Variant::String(b.to_string())])
                .unwrap();
        }
        table.compress_chunk(ChunkID(0)).unwrap();

        table
            .with_chunk(ChunkID(0), |chunk| {
                assert_eq!(chunk.get(ColumnID(0), 0).unwrap(), Variant::Int32(4));
                assert_eq!(
                    chunk.get(ColumnID(1), 3).unwrap(),
                    Variant::String("Hello,".to_string())
                );
                let seg = chunk.get_segment(ColumnID(0)).unwrap().as_dictionary().unwrap();
                assert_eq!(seg.unique_values_count(), 4);
            })
            .unwrap();
    }

    /// T4/R1: for a larger, randomly generated column (more offsets and
    /// more repeated values than practical to write out by hand),
    /// compressing a chunk must decode back to exactly the original values
    /// in the same order, and the resulting dictionary must be sorted.
    #[test]
    fn compress_chunk_round_trips_random_column() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let original: Vec<i32> = (0..500).map(|_| rng.gen_range(0..50)).collect();

        let mut table = Table::new(original.len() as u32);
        table.add_column("a", "int").unwrap();
        for &v in &original {
            table.append(&[Variant::Int32(v)]).unwrap();
        }
        table.compress_chunk(ChunkID(0)).unwrap();

        table
            .with_chunk(ChunkID(0), |chunk| {
                for (i, &expected) in original.iter().enumerate() {
                    assert_eq!(chunk.get(ColumnID(0), i).unwrap(), Variant::Int32(expected));
                }
                let seg = chunk.get_segment(ColumnID(0)).unwrap().as_dictionary().unwrap();
                assert!(seg.unique_values_count() <= 50);
            })
            .unwrap();
    }
}
