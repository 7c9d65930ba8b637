//! `TableScan` (spec.md §4.I): the type- and encoding-dispatched predicate
//! evaluator. Given an upstream operator, a column, a comparison operator
//! and a search value, it produces a table whose columns are all
//! `ReferenceSegment`s sharing one position list — without copying a
//! single underlying value.
//!
//! The dispatch on logical type (`match input_table.column_type(column)`)
//! stands in for the source's compile-time `TableScan<T>` template
//! instantiation (spec.md §9); the dispatch on physical encoding
//! (`match segment { Value | Dictionary | Reference }`) stands in for its
//! dynamic downcast attempts. Both are exhaustive Rust `match`es, so
//! neither "unknown type tag" nor "unknown physical encoding" can reach
//! the scan at all — only the `ScanType is not defined` error kind from
//! spec.md §7 survives as a live code path, and even that is unreachable
//! here because `ScanType` is itself a closed, exhaustively-matched enum;
//! see DESIGN.md.

use std::sync::Arc;

use columnar_storage::segment::DictionarySegmentData;
use columnar_storage::{Chunk, ReferenceSegment, Segment, Table, TypedSegmentOps};
use columnar_types::{ChunkID, ChunkOffset, ColumnID, ColumnValue, LogicalType, PosList, RowID, Variant};
use observability_deps::tracing::debug;

use crate::error::Result;
use crate::operator::{ExecutionState, Operator};

/// The six comparison operators a scan can evaluate (spec.md §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
}

#[derive(Debug)]
pub struct TableScan {
    input: Arc<dyn Operator>,
    column: ColumnID,
    scan_type: ScanType,
    search: Variant,
    state: ExecutionState,
}

impl TableScan {
    pub fn new(input: Arc<dyn Operator>, column: ColumnID, scan_type: ScanType, search: Variant) -> Self {
        Self {
            input,
            column,
            scan_type,
            search,
            state: ExecutionState::new(),
        }
    }
}

impl Operator for TableScan {
    fn on_execute(&self) -> Result<Arc<Table>> {
        let input_table = self.input.execute()?;
        let logical_type = input_table.column_type(self.column);
        debug!(
            column = self.column.get(),
            ?logical_type,
            scan_type = ?self.scan_type,
            chunk_count = input_table.chunk_count().get(),
            "running table scan"
        );

        let pos_list = match logical_type {
            LogicalType::Int32 => scan_typed::<i32>(&input_table, self.column, self.scan_type, &self.search)?,
            LogicalType::Int64 => scan_typed::<i64>(&input_table, self.column, self.scan_type, &self.search)?,
            LogicalType::Float32 => {
                scan_typed::<f32>(&input_table, self.column, self.scan_type, &self.search)?
            }
            LogicalType::Float64 => {
                scan_typed::<f64>(&input_table, self.column, self.scan_type, &self.search)?
            }
            LogicalType::String => {
                scan_typed::<String>(&input_table, self.column, self.scan_type, &self.search)?
            }
        };

        let pos_list = Arc::new(pos_list);
        let mut chunk = Chunk::empty();
        for c in 0..input_table.column_count() {
            let column_id = ColumnID::from(c);
            let reference =
                ReferenceSegment::new(Arc::clone(&input_table), column_id, Arc::clone(&pos_list))?;
            chunk.add_segment(Segment::Reference(reference));
        }

        let output = Table::from_single_chunk(
            input_table.column_names().to_vec(),
            input_table.column_types().to_vec(),
            chunk,
        );
        Ok(Arc::new(output))
    }

    fn execution_state(&self) -> &ExecutionState {
        &self.state
    }
}

/// Evaluates the scan for one logical type `T`, producing the matching
/// `PosList` in chunk-major, offset-ascending order (spec.md §4.I,
/// Ordering guarantees in §5).
fn scan_typed<T>(table: &Table, column: ColumnID, op: ScanType, search: &Variant) -> Result<PosList>
where
    T: ColumnValue + TypedSegmentOps,
{
    let search = T::type_cast(search)?;
    let mut pos_list = PosList::new();
    for idx in 0..table.chunk_count().get() {
        let chunk_id = ChunkID(idx);
        table
            .with_chunk(chunk_id, |chunk| -> Result<()> {
                scan_chunk_column::<T>(chunk, chunk_id, column, op, &search, &mut pos_list)
            })??;
    }
    Ok(pos_list)
}

fn scan_chunk_column<T>(
    chunk: &Chunk,
    chunk_id: ChunkID,
    column: ColumnID,
    op: ScanType,
    search: &T,
    pos_list: &mut PosList,
) -> Result<()>
where
    T: ColumnValue + TypedSegmentOps,
{
    match chunk.get_segment(column)? {
        Segment::Value(segment) => {
            let data = T::unwrap_value(segment)
                .expect("column schema guarantees this segment's physical type matches T");
            for (offset, value) in data.values().iter().enumerate() {
                if value_matches(op, value, search) {
                    pos_list.push(RowID::new(chunk_id, ChunkOffset::from(offset)));
                }
            }
        }
        Segment::Dictionary(segment) => {
            let data = T::unwrap_dictionary(segment)
                .expect("column schema guarantees this segment's physical type matches T");
            let test = dictionary_offset_test(data, op, search);
            let av = data.attribute_vector();
            for offset in 0..data.size() {
                if test.matches(av.get(offset).get()) {
                    pos_list.push(RowID::new(chunk_id, ChunkOffset::from(offset)));
                }
            }
        }
        Segment::Reference(segment) => {
            scan_reference_segment::<T>(segment, column, op, search, pos_list)?;
        }
    }
    Ok(())
}

/// Evaluates the scan over a `ReferenceSegment` by grouping its position
/// list into maximal runs of equal `chunk_id` (spec.md §4.I step 3's
/// "ReferenceSegment" branch) and recursing into the value/dictionary
/// branch above once per run, using the run's offsets as the filter.
/// Grouping only batches the per-chunk dispatch; it does not change which
/// rows are emitted or their order relative to a naive per-offset decode.
fn scan_reference_segment<T>(
    reference: &ReferenceSegment,
    column: ColumnID,
    op: ScanType,
    search: &T,
    pos_list: &mut PosList,
) -> Result<()>
where
    T: ColumnValue + TypedSegmentOps,
{
    let rows = reference.pos_list();
    let referenced_table = reference.referenced_table();
    let referenced_column = reference.referenced_column_id();

    let len = rows.len();
    let mut i = 0;
    while i < len {
        let chunk_id = rows.get(i).expect("i < len").chunk_id;
        let mut offsets = Vec::new();
        let mut j = i;
        while j < len {
            let row = rows.get(j).expect("j < len");
            if row.chunk_id != chunk_id {
                break;
            }
            offsets.push(row.chunk_offset);
            j += 1;
        }

        referenced_table
            .with_chunk(chunk_id, |chunk| -> Result<()> {
                match chunk.get_segment(referenced_column)? {
                    Segment::Value(segment) => {
                        let data = T::unwrap_value(segment)
                            .expect("column schema guarantees this segment's physical type matches T");
                        for &offset in &offsets {
                            let value = &data.values()[usize::from(offset)];
                            if value_matches(op, value, search) {
                                pos_list.push(RowID::new(chunk_id, offset));
                            }
                        }
                    }
                    Segment::Dictionary(segment) => {
                        let data = T::unwrap_dictionary(segment)
                            .expect("column schema guarantees this segment's physical type matches T");
                        let test = dictionary_offset_test(data, op, search);
                        let av = data.attribute_vector();
                        for &offset in &offsets {
                            if test.matches(av.get(usize::from(offset)).get()) {
                                pos_list.push(RowID::new(chunk_id, offset));
                            }
                        }
                    }
                    Segment::Reference(_) => unreachable!(
                        "ReferenceSegment construction flattens reference chains (spec.md T5)"
                    ),
                }
                Ok(())
            })??;

        i = j;
    }
    Ok(())
}

fn value_matches<T: PartialOrd>(op: ScanType, value: &T, search: &T) -> bool {
    match op {
        ScanType::Equals => value == search,
        ScanType::NotEquals => value != search,
        ScanType::LessThan => value < search,
        ScanType::LessThanEquals => value <= search,
        ScanType::GreaterThan => value > search,
        ScanType::GreaterThanEquals => value >= search,
    }
}

/// A per-offset test against dictionary indices, precomputed once per
/// chunk rather than re-deriving the bound on every offset.
enum OffsetTest {
    None,
    All,
    LessThan(u32),
    GreaterOrEqual(u32),
    EqualTo(u32),
    NotEqualTo(u32),
}

impl OffsetTest {
    fn matches(&self, value_id: u32) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::LessThan(threshold) => value_id < *threshold,
            Self::GreaterOrEqual(threshold) => value_id >= *threshold,
            Self::EqualTo(threshold) => value_id == *threshold,
            Self::NotEqualTo(threshold) => value_id != *threshold,
        }
    }
}

/// Translates `op` into a dictionary-domain `ValueID` test, following the
/// bound-lookup / per-offset-test / empty-bound-fallback table in
/// spec.md §4.I step 3. Each arm is special-cased rather than computed
/// uniformly from the `INVALID` sentinel's numeric value, because a naive
/// "treat INVALID as a huge ValueID" trick would silently flip `<`/`>`/`=`/
/// `>=`'s fallback from "emit nothing" to "emit everything" — the
/// spec is explicit that only `!=` and `<=` get the "emit everything"
/// fallback.
fn dictionary_offset_test<T: ColumnValue>(
    segment: &DictionarySegmentData<T>,
    op: ScanType,
    search: &T,
) -> OffsetTest {
    let equals_bound_valid = |value_id: columnar_types::ValueID| {
        !value_id.is_invalid() && segment.value_by_value_id(value_id) == search
    };

    match op {
        ScanType::Equals => {
            let lb = segment.lower_bound(search);
            if equals_bound_valid(lb) {
                OffsetTest::EqualTo(lb.get())
            } else {
                OffsetTest::None
            }
        }
        ScanType::NotEquals => {
            let lb = segment.lower_bound(search);
            if equals_bound_valid(lb) {
                OffsetTest::NotEqualTo(lb.get())
            } else {
                OffsetTest::All
            }
        }
        ScanType::LessThan => {
            let lb = segment.lower_bound(search);
            if lb.is_invalid() {
                OffsetTest::None
            } else {
                OffsetTest::LessThan(lb.get())
            }
        }
        ScanType::LessThanEquals => {
            let ub = segment.upper_bound(search);
            if ub.is_invalid() {
                OffsetTest::All
            } else {
                OffsetTest::LessThan(ub.get())
            }
        }
        ScanType::GreaterThan => {
            let ub = segment.upper_bound(search);
            if ub.is_invalid() {
                OffsetTest::None
            } else {
                OffsetTest::GreaterOrEqual(ub.get())
            }
        }
        ScanType::GreaterThanEquals => {
            let lb = segment.lower_bound(search);
            if lb.is_invalid() {
                OffsetTest::None
            } else {
                OffsetTest::GreaterOrEqual(lb.get())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::get_table::GetTable;
    use storage_manager::StorageManager;

    fn registered(values: &[i32]) -> (Arc<StorageManager>, Arc<dyn Operator>) {
        let manager = Arc::new(StorageManager::new());
        let mut table = Table::new(10);
        table.add_column("col", "int").unwrap();
        for &v in values {
            table.append(&[Variant::Int32(v)]).unwrap();
        }
        manager.add_table("t", table);
        let get_table: Arc<dyn Operator> = Arc::new(GetTable::new(Arc::clone(&manager), "t"));
        (manager, get_table)
    }

    fn pos_list_offsets(table: &Table) -> Vec<(u32, u32)> {
        table
            .with_chunk(ChunkID(0), |chunk| {
                let segment = chunk.get_segment(ColumnID(0)).unwrap();
                match segment {
                    Segment::Reference(r) => r
                        .pos_list()
                        .iter()
                        .map(|row| (row.chunk_id.get(), row.chunk_offset.get()))
                        .collect(),
                    _ => panic!("scan output column must be a ReferenceSegment"),
                }
            })
            .unwrap()
    }

    #[test]
    fn s3_scan_over_value_segment() {
        let (_manager, input) = registered(&[4, 6, 3, 8, 5]);
        let scan = TableScan::new(input, ColumnID(0), ScanType::GreaterThan, Variant::Int32(4));
        let output = scan.execute().unwrap();
        assert_eq!(pos_list_offsets(&output), vec![(0, 1), (0, 3), (0, 4)]);
    }

    #[test]
    fn s4_scan_over_dictionary_segment_matches_value_segment() {
        let manager = Arc::new(StorageManager::new());
        let mut table = Table::new(10);
        table.add_column("col", "int").unwrap();
        for v in [4, 6, 3, 8, 5] {
            table.append(&[Variant::Int32(v)]).unwrap();
        }
        table.compress_chunk(ChunkID(0)).unwrap();
        manager.add_table("t", table);
        let input: Arc<dyn Operator> = Arc::new(GetTable::new(manager, "t"));

        let scan = TableScan::new(input, ColumnID(0), ScanType::GreaterThan, Variant::Int32(4));
        let output = scan.execute().unwrap();
        assert_eq!(pos_list_offsets(&output), vec![(0, 1), (0, 3), (0, 4)]);
    }

    #[test]
    fn s5_scan_of_scan_flattens_reference_chain() {
        let (_manager, input) = registered(&[4, 6, 3, 8, 5]);

        let scan1: Arc<dyn Operator> = Arc::new(TableScan::new(
            input,
            ColumnID(0),
            ScanType::GreaterThan,
            Variant::Int32(3),
        ));
        let scan2 = TableScan::new(scan1, ColumnID(0), ScanType::LessThan, Variant::Int32(8));
        let output = scan2.execute().unwrap();
        assert_eq!(pos_list_offsets(&output), vec![(0, 0), (0, 1), (0, 4)]);

        // The flattening invariant (spec.md T5): the final output's
        // reference segment must point at the *original* table, not at
        // scan1's intermediate one.
        output
            .with_chunk(ChunkID(0), |chunk| {
                let segment = chunk.get_segment(ColumnID(0)).unwrap().as_reference().unwrap();
                assert_eq!(segment.referenced_table().column_count(), 1);
            })
            .unwrap();
    }

    #[test]
    fn s6_not_equals_out_of_range_search_emits_every_row() {
        let (_manager, input) = registered(&[1, 2, 3]);
        let scan = TableScan::new(
            Arc::clone(&input),
            ColumnID(0),
            ScanType::NotEquals,
            Variant::Int32(100),
        );
        let output = scan.execute().unwrap();
        assert_eq!(pos_list_offsets(&output), vec![(0, 0), (0, 1), (0, 2)]);

        let scan_eq = TableScan::new(input, ColumnID(0), ScanType::Equals, Variant::Int32(100));
        let output_eq = scan_eq.execute().unwrap();
        assert!(pos_list_offsets(&output_eq).is_empty());
    }

    #[test]
    fn b1_dictionary_le_search_past_dictionary_end_emits_all_rows() {
        let manager = Arc::new(StorageManager::new());
        let mut table = Table::new(10);
        table.add_column("col", "int").unwrap();
        for v in [1, 2, 3] {
            table.append(&[Variant::Int32(v)]).unwrap();
        }
        table.compress_chunk(ChunkID(0)).unwrap();
        manager.add_table("t", table);
        let input: Arc<dyn Operator> = Arc::new(GetTable::new(manager, "t"));

        let scan = TableScan::new(input, ColumnID(0), ScanType::LessThanEquals, Variant::Int32(100));
        let output = scan.execute().unwrap();
        assert_eq!(pos_list_offsets(&output).len(), 3);
    }

    #[test]
    fn r2_not_equals_is_the_complement_of_equals() {
        let (_manager, input) = registered(&[4, 6, 3, 8, 5, 4]);

        let eq = TableScan::new(Arc::clone(&input), ColumnID(0), ScanType::Equals, Variant::Int32(4));
        let ne = TableScan::new(input, ColumnID(0), ScanType::NotEquals, Variant::Int32(4));

        let eq_offsets: std::collections::BTreeSet<_> =
            pos_list_offsets(&eq.execute().unwrap()).into_iter().collect();
        let ne_offsets: std::collections::BTreeSet<_> =
            pos_list_offsets(&ne.execute().unwrap()).into_iter().collect();

        assert!(eq_offsets.is_disjoint(&ne_offsets));
        assert_eq!(eq_offsets.len() + ne_offsets.len(), 6);
    }

    /// R1-adjacent property: scanning a randomly generated column must
    /// produce the same `PosList` whether the underlying chunk is a plain
    /// value segment or has since been dictionary-compressed, across
    /// several comparison operators.
    #[test]
    fn scan_result_is_unaffected_by_dictionary_compression() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let values: Vec<i32> = (0..200).map(|_| rng.gen_range(0..20)).collect();
        let search = rng.gen_range(0..20);

        for op in [
            ScanType::Equals,
            ScanType::NotEquals,
            ScanType::LessThan,
            ScanType::LessThanEquals,
            ScanType::GreaterThan,
            ScanType::GreaterThanEquals,
        ] {
            let manager = Arc::new(StorageManager::new());
            let mut uncompressed = Table::new(values.len() as u32);
            uncompressed.add_column("col", "int").unwrap();
            for &v in &values {
                uncompressed.append(&[Variant::Int32(v)]).unwrap();
            }
            manager.add_table("uncompressed", uncompressed);

            let mut compressed = Table::new(values.len() as u32);
            compressed.add_column("col", "int").unwrap();
            for &v in &values {
                compressed.append(&[Variant::Int32(v)]).unwrap();
            }
            compressed.compress_chunk(ChunkID(0)).unwrap();
            manager.add_table("compressed", compressed);

            let plain: Arc<dyn Operator> = Arc::new(GetTable::new(Arc::clone(&manager), "uncompressed"));
            let dict: Arc<dyn Operator> = Arc::new(GetTable::new(Arc::clone(&manager), "compressed"));

            let plain_out = TableScan::new(plain, ColumnID(0), op, Variant::Int32(search))
                .execute()
                .unwrap();
            let dict_out = TableScan::new(dict, ColumnID(0), op, Variant::Int32(search))
                .execute()
                .unwrap();

            assert_eq!(
                pos_list_offsets(&plain_out),
                pos_list_offsets(&dict_out),
                "op {:?} disagreed between value and dictionary segments",
                op
            );
        }
    }

    #[test]
    fn b4_empty_input_table_scan_has_empty_pos_list() {
        let (_manager, input) = registered(&[]);
        let scan = TableScan::new(input, ColumnID(0), ScanType::Equals, Variant::Int32(1));
        let output = scan.execute().unwrap();
        assert_eq!(output.chunk_count(), ChunkID(1));
        assert!(pos_list_offsets(&output).is_empty());
    }
}
