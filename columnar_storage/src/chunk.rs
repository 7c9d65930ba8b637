//! A `Chunk` is a horizontal partition of a table: one [`Segment`] per
//! column, all holding the same number of rows.

use columnar_types::{ColumnID, Variant};
use snafu::ensure;

use crate::error::{ColumnIdOutOfRange, Result, RowArityMismatch};
use crate::segment::Segment;

#[derive(Debug, Clone, Default)]
pub struct Chunk {
    segments: Vec<Segment>,
}

impl Chunk {
    /// A chunk with no segments yet (no columns added), matching a freshly
    /// constructed `Table`'s single starting chunk.
    pub fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Appends one row: `values[i]` is forwarded to column `i`'s segment.
    pub fn append(&mut self, values: &[Variant]) -> Result<()> {
        ensure!(
            values.len() == self.column_count(),
            RowArityMismatch {
                column_count: self.column_count(),
                row_len: values.len(),
            }
        );

        for (segment, value) in self.segments.iter_mut().zip(values) {
            segment.append(value)?;
        }
        Ok(())
    }

    pub fn get_segment(&self, column_id: ColumnID) -> Result<&Segment> {
        self.segments
            .get(usize::from(column_id))
            .ok_or_else(|| ColumnIdOutOfRange { column_id }.build())
    }

    pub fn column_count(&self) -> usize {
        self.segments.len()
    }

    /// The chunk's row count: the size of its first segment, or `0` if the
    /// chunk has no segments yet (spec.md §3).
    pub fn size(&self) -> usize {
        self.segments.first().map(|s| s.size()).unwrap_or(0)
    }

    /// Decodes the value at `(column_id, offset)`.
    pub fn get(&self, column_id: ColumnID, offset: usize) -> Result<Variant> {
        Ok(self.get_segment(column_id)?.get(offset))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.segments.iter().map(|s| s.estimate_memory_usage()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::value::ValueSegmentData;
    use crate::segment::ValueSegment;

    fn int_chunk() -> Chunk {
        let mut chunk = Chunk::empty();
        chunk.add_segment(Segment::Value(ValueSegment::Int32(ValueSegmentData::new())));
        chunk
    }

    #[test]
    fn size_is_zero_with_no_segments() {
        assert_eq!(Chunk::empty().size(), 0);
    }

    #[test]
    fn append_requires_matching_arity() {
        let mut chunk = int_chunk();
        assert!(chunk.append(&[Variant::Int32(1), Variant::Int32(2)]).is_err());
        assert!(chunk.append(&[Variant::Int32(1)]).is_ok());
        assert_eq!(chunk.size(), 1);
    }
}
