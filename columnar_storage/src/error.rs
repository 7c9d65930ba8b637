use columnar_types::ColumnID;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("cannot add column to table: table already has {} row(s)", row_count))]
    NonEmptyTableSchemaChange { row_count: u64 },

    #[snafu(display(
        "row arity mismatch: table has {} column(s), row has {} value(s)",
        column_count,
        row_len
    ))]
    RowArityMismatch { column_count: usize, row_len: usize },

    #[snafu(display("no column named '{}' in this table", name))]
    ColumnNotFound { name: String },

    #[snafu(display("no chunk with id {}", chunk_id))]
    ChunkNotFound { chunk_id: u32 },

    #[snafu(display("no column with id {}", column_id.get()))]
    ColumnIdOutOfRange { column_id: ColumnID },

    #[snafu(display("ReferenceSegment is immutable and cannot be appended to"))]
    ImmutableReferenceSegmentAppend,

    #[snafu(display("type error while building or appending a segment: {}", source))]
    TypeError { source: columnar_types::Error },
}

impl From<columnar_types::Error> for Error {
    fn from(source: columnar_types::Error) -> Self {
        Self::TypeError { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
