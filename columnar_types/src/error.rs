use snafu::Snafu;

use crate::variant::Variant;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "type cast failed: cannot cast {:?} to column type '{}'",
        value,
        target_type
    ))]
    TypeCastFailed {
        value: Variant,
        target_type: &'static str,
    },

    #[snafu(display(
        "unknown column type tag '{}' (expected one of: int, long, float, double, string)",
        tag
    ))]
    UnknownTypeTag { tag: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
