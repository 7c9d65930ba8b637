//! Identifier newtypes used to address chunks, columns and dictionary
//! entries without mixing up plain `u32`s that happen to mean different
//! things.

use std::fmt;

macro_rules! u32_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// Constructs the id from its raw numeric value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            pub fn get(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value as u32)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.0 as usize
            }
        }
    };
}

u32_id!(ChunkID, "Identifies one chunk within a table's chunk list.");
u32_id!(ChunkOffset, "Identifies one row within a chunk.");
u32_id!(ColumnID, "Identifies one column within a table's schema.");
u32_id!(ValueID, "Identifies one entry within a dictionary segment's dictionary.");

impl ValueID {
    /// Sentinel returned by `lower_bound`/`upper_bound` when no dictionary
    /// entry satisfies the search predicate.
    pub const INVALID: ValueID = ValueID(u32::MAX);

    /// Whether this id is the `INVALID` sentinel.
    pub fn is_invalid(&self) -> bool {
        *self == Self::INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_id_is_max() {
        assert_eq!(ValueID::INVALID, ValueID(u32::MAX));
        assert!(ValueID::INVALID.is_invalid());
        assert!(!ValueID(0).is_invalid());
    }

    #[test]
    fn ids_order_by_numeric_value() {
        assert!(ChunkID(0) < ChunkID(1));
        assert!(ColumnID::from(3usize) == ColumnID(3));
    }
}
