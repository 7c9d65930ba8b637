//! The segment family: three physical encodings sharing one contract
//! (`get`/`append`/`size`/`estimate_memory_usage`), modeled as a sum type
//! per spec.md's Design Notes §9 ("dynamic segment downcast ... replace
//! with a `Segment` sum type whose three arms are the three concrete
//! segments; dispatch is exhaustive `match`").

pub mod dictionary;
pub mod reference;
pub mod value;

pub use dictionary::{DictionarySegment, DictionarySegmentData};
pub use reference::ReferenceSegment;
pub use value::{ValueSegment, ValueSegmentData};

use columnar_types::{ColumnValue, Variant};

use crate::error::{ImmutableReferenceSegmentAppend, Result};

/// One column's storage within one chunk: either raw values, a dictionary
/// encoding, or an indirection into another table via a position list.
#[derive(Debug, Clone)]
pub enum Segment {
    Value(ValueSegment),
    Dictionary(DictionarySegment),
    Reference(ReferenceSegment),
}

impl Segment {
    pub fn get(&self, offset: usize) -> Variant {
        match self {
            Self::Value(s) => s.get(offset),
            Self::Dictionary(s) => s.get(offset),
            Self::Reference(s) => s.get(offset),
        }
    }

    /// Appends a value to this segment.
    ///
    /// - `Value`: type-casts and appends; fails on a type mismatch.
    /// - `Dictionary`: silent no-op (spec.md §7.5 — a preserved quirk).
    /// - `Reference`: a hard error; reference segments are immutable and
    ///   never participate in `Table::append`.
    pub fn append(&mut self, value: &Variant) -> Result<()> {
        match self {
            Self::Value(s) => s.append(value),
            Self::Dictionary(s) => s.append(value),
            Self::Reference(_) => ImmutableReferenceSegmentAppend.fail(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Value(s) => s.size(),
            Self::Dictionary(s) => s.size(),
            Self::Reference(s) => s.size(),
        }
    }

    pub fn estimate_memory_usage(&self) -> usize {
        match self {
            Self::Value(s) => s.estimate_memory_usage(),
            Self::Dictionary(s) => s.estimate_memory_usage(),
            Self::Reference(s) => s.estimate_memory_usage(),
        }
    }

    pub fn as_value(&self) -> Option<&ValueSegment> {
        match self {
            Self::Value(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&DictionarySegment> {
        match self {
            Self::Dictionary(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceSegment> {
        match self {
            Self::Reference(s) => Some(s),
            _ => None,
        }
    }
}

/// Bridges a generic `T: ColumnValue` to the matching arm of the
/// [`ValueSegment`]/[`DictionarySegment`] tagged unions.
///
/// `resolve_data_type`'s visitor pattern (columnar_types) hands code a
/// statically-known `T`; this trait is how that code produces or consumes
/// the right enum arm for `T` without a runtime type check at every call
/// site. Implemented once per closed-set type, trivially.
pub trait TypedSegmentOps: ColumnValue {
    fn wrap_value(data: ValueSegmentData<Self>) -> ValueSegment;
    fn wrap_dictionary(data: DictionarySegmentData<Self>) -> DictionarySegment;
    fn unwrap_value(segment: &ValueSegment) -> Option<&ValueSegmentData<Self>>;
    fn unwrap_dictionary(segment: &DictionarySegment) -> Option<&DictionarySegmentData<Self>>;
}

macro_rules! impl_typed_segment_ops {
    ($t:ty, $arm:ident) => {
        impl TypedSegmentOps for $t {
            fn wrap_value(data: ValueSegmentData<Self>) -> ValueSegment {
                ValueSegment::$arm(data)
            }

            fn wrap_dictionary(data: DictionarySegmentData<Self>) -> DictionarySegment {
                DictionarySegment::$arm(data)
            }

            fn unwrap_value(segment: &ValueSegment) -> Option<&ValueSegmentData<Self>> {
                match segment {
                    ValueSegment::$arm(data) => Some(data),
                    _ => None,
                }
            }

            fn unwrap_dictionary(segment: &DictionarySegment) -> Option<&DictionarySegmentData<Self>> {
                match segment {
                    DictionarySegment::$arm(data) => Some(data),
                    _ => None,
                }
            }
        }
    };
}

impl_typed_segment_ops!(i32, Int32);
impl_typed_segment_ops!(i64, Int64);
impl_typed_segment_ops!(f32, Float32);
impl_typed_segment_ops!(f64, Float64);
impl_typed_segment_ops!(String, String);
