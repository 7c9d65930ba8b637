//! Dictionary-compressed, immutable segment storage: a sorted, deduplicated
//! dictionary plus an [`AttributeVector`] of indices into it.

use attribute_vector::{AttributeVector, Width};
use columnar_types::{ColumnValue, ValueID, Variant};
use observability_deps::tracing::trace;

use crate::error::Result;

/// Backing storage for one [`super::DictionarySegment`] arm.
///
/// Invariants (spec.md T4): `dictionary` is strictly increasing; every
/// `attribute_vector` entry is a valid index into `dictionary`; decoding
/// offset `i` (`dictionary[attribute_vector.get(i)]`) reproduces the
/// original segment's value at `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionarySegmentData<T> {
    dictionary: Vec<T>,
    attribute_vector: AttributeVector,
}

impl<T: ColumnValue> DictionarySegmentData<T> {
    /// Builds a dictionary segment from a column's original, decoded
    /// values, following spec.md §4.E.1 steps 2-5: sort+dedupe into a
    /// dictionary, pick the narrowest attribute-vector width the
    /// cardinality allows, then binary-search each original value into its
    /// dictionary index.
    ///
    /// Assumes `values` contains no NaN-like "doesn't compare to itself"
    /// entries — `partial_cmp` is unwrapped when sorting, matching the
    /// source's reliance on a plain `std::sort` over the column's values.
    pub fn build(values: Vec<T>) -> Self {
        let mut dictionary = values.clone();
        dictionary.sort_by(|a, b| {
            a.partial_cmp(b)
                .expect("column value did not compare (NaN?) while building dictionary")
        });
        dictionary.dedup_by(|a, b| a == b);

        let width = Width::for_cardinality(dictionary.len());
        let mut attribute_vector = AttributeVector::new(width, values.len());
        for (i, value) in values.iter().enumerate() {
            let value_id = lower_bound_idx(&dictionary, value);
            debug_assert!(
                value_id < dictionary.len() && dictionary[value_id] == *value,
                "value must be present in the dictionary built from itself"
            );
            attribute_vector.set(i, ValueID(value_id as u32));
        }

        Self {
            dictionary,
            attribute_vector,
        }
    }

    pub fn get(&self, offset: usize) -> Variant {
        let value_id = self.attribute_vector.get(offset);
        self.dictionary[value_id.0 as usize].clone().into_variant()
    }

    /// `DictionarySegment::append` is a silent no-op (spec.md §7.5): the
    /// segment is immutable, but appending to it is not an error.
    pub fn append(&mut self, _value: &Variant) -> Result<()> {
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.attribute_vector.size()
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.attribute_vector.estimate_memory_usage()
            + self.dictionary.len() * std::mem::size_of::<T>()
    }

    pub fn dictionary(&self) -> &[T] {
        &self.dictionary
    }

    pub fn attribute_vector(&self) -> &AttributeVector {
        &self.attribute_vector
    }

    pub fn value_by_value_id(&self, value_id: ValueID) -> &T {
        &self.dictionary[value_id.0 as usize]
    }

    pub fn unique_values_count(&self) -> usize {
        self.dictionary.len()
    }

    /// First `ValueID` whose dictionary entry is `>= value`, or
    /// [`ValueID::INVALID`] when every entry is smaller.
    pub fn lower_bound(&self, value: &T) -> ValueID {
        let idx = lower_bound_idx(&self.dictionary, value);
        if idx == self.dictionary.len() {
            ValueID::INVALID
        } else {
            ValueID(idx as u32)
        }
    }

    /// First `ValueID` whose dictionary entry is `> value`, or
    /// [`ValueID::INVALID`] when every entry is smaller-or-equal.
    pub fn upper_bound(&self, value: &T) -> ValueID {
        let idx = upper_bound_idx(&self.dictionary, value);
        if idx == self.dictionary.len() {
            ValueID::INVALID
        } else {
            ValueID(idx as u32)
        }
    }
}

fn lower_bound_idx<T: PartialOrd>(dictionary: &[T], value: &T) -> usize {
    let mut lo = 0usize;
    let mut hi = dictionary.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if dictionary[mid] < *value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

fn upper_bound_idx<T: PartialOrd>(dictionary: &[T], value: &T) -> usize {
    let mut lo = 0usize;
    let mut hi = dictionary.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if dictionary[mid] <= *value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// The closed-set tagged union of `DictionarySegmentData<T>` for each
/// logical type.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionarySegment {
    Int32(DictionarySegmentData<i32>),
    Int64(DictionarySegmentData<i64>),
    Float32(DictionarySegmentData<f32>),
    Float64(DictionarySegmentData<f64>),
    String(DictionarySegmentData<String>),
}

impl DictionarySegment {
    /// Decodes the value at `offset` via a dictionary lookup. Like
    /// `ValueSegment::get`, this is the source's flagged `operator[]` slow
    /// path rather than a scan's bound-lookup fast path.
    pub fn get(&self, offset: usize) -> Variant {
        trace!(offset, "DictionarySegment::get direct index access");
        match self {
            Self::Int32(s) => s.get(offset),
            Self::Int64(s) => s.get(offset),
            Self::Float32(s) => s.get(offset),
            Self::Float64(s) => s.get(offset),
            Self::String(s) => s.get(offset),
        }
    }

    pub fn append(&mut self, value: &Variant) -> Result<()> {
        match self {
            Self::Int32(s) => s.append(value),
            Self::Int64(s) => s.append(value),
            Self::Float32(s) => s.append(value),
            Self::Float64(s) => s.append(value),
            Self::String(s) => s.append(value),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Int32(s) => s.size(),
            Self::Int64(s) => s.size(),
            Self::Float32(s) => s.size(),
            Self::Float64(s) => s.size(),
            Self::String(s) => s.size(),
        }
    }

    pub fn estimate_memory_usage(&self) -> usize {
        match self {
            Self::Int32(s) => s.estimate_memory_usage(),
            Self::Int64(s) => s.estimate_memory_usage(),
            Self::Float32(s) => s.estimate_memory_usage(),
            Self::Float64(s) => s.estimate_memory_usage(),
            Self::String(s) => s.estimate_memory_usage(),
        }
    }

    pub fn unique_values_count(&self) -> usize {
        match self {
            Self::Int32(s) => s.unique_values_count(),
            Self::Int64(s) => s.unique_values_count(),
            Self::Float32(s) => s.unique_values_count(),
            Self::Float64(s) => s.unique_values_count(),
            Self::String(s) => s.unique_values_count(),
        }
    }

    pub fn attribute_vector(&self) -> &AttributeVector {
        match self {
            Self::Int32(s) => s.attribute_vector(),
            Self::Int64(s) => s.attribute_vector(),
            Self::Float32(s) => s.attribute_vector(),
            Self::Float64(s) => s.attribute_vector(),
            Self::String(s) => s.attribute_vector(),
        }
    }
}
