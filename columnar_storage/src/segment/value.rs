//! Uncompressed, mutable segment storage: a plain ordered `Vec<T>`.

use std::mem;

use columnar_types::{ColumnValue, Variant};
use observability_deps::tracing::trace;

use crate::error::Result;

/// Backing storage for one [`super::ValueSegment`] arm.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSegmentData<T> {
    values: Vec<T>,
}

impl<T: ColumnValue> ValueSegmentData<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn get(&self, offset: usize) -> Variant {
        self.values[offset].clone().into_variant()
    }

    pub fn append(&mut self, value: &Variant) -> Result<()> {
        self.values.push(T::type_cast(value)?);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn estimate_memory_usage(&self) -> usize {
        self.values.len() * mem::size_of::<T>()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: ColumnValue> Default for ValueSegmentData<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The closed-set tagged union of `ValueSegmentData<T>` for each logical
/// type: the Rust rendering of one `ValueSegment<T>` template instantiation
/// per type.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSegment {
    Int32(ValueSegmentData<i32>),
    Int64(ValueSegmentData<i64>),
    Float32(ValueSegmentData<f32>),
    Float64(ValueSegmentData<f64>),
    String(ValueSegmentData<String>),
}

impl ValueSegment {
    /// Decodes the value at `offset`. Direct per-offset access like this is
    /// the source's `operator[]` slow path (its `PerformanceWarning
    /// ("operator[] used")` call); a scan dispatches on the segment's
    /// physical encoding instead of going through here row by row.
    pub fn get(&self, offset: usize) -> Variant {
        trace!(offset, "ValueSegment::get direct index access");
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
}
