//! The closed logical type set, the type-erased [`Variant`] value carrier,
//! and the `resolve_data_type` pivot that turns a runtime type tag into a
//! statically-typed call.
//!
//! This is the Rust rendering of the source's compile-time template
//! dispatched at runtime by a type-tag string: there the compiler
//! instantiates one `TableScan<T>` per logical type and a tag string picks
//! which instantiation runs. A sum type can't carry "the type currently
//! being handled" as a type parameter, so the pivot becomes a `match` over
//! [`LogicalType`] whose arms each call a generic function/method once,
//! instantiated for that arm's concrete `T` (the [`TypeVisitor`] below).

use std::fmt;

use crate::error::{Result, TypeCastFailed, UnknownTypeTag};

/// The closed set of logical column types this storage engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
}

impl LogicalType {
    /// The external type tag string, as used in column schemas and
    /// `StorageManager::print` output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::Float32 => "float",
            Self::Float64 => "double",
            Self::String => "string",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "int" => Ok(Self::Int32),
            "long" => Ok(Self::Int64),
            "float" => Ok(Self::Float32),
            "double" => Ok(Self::Float64),
            "string" => Ok(Self::String),
            other => UnknownTypeTag { tag: other }.fail(),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A type-erased carrier of exactly one value of one of the logical types.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Variant {
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Self::Int32(_) => LogicalType::Int32,
            Self::Int64(_) => LogicalType::Int64,
            Self::Float32(_) => LogicalType::Float32,
            Self::Float64(_) => LogicalType::Float64,
            Self::String(_) => LogicalType::String,
        }
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}
impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}
impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Self::Float32(v)
    }
}
impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}
impl From<String> for Variant {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// A concrete Rust type that backs one arm of [`LogicalType`].
///
/// Implemented for exactly the five closed-set types. `type_cast` permits
/// widening between `int32`/`int64` and between `float32`/`float64` (in
/// either direction — the source's `AllTypeVariant` cast is a plain numeric
/// conversion, not a checked narrowing guard); `string` never casts to or
/// from a numeric type.
pub trait ColumnValue:
    Clone + fmt::Debug + PartialOrd + PartialEq + Send + Sync + 'static
{
    const LOGICAL_TYPE: LogicalType;

    /// Type-casts a type-erased value into this concrete type. Fails when
    /// the variant holds an incompatible logical type (string <-> numeric).
    fn type_cast(value: &Variant) -> Result<Self>;

    fn into_variant(self) -> Variant;
}

impl ColumnValue for i32 {
    const LOGICAL_TYPE: LogicalType = LogicalType::Int32;

    fn type_cast(value: &Variant) -> Result<Self> {
        match value {
            Variant::Int32(v) => Ok(*v),
            Variant::Int64(v) => Ok(*v as i32),
            _ => TypeCastFailed {
                value: value.clone(),
                target_type: Self::LOGICAL_TYPE.tag(),
            }
            .fail(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant::Int32(self)
    }
}

impl ColumnValue for i64 {
    const LOGICAL_TYPE: LogicalType = LogicalType::Int64;

    fn type_cast(value: &Variant) -> Result<Self> {
        match value {
            Variant::Int64(v) => Ok(*v),
            Variant::Int32(v) => Ok(*v as i64),
            _ => TypeCastFailed {
                value: value.clone(),
                target_type: Self::LOGICAL_TYPE.tag(),
            }
            .fail(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant::Int64(self)
    }
}

impl ColumnValue for f32 {
    const LOGICAL_TYPE: LogicalType = LogicalType::Float32;

    fn type_cast(value: &Variant) -> Result<Self> {
        match value {
            Variant::Float32(v) => Ok(*v),
            Variant::Float64(v) => Ok(*v as f32),
            _ => TypeCastFailed {
                value: value.clone(),
                target_type: Self::LOGICAL_TYPE.tag(),
            }
            .fail(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant::Float32(self)
    }
}

impl ColumnValue for f64 {
    const LOGICAL_TYPE: LogicalType = LogicalType::Float64;

    fn type_cast(value: &Variant) -> Result<Self> {
        match value {
            Variant::Float64(v) => Ok(*v),
            Variant::Float32(v) => Ok(*v as f64),
            _ => TypeCastFailed {
                value: value.clone(),
                target_type: Self::LOGICAL_TYPE.tag(),
            }
            .fail(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant::Float64(self)
    }
}

impl ColumnValue for String {
    const LOGICAL_TYPE: LogicalType = LogicalType::String;

    fn type_cast(value: &Variant) -> Result<Self> {
        match value {
            Variant::String(v) => Ok(v.clone()),
            _ => TypeCastFailed {
                value: value.clone(),
                target_type: Self::LOGICAL_TYPE.tag(),
            }
            .fail(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant::String(self)
    }
}

/// A callback specialized to a concrete [`ColumnValue`] type, the generic
/// function `resolve_data_type` invokes once it has matched the runtime
/// type tag to a `LogicalType` arm.
pub trait TypeVisitor {
    type Output;

    fn visit<T: ColumnValue>(self) -> Self::Output;
}

/// The type-directed dispatch pivot: resolves `type_tag` to a
/// [`LogicalType`] and invokes `visitor` with the matching concrete type
/// statically substituted for `T`.
pub fn resolve_data_type<V: TypeVisitor>(type_tag: &str, visitor: V) -> Result<V::Output> {
    Ok(match LogicalType::from_tag(type_tag)? {
        LogicalType::Int32 => visitor.visit::<i32>(),
        LogicalType::Int64 => visitor.visit::<i64>(),
        LogicalType::Float32 => visitor.visit::<f32>(),
        LogicalType::Float64 => visitor.visit::<f64>(),
        LogicalType::String => visitor.visit::<String>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_cast_between_int_widths() {
        assert_eq!(i64::type_cast(&Variant::Int32(7)).unwrap(), 7i64);
        assert_eq!(i32::type_cast(&Variant::Int64(7)).unwrap(), 7i32);
    }

    #[test]
    fn widening_cast_between_float_widths() {
        assert_eq!(f64::type_cast(&Variant::Float32(1.5)).unwrap(), 1.5f64);
        assert_eq!(f32::type_cast(&Variant::Float64(1.5)).unwrap(), 1.5f32);
    }

    #[test]
    fn string_numeric_cast_is_an_error() {
        assert!(i32::type_cast(&Variant::String("x".into())).is_err());
        assert!(String::type_cast(&Variant::Int32(1)).is_err());
    }

    #[test]
    fn unknown_type_tag_is_an_error() {
        assert!(LogicalType::from_tag("bool").is_err());
    }

    struct TagOf;
    impl TypeVisitor for TagOf {
        type Output = &'static str;
        fn visit<T: ColumnValue>(self) -> Self::Output {
            T::LOGICAL_TYPE.tag()
        }
    }

    #[test]
    fn resolve_data_type_dispatches_to_matching_arm() {
        assert_eq!(resolve_data_type("long", TagOf).unwrap(), "long");
        assert_eq!(resolve_data_type("string", TagOf).unwrap(), "string");
    }
}
