use std::fmt;

use crate::arrays::column::physical_type::PhysicalType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "μs",
            Self::Nanosecond => "ns",
        }
    }
}

/// Logical data types.
///
/// Multiple logical types may share the same physical representation, e.g.
/// dates are stored as 32-bit ints and timestamps as 64-bit ints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Constant null columns.
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    /// Days since epoch.
    Date32,
    /// Timestamp since epoch in the given unit.
    Timestamp(TimeUnit),
    Utf8,
    Binary,
}

impl DataType {
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Null => PhysicalType::UntypedNull,
            Self::Boolean => PhysicalType::Boolean,
            Self::Int8 => PhysicalType::Int8,
            Self::Int16 => PhysicalType::Int16,
            Self::Int32 | Self::Date32 => PhysicalType::Int32,
            Self::Int64 | Self::Timestamp(_) => PhysicalType::Int64,
            Self::Float16 => PhysicalType::Float16,
            Self::Float32 => PhysicalType::Float32,
            Self::Float64 => PhysicalType::Float64,
            Self::Utf8 | Self::Binary => PhysicalType::Binary,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Int8 => write!(f, "Int8"),
            Self::Int16 => write!(f, "Int16"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float16 => write!(f, "Float16"),
            Self::Float32 => write!(f, "Float32"),
            Self::Float64 => write!(f, "Float64"),
            Self::Date32 => write!(f, "Date32"),
            Self::Timestamp(unit) => write!(f, "Timestamp({})", unit.as_str()),
            Self::Utf8 => write!(f, "Utf8"),
            Self::Binary => write!(f, "Binary"),
        }
    }
}
