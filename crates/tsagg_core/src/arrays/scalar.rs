use std::fmt;

use half::f16;
use tsagg_error::{DbError, Result};

use super::datatype::{DataType, TimeUnit};

/// A single owned value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float16(f16),
    Float32(f32),
    Float64(f64),
    Date32(i32),
    Timestamp(TimeUnit, i64),
    Utf8(String),
    Binary(Vec<u8>),
}

impl ScalarValue {
    pub const fn datatype(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float16(_) => DataType::Float16,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Date32(_) => DataType::Date32,
            Self::Timestamp(unit, _) => DataType::Timestamp(*unit),
            Self::Utf8(_) => DataType::Utf8,
            Self::Binary(_) => DataType::Binary,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn try_as_i64(&self) -> Result<i64> {
        match self {
            Self::Int8(i) => Ok(*i as i64),
            Self::Int16(i) => Ok(*i as i64),
            Self::Int32(i) => Ok(*i as i64),
            Self::Int64(i) => Ok(*i),
            other => Err(DbError::invalid_argument(format!("Not an integer: {other}"))),
        }
    }

    pub fn try_as_u64(&self) -> Result<u64> {
        let v = self.try_as_i64()?;
        u64::try_from(v).map_err(|_| {
            DbError::invalid_argument(format!("Expected a non-negative integer, got {v}"))
        })
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float16(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Date32(v) => write!(f, "date({v})"),
            Self::Timestamp(unit, v) => write!(f, "{v}{}", unit.as_str()),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Binary(v) => {
                write!(f, "\\x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($prim:ty, $variant:ident) => {
        impl From<$prim> for ScalarValue {
            fn from(value: $prim) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_from_scalar!(bool, Boolean);
impl_from_scalar!(i8, Int8);
impl_from_scalar!(i16, Int16);
impl_from_scalar!(i32, Int32);
impl_from_scalar!(i64, Int64);
impl_from_scalar!(f16, Float16);
impl_from_scalar!(f32, Float32);
impl_from_scalar!(f64, Float64);
impl_from_scalar!(String, Utf8);
impl_from_scalar!(Vec<u8>, Binary);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(value: &[u8]) -> Self {
        ScalarValue::Binary(value.to_vec())
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ScalarValue::Null,
        }
    }
}
