use std::fmt::{self, Debug};

use half::f16;
use tsagg_error::{DbError, Result};

use super::column_data::ColumnData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    UntypedNull,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Binary,
}

impl PhysicalType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UntypedNull => "UntypedNull",
            Self::Boolean => "Boolean",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float16 => "Float16",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Binary => "Binary",
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents in-memory storage that can be indexed into to retrieve values.
pub trait Addressable<'a>: Debug {
    /// The type that get's returned.
    type T: Send + Debug + ?Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a value at the given index.
    fn get(&self, idx: usize) -> Option<&'a Self::T>;
}

impl<'a, T> Addressable<'a> for &'a [T]
where
    T: Debug + Send + Sync,
{
    type T = T;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, idx: usize) -> Option<&'a Self::T> {
        (**self).get(idx)
    }
}

/// Addressable view over variable length binary data.
#[derive(Debug, Clone, Copy)]
pub struct BinaryAddressable<'a> {
    offsets: &'a [usize],
    data: &'a [u8],
}

impl<'a> Addressable<'a> for BinaryAddressable<'a> {
    type T = [u8];

    fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn get(&self, idx: usize) -> Option<&'a Self::T> {
        let start = *self.offsets.get(idx)?;
        let end = *self.offsets.get(idx + 1)?;
        self.data.get(start..end)
    }
}

/// Helper trait for getting at the underlying data of a column.
///
/// Implemented on zero-sized marker types, one per physical type.
pub trait ScalarStorage: Debug + Default + Sync + Send + Clone + Copy + 'static {
    const PHYSICAL_TYPE: PhysicalType;

    /// The type being stored that can be accessed.
    type StorageType: Sync + Send + Debug + ?Sized;

    /// The type of the addressable storage.
    type Addressable<'a>: Addressable<'a, T = Self::StorageType>;

    /// Get addressable storage for indexing into the data.
    fn get_addressable(data: &ColumnData) -> Result<Self::Addressable<'_>>;

    /// Push a value onto the end of the data.
    fn push(data: &mut ColumnData, val: &Self::StorageType) -> Result<()>;
}

fn type_mismatch(expected: PhysicalType, requested: PhysicalType) -> DbError {
    DbError::invalid_argument("Physical type mismatch for column data")
        .with_field("expected_type", expected)
        .with_field("requested_type", requested)
}

macro_rules! generate_primitive {
    ($prim:ty, $name:ident, $variant:ident) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl ScalarStorage for $name {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$variant;

            type StorageType = $prim;
            type Addressable<'a> = &'a [Self::StorageType];

            fn get_addressable(data: &ColumnData) -> Result<Self::Addressable<'_>> {
                match data {
                    ColumnData::$variant(values) => Ok(values.as_slice()),
                    other => Err(type_mismatch(other.physical_type(), Self::PHYSICAL_TYPE)),
                }
            }

            fn push(data: &mut ColumnData, val: &Self::StorageType) -> Result<()> {
                match data {
                    ColumnData::$variant(values) => {
                        values.push(*val);
                        Ok(())
                    }
                    other => Err(type_mismatch(other.physical_type(), Self::PHYSICAL_TYPE)),
                }
            }
        }
    };
}

generate_primitive!(bool, PhysicalBool, Boolean);

generate_primitive!(i8, PhysicalI8, Int8);
generate_primitive!(i16, PhysicalI16, Int16);
generate_primitive!(i32, PhysicalI32, Int32);
generate_primitive!(i64, PhysicalI64, Int64);

generate_primitive!(f16, PhysicalF16, Float16);
generate_primitive!(f32, PhysicalF32, Float32);
generate_primitive!(f64, PhysicalF64, Float64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalBinary;

impl ScalarStorage for PhysicalBinary {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Binary;

    type StorageType = [u8];
    type Addressable<'a> = BinaryAddressable<'a>;

    fn get_addressable(data: &ColumnData) -> Result<Self::Addressable<'_>> {
        match data {
            ColumnData::Binary(binary) => Ok(BinaryAddressable {
                offsets: &binary.offsets,
                data: &binary.data,
            }),
            other => Err(type_mismatch(other.physical_type(), Self::PHYSICAL_TYPE)),
        }
    }

    fn push(data: &mut ColumnData, val: &Self::StorageType) -> Result<()> {
        match data {
            ColumnData::Binary(binary) => {
                binary.push(val);
                Ok(())
            }
            other => Err(type_mismatch(other.physical_type(), Self::PHYSICAL_TYPE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::column::column_data::BinaryData;

    #[test]
    fn primitive_addressable() {
        let data = ColumnData::Int32(vec![4, 5, 6]);
        let values = PhysicalI32::get_addressable(&data).unwrap();
        assert_eq!(3, values.len());
        assert_eq!(Some(&5), values.get(1));
        assert_eq!(None, values.get(3));
    }

    #[test]
    fn primitive_addressable_wrong_type() {
        let data = ColumnData::Int64(vec![4]);
        let err = PhysicalI32::get_addressable(&data).unwrap_err();
        assert_eq!("Int64", err.get_field("expected_type").unwrap().to_string());
        assert_eq!("Int32", err.get_field("requested_type").unwrap().to_string());
    }

    #[test]
    fn binary_addressable() {
        let mut binary = BinaryData::default();
        binary.push(b"cat");
        binary.push(b"");
        binary.push(b"horse");
        let data = ColumnData::Binary(binary);

        let values = PhysicalBinary::get_addressable(&data).unwrap();
        assert_eq!(3, values.len());
        assert_eq!(Some(b"cat".as_slice()), values.get(0));
        assert_eq!(Some(b"".as_slice()), values.get(1));
        assert_eq!(Some(b"horse".as_slice()), values.get(2));
        assert_eq!(None, values.get(3));
    }

    #[test]
    fn push_wrong_type() {
        let mut data = ColumnData::Boolean(Vec::new());
        assert!(PhysicalF64::push(&mut data, &1.5).is_err());
        PhysicalBool::push(&mut data, &true).unwrap();
        assert_eq!(ColumnData::Boolean(vec![true]), data);
    }
}
