pub mod column_data;
pub mod flat;
pub mod physical_type;
pub mod validity;

use half::f16;
use tsagg_error::{DbError, OptionExt, Result, ResultExt};

use self::column_data::ColumnData;
use self::flat::{FlatSelection, FlatView};
use self::physical_type::{
    Addressable,
    PhysicalBinary,
    PhysicalBool,
    PhysicalF16,
    PhysicalF32,
    PhysicalF64,
    PhysicalI8,
    PhysicalI16,
    PhysicalI32,
    PhysicalI64,
    PhysicalType,
    ScalarStorage,
};
use self::validity::Validity;
use super::builder::ColumnBuilder;
use super::datatype::DataType;
use super::scalar::ScalarValue;

/// How the physical data of a column maps to its logical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// One physical row per logical row.
    Flat,
    /// A single physical row standing in for every logical row.
    Constant,
}

/// A column of values with an associated validity mask.
#[derive(Debug, Clone)]
pub struct Column {
    datatype: DataType,
    /// Number of logical rows.
    len: usize,
    repr: Representation,
    /// Validity of the physical rows.
    validity: Validity,
    data: ColumnData,
}

impl Column {
    /// Create a new flat column from existing data.
    pub fn try_new(datatype: DataType, validity: Validity, data: ColumnData) -> Result<Self> {
        if datatype.physical_type() != data.physical_type() {
            return Err(
                DbError::invalid_argument("Data does not match column datatype")
                    .with_field("datatype", datatype)
                    .with_field("physical_type", data.physical_type()),
            );
        }
        if validity.len() != data.len() {
            return Err(DbError::invalid_argument("Validity length mismatch")
                .with_field("validity_len", validity.len())
                .with_field("data_len", data.len()));
        }

        Ok(Column {
            datatype,
            len: data.len(),
            repr: Representation::Flat,
            validity,
            data,
        })
    }

    /// Create a flat column without checking that validity and data agree.
    pub(crate) fn new_flat_unchecked(
        datatype: DataType,
        validity: Validity,
        data: ColumnData,
    ) -> Self {
        debug_assert_eq!(validity.len(), data.len());
        Column {
            datatype,
            len: data.len(),
            repr: Representation::Flat,
            validity,
            data,
        }
    }

    /// Create a column where every row is the given value.
    pub fn new_constant(value: &ScalarValue, len: usize) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::new_typed_null(DataType::Null, len));
        }

        let mut builder = ColumnBuilder::with_capacity(value.datatype(), 1);
        builder.append_value(value)?;
        let single = builder.finish();

        Ok(Column {
            datatype: single.datatype,
            len,
            repr: Representation::Constant,
            validity: single.validity,
            data: single.data,
        })
    }

    /// Creates a new column of the given type with all values being null.
    pub fn new_typed_null(datatype: DataType, len: usize) -> Self {
        let mut data = ColumnData::with_capacity(datatype.physical_type(), 1);
        data.push_default();

        Column {
            datatype,
            len,
            repr: Representation::Constant,
            validity: Validity::new_all_invalid(1),
            data,
        }
    }

    /// Create a flat column from an iterator of values.
    ///
    /// The datatype is derived from the item type, `Option` items produce
    /// nulls for `None`.
    pub fn try_from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: ColumnValue,
    {
        let iter = iter.into_iter();
        let mut builder =
            ColumnBuilder::with_capacity(<I::Item as ColumnValue>::DATATYPE, iter.size_hint().0);
        for val in iter {
            builder.append_value(&val.into())?;
        }
        Ok(builder.finish())
    }

    /// Reinterpret this column as a different logical type with the same
    /// physical representation.
    pub fn with_datatype(mut self, datatype: DataType) -> Result<Self> {
        if datatype.physical_type() != self.physical_type() {
            return Err(DbError::invalid_argument(format!(
                "Cannot reinterpret {} column as {datatype}",
                self.datatype
            )));
        }
        self.datatype = datatype;
        Ok(self)
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.datatype.physical_type()
    }

    /// Number of logical rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn representation(&self) -> Representation {
        self.repr
    }

    pub fn is_constant(&self) -> bool {
        self.repr == Representation::Constant
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn selection(&self) -> FlatSelection {
        match self.repr {
            Representation::Flat => FlatSelection::Linear { len: self.len },
            Representation::Constant => FlatSelection::Constant { len: self.len },
        }
    }

    pub fn flat_view(&self) -> FlatView<'_> {
        FlatView {
            validity: &self.validity,
            data: &self.data,
            selection: self.selection(),
        }
    }

    /// Check if the logical row at `idx` is valid.
    ///
    /// Panics if out of bounds.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.flat_view().is_valid(idx)
    }

    pub fn is_null(&self, idx: usize) -> bool {
        !self.is_valid(idx)
    }

    /// Get the value at a logical index.
    pub fn get_value(&self, idx: usize) -> Result<ScalarValue> {
        let phys = self.selection().get(idx).ok_or_else(|| {
            DbError::invalid_argument("Index out of bounds")
                .with_field("idx", idx)
                .with_field("len", self.len)
        })?;

        if !self.validity.is_valid(phys) {
            return Ok(ScalarValue::Null);
        }

        let data = &self.data;
        Ok(match self.datatype {
            DataType::Null => ScalarValue::Null,
            DataType::Boolean => ScalarValue::Boolean(*get_physical::<PhysicalBool>(data, phys)?),
            DataType::Int8 => ScalarValue::Int8(*get_physical::<PhysicalI8>(data, phys)?),
            DataType::Int16 => ScalarValue::Int16(*get_physical::<PhysicalI16>(data, phys)?),
            DataType::Int32 => ScalarValue::Int32(*get_physical::<PhysicalI32>(data, phys)?),
            DataType::Int64 => ScalarValue::Int64(*get_physical::<PhysicalI64>(data, phys)?),
            DataType::Float16 => ScalarValue::Float16(*get_physical::<PhysicalF16>(data, phys)?),
            DataType::Float32 => ScalarValue::Float32(*get_physical::<PhysicalF32>(data, phys)?),
            DataType::Float64 => ScalarValue::Float64(*get_physical::<PhysicalF64>(data, phys)?),
            DataType::Date32 => ScalarValue::Date32(*get_physical::<PhysicalI32>(data, phys)?),
            DataType::Timestamp(unit) => {
                ScalarValue::Timestamp(unit, *get_physical::<PhysicalI64>(data, phys)?)
            }
            DataType::Utf8 => {
                let v = get_physical::<PhysicalBinary>(data, phys)?;
                let s = std::str::from_utf8(v).context("binary data not valid utf8")?;
                ScalarValue::Utf8(s.to_string())
            }
            DataType::Binary => {
                ScalarValue::Binary(get_physical::<PhysicalBinary>(data, phys)?.to_vec())
            }
        })
    }
}

fn get_physical<S: ScalarStorage>(data: &ColumnData, idx: usize) -> Result<&S::StorageType> {
    S::get_addressable(data)?.get(idx).required("value")
}

/// Values that can be collected into a column.
pub trait ColumnValue: Into<ScalarValue> {
    const DATATYPE: DataType;
}

macro_rules! impl_column_value {
    ($ty:ty, $datatype:expr) => {
        impl ColumnValue for $ty {
            const DATATYPE: DataType = $datatype;
        }
    };
}

impl_column_value!(bool, DataType::Boolean);
impl_column_value!(i8, DataType::Int8);
impl_column_value!(i16, DataType::Int16);
impl_column_value!(i32, DataType::Int32);
impl_column_value!(i64, DataType::Int64);
impl_column_value!(f16, DataType::Float16);
impl_column_value!(f32, DataType::Float32);
impl_column_value!(f64, DataType::Float64);
impl_column_value!(String, DataType::Utf8);
impl_column_value!(&str, DataType::Utf8);
impl_column_value!(Vec<u8>, DataType::Binary);
impl_column_value!(&[u8], DataType::Binary);

impl<T> ColumnValue for Option<T>
where
    T: ColumnValue,
{
    const DATATYPE: DataType = T::DATATYPE;
}
