use tsagg_error::{DbError, Result};

use super::bitmap::Bitmap;
use super::column::Column;
use super::column::column_data::ColumnData;
use super::column::physical_type::{
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
use super::column::validity::Validity;
use super::datatype::DataType;
use super::scalar::ScalarValue;

/// Incrementally builds a flat column.
#[derive(Debug)]
pub struct ColumnBuilder {
    datatype: DataType,
    validity: Bitmap,
    data: ColumnData,
}

impl ColumnBuilder {
    pub fn new(datatype: DataType) -> Self {
        Self::with_capacity(datatype, 0)
    }

    pub fn with_capacity(datatype: DataType, cap: usize) -> Self {
        ColumnBuilder {
            datatype,
            validity: Bitmap::with_capacity(cap),
            data: ColumnData::with_capacity(datatype.physical_type(), cap),
        }
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.datatype.physical_type()
    }

    pub fn len(&self) -> usize {
        self.validity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append_null(&mut self) {
        self.validity.push(false);
        self.data.push_default();
    }

    /// Append a non-null value using the physical storage `S`.
    ///
    /// Errors if `S` doesn't match the builder's physical type.
    pub fn append<S>(&mut self, val: &S::StorageType) -> Result<()>
    where
        S: ScalarStorage,
    {
        S::push(&mut self.data, val)?;
        self.validity.push(true);
        Ok(())
    }

    /// Append a scalar value, the value's type must match the builder's type.
    pub fn append_value(&mut self, value: &ScalarValue) -> Result<()> {
        match (self.datatype, value) {
            (_, ScalarValue::Null) => {
                self.append_null();
                Ok(())
            }
            (DataType::Boolean, ScalarValue::Boolean(v)) => self.append::<PhysicalBool>(v),
            (DataType::Int8, ScalarValue::Int8(v)) => self.append::<PhysicalI8>(v),
            (DataType::Int16, ScalarValue::Int16(v)) => self.append::<PhysicalI16>(v),
            (DataType::Int32, ScalarValue::Int32(v)) => self.append::<PhysicalI32>(v),
            (DataType::Int64, ScalarValue::Int64(v)) => self.append::<PhysicalI64>(v),
            (DataType::Float16, ScalarValue::Float16(v)) => self.append::<PhysicalF16>(v),
            (DataType::Float32, ScalarValue::Float32(v)) => self.append::<PhysicalF32>(v),
            (DataType::Float64, ScalarValue::Float64(v)) => self.append::<PhysicalF64>(v),
            (DataType::Date32, ScalarValue::Date32(v)) => self.append::<PhysicalI32>(v),
            (DataType::Timestamp(unit), ScalarValue::Timestamp(val_unit, v))
                if unit == *val_unit =>
            {
                self.append::<PhysicalI64>(v)
            }
            (DataType::Utf8, ScalarValue::Utf8(v)) => self.append::<PhysicalBinary>(v.as_bytes()),
            (DataType::Binary, ScalarValue::Binary(v)) => self.append::<PhysicalBinary>(v),
            (datatype, value) => Err(DbError::invalid_argument(
                "Cannot append value to column builder",
            )
            .with_field("builder_type", datatype)
            .with_field("value_type", value.datatype())),
        }
    }

    pub fn finish(self) -> Column {
        // Every append touches both validity and data, so lengths line up.
        Column::new_flat_unchecked(self.datatype, Validity::from_bitmap(self.validity), self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::testutil::assert_columns_eq;

    #[test]
    fn build_with_nulls() {
        let mut builder = ColumnBuilder::new(DataType::Int64);
        builder.append::<PhysicalI64>(&4).unwrap();
        builder.append_null();
        builder.append_value(&ScalarValue::Int64(6)).unwrap();
        assert_eq!(3, builder.len());

        let col = builder.finish();
        let expected = Column::try_from_iter([Some(4_i64), None, Some(6)]).unwrap();
        assert_columns_eq(&expected, &col);
    }

    #[test]
    fn append_wrong_physical_type() {
        let mut builder = ColumnBuilder::new(DataType::Int32);
        assert!(builder.append::<PhysicalI64>(&4).is_err());
        assert!(builder.append_value(&ScalarValue::Int64(4)).is_err());
        assert!(builder.is_empty());
    }

    #[test]
    fn append_utf8_and_timestamp() {
        let mut builder = ColumnBuilder::new(DataType::Utf8);
        builder.append_value(&"hello".into()).unwrap();
        let col = builder.finish();
        assert_eq!(ScalarValue::Utf8("hello".into()), col.get_value(0).unwrap());

        use crate::arrays::datatype::TimeUnit;
        let mut builder = ColumnBuilder::new(DataType::Timestamp(TimeUnit::Millisecond));
        builder
            .append_value(&ScalarValue::Timestamp(TimeUnit::Millisecond, 15))
            .unwrap();
        assert!(
            builder
                .append_value(&ScalarValue::Timestamp(TimeUnit::Second, 15))
                .is_err()
        );
    }
}
