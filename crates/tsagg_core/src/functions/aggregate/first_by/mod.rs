//! Grouped aggregate returning the value of `x` at the earliest timestamp.
//!
//! Rows where `y` is null are ignored. A null `x` still takes part in the
//! timestamp comparison, so a null at the earliest timestamp produces a null
//! result. On equal timestamps the first value seen wins.

pub mod encoding;
pub mod value;

use std::borrow::Borrow;

use tracing::{debug, trace};
use tsagg_error::{DbError, ErrorKind, OptionExt, Result};

use self::encoding::{HEADER_LEN, decode_state, encode_state};
use self::value::FirstByValue;
use super::grouped::GroupedAccumulator;
use crate::arrays::builder::ColumnBuilder;
use crate::arrays::column::Column;
use crate::arrays::column::physical_type::{
    Addressable,
    PhysicalBinary,
    PhysicalBool,
    PhysicalF32,
    PhysicalF64,
    PhysicalI32,
    PhysicalI64,
    PhysicalType,
    ScalarStorage,
};
use crate::arrays::datatype::DataType;
use crate::buffer::buffer_manager::BufferManager;
use crate::buffer::group_array::GroupArray;
use crate::config::aggregate::AggregateConfig;

pub const FIRST_BY_NAME: &str = "first_by";

/// Create a first_by accumulator for the given `x` and `y` types.
///
/// Errors if `x` isn't one of the supported kinds: 32 and 64 bit integers
/// (including dates and timestamps), 32 and 64 bit floats, text and binary,
/// and booleans.
pub fn new_grouped_first_by<B>(
    x_type: DataType,
    y_type: DataType,
    manager: &B,
    config: &AggregateConfig,
) -> Result<Box<dyn GroupedAccumulator>>
where
    B: BufferManager + 'static,
{
    let acc: Box<dyn GroupedAccumulator> = match x_type.physical_type() {
        PhysicalType::Boolean => Box::new(GroupedFirstBy::<PhysicalBool, B>::new(
            x_type, y_type, manager, config,
        )),
        PhysicalType::Int32 => Box::new(GroupedFirstBy::<PhysicalI32, B>::new(
            x_type, y_type, manager, config,
        )),
        PhysicalType::Int64 => Box::new(GroupedFirstBy::<PhysicalI64, B>::new(
            x_type, y_type, manager, config,
        )),
        PhysicalType::Float32 => Box::new(GroupedFirstBy::<PhysicalF32, B>::new(
            x_type, y_type, manager, config,
        )),
        PhysicalType::Float64 => Box::new(GroupedFirstBy::<PhysicalF64, B>::new(
            x_type, y_type, manager, config,
        )),
        PhysicalType::Binary => Box::new(GroupedFirstBy::<PhysicalBinary, B>::new(
            x_type, y_type, manager, config,
        )),
        other => {
            return Err(DbError::unsupported_type(format!(
                "Unsupported type for {FIRST_BY_NAME}: {x_type}"
            ))
            .with_field("physical_type", other));
        }
    };

    debug!(%x_type, %y_type, "created {FIRST_BY_NAME} accumulator");

    Ok(acc)
}

/// State for first_by over a single physical type.
///
/// Per-group state lives in parallel group arrays indexed by group id.
#[derive(Debug)]
pub struct GroupedFirstBy<V: FirstByValue, B: BufferManager> {
    x_type: DataType,
    /// Only kept for diagnostics, `y` contributes nothing but its validity.
    y_type: DataType,
    group_count: usize,
    timestamps: GroupArray<i64, B>,
    initialized: GroupArray<bool, B>,
    nulls: GroupArray<bool, B>,
    values: GroupArray<V::Slot, B>,
}

impl<V, B> GroupedFirstBy<V, B>
where
    V: FirstByValue,
    B: BufferManager,
{
    pub fn new(x_type: DataType, y_type: DataType, manager: &B, config: &AggregateConfig) -> Self {
        let min_cap = config.group_array_min_capacity();
        GroupedFirstBy {
            x_type,
            y_type,
            group_count: 0,
            timestamps: GroupArray::new(manager, i64::MAX).with_min_capacity(min_cap),
            initialized: GroupArray::new(manager, false).with_min_capacity(min_cap),
            nulls: GroupArray::new(manager, true).with_min_capacity(min_cap),
            values: GroupArray::new(manager, V::Slot::default()).with_min_capacity(min_cap),
        }
    }

    pub fn x_type(&self) -> DataType {
        self.x_type
    }

    pub fn y_type(&self) -> DataType {
        self.y_type
    }

    /// Apply a candidate `(timestamp, value)` to a group.
    ///
    /// A `None` value records a null.
    fn update(&mut self, group: usize, timestamp: i64, value: Option<&V::StorageType>) {
        if *self.initialized.get(group) && timestamp >= *self.timestamps.get(group) {
            return;
        }

        self.initialized.set(group, true);
        self.timestamps.set(group, timestamp);
        match value {
            Some(value) => {
                self.nulls.set(group, false);
                self.values
                    .update(group, |slot| V::write_to_slot(slot, value));
            }
            None => self.nulls.set(group, true),
        }
    }

    fn check_group(&self, group: usize) -> Result<()> {
        if group >= self.group_count {
            return Err(DbError::invalid_argument(format!(
                "Group id out of range for {FIRST_BY_NAME}"
            ))
            .with_field("group", group)
            .with_field("group_count", self.group_count));
        }
        Ok(())
    }

    fn check_groups(&self, group_ids: &[usize]) -> Result<()> {
        group_ids
            .iter()
            .try_for_each(|&group| self.check_group(group))
    }

    fn check_len(group_ids: &[usize], col: &Column, name: &'static str) -> Result<()> {
        if col.len() != group_ids.len() {
            return Err(DbError::invalid_argument(format!(
                "Column length does not match number of group ids for {FIRST_BY_NAME}"
            ))
            .with_field("column", name)
            .with_field("column_len", col.len())
            .with_field("group_ids_len", group_ids.len()));
        }
        Ok(())
    }
}

/// Wrap a failure to encode a group's state as an internal error.
fn serialization_error(err: DbError, group: usize) -> DbError {
    err.kind_of(ErrorKind::Internal)
        .with_field("aggregate", FIRST_BY_NAME)
        .with_field("group", group)
}

impl<V, B> GroupedAccumulator for GroupedFirstBy<V, B>
where
    V: FirstByValue,
    B: BufferManager,
{
    fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.timestamps.size_of()
            + self.initialized.size_of()
            + self.nulls.size_of()
            + self.values.size_of()
    }

    fn set_group_count(&mut self, count: usize) -> Result<()> {
        if count <= self.group_count {
            return Ok(());
        }

        self.timestamps.ensure_capacity(count)?;
        self.initialized.ensure_capacity(count)?;
        self.nulls.ensure_capacity(count)?;
        self.values.ensure_capacity(count)?;

        trace!(old = self.group_count, new = count, "grew {FIRST_BY_NAME} groups");
        self.group_count = count;

        Ok(())
    }

    fn add_input(&mut self, group_ids: &[usize], inputs: &[&Column]) -> Result<()> {
        let [x, y, time] = inputs else {
            return Err(DbError::invalid_argument(format!(
                "{FIRST_BY_NAME} expects 3 inputs, got {}",
                inputs.len()
            )));
        };

        Self::check_len(group_ids, x, "x")?;
        Self::check_len(group_ids, y, "y")?;
        Self::check_len(group_ids, time, "time")?;

        if time.physical_type() != PhysicalType::Int64 {
            return Err(DbError::unsupported_type(format!(
                "Unsupported time type for {FIRST_BY_NAME}: {}",
                time.datatype()
            )));
        }
        if x.physical_type() != V::PHYSICAL_TYPE {
            return Err(DbError::invalid_argument(format!(
                "Unexpected x type for {FIRST_BY_NAME}"
            ))
            .with_field("expected", self.x_type)
            .with_field("got", x.datatype()));
        }
        self.check_groups(group_ids)?;

        let x = x.flat_view();
        let y = y.flat_view();
        let time = time.flat_view();

        let x_values = V::get_addressable(x.data)?;
        let timestamps = PhysicalI64::get_addressable(time.data)?;

        for (row, &group) in group_ids.iter().enumerate() {
            if !y.is_valid(row) || !time.is_valid(row) {
                continue;
            }

            let timestamp = *timestamps
                .get(time.physical_index(row))
                .required("timestamp")?;
            let value = if x.is_valid(row) {
                Some(x_values.get(x.physical_index(row)).required("x value")?)
            } else {
                None
            };

            self.update(group, timestamp, value);
        }

        Ok(())
    }

    fn add_intermediate(&mut self, group_ids: &[usize], input: &Column) -> Result<()> {
        if input.physical_type() != PhysicalType::Binary {
            return Err(DbError::invalid_argument(format!(
                "Intermediate input for {FIRST_BY_NAME} must be binary, got {}",
                input.datatype()
            )));
        }
        Self::check_len(group_ids, input, "intermediate")?;
        self.check_groups(group_ids)?;

        let input = input.flat_view();
        let blobs = PhysicalBinary::get_addressable(input.data)?;

        for (row, &group) in group_ids.iter().enumerate() {
            if !input.is_valid(row) {
                continue;
            }

            let blob = blobs
                .get(input.physical_index(row))
                .required("intermediate state")?;
            let state = decode_state::<V>(blob).map_err(|e| {
                e.with_field("aggregate", FIRST_BY_NAME)
                    .with_field("row", row)
            })?;

            let value = state.value.as_ref().map(Borrow::borrow);
            self.update(group, state.timestamp, value);
        }

        Ok(())
    }

    fn evaluate_intermediate(&self, group_id: usize, output: &mut ColumnBuilder) -> Result<()> {
        if output.physical_type() != PhysicalType::Binary {
            return Err(DbError::invalid_argument(format!(
                "Intermediate output for {FIRST_BY_NAME} must be binary, got {}",
                output.datatype()
            )));
        }
        self.check_group(group_id)?;

        if !*self.initialized.get(group_id) {
            output.append_null();
            return Ok(());
        }

        let value = if *self.nulls.get(group_id) {
            None
        } else {
            Some(V::slot_as_storage(self.values.get(group_id)))
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + 8);
        encode_state::<V>(*self.timestamps.get(group_id), value, &mut buf)
            .map_err(|e| serialization_error(e, group_id))?;

        output.append::<PhysicalBinary>(&buf)
    }

    fn evaluate_final(&self, group_id: usize, output: &mut ColumnBuilder) -> Result<()> {
        if output.physical_type() != V::PHYSICAL_TYPE {
            return Err(DbError::invalid_argument(format!(
                "Unexpected output type for {FIRST_BY_NAME}"
            ))
            .with_field("expected", self.x_type)
            .with_field("got", output.datatype()));
        }
        self.check_group(group_id)?;

        if !*self.initialized.get(group_id) || *self.nulls.get(group_id) {
            output.append_null();
            return Ok(());
        }

        output.append::<V>(V::slot_as_storage(self.values.get(group_id)))
    }

    fn intermediate_type(&self) -> DataType {
        DataType::Binary
    }

    fn final_type(&self) -> DataType {
        self.x_type
    }
}
