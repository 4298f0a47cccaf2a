use std::fmt::Debug;

use tsagg_error::Result;

use crate::arrays::builder::ColumnBuilder;
use crate::arrays::column::Column;
use crate::arrays::datatype::DataType;

/// Per-group aggregate state driven by a grouped aggregation operator.
///
/// Group ids are dense and must be announced through `set_group_count`
/// before being referenced by an update. State can be flushed to an
/// intermediate column and merged into another accumulator of the same
/// kind with `add_intermediate`.
pub trait GroupedAccumulator: Debug + Send {
    /// Bytes currently retained by this accumulator.
    fn estimated_size(&self) -> usize;

    /// Grow state so that groups `0..count` are addressable.
    fn set_group_count(&mut self, count: usize) -> Result<()>;

    /// Update state using raw input columns.
    ///
    /// `group_ids[i]` is the group for row `i` of every input column.
    fn add_input(&mut self, group_ids: &[usize], inputs: &[&Column]) -> Result<()>;

    /// Merge a column of intermediate states into this accumulator.
    fn add_intermediate(&mut self, group_ids: &[usize], input: &Column) -> Result<()>;

    /// Append the intermediate state for a group to `output`.
    fn evaluate_intermediate(&self, group_id: usize, output: &mut ColumnBuilder) -> Result<()>;

    /// Append the final value for a group to `output`.
    fn evaluate_final(&self, group_id: usize, output: &mut ColumnBuilder) -> Result<()>;

    /// Hook called once before final evaluation.
    fn prepare_final(&mut self) {}

    /// Type of the column produced by `evaluate_intermediate`.
    fn intermediate_type(&self) -> DataType;

    /// Type of the column produced by `evaluate_final`.
    fn final_type(&self) -> DataType;
}

/// Build a column holding the intermediate states for groups `0..group_count`.
pub fn evaluate_intermediate_all(
    acc: &dyn GroupedAccumulator,
    group_count: usize,
) -> Result<Column> {
    let mut builder = ColumnBuilder::with_capacity(acc.intermediate_type(), group_count);
    for group_id in 0..group_count {
        acc.evaluate_intermediate(group_id, &mut builder)?;
    }
    Ok(builder.finish())
}

/// Build a column holding the final values for groups `0..group_count`.
pub fn evaluate_final_all(acc: &mut dyn GroupedAccumulator, group_count: usize) -> Result<Column> {
    acc.prepare_final();
    let mut builder = ColumnBuilder::with_capacity(acc.final_type(), group_count);
    for group_id in 0..group_count {
        acc.evaluate_final(group_id, &mut builder)?;
    }
    Ok(builder.finish())
}
