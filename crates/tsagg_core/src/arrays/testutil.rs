//! Utilities for testing columns.

use super::column::Column;

/// Assert that two columns are logically equal.
///
/// Representation is ignored, a constant column equals a flat column with
/// the value repeated.
#[track_caller]
pub fn assert_columns_eq(expected: &Column, got: &Column) {
    assert_eq!(expected.datatype(), got.datatype(), "column datatypes differ");
    assert_eq!(expected.len(), got.len(), "column lengths differ");

    for idx in 0..expected.len() {
        let expected_val = expected
            .get_value(idx)
            .unwrap_or_else(|e| panic!("failed to get expected value at {idx}: {e}"));
        let got_val = got
            .get_value(idx)
            .unwrap_or_else(|e| panic!("failed to get value at {idx}: {e}"));
        assert_eq!(expected_val, got_val, "values differ at row {idx}");
    }
}
