//! Intermediate state layout for first_by.
//!
//! All integers are big-endian.
//!
//! ```text
//! offset 0  i64  timestamp
//! offset 8  u8   is_null (0 or 1)
//! offset 9  ..   value, only present when is_null == 0
//! ```

use std::fmt;

use bytes::{Buf, BufMut};
use tsagg_error::{DbError, Result};

use super::value::{FirstByValue, ensure_remaining};

/// Length of the timestamp and null flag preceding the value.
pub const HEADER_LEN: usize = 9;

/// A decoded intermediate state.
pub struct DecodedState<'a, V: FirstByValue> {
    pub timestamp: i64,
    /// None if the tracked value is null.
    pub value: Option<V::Decoded<'a>>,
}

impl<V: FirstByValue> fmt::Debug for DecodedState<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedState")
            .field("timestamp", &self.timestamp)
            .field("value", &self.value)
            .finish()
    }
}

pub fn encode_state<V: FirstByValue>(
    timestamp: i64,
    value: Option<&V::StorageType>,
    buf: &mut impl BufMut,
) -> Result<()> {
    buf.put_i64(timestamp);
    match value {
        Some(value) => {
            buf.put_u8(0);
            V::encode(value, buf)?;
        }
        None => buf.put_u8(1),
    }
    Ok(())
}

/// Decode a complete blob, erroring on malformed or trailing input.
pub fn decode_state<V: FirstByValue>(mut blob: &[u8]) -> Result<DecodedState<'_, V>> {
    ensure_remaining(blob, HEADER_LEN, "header")?;
    let timestamp = blob.get_i64();
    let value = match blob.get_u8() {
        0 => Some(V::decode(&mut blob)?),
        1 => None,
        other => {
            return Err(DbError::invalid_argument("Invalid null flag in intermediate state")
                .with_field("byte", other));
        }
    };

    if !blob.is_empty() {
        return Err(
            DbError::invalid_argument("Trailing bytes in intermediate state")
                .with_field("trailing", blob.len()),
        );
    }

    Ok(DecodedState { timestamp, value })
}

#[cfg(test)]
mod tests {
    use std::borrow::Borrow;

    use tsagg_error::ErrorKind;

    use super::*;
    use crate::arrays::column::physical_type::{
        PhysicalBinary,
        PhysicalBool,
        PhysicalF32,
        PhysicalF64,
        PhysicalI32,
        PhysicalI64,
    };

    fn encode<V: FirstByValue>(timestamp: i64, value: Option<&V::StorageType>) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_state::<V>(timestamp, value, &mut buf).unwrap();
        buf
    }

    fn assert_round_trip<V>(timestamp: i64, value: Option<&V::StorageType>)
    where
        V: FirstByValue,
        V::StorageType: PartialEq,
    {
        let blob = encode::<V>(timestamp, value);
        let state = decode_state::<V>(&blob).unwrap();
        assert_eq!(timestamp, state.timestamp);
        let got: Option<&V::StorageType> = state.value.as_ref().map(Borrow::borrow);
        assert_eq!(value, got);
    }

    #[test]
    fn exact_layout_i32() {
        let blob = encode::<PhysicalI32>(1, Some(&7));
        assert_eq!(
            vec![0_u8, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 7],
            blob,
        );
    }

    #[test]
    fn exact_layout_null() {
        let blob = encode::<PhysicalI64>(-1, None);
        assert_eq!(vec![0xff_u8; 8].into_iter().chain([1]).collect::<Vec<_>>(), blob);
        assert_eq!(HEADER_LEN, blob.len());
    }

    #[test]
    fn exact_layout_binary() {
        let blob = encode::<PhysicalBinary>(2, Some(b"hi".as_slice()));
        assert_eq!(
            vec![0_u8, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, b'h', b'i'],
            blob,
        );
    }

    #[test]
    fn round_trip_boundaries() {
        for ts in [i64::MIN, -1, 0, i64::MAX] {
            assert_round_trip::<PhysicalI32>(ts, Some(&i32::MIN));
            assert_round_trip::<PhysicalI32>(ts, Some(&i32::MAX));
            assert_round_trip::<PhysicalI64>(ts, Some(&i64::MIN));
            assert_round_trip::<PhysicalF32>(ts, Some(&f32::MAX));
            assert_round_trip::<PhysicalF64>(ts, Some(&-0.5));
            assert_round_trip::<PhysicalBool>(ts, Some(&true));
            assert_round_trip::<PhysicalBool>(ts, Some(&false));
            assert_round_trip::<PhysicalBinary>(ts, Some(b"".as_slice()));
            assert_round_trip::<PhysicalBinary>(ts, Some("héllo".as_bytes()));
            assert_round_trip::<PhysicalBinary>(ts, None);
            assert_round_trip::<PhysicalF64>(ts, None);
        }
    }

    #[test]
    fn decode_truncated_header() {
        let err = decode_state::<PhysicalI32>(&[0, 0, 0]).unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }

    #[test]
    fn decode_truncated_value() {
        let mut blob = encode::<PhysicalI64>(4, Some(&9));
        blob.pop();
        decode_state::<PhysicalI64>(&blob).unwrap_err();
    }

    #[test]
    fn decode_bad_null_flag() {
        let mut blob = encode::<PhysicalI32>(4, None);
        blob[8] = 2;
        let err = decode_state::<PhysicalI32>(&blob).unwrap_err();
        assert_eq!("2", err.get_field("byte").unwrap().to_string());
    }

    #[test]
    fn decode_trailing_bytes() {
        let mut blob = encode::<PhysicalI32>(4, Some(&1));
        blob.push(0);
        decode_state::<PhysicalI32>(&blob).unwrap_err();

        // A null state carries no value bytes.
        let mut blob = encode::<PhysicalI32>(4, None);
        blob.extend_from_slice(&[0, 0, 0, 1]);
        decode_state::<PhysicalI32>(&blob).unwrap_err();
    }
}
