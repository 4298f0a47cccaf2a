use std::borrow::Borrow;
use std::fmt::Debug;

use bytes::{Buf, BufMut};
use tsagg_error::{DbError, Result};

use crate::arrays::column::physical_type::{
    PhysicalBinary,
    PhysicalBool,
    PhysicalF32,
    PhysicalF64,
    PhysicalI32,
    PhysicalI64,
    ScalarStorage,
};
use crate::buffer::group_array::GroupArrayValue;

/// A physical type that first_by can track per group.
///
/// Ties together how values are held in a group array and how they're laid
/// out in the intermediate state.
pub trait FirstByValue: ScalarStorage {
    /// Owned per-group representation.
    type Slot: GroupArrayValue + Default;

    /// Value produced when decoding, borrowing from the input where possible.
    type Decoded<'a>: Borrow<Self::StorageType> + Debug;

    fn write_to_slot(slot: &mut Self::Slot, val: &Self::StorageType);

    fn slot_as_storage(slot: &Self::Slot) -> &Self::StorageType;

    /// Write the big-endian encoding of a value.
    fn encode(val: &Self::StorageType, buf: &mut impl BufMut) -> Result<()>;

    /// Read a value from the front of `buf`, advancing it.
    fn decode<'a>(buf: &mut &'a [u8]) -> Result<Self::Decoded<'a>>;
}

pub(crate) fn ensure_remaining(buf: &[u8], needed: usize, what: &'static str) -> Result<()> {
    if buf.len() < needed {
        return Err(
            DbError::invalid_argument(format!("Truncated intermediate state reading {what}"))
                .with_field("needed", needed)
                .with_field("remaining", buf.len()),
        );
    }
    Ok(())
}

macro_rules! impl_first_by_primitive {
    ($storage:ty, $prim:ty, $put:ident, $get:ident) => {
        impl FirstByValue for $storage {
            type Slot = $prim;
            type Decoded<'a> = $prim;

            fn write_to_slot(slot: &mut Self::Slot, val: &Self::StorageType) {
                *slot = *val;
            }

            fn slot_as_storage(slot: &Self::Slot) -> &Self::StorageType {
                slot
            }

            fn encode(val: &Self::StorageType, buf: &mut impl BufMut) -> Result<()> {
                buf.$put(*val);
                Ok(())
            }

            fn decode<'a>(buf: &mut &'a [u8]) -> Result<Self::Decoded<'a>> {
                ensure_remaining(buf, std::mem::size_of::<$prim>(), stringify!($prim))?;
                Ok(buf.$get())
            }
        }
    };
}

impl_first_by_primitive!(PhysicalI32, i32, put_i32, get_i32);
impl_first_by_primitive!(PhysicalI64, i64, put_i64, get_i64);
impl_first_by_primitive!(PhysicalF32, f32, put_f32, get_f32);
impl_first_by_primitive!(PhysicalF64, f64, put_f64, get_f64);

impl FirstByValue for PhysicalBool {
    type Slot = bool;
    type Decoded<'a> = bool;

    fn write_to_slot(slot: &mut Self::Slot, val: &Self::StorageType) {
        *slot = *val;
    }

    fn slot_as_storage(slot: &Self::Slot) -> &Self::StorageType {
        slot
    }

    fn encode(val: &Self::StorageType, buf: &mut impl BufMut) -> Result<()> {
        buf.put_u8(u8::from(*val));
        Ok(())
    }

    fn decode<'a>(buf: &mut &'a [u8]) -> Result<Self::Decoded<'a>> {
        ensure_remaining(buf, 1, "bool")?;
        match buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                Err(DbError::invalid_argument("Invalid encoded bool").with_field("byte", other))
            }
        }
    }
}

impl FirstByValue for PhysicalBinary {
    type Slot = Vec<u8>;
    type Decoded<'a> = &'a [u8];

    fn write_to_slot(slot: &mut Self::Slot, val: &Self::StorageType) {
        slot.clear();
        slot.extend_from_slice(val);
    }

    fn slot_as_storage(slot: &Self::Slot) -> &Self::StorageType {
        slot.as_slice()
    }

    fn encode(val: &Self::StorageType, buf: &mut impl BufMut) -> Result<()> {
        let len = i32::try_from(val.len()).map_err(|_| {
            DbError::internal("Binary value too large to encode").with_field("len", val.len())
        })?;
        buf.put_i32(len);
        buf.put_slice(val);
        Ok(())
    }

    fn decode<'a>(buf: &mut &'a [u8]) -> Result<Self::Decoded<'a>> {
        ensure_remaining(buf, 4, "binary length")?;
        let len = buf.get_i32();
        let len = usize::try_from(len).map_err(|_| {
            DbError::invalid_argument("Negative binary length in intermediate state")
                .with_field("len", len)
        })?;
        ensure_remaining(buf, len, "binary value")?;

        let whole: &'a [u8] = *buf;
        let (val, rest) = whole.split_at(len);
        *buf = rest;
        Ok(val)
    }
}
