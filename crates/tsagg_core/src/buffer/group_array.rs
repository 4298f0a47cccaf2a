use std::fmt::Debug;

use half::f16;
use tracing::trace;
use tsagg_error::{DbError, ErrorKind, Result, ResultExt};

use super::buffer_manager::{BufferManager, Reservation};

/// Values that can be stored in a group array.
pub trait GroupArrayValue: Debug + Clone + Send + Sync + 'static {
    /// Bytes owned by this value outside of the array itself.
    fn heap_size(&self) -> usize {
        0
    }
}

impl GroupArrayValue for bool {}
impl GroupArrayValue for i32 {}
impl GroupArrayValue for i64 {}
impl GroupArrayValue for f16 {}
impl GroupArrayValue for f32 {}
impl GroupArrayValue for f64 {}

impl GroupArrayValue for Vec<u8> {
    fn heap_size(&self) -> usize {
        self.capacity()
    }
}

/// Dense array of per-group values indexed by group id.
///
/// Slots that have never been written hold the fill value. Memory for the
/// array's capacity is reserved with the buffer manager before growing.
#[derive(Debug)]
pub struct GroupArray<T: GroupArrayValue, B: BufferManager> {
    reservation: Reservation<B>,
    fill: T,
    values: Vec<T>,
    /// Number of slots accounted for in the reservation.
    capacity: usize,
    min_capacity: usize,
    /// Sum of `heap_size` across all values.
    heap_bytes: usize,
}

impl<T, B> GroupArray<T, B>
where
    T: GroupArrayValue,
    B: BufferManager,
{
    pub fn new(manager: &B, fill: T) -> Self {
        GroupArray {
            reservation: Reservation::empty(manager.clone()),
            fill,
            values: Vec::new(),
            capacity: 0,
            min_capacity: 0,
            heap_bytes: 0,
        }
    }

    /// Set the smallest capacity to allocate once the array grows.
    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    /// Number of addressable slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently reserved with the buffer manager.
    pub fn reserved_bytes(&self) -> usize {
        self.reservation.size()
    }

    /// Make slots `0..n` addressable.
    ///
    /// Never shrinks. New slots are set to the fill value. If the
    /// reservation is refused the array is left unchanged.
    pub fn ensure_capacity(&mut self, n: usize) -> Result<()> {
        if n <= self.values.len() {
            return Ok(());
        }

        if n > self.capacity {
            let new_cap = n
                .max(self.capacity.saturating_mul(2))
                .max(self.min_capacity);
            let additional = (new_cap - self.capacity)
                .checked_mul(std::mem::size_of::<T>())
                .ok_or_else(|| {
                    DbError::with_kind(
                        ErrorKind::ResourceExhausted,
                        "Group array capacity exceeds addressable memory",
                    )
                    .with_field("requested_capacity", new_cap)
                })?;

            let extra = self.reservation.manager().try_reserve(additional)?;
            self.values
                .try_reserve_exact(new_cap - self.values.len())
                .context("failed to grow group array")?;
            self.reservation.merge(extra);

            trace!(
                old_capacity = self.capacity,
                new_capacity = new_cap,
                "grew group array"
            );
            self.capacity = new_cap;
        }

        let added = n - self.values.len();
        self.heap_bytes += added * self.fill.heap_size();
        self.values.resize(n, self.fill.clone());

        Ok(())
    }

    /// Get the value for a slot.
    ///
    /// Panics if `idx` isn't addressable.
    pub fn get(&self, idx: usize) -> &T {
        &self.values[idx]
    }

    /// Replace the value for a slot.
    ///
    /// Panics if `idx` isn't addressable.
    pub fn set(&mut self, idx: usize, value: T) {
        let slot = &mut self.values[idx];
        self.heap_bytes = self.heap_bytes - slot.heap_size() + value.heap_size();
        *slot = value;
    }

    /// Update a slot in place.
    ///
    /// Panics if `idx` isn't addressable.
    pub fn update<R>(&mut self, idx: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let slot = &mut self.values[idx];
        let before = slot.heap_size();
        let out = f(slot);
        self.heap_bytes = self.heap_bytes - before + slot.heap_size();
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    /// Approximate number of bytes used by this array.
    pub fn size_of(&self) -> usize {
        std::mem::size_of::<Self>() + self.capacity * std::mem::size_of::<T>() + self.heap_bytes
    }
}

#[cfg(test)]
mod tests {
    use tsagg_error::ErrorKind;

    use super::*;
    use crate::buffer::buffer_manager::{NopBufferManager, TrackedBufferManager};

    #[test]
    fn fill_new_slots() {
        let mut arr = GroupArray::new(&NopBufferManager, i64::MAX);
        arr.ensure_capacity(3).unwrap();
        assert_eq!(3, arr.len());
        assert!(arr.iter().all(|v| *v == i64::MAX));
    }

    #[test]
    fn growth_preserves_values() {
        let mut arr = GroupArray::new(&NopBufferManager, 0_i32);
        arr.ensure_capacity(4).unwrap();
        for idx in 0..4 {
            arr.set(idx, idx as i32 * 10);
        }

        arr.ensure_capacity(100).unwrap();
        assert_eq!(100, arr.len());
        for idx in 0..4 {
            assert_eq!(idx as i32 * 10, *arr.get(idx));
        }
        assert_eq!(0, *arr.get(99));
    }

    #[test]
    fn never_shrinks() {
        let mut arr = GroupArray::new(&NopBufferManager, false);
        arr.ensure_capacity(10).unwrap();
        arr.ensure_capacity(2).unwrap();
        assert_eq!(10, arr.len());
    }

    #[test]
    fn amortized_growth() {
        let mut arr = GroupArray::new(&NopBufferManager, 0_i64);
        arr.ensure_capacity(10).unwrap();
        assert_eq!(10, arr.capacity());
        arr.ensure_capacity(11).unwrap();
        assert_eq!(20, arr.capacity());

        let mut arr = GroupArray::new(&NopBufferManager, 0_i64).with_min_capacity(64);
        arr.ensure_capacity(1).unwrap();
        assert_eq!(64, arr.capacity());
        assert_eq!(1, arr.len());
    }

    #[test]
    fn reservation_tracks_capacity() {
        let manager = TrackedBufferManager::unlimited();
        let mut arr = GroupArray::new(&manager, 0_i64);
        arr.ensure_capacity(8).unwrap();
        assert_eq!(64, manager.reserved_bytes());
        assert_eq!(64, arr.reserved_bytes());

        arr.ensure_capacity(9).unwrap();
        assert_eq!(128, manager.reserved_bytes());

        std::mem::drop(arr);
        assert_eq!(0, manager.reserved_bytes());
    }

    #[test]
    fn refused_growth_leaves_array_unchanged() {
        let manager = TrackedBufferManager::new(Some(64));
        let mut arr = GroupArray::new(&manager, 0_i64);
        arr.ensure_capacity(8).unwrap();
        arr.set(7, 42);

        let err = arr.ensure_capacity(9).unwrap_err();
        assert_eq!(ErrorKind::ResourceExhausted, err.kind());
        assert_eq!(8, arr.len());
        assert_eq!(8, arr.capacity());
        assert_eq!(42, *arr.get(7));
        assert_eq!(64, manager.reserved_bytes());
    }

    #[test]
    fn oversized_growth_errors() {
        let manager = TrackedBufferManager::unlimited();
        let mut arr = GroupArray::new(&manager, 0_i64);
        arr.ensure_capacity(4).unwrap();

        let err = arr.ensure_capacity(usize::MAX / 4).unwrap_err();
        assert_eq!(ErrorKind::ResourceExhausted, err.kind());
        assert_eq!(
            (usize::MAX / 4).to_string(),
            err.get_field("requested_capacity").unwrap().to_string()
        );
        assert_eq!(4, arr.len());
        assert_eq!(arr.capacity() * 8, manager.reserved_bytes());
    }

    #[test]
    fn heap_bytes_tracked() {
        let mut arr: GroupArray<Vec<u8>, _> = GroupArray::new(&NopBufferManager, Vec::new());
        arr.ensure_capacity(2).unwrap();
        let base = arr.size_of();

        let v0 = Vec::with_capacity(16);
        let cap0 = v0.capacity();
        arr.set(0, v0);
        assert_eq!(base + cap0, arr.size_of());

        arr.update(1, |v| {
            v.reserve_exact(8);
            v.extend_from_slice(b"abc");
        });
        let cap1 = arr.get(1).capacity();
        assert_eq!(base + cap0 + cap1, arr.size_of());

        arr.update(0, |v| *v = Vec::new());
        assert_eq!(base + cap1, arr.size_of());
    }
}
