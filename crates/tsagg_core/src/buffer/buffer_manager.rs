use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{trace, warn};
use tsagg_error::{DbError, ErrorKind, Result};

pub trait BufferManager: Debug + Sync + Clone + Send + Sized {
    /// Try to reserve some number of bytes.
    ///
    /// Returns a reservation for keeping track of "used" bytes.
    ///
    /// This should never error when attempting to reserve zero bytes.
    fn try_reserve(&self, size_bytes: usize) -> Result<Reservation<Self>>;

    /// Release the bytes held by a reservation.
    fn release(&self, reservation: &Reservation<Self>);
}

/// Bytes reserved with a buffer manager.
///
/// The bytes are returned to the manager when the reservation is dropped.
#[derive(Debug)]
pub struct Reservation<B: BufferManager> {
    manager: B,
    /// Size in bytes of the memory reservation.
    size: usize,
}

impl<B> Reservation<B>
where
    B: BufferManager,
{
    /// Create a zero byte reservation.
    pub const fn empty(manager: B) -> Self {
        Reservation { manager, size: 0 }
    }

    /// Absorb another reservation into this one.
    pub fn merge(&mut self, mut other: Self) {
        self.size += other.size;
        other.size = 0;
    }

    pub const fn manager(&self) -> &B {
        &self.manager
    }

    pub const fn size(&self) -> usize {
        self.size
    }
}

impl<B> Drop for Reservation<B>
where
    B: BufferManager,
{
    fn drop(&mut self) {
        if self.size > 0 {
            self.manager.release(self);
        }
    }
}

/// Buffer manager that tracks nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopBufferManager;

impl BufferManager for NopBufferManager {
    fn try_reserve(&self, size_bytes: usize) -> Result<Reservation<Self>> {
        Ok(Reservation {
            manager: *self,
            size: size_bytes,
        })
    }

    fn release(&self, _reservation: &Reservation<Self>) {
        // Ok
    }
}

/// Buffer manager counting reserved bytes, optionally up to a limit.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct TrackedBufferManager {
    inner: Arc<TrackedInner>,
}

#[derive(Debug, Default)]
struct TrackedInner {
    reserved: AtomicUsize,
    limit: Option<usize>,
}

impl TrackedBufferManager {
    pub fn new(limit: Option<usize>) -> Self {
        TrackedBufferManager {
            inner: Arc::new(TrackedInner {
                reserved: AtomicUsize::new(0),
                limit,
            }),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Total bytes currently reserved across all reservations.
    pub fn reserved_bytes(&self) -> usize {
        self.inner.reserved.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> Option<usize> {
        self.inner.limit
    }
}

impl BufferManager for TrackedBufferManager {
    fn try_reserve(&self, size_bytes: usize) -> Result<Reservation<Self>> {
        if size_bytes == 0 {
            return Ok(Reservation {
                manager: self.clone(),
                size: 0,
            });
        }

        let limit = self.inner.limit;
        let result = self
            .inner
            .reserved
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                let next = current.checked_add(size_bytes)?;
                match limit {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            });

        match result {
            Ok(prev) => {
                trace!(size_bytes, total = prev + size_bytes, "reserved memory");
                Ok(Reservation {
                    manager: self.clone(),
                    size: size_bytes,
                })
            }
            Err(current) => {
                warn!(size_bytes, current, ?limit, "memory reservation refused");
                Err(
                    DbError::with_kind(ErrorKind::ResourceExhausted, "Memory limit exceeded")
                        .with_field("requested_bytes", size_bytes)
                        .with_field("reserved_bytes", current)
                        .with_field("limit_bytes", limit.unwrap_or(usize::MAX)),
                )
            }
        }
    }

    fn release(&self, reservation: &Reservation<Self>) {
        self.inner
            .reserved
            .fetch_sub(reservation.size, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_reserve_and_drop() {
        let manager = TrackedBufferManager::unlimited();
        let res1 = manager.try_reserve(16).unwrap();
        let res2 = manager.try_reserve(8).unwrap();
        assert_eq!(24, manager.reserved_bytes());

        std::mem::drop(res1);
        assert_eq!(8, manager.reserved_bytes());
        std::mem::drop(res2);
        assert_eq!(0, manager.reserved_bytes());
    }

    #[test]
    fn tracked_merge_releases_once() {
        let manager = TrackedBufferManager::unlimited();
        let mut res = manager.try_reserve(16).unwrap();
        res.merge(manager.try_reserve(4).unwrap());
        assert_eq!(20, res.size());
        assert_eq!(20, manager.reserved_bytes());

        std::mem::drop(res);
        assert_eq!(0, manager.reserved_bytes());
    }

    #[test]
    fn tracked_limit_refuses() {
        let manager = TrackedBufferManager::new(Some(32));
        let _res = manager.try_reserve(30).unwrap();

        let err = manager.try_reserve(4).unwrap_err();
        assert_eq!(ErrorKind::ResourceExhausted, err.kind());
        assert_eq!(30, manager.reserved_bytes());

        // Zero byte reservations always succeed.
        manager.try_reserve(0).unwrap();
    }

    #[test]
    fn clones_share_counter() {
        let manager = TrackedBufferManager::unlimited();
        let cloned = manager.clone();
        let _res = cloned.try_reserve(10).unwrap();
        assert_eq!(10, manager.reserved_bytes());
    }
}
