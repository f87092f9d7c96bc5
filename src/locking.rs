//! Locking policies for [`Pool`](crate::Pool).
//!
//! A policy is a raw mutex type implementing [`RawMutex`]. The pool wraps its
//! free list in a [`lock_api::Mutex`] parameterized by the policy, and every
//! critical section holds the corresponding RAII guard, so the lock is
//! released on all exit paths including unwinding.

use core::{cell::Cell, fmt};
use parking_lot::lock_api::{self, GuardNoSend};

pub use parking_lot::lock_api::RawMutex;

/// Full mutual exclusion. Required whenever more than one thread may touch
/// the same pool.
pub type MutexLock = parking_lot::RawMutex;

/// A locking policy that performs no synchronization.
///
/// `NoLock` is `!Sync`, which makes every pool and handle using it confined
/// to the thread that created it. Locking it again while a guard is alive
/// on the same thread panics.
pub struct NoLock {
    locked: Cell<bool>,
}

impl fmt::Debug for NoLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoLock")
            .field("locked", &self.locked.get())
            .finish()
    }
}

// Safety: `NoLock` is `!Sync`, so the lock can only be reached from a single
// thread; re-entrant acquisition on that thread panics instead of handing out
// a second guard.
unsafe impl RawMutex for NoLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = NoLock {
        locked: Cell::new(false),
    };

    type GuardMarker = GuardNoSend;

    #[inline(always)]
    fn lock(&self) {
        if self.locked.replace(true) {
            panic!("NoLock acquired twice on the same thread");
        }
    }

    #[inline(always)]
    fn try_lock(&self) -> bool {
        !self.locked.replace(true)
    }

    #[inline(always)]
    unsafe fn unlock(&self) {
        self.locked.set(false);
    }

    #[inline(always)]
    fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

pub(crate) type PolicyMutex<L, T> = lock_api::Mutex<L, T>;

mod sealed {
    pub trait Sealed<L> {}

    impl<X: ?Sized + Send + Sync> Sealed<super::MutexLock> for X {}
    impl<X: ?Sized> Sealed<super::NoLock> for X {}
}

/// Thread requirements a locking policy `L` places on the allocator and
/// closures a pool stores.
///
/// A [`MutexLock`] pool can be shared between threads, so everything it
/// stores must be `Send + Sync`. A [`NoLock`] pool never leaves the thread
/// that created it and accepts anything, including closures that capture an
/// `Rc`.
///
/// This trait is sealed. Pools can only be constructed with the two policies
/// above.
pub trait ThreadSafety<L>: sealed::Sealed<L> {}

impl<X: ?Sized + Send + Sync> ThreadSafety<MutexLock> for X {}
impl<X: ?Sized> ThreadSafety<NoLock> for X {}
