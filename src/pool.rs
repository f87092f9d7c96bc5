use crate::{
    pool_allocator::Checked, pool_core::Core, DefaultAllocator, Handle, MutexLock, NoLock,
    PoolAllocator, PoolBuilder, PoolError, RawMutex, ThreadSafety,
};
use core::fmt;
use std::sync::Arc;

/// A pool of reusable resources.
///
/// Resources are leased through [`Handle`]s and return to the pool when the
/// handle is dropped. The most recently returned resource is always reused
/// first. When the free list is empty the pool constructs a new resource,
/// unless it has been switched to a fixed capacity.
///
/// The locking policy `L` decides how concurrent access to the free list is
/// serialized: [`MutexLock`] (the default) for pools shared between
/// threads, [`NoLock`] for pools confined to one thread (see [`LocalPool`]).
///
/// Cloning a pool creates an independent pool with the same allocator and a
/// fresh instance for every resource that is currently free in the source.
///
/// # Examples
///
/// ```
/// use recycle::Pool;
///
/// let pool: Pool<String> = Pool::with_recycle(String::new, |s: &mut String| s.clear());
///
/// let mut greeting = pool.allocate();
/// greeting.push_str("hello");
/// drop(greeting);
///
/// assert_eq!(pool.unused_resources(), 1);
/// assert!(pool.allocate().is_empty());
/// ```
pub struct Pool<T, L: RawMutex = MutexLock> {
    core: Arc<Core<T, L>>,
}

/// A pool without synchronization, confined to the thread that created it.
///
/// Its factory, recycle hook and allocator need not be `Send` or `Sync`.
///
/// ```
/// use recycle::LocalPool;
/// use std::{cell::Cell, rc::Rc};
///
/// let made = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&made);
/// let pool: LocalPool<u32> = LocalPool::new(move || {
///     counter.set(counter.get() + 1);
///     counter.get()
/// });
///
/// drop(pool.allocate());
/// assert_eq!(*pool.allocate(), 1);
/// assert_eq!(made.get(), 1);
/// ```
pub type LocalPool<T> = Pool<T, NoLock>;

impl<T: 'static, L: RawMutex> Pool<T, L> {
    /// Creates a pool that constructs resources with `factory`.
    ///
    /// See [`ThreadSafety`] for what the locking policy requires of the
    /// closures.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + ThreadSafety<L> + 'static,
    {
        Self::builder(factory).build()
    }

    /// Creates a pool that constructs resources with `factory` and passes
    /// every returned resource through `recycle` before reusing it.
    pub fn with_recycle<F, R>(factory: F, recycle: R) -> Self
    where
        F: Fn() -> T + ThreadSafety<L> + 'static,
        R: Fn(&mut T) + ThreadSafety<L> + 'static,
    {
        Self::builder(factory).recycle(recycle).build()
    }

    /// Starts configuring a pool that constructs resources with `factory`.
    pub fn builder<F>(factory: F) -> PoolBuilder<T, L>
    where
        F: Fn() -> T + ThreadSafety<L> + 'static,
    {
        PoolBuilder::new(factory)
    }
}

impl<T, L: RawMutex> Pool<T, L> {
    /// Creates a pool driven by a custom [`PoolAllocator`].
    pub fn with_allocator<A>(allocator: A) -> Self
    where
        A: PoolAllocator<T> + ThreadSafety<L> + 'static,
    {
        Self::from_shared_allocator(Arc::new(Checked::new::<T, L>(allocator)))
    }

    pub(crate) fn from_shared_allocator(
        allocator: Arc<dyn PoolAllocator<T> + Send + Sync>,
    ) -> Self {
        Pool {
            core: Arc::new(Core::new(allocator)),
        }
    }

    /// Leases a resource from the pool.
    ///
    /// Reuses the most recently returned resource if one is free, otherwise
    /// constructs a new one. A fixed-capacity pool with no free resource
    /// returns an invalid handle instead; see [`Handle::is_valid`].
    pub fn allocate(&self) -> Handle<T, L> {
        self.core.allocate()
    }

    /// Like [`Self::allocate`], but reports exhaustion as an error.
    pub fn try_allocate(&self) -> Result<Handle<T, L>, PoolError> {
        let handle = self.core.allocate();
        if handle.is_valid() {
            Ok(handle)
        } else {
            Err(PoolError::Exhausted)
        }
    }

    /// Leases up to `count` resources at once.
    ///
    /// Free resources are taken under a single lock acquisition; the rest are
    /// constructed. The result holds fewer than `count` handles only when the
    /// pool has a fixed capacity and ran out of free resources.
    pub fn allocate_bulk(&self, count: usize) -> Vec<Handle<T, L>> {
        let mut handles = Vec::new();
        self.core.allocate_bulk(&mut handles, count);
        handles
    }

    /// Appends up to `count` leased resources to `handles` and returns how
    /// many were appended.
    pub fn allocate_bulk_into(&self, handles: &mut Vec<Handle<T, L>>, count: usize) -> usize {
        self.core.allocate_bulk(handles, count)
    }

    /// Returns a batch of handles to the pool under a single lock
    /// acquisition.
    ///
    /// Invalid handles are skipped. Handles leased from a different pool are
    /// released to that pool as if they had been dropped.
    pub fn recycle_bulk<I>(&self, handles: I)
    where
        I: IntoIterator<Item = Handle<T, L>>,
    {
        self.core.recycle_bulk(handles);
    }

    /// Constructs resources until at least `count` of them are free.
    pub fn prefill(&self, count: usize) -> &Self {
        self.core.prefill(count);
        self
    }

    /// Enables or disables fixed capacity. A fixed-capacity pool never
    /// constructs resources on allocation. Free resources are kept either
    /// way.
    pub fn set_fixed_capacity(&self, on: bool) -> &Self {
        self.core.set_fixed_capacity(on);
        self
    }

    /// Returns `true` if the pool is limited to its existing resources.
    pub fn is_fixed_capacity(&self) -> bool {
        self.core.is_fixed_capacity()
    }

    /// Returns the number of resources that are free for reuse.
    pub fn unused_resources(&self) -> usize {
        self.core.unused_resources()
    }

    /// Drops every free resource. Leased resources are unaffected.
    pub fn free_unused(&self) {
        self.core.free_unused();
    }
}

impl<T: Default, L: RawMutex> Default for Pool<T, L>
where
    DefaultAllocator: ThreadSafety<L>,
{
    fn default() -> Self {
        Self::with_allocator(DefaultAllocator)
    }
}

impl<T, L: RawMutex> Clone for Pool<T, L> {
    fn clone(&self) -> Self {
        Pool {
            core: Arc::new(self.core.duplicate()),
        }
    }
}

impl<T, L: RawMutex> fmt::Debug for Pool<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("unused_resources", &self.unused_resources())
            .field("fixed_capacity", &self.is_fixed_capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn allocate_reuses_last_returned() {
        let next = Arc::new(AtomicUsize::new(0));
        let ids = Arc::clone(&next);
        let pool: Pool<usize> = Pool::new(move || ids.fetch_add(1, Ordering::Relaxed));

        let first = pool.allocate();
        let second = pool.allocate();
        assert_eq!((*first, *second), (0, 1));

        drop(first);
        assert_eq!(*pool.allocate(), 0);
        assert_eq!(next.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn try_allocate_reports_exhaustion() {
        let pool: Pool<u8> = Pool::default();
        pool.prefill(1).set_fixed_capacity(true);

        let held = pool.try_allocate().unwrap();
        assert_eq!(pool.try_allocate().unwrap_err(), PoolError::Exhausted);
        drop(held);
        assert!(pool.try_allocate().is_ok());
    }

    #[test]
    fn debug_shows_state() {
        let pool: Pool<u8> = Pool::default();
        pool.prefill(2);
        let rendered = format!("{pool:?}");
        assert!(rendered.contains("unused_resources: 2"));
        assert!(rendered.contains("fixed_capacity: false"));
    }

    #[test]
    fn clone_owns_a_separate_core() {
        let pool: Pool<u8> = Pool::new(|| 1);
        let copy = pool.clone();
        assert!(!Arc::ptr_eq(&pool.core, &copy.core));
        assert_eq!(Arc::strong_count(&pool.core), 1);
    }
}
