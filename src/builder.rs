use crate::{
    pool_allocator::{Checked, Factory, FnAllocator, RecycleHook},
    MutexLock, Pool, RawMutex, ThreadSafety,
};
use core::{fmt, marker::PhantomData};
use std::sync::Arc;

/// Builder for creating a [`Pool`] from a factory closure.
///
/// # Examples
///
/// ```
/// use recycle::Pool;
///
/// let pool: Pool<Vec<u8>> = Pool::builder(|| Vec::with_capacity(1024))
///     .recycle(|buf: &mut Vec<u8>| buf.clear())
///     .prefill(4)
///     .fixed_capacity(true)
///     .build();
///
/// assert_eq!(pool.unused_resources(), 4);
/// assert!(pool.is_fixed_capacity());
/// ```
#[must_use]
pub struct PoolBuilder<T, L = MutexLock> {
    factory: Factory<T>,
    recycle: Option<RecycleHook<T>>,
    prefill: usize,
    fixed_capacity: bool,

    _lock: PhantomData<fn() -> L>,
}

impl<T, L> fmt::Debug for PoolBuilder<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("recycle", &self.recycle.is_some())
            .field("prefill", &self.prefill)
            .field("fixed_capacity", &self.fixed_capacity)
            .finish()
    }
}

impl<T: 'static, L: RawMutex> PoolBuilder<T, L> {
    pub(crate) fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + ThreadSafety<L> + 'static,
    {
        Self {
            factory: Box::new(factory),
            recycle: None,
            prefill: 0,
            fixed_capacity: false,
            _lock: PhantomData,
        }
    }

    /// Sets the hook invoked on every resource right before it re-enters the
    /// free list.
    pub fn recycle<R>(mut self, hook: R) -> Self
    where
        R: Fn(&mut T) + ThreadSafety<L> + 'static,
    {
        self.recycle = Some(Box::new(hook));
        self
    }

    /// Constructs `count` resources up front when the pool is built.
    pub fn prefill(mut self, count: usize) -> Self {
        self.prefill = count;
        self
    }

    /// Stops the pool from constructing resources beyond the prefilled ones.
    pub fn fixed_capacity(mut self, on: bool) -> Self {
        self.fixed_capacity = on;
        self
    }

    /// Builds the pool. Prefilling happens before the capacity is fixed.
    #[must_use]
    pub fn build(self) -> Pool<T, L> {
        let allocator = FnAllocator::new(self.factory, self.recycle);
        // Safety: `new` and `recycle` checked both closures against `L`.
        let allocator = unsafe { Checked::new_unchecked(allocator) };
        let pool = Pool::from_shared_allocator(Arc::new(allocator));
        pool.prefill(self.prefill).set_fixed_capacity(self.fixed_capacity);
        pool
    }
}
