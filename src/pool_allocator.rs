use crate::ThreadSafety;
use core::fmt;

/// A trait defining how a pool creates and recycles its resources.
///
/// The pool calls [`Self::allocate`] whenever it needs a fresh resource and
/// [`Self::recycle`] every time a leased resource is handed back, right
/// before it re-enters the free list.
pub trait PoolAllocator<T> {
    /// Creates a new object of type T.
    fn allocate(&self) -> T;

    /// Resets the state of an object that is being returned to the pool.
    ///
    /// By default, this method does nothing. Override this method to close
    /// temporary resources or clear buffers before the object is reused.
    #[inline(always)]
    fn recycle(&self, _obj: &mut T) {}
}

/// Allocator for types that can be built with [`Default`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAllocator;

impl<T: Default> PoolAllocator<T> for DefaultAllocator {
    #[inline(always)]
    fn allocate(&self) -> T {
        T::default()
    }
}

pub(crate) type Factory<T> = Box<dyn Fn() -> T>;
pub(crate) type RecycleHook<T> = Box<dyn Fn(&mut T)>;

/// Allocator assembled from a factory closure and an optional recycle hook.
pub(crate) struct FnAllocator<T> {
    factory: Factory<T>,
    recycle: Option<RecycleHook<T>>,
}

impl<T> FnAllocator<T> {
    pub(crate) fn new(factory: Factory<T>, recycle: Option<RecycleHook<T>>) -> Self {
        Self { factory, recycle }
    }
}

impl<T> PoolAllocator<T> for FnAllocator<T> {
    #[inline(always)]
    fn allocate(&self) -> T {
        (self.factory)()
    }

    #[inline(always)]
    fn recycle(&self, obj: &mut T) {
        if let Some(hook) = &self.recycle {
            hook(obj);
        }
    }
}

impl<T> fmt::Debug for FnAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAllocator")
            .field("recycle", &self.recycle.is_some())
            .finish_non_exhaustive()
    }
}

/// Allocator whose thread requirements were checked against the locking
/// policy of the pool that stores it.
pub(crate) struct Checked<A>(A);

impl<A> Checked<A> {
    pub(crate) fn new<T, L>(allocator: A) -> Self
    where
        A: PoolAllocator<T> + ThreadSafety<L>,
    {
        Self(allocator)
    }

    /// # Safety
    ///
    /// `allocator` must be `Send + Sync` unless it is only ever stored in a
    /// [`NoLock`](crate::NoLock) pool.
    pub(crate) unsafe fn new_unchecked(allocator: A) -> Self {
        Self(allocator)
    }
}

// Safety: a `Checked` either wraps a `Send + Sync` allocator or lives in a
// `NoLock` core. That core is `!Sync`, so every `Arc` and `Weak` pointing at
// it is `!Send` and the allocator never leaves the thread that created it.
unsafe impl<A> Send for Checked<A> {}
unsafe impl<A> Sync for Checked<A> {}

impl<T, A: PoolAllocator<T>> PoolAllocator<T> for Checked<A> {
    #[inline(always)]
    fn allocate(&self) -> T {
        self.0.allocate()
    }

    #[inline(always)]
    fn recycle(&self, obj: &mut T) {
        self.0.recycle(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn default_allocator_builds_default_values() {
        let value: Vec<u8> = DefaultAllocator.allocate();
        assert!(value.is_empty());
    }

    #[test]
    fn fn_allocator_runs_hook_only_when_present() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let with_hook = FnAllocator::<u32>::new(
            Box::new(|| 7),
            Some(Box::new(move |v: &mut u32| {
                *v = 0;
                counter.fetch_add(1, Ordering::Relaxed);
            })),
        );
        let mut value = with_hook.allocate();
        assert_eq!(value, 7);
        with_hook.recycle(&mut value);
        assert_eq!(value, 0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        let without_hook = FnAllocator::<u32>::new(Box::new(|| 3), None);
        let mut value = without_hook.allocate();
        without_hook.recycle(&mut value);
        assert_eq!(value, 3);
    }
}
