use crate::{pool_core::Core, MutexLock, NoLock, RawMutex};
use core::{
    fmt,
    hash::{Hash, Hasher},
    ops::{Deref, DerefMut},
    ptr,
};
use std::sync::{Arc, Weak};

/// A leased resource.
///
/// The handle owns the resource and keeps a weak back reference to the pool
/// it came from. When the handle is dropped the resource goes back to that
/// pool, or is simply dropped if the pool no longer exists, so pools and
/// handles may be destroyed in any order.
///
/// A handle can also be *invalid*: [`Pool::allocate`](crate::Pool::allocate)
/// returns one when a fixed-capacity pool is exhausted. Use
/// [`Self::is_valid`] or [`Self::get`] to tell the two apart; dereferencing an
/// invalid handle panics.
pub struct Handle<T, L: RawMutex = MutexLock> {
    obj: Option<T>,
    pool: Weak<Core<T, L>>,
}

/// Handle leased from a [`LocalPool`](crate::LocalPool).
pub type LocalHandle<T> = Handle<T, NoLock>;

impl<T, L: RawMutex> Handle<T, L> {
    pub(crate) fn new(obj: T, pool: Weak<Core<T, L>>) -> Self {
        Handle {
            obj: Some(obj),
            pool,
        }
    }

    /// Creates an invalid handle that holds no resource.
    pub fn empty() -> Self {
        Handle {
            obj: None,
            pool: Weak::new(),
        }
    }

    /// Returns `true` if the handle holds a resource.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.obj.is_some()
    }

    /// Returns `true` while the pool this handle was leased from is alive.
    ///
    /// A detached handle still owns its resource; it just drops it instead of
    /// recycling it.
    pub fn is_attached(&self) -> bool {
        self.pool.strong_count() > 0
    }

    /// Borrows the resource, or `None` for an invalid handle.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.obj.as_ref()
    }

    /// Mutably borrows the resource, or `None` for an invalid handle.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.obj.as_mut()
    }

    /// Consumes the handle and returns the resource without returning it to
    /// the pool.
    ///
    /// The resource is no longer accounted for by the pool afterwards.
    pub fn into_inner(mut self) -> Option<T> {
        self.release()
    }

    /// Turns the handle into a shareable one. The resource is recycled once
    /// the last clone of the returned [`Arc`] is dropped.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Takes the resource out without recycling it, leaving the handle
    /// invalid.
    pub(crate) fn release(&mut self) -> Option<T> {
        self.obj.take()
    }

    pub(crate) fn is_leased_from(&self, core: &Arc<Core<T, L>>) -> bool {
        ptr::eq(self.pool.as_ptr(), Arc::as_ptr(core))
    }

    #[track_caller]
    fn resource(&self) -> &T {
        match &self.obj {
            Some(obj) => obj,
            None => panic!("dereferenced an invalid pool handle"),
        }
    }

    #[track_caller]
    fn resource_mut(&mut self) -> &mut T {
        match &mut self.obj {
            Some(obj) => obj,
            None => panic!("dereferenced an invalid pool handle"),
        }
    }
}

impl<T, L: RawMutex> Default for Handle<T, L> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, L: RawMutex> Deref for Handle<T, L> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.resource()
    }
}

impl<T, L: RawMutex> DerefMut for Handle<T, L> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource_mut()
    }
}

/// Returns the resource to its pool, or drops it if the pool is gone.
impl<T, L: RawMutex> Drop for Handle<T, L> {
    fn drop(&mut self) {
        let Some(obj) = self.obj.take() else {
            return;
        };
        if let Some(core) = self.pool.upgrade() {
            core.recycle(obj);
        }
    }
}

impl<T: fmt::Debug, L: RawMutex> fmt::Debug for Handle<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.obj {
            Some(obj) => fmt::Debug::fmt(obj, f),
            None => f.write_str("Handle(<invalid>)"),
        }
    }
}

impl<T: Hash, L: RawMutex> Hash for Handle<T, L> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.obj.hash(state);
    }
}

impl<T: PartialEq, L: RawMutex> PartialEq for Handle<T, L> {
    #[inline]
    fn eq(&self, other: &Handle<T, L>) -> bool {
        self.obj == other.obj
    }
}

impl<T: Eq, L: RawMutex> Eq for Handle<T, L> {}

impl<T, L: RawMutex> AsRef<T> for Handle<T, L> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, L: RawMutex> AsMut<T> for Handle<T, L> {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut T {
        self
    }
}
