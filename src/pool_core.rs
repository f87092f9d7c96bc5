use crate::{locking::PolicyMutex, Handle, PoolAllocator, RawMutex};
use std::{
    mem,
    sync::{Arc, Weak},
};

/// Mutable pooling state, only ever touched under the policy lock.
struct State<T> {
    /// Free resources, most recently recycled last.
    free: Vec<T>,
    /// Limits the pool to the entries that were prefilled or returned.
    fixed_capacity: bool,
}

/// The shared state behind a [`Pool`](crate::Pool).
///
/// Facades own it through an [`Arc`]; handles only keep a [`Weak`] back
/// reference so they never extend its lifetime.
pub(crate) struct Core<T, L: RawMutex> {
    allocator: Arc<dyn PoolAllocator<T> + Send + Sync>,
    state: PolicyMutex<L, State<T>>,
}

impl<T, L: RawMutex> Core<T, L> {
    pub(crate) fn new(allocator: Arc<dyn PoolAllocator<T> + Send + Sync>) -> Self {
        Self {
            allocator,
            state: PolicyMutex::new(State {
                free: Vec::new(),
                fixed_capacity: false,
            }),
        }
    }

    /// Builds an independent core holding fresh instances for every free
    /// resource of `self`. The source lock is held for the whole pass.
    pub(crate) fn duplicate(&self) -> Self {
        let state = self.state.lock();
        let free: Vec<T> = (0..state.free.len())
            .map(|_| self.allocator.allocate())
            .collect();
        tracing::debug!(resources = free.len(), "duplicated pool");
        Self {
            allocator: Arc::clone(&self.allocator),
            state: PolicyMutex::new(State {
                free,
                fixed_capacity: state.fixed_capacity,
            }),
        }
    }

    /// Pops the most recently recycled resource, constructing a new one when
    /// the free list is empty. Returns an invalid handle if the pool has a
    /// fixed capacity and nothing is free.
    pub(crate) fn allocate(self: &Arc<Self>) -> Handle<T, L> {
        let (popped, fixed) = {
            let mut state = self.state.lock();
            (state.free.pop(), state.fixed_capacity)
        };
        match popped {
            Some(obj) => Handle::new(obj, Arc::downgrade(self)),
            None if fixed => Handle::empty(),
            None => Handle::new(self.allocator.allocate(), Arc::downgrade(self)),
        }
    }

    /// Appends up to `count` handles to `out`, draining the free list under
    /// a single lock acquisition and constructing any shortfall outside it.
    /// Returns the number of handles appended.
    pub(crate) fn allocate_bulk(
        self: &Arc<Self>,
        out: &mut Vec<Handle<T, L>>,
        count: usize,
    ) -> usize {
        let (drained, fixed) = {
            let mut state = self.state.lock();
            let keep = state.free.len().saturating_sub(count);
            (state.free.split_off(keep), state.fixed_capacity)
        };
        let reused = drained.len();
        let missing = if fixed { 0 } else { count - reused };

        out.reserve(reused + missing);
        let back_ref = Arc::downgrade(self);
        out.extend(
            drained
                .into_iter()
                .rev()
                .map(|obj| Handle::new(obj, Weak::clone(&back_ref))),
        );
        out.extend(
            (0..missing).map(|_| Handle::new(self.allocator.allocate(), Weak::clone(&back_ref))),
        );

        tracing::trace!(requested = count, reused, constructed = missing, "bulk allocation");
        reused + missing
    }

    /// Takes back a resource released by a handle.
    pub(crate) fn recycle(&self, mut obj: T) {
        self.allocator.recycle(&mut obj);
        self.state.lock().free.push(obj);
    }

    /// Takes back every resource leased from this core in one lock
    /// acquisition. Empty handles are skipped; handles leased from another
    /// core are released to their own pool.
    pub(crate) fn recycle_bulk<I>(self: &Arc<Self>, handles: I)
    where
        I: IntoIterator<Item = Handle<T, L>>,
    {
        let mut returned = Vec::new();
        for mut handle in handles {
            if !handle.is_leased_from(self) {
                continue;
            }
            if let Some(mut obj) = handle.release() {
                self.allocator.recycle(&mut obj);
                returned.push(obj);
            }
        }
        if returned.is_empty() {
            return;
        }
        tracing::trace!(resources = returned.len(), "bulk recycle");
        self.state.lock().free.append(&mut returned);
    }

    /// Constructs resources until at least `count` are free.
    pub(crate) fn prefill(&self, count: usize) {
        let missing = count.saturating_sub(self.state.lock().free.len());
        if missing == 0 {
            return;
        }
        let mut fresh: Vec<T> = (0..missing).map(|_| self.allocator.allocate()).collect();
        tracing::debug!(target_free = count, constructed = missing, "prefilled pool");
        self.state.lock().free.append(&mut fresh);
    }

    pub(crate) fn set_fixed_capacity(&self, on: bool) {
        self.state.lock().fixed_capacity = on;
    }

    pub(crate) fn is_fixed_capacity(&self) -> bool {
        self.state.lock().fixed_capacity
    }

    pub(crate) fn unused_resources(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Drops every free resource. The drop happens after the lock is
    /// released so resource destructors may use the pool again.
    pub(crate) fn free_unused(&self) {
        let evicted = mem::take(&mut self.state.lock().free);
        tracing::debug!(resources = evicted.len(), "freed unused resources");
        drop(evicted);
    }
}
