use thiserror::Error;

/// Errors reported by [`Pool`](crate::Pool) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool has a fixed capacity and every resource is currently leased.
    #[error("pool exhausted: fixed capacity reached and no resource is free")]
    Exhausted,
}
