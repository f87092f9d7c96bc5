#![doc = include_str!("../README.md")]
#![warn(missing_docs, missing_debug_implementations)]
mod builder;
mod error;
mod handle;
mod locking;
mod pool;
mod pool_allocator;
mod pool_core;

pub use builder::*;
pub use error::*;
pub use handle::*;
pub use locking::{MutexLock, NoLock, RawMutex, ThreadSafety};
pub use pool::*;
pub use pool_allocator::{DefaultAllocator, PoolAllocator};
