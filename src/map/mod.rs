//! Map implementations
//!
//! This module provides the concurrent open-addressing map and its building blocks.
//!
//! ## Layout
//!
//! - [`ConcurrentOpenAddressingMap`]: the public, thread-safe map
//! - `raw`: the unsynchronised slot array and probing algorithms it locks around
//! - [`slot`]: validated keys and slot states

pub mod concurrent;
mod raw;
pub mod slot;

pub use self::concurrent::ConcurrentOpenAddressingMap;
pub use self::slot::Key;


#[cfg(test)]
mod proptests;
