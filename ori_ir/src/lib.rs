//! Shared low-level value types for the declaration environment.
//!
//! This crate holds the leaf types that everything else is built on:
//! - `Name`: a compact interned identifier
//! - `StringInterner` / `SharedInterner`: sharded interning with concurrent access
//! - `Span`: a compact source location
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → Name(u32), so identifier equality and
//!   hashing are O(1) regardless of string length.
//! - **Small, Copy Types**: `Name` and `Span` are `Copy` and fit in a register,
//!   so they can be threaded through the environment without cloning strings.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod span;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use span::{Span, SpanError};
