//! # `alloc-core`
//!
//! The block/free-list engine for a general-purpose dynamic storage
//! allocator: boundary-tag block layout, an intrusive LIFO free list, and a
//! first-fit allocation engine with immediate bidirectional coalescing.
//!
//! This crate is the *core* only — it consumes a [`HeapHost`] that supplies
//! the actual backing memory (`sbrk`, a static array, mapped pages,
//! whatever) and exposes [`Allocator::init`], [`Allocator::allocate`],
//! [`Allocator::free`] and the optional [`Allocator::check`] diagnostic. It
//! does not implement thread safety, multiple arenas, size classes, or
//! returning memory to the host — see `DESIGN.md`.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod block;
mod check;
mod engine;
mod error;
mod free_list;
mod host;

pub use engine::Allocator;
pub use error::{CheckFailure, HeapExhausted};
pub use host::HeapHost;
