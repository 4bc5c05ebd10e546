//! A small in-memory [`HeapHost`] test double, playing the role the real
//! heap simulator plays in production (§1: "the heap simulator itself" is
//! an external collaborator, out of scope for this crate).
//!
//! Backed by a fixed, over-sized, 8-aligned byte buffer so addresses are
//! real pointers the engine can dereference, not synthetic offsets. Uses
//! `alloc_zeroed` directly rather than a boxed array literal, which would
//! build the whole buffer on the stack before moving it to the heap.

use alloc_core::HeapHost;
use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ptr::NonNull;

/// Total backing storage handed to every test. Comfortably larger than any
/// scenario in this suite needs, including the heap-growth tests that force
/// several `grow` calls.
const CAPACITY: usize = 16 * 1024 * 1024;

const PAGE_SIZE: usize = 4096;

/// Test double for the heap simulator: a monotonically growing window into
/// a fixed backing buffer.
pub struct TestHost {
    ptr: NonNull<u8>,
    layout: Layout,
    base: usize,
    used: usize,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    #[must_use]
    pub fn new() -> Self {
        let layout = Layout::from_size_align(CAPACITY, 8).expect("valid layout");
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).expect("backing allocation must succeed");
        Self {
            ptr,
            layout,
            base: ptr.as_ptr() as usize,
            used: 0,
        }
    }

    /// Keeps the backing allocation alive for the caller's inspection needs
    /// (none of the current tests use this, but it mirrors the simulator's
    /// own `low`/`high` pair being independently queryable).
    #[allow(dead_code)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl HeapHost for TestHost {
    fn low(&self) -> usize {
        self.base
    }

    fn high(&self) -> usize {
        self.base + self.used - 1
    }

    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    fn grow(&mut self, n: usize) -> Option<usize> {
        if self.used + n > self.layout.size() {
            return None;
        }
        let addr = self.base + self.used;
        self.used += n;
        Some(addr)
    }
}
