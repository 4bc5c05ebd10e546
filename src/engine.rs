//! The allocation engine (§4.3): `init`, `allocate`, `free`, heap growth,
//! split and coalesce. This module owns every invariant from §3 — the
//! other modules only provide the arithmetic and the list it orchestrates.

use crate::block::{self, A, HEAD_SLOT_SIZE, MIN_BLOCK, W};
use crate::error::HeapExhausted;
use crate::free_list::FreeList;
use crate::host::HeapHost;

/// The block/free-list engine, generic over the host that supplies backing
/// storage (§6). Holding an `Allocator<H>` does not imply the heap has been
/// initialized yet — callers must call [`Allocator::init`] first.
pub struct Allocator<H: HeapHost> {
    host: H,
}

impl<H: HeapHost> Allocator<H> {
    /// Wrap a host. The heap is not usable until [`Self::init`] succeeds.
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    #[inline]
    fn free_list(&self) -> FreeList {
        FreeList::new(self.host.low())
    }

    /// Borrow the underlying host (diagnostics, tests).
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// §4.3 `init`: grow the heap by one minimal block, lay down the head
    /// slot, the first free block and the sentinel.
    ///
    /// Must be called exactly once before any other method. Calling it a
    /// second time on the same host re-establishes a fresh single-block heap
    /// on top of whatever the host now reports as `low`/`high`, which is only
    /// sound if the host itself was reset — not a contract this type polices.
    ///
    /// # Errors
    /// Returns [`HeapExhausted`] if the host's `grow` declines the initial
    /// request.
    pub fn init(&mut self) -> Result<(), HeapExhausted> {
        let request = HEAD_SLOT_SIZE + MIN_BLOCK + W;
        let base = self.host.grow(request).ok_or(HeapExhausted)?;
        debug_assert_eq!(base, self.host.low());

        let list_head_slot = base;
        let block = base + HEAD_SLOT_SIZE;

        unsafe {
            block::set_header(block, MIN_BLOCK, true, false);
            block::write_footer(block);

            let sentinel = block::following(block);
            block::write_sentinel(sentinel, false);

            // head slot starts zeroed by the host contract, but we own it
            // explicitly rather than assume.
            FreeList::new(list_head_slot).insert(block);
        }

        log::debug!(
            "engine initialized: heap [{:#x}, {:#x}], first free block at {:#x} ({} bytes)",
            self.host.low(),
            self.host.high(),
            block,
            MIN_BLOCK
        );
        Ok(())
    }

    /// §4.3 `allocate`: first-fit with split, growing the heap on miss.
    ///
    /// Returns `null` (`None`) for `size == 0` per §7, and on exhaustion
    /// (§7's policy choice — this crate surfaces it rather than aborting;
    /// see `DESIGN.md`).
    ///
    /// # Panics
    /// Panics if `grow_heap` reports success but the subsequent `first_fit`
    /// still fails to find `req` bytes — §4.3 calls this case fatal (the
    /// host's accounting of what it just grew disagrees with what the
    /// engine wrote), and it should be unreachable given a conforming
    /// [`HeapHost`].
    #[must_use]
    pub fn allocate(&mut self, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }

        let req = core::cmp::max(MIN_BLOCK, block::align_up(size + W, A));
        let list = self.free_list();

        let found = unsafe { list.first_fit(req) };
        let block = match found {
            Some(b) => b,
            None => {
                self.grow_heap(req).ok()?;
                let list = self.free_list();
                unsafe { list.first_fit(req) }
                    .expect("grow_heap grew enough to satisfy req but first_fit still missed")
            }
        };

        let list = self.free_list();
        unsafe {
            list.unlink(block);

            let full = block::size_of(block);
            let prev_used = block::is_prev_used(block);

            if full - req >= MIN_BLOCK {
                block::set_header(block, req, prev_used, true);

                let suffix = block + req;
                block::set_header(suffix, full - req, true, false);
                block::write_footer(suffix);
                list.insert(suffix);
            } else {
                block::set_header(block, full, prev_used, true);
                let following = block::following(block);
                block::set_prev_used(following, true);
            }

            Some(block::payload_of(block))
        }
    }

    /// §4.3 `free`: mark the block free, fix up the neighbor's `PREV_USED`,
    /// link it and immediately coalesce in both directions.
    ///
    /// # Safety
    /// `payload` must be a pointer previously returned by [`Self::allocate`]
    /// on this same allocator and not already freed (double-free is
    /// undefined behavior per §7).
    pub unsafe fn free(&mut self, payload: usize) {
        unsafe {
            let block = block::block_of(payload);
            let size = block::size_of(block);

            block::set_used(block, false);
            block::write_footer(block);

            let following = block::following(block);
            block::set_prev_used(following, false);

            let list = self.free_list();
            list.insert(block);

            self.coalesce(block, size);
        }
    }

    /// §4.3 `coalesce`: absorb adjacent free neighbors in both directions.
    /// Bounded to at most three blocks per §5 (the freed block plus one free
    /// neighbor on each side; I4 rules out longer runs).
    ///
    /// # Safety
    /// `block` must be a free block currently linked into the free list, and
    /// `size` must be its current size.
    unsafe fn coalesce(&mut self, block: usize, size: usize) {
        unsafe {
            let list = self.free_list();
            let mut current = block;
            let mut size = size;

            while !block::is_prev_used(current) {
                let preceding = block::preceding_free(current);
                list.unlink(preceding);
                size += block::size_of(preceding);
                current = preceding;
            }

            loop {
                let following = current + size;
                if block::is_used(following) {
                    break;
                }
                list.unlink(following);
                size += block::size_of(following);
            }

            if current != block || size != block::size_of(block) {
                list.unlink(block);
                block::set_header(current, size, true, false);
                block::write_footer(current);
                list.insert(current);
                log::trace!("coalesced into block at {current:#x} ({size} bytes)");
            }
        }
    }

    /// §4.3 `grow_heap`: round up to a whole number of pages, ask the host to
    /// extend the heap, and fold the new region in as a free block that
    /// coalesces with whatever was previously the tail.
    ///
    /// # Errors
    /// Returns [`HeapExhausted`] if the host declines to grow.
    fn grow_heap(&mut self, req: usize) -> Result<(), HeapExhausted> {
        let page_size = self.host.page_size();
        let pages = req.div_ceil(page_size);
        let total = pages * page_size;

        let old_high = self.host.high();
        let old_sentinel = old_high + 1 - W;
        let old_prev_used = unsafe { block::is_prev_used(old_sentinel) };

        let Some(base) = self.host.grow(total) else {
            log::warn!("heap exhausted: host declined to grow by {total} bytes");
            return Err(HeapExhausted);
        };

        let block = base - W;
        debug_assert_eq!(block, old_sentinel);

        unsafe {
            block::set_header(block, total, old_prev_used, false);
            block::write_footer(block);

            let sentinel = block::following(block);
            block::write_sentinel(sentinel, false);

            let list = self.free_list();
            list.insert(block);
            self.coalesce(block, total);
        }

        log::debug!(
            "grew heap by {total} bytes ({pages} page(s)): [{:#x}, {:#x}] -> [{:#x}, {:#x}]",
            self.host.low(),
            old_high,
            self.host.low(),
            self.host.high()
        );
        Ok(())
    }
}
