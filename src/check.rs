//! The optional consistency checker (§6, §8 P1).
//!
//! Walks the heap from the first real block to the sentinel, checking I1–I4
//! and I6 against the live bytes, then cross-checks the free list (I5) and
//! the overall byte accounting (P5). Never called from `allocate`/`free`
//! themselves — those assume invariants hold; this is a diagnostic a caller
//! opts into.

use crate::block::{self, A, HEAD_SLOT_SIZE, MIN_BLOCK, W};
use crate::engine::Allocator;
use crate::error::CheckFailure;
use crate::free_list::FreeList;
use crate::host::HeapHost;

impl<H: HeapHost> Allocator<H> {
    /// Walk the heap and the free list, verifying every invariant from §3.
    ///
    /// # Errors
    /// Returns the first [`CheckFailure`] encountered. Not exhaustive in the
    /// sense of reporting every violation — a single bad block is enough to
    /// make later checks meaningless.
    pub fn check(&self) -> Result<(), CheckFailure> {
        let low = self.host().low();
        let high = self.host().high();
        let list = FreeList::new(low);

        let mut block = low + HEAD_SLOT_SIZE;
        let mut prev_used_expected = true;
        let mut heap_free_count = 0usize;
        let mut heap_free_bytes = 0usize;

        loop {
            let size = unsafe { block::size_of(block) };
            let used = unsafe { block::is_used(block) };
            let prev_used = unsafe { block::is_prev_used(block) };

            if size == 0 {
                if !used {
                    return Err(CheckFailure::BadSentinel { addr: block, size });
                }
                if prev_used != prev_used_expected {
                    return Err(CheckFailure::PrevUsedMismatch {
                        addr: block,
                        prev_used,
                    });
                }
                break;
            }

            if size % A != 0 || size < MIN_BLOCK {
                return Err(CheckFailure::MalformedSize {
                    addr: block,
                    size,
                    a: A,
                });
            }

            if prev_used != prev_used_expected {
                return Err(CheckFailure::PrevUsedMismatch {
                    addr: block,
                    prev_used,
                });
            }

            if !used {
                heap_free_count += 1;
                heap_free_bytes += size;

                let header = unsafe { block::raw_bits(block) };
                let footer = unsafe { block::raw_bits(block::footer_of(block)) };
                if header != footer {
                    return Err(CheckFailure::FooterMismatch {
                        addr: block,
                        header,
                        footer,
                    });
                }
            }

            let next = block + size;
            if !used && next <= high {
                let next_used = unsafe { block::is_used(next) };
                if !next_used {
                    return Err(CheckFailure::AdjacentFreeBlocks {
                        first: block,
                        second: next,
                    });
                }
            }

            prev_used_expected = used;
            block = next;
        }

        let sentinel = block;
        if sentinel != high + 1 - W {
            return Err(CheckFailure::SizeAccounting {
                computed: sentinel + W,
                expected: high + 1,
            });
        }

        let accounted = (sentinel + W) - low;
        let expected = high + 1 - low;
        if accounted != expected {
            return Err(CheckFailure::SizeAccounting {
                computed: accounted,
                expected,
            });
        }

        let mut list_count = 0usize;
        let mut list_bytes = 0usize;
        let limit = heap_free_count + 1;
        let mut current = unsafe { list.raw_head() };
        while current != 0 {
            list_count += 1;
            if list_count > limit {
                return Err(CheckFailure::FreeListCycle { limit });
            }
            list_bytes += unsafe { block::size_of(current) };
            current = unsafe { list.raw_next(current) };
        }

        if list_count != heap_free_count || list_bytes != heap_free_bytes {
            return Err(CheckFailure::FreeListMismatch {
                list_count,
                list_bytes,
                heap_count: heap_free_count,
                heap_bytes: heap_free_bytes,
            });
        }

        Ok(())
    }
}
