//! The few error kinds the engine surfaces (§7).
//!
//! Everything else — double-free, freeing a foreign pointer, writing past a
//! payload into a neighbor's header — is undefined behavior by contract, not
//! a reportable error, and is documented on the relevant `unsafe fn` instead.

/// The host's `grow` primitive reported address-space exhaustion.
///
/// `Allocator::init` and `Allocator::allocate` surface this as, respectively,
/// an `Err` and a `None` return rather than aborting — see `DESIGN.md` for
/// why this crate resolves §7's open policy question that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("heap exhausted: host declined to grow")]
pub struct HeapExhausted;

/// A violated invariant, as reported by [`crate::Allocator::check`].
///
/// Each variant names the invariant from §3 it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckFailure {
    /// I1: size isn't a multiple of `A`, or is below `MIN_BLOCK`.
    #[error("block at {addr:#x} has malformed size {size} (alignment {a})")]
    MalformedSize { addr: usize, size: usize, a: usize },

    /// I2: `PREV_USED` disagrees with the preceding block's `USED` flag.
    #[error("block at {addr:#x}: PREV_USED={prev_used} disagrees with the preceding block")]
    PrevUsedMismatch { addr: usize, prev_used: bool },

    /// I3: a free block's footer doesn't mirror its header.
    #[error("free block at {addr:#x}: footer {footer:#x} != header {header:#x}")]
    FooterMismatch { addr: usize, header: u64, footer: u64 },

    /// I4: two free blocks sit next to each other uncoalesced.
    #[error("adjacent free blocks at {first:#x} and {second:#x}")]
    AdjacentFreeBlocks { first: usize, second: usize },

    /// I6: the sentinel isn't `size=0, USED=1`.
    #[error("sentinel at {addr:#x} has size {size}, expected 0")]
    BadSentinel { addr: usize, size: usize },

    /// I5: the free list's node count/byte total disagrees with a direct
    /// heap walk's free-block count/byte total.
    #[error(
        "free list has {list_count} block(s)/{list_bytes}B, heap walk found {heap_count}/{heap_bytes}B"
    )]
    FreeListMismatch {
        list_count: usize,
        list_bytes: usize,
        heap_count: usize,
        heap_bytes: usize,
    },

    /// I5: the free list didn't terminate within the number of free blocks
    /// the heap walk found — a cycle or a corrupted link.
    #[error("free list scan exceeded {limit} steps without terminating")]
    FreeListCycle { limit: usize },

    /// P5: total accounted bytes (head slot + blocks + sentinel) don't match
    /// the host-reported heap span.
    #[error("heap accounting mismatch: computed {computed:#x}, expected {expected:#x}")]
    SizeAccounting { computed: usize, expected: usize },
}
