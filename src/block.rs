use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

use crate::error::BlockDequeError;

/// Number of elements a single block can hold.
pub const BLOCK_CAPACITY: usize = 16;

/// Handle of a block inside a [`BlockArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockId(usize);

/// A fixed-capacity region of possibly uninitialized cells.
///
/// The block never tracks which cells are live; the owning deque derives
/// that from its cursor state. Dropping a block frees the memory without
/// running any element destructor.
pub(crate) struct Block<T> {
    cells: NonNull<MaybeUninit<T>>,
}

// SAFETY: a block uniquely owns its cells, like `Box<[MaybeUninit<T>]>`.
#[allow(unsafe_code)]
unsafe impl<T: Send> Send for Block<T> {}
#[allow(unsafe_code)]
unsafe impl<T: Sync> Sync for Block<T> {}

impl<T> Block<T> {
    fn try_new() -> Result<Self, BlockDequeError> {
        let mut cells: Vec<MaybeUninit<T>> = Vec::new();
        cells
            .try_reserve_exact(BLOCK_CAPACITY)
            .map_err(|_| BlockDequeError::AllocationFailed {
                requested: BLOCK_CAPACITY,
            })?;
        cells.resize_with(BLOCK_CAPACITY, MaybeUninit::uninit);
        let raw = Box::into_raw(cells.into_boxed_slice()).cast::<MaybeUninit<T>>();
        // SAFETY: `Box::into_raw` never returns null.
        #[allow(unsafe_code)]
        let cells = unsafe { NonNull::new_unchecked(raw) };
        Ok(Self { cells })
    }

    /// Raw pointer to the cell at `offset`.
    ///
    /// The pointer is valid for reads and writes for as long as the block is
    /// alive. Whether the cell holds an initialized `T` is up to the caller.
    pub(crate) fn cell(&self, offset: usize) -> *mut T {
        debug_assert!(offset < BLOCK_CAPACITY, "offset {offset} beyond block");
        // SAFETY: offset is within the allocation of BLOCK_CAPACITY cells.
        #[allow(unsafe_code)]
        let cell = unsafe { self.cells.as_ptr().add(offset) };
        cell.cast::<T>()
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        let slice = ptr::slice_from_raw_parts_mut(self.cells.as_ptr(), BLOCK_CAPACITY);
        // SAFETY: `cells` came from `Box::into_raw` of a slice of exactly
        // BLOCK_CAPACITY cells and is freed only here.
        #[allow(unsafe_code)]
        drop(unsafe { Box::from_raw(slice) });
    }
}

/// Owner of every block of a deque.
///
/// Blocks are addressed by `BlockId`. Released ids go to a free list and
/// are handed out again before the arena grows. A released block's memory
/// is returned to the allocator immediately; only the id is recycled.
pub(crate) struct BlockArena<T> {
    blocks: Vec<Option<Block<T>>>,
    free: Vec<BlockId>,
    live: usize,
}

impl<T> BlockArena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            blocks: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of blocks currently allocated.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Allocates a fresh block.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::AllocationFailed` if memory for the block or
    /// for the arena bookkeeping cannot be obtained. The arena is unchanged
    /// in that case.
    pub(crate) fn acquire(&mut self) -> Result<BlockId, BlockDequeError> {
        let block = Block::try_new()?;
        let id = if let Some(id) = self.free.pop() {
            self.blocks[id.0] = Some(block);
            id
        } else {
            // Keep room in the free list for every id so `release` never allocates.
            let total = self.blocks.len() + 1;
            self.blocks
                .try_reserve(1)
                .and_then(|()| self.free.try_reserve(total - self.free.len()))
                .map_err(|_| BlockDequeError::AllocationFailed { requested: total })?;
            self.blocks.push(Some(block));
            BlockId(self.blocks.len() - 1)
        };
        self.live += 1;
        tracing::trace!(block = id.0, live = self.live, "acquired block");
        Ok(id)
    }

    /// Frees a block. The caller must have moved out or dropped every live
    /// element in it.
    pub(crate) fn release(&mut self, id: BlockId) {
        if let Some(slot) = self.blocks.get_mut(id.0) {
            if slot.take().is_some() {
                self.free.push(id);
                self.live -= 1;
                tracing::trace!(block = id.0, live = self.live, "released block");
            }
        }
    }

    #[allow(clippy::expect_used)]
    pub(crate) fn get(&self, id: BlockId) -> &Block<T> {
        self.blocks
            .get(id.0)
            .and_then(Option::as_ref)
            .expect("block id refers to a live block")
    }
}
