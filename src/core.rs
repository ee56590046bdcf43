use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt;
use core::mem;
use core::ops::{Index, IndexMut};
use core::ptr;

use crate::block::{BlockArena, BlockId, BLOCK_CAPACITY};
use crate::cursor::Cursor;
use crate::error::{BlockDequeError, ElementError};
use crate::iter::{Iter, IterMut};

const MIN_INDEX_CAPACITY: usize = 8;
const GROWTH_FACTOR: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

/// A cell reserved for a push that has not been committed yet.
#[derive(Debug)]
struct Stage {
    slot: usize,
    offset: usize,
    /// The block at `slot` was allocated for this push.
    fresh: bool,
    /// Index layout replaced by a growth this push triggered.
    prior: Option<PriorIndex>,
}

/// Index array and boundary slots as they were before a growth.
#[derive(Debug)]
struct PriorIndex {
    index: Vec<Option<BlockId>>,
    head_slot: usize,
    tail_slot: usize,
}

/// A double-ended random-access buffer built from fixed-capacity blocks.
///
/// Elements live in blocks of [`BLOCK_CAPACITY`] cells. An index array of
/// slots records which block holds which run of the sequence; the live range
/// is described by a (slot, offset) pair for the first element and another
/// for the last one.
pub struct BlockDeque<T> {
    index: Vec<Option<BlockId>>,
    arena: BlockArena<T>,
    len: usize,
    head_slot: usize,
    head_offset: usize,
    tail_slot: usize,
    tail_offset: usize,
    generation: u64,
}

impl<T> BlockDeque<T> {
    /// Creates an empty deque with the default index capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_index(vec![None; MIN_INDEX_CAPACITY + 1])
    }

    /// Creates an empty deque whose index array starts with `slots` slots.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::InvalidConfiguration` if `slots` is 0, or
    /// `BlockDequeError::AllocationFailed` if the index array cannot be
    /// allocated.
    pub fn with_index_slots(slots: usize) -> Result<Self, BlockDequeError> {
        if slots == 0 {
            return Err(BlockDequeError::InvalidConfiguration {
                parameter: "slots",
                value: slots,
            });
        }
        Ok(Self::with_index(try_alloc_index(slots)?))
    }

    fn with_index(index: Vec<Option<BlockId>>) -> Self {
        let start = (index.len() - 1) / 2;
        Self {
            index,
            arena: BlockArena::new(),
            len: 0,
            head_slot: start,
            head_offset: 0,
            tail_slot: start,
            tail_offset: 0,
            generation: 0,
        }
    }

    /// Creates a deque holding `len` default values.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::AllocationFailed` if storage runs out.
    pub fn with_default(len: usize) -> Result<Self, BlockDequeError>
    where
        T: Default,
    {
        let mut deque = Self::new();
        for _ in 0..len {
            deque.push_back_with(T::default)?;
        }
        Ok(deque)
    }

    /// Creates a deque holding `len` clones of `value`.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::AllocationFailed` if storage runs out.
    pub fn from_elem(len: usize, value: &T) -> Result<Self, BlockDequeError>
    where
        T: Clone,
    {
        let mut deque = Self::new();
        for _ in 0..len {
            deque.push_back_with(|| value.clone())?;
        }
        Ok(deque)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the index array.
    #[must_use]
    pub fn index_slots(&self) -> usize {
        self.index.len()
    }

    /// Number of blocks currently allocated.
    #[must_use]
    pub fn allocated_blocks(&self) -> usize {
        self.arena.live()
    }

    /// Generation of the deque. Cursors taken in an older generation are
    /// stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Slot and offset of logical position `index`.
    ///
    /// Valid for `index <= len`; the caller is responsible for the range.
    fn locate(&self, index: usize) -> (usize, usize) {
        let shifted = self.head_offset + index;
        (
            self.head_slot + shifted / BLOCK_CAPACITY,
            shifted % BLOCK_CAPACITY,
        )
    }

    #[allow(clippy::expect_used, clippy::indexing_slicing)]
    fn block_at(&self, slot: usize) -> BlockId {
        self.index[slot].expect("slot inside the live range owns a block")
    }

    fn cell(&self, slot: usize, offset: usize) -> *mut T {
        self.arena.get(self.block_at(slot)).cell(offset)
    }

    pub(crate) fn cell_at(&self, index: usize) -> *mut T {
        let (slot, offset) = self.locate(index);
        self.cell(slot, offset)
    }

    /// Pointer to the cell a cursor names. The cursor must be inside the
    /// live range.
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn cell_at_cursor(&self, cursor: Cursor) -> *mut T {
        self.cell(cursor.slot() as usize, cursor.offset())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn head_linear(&self) -> isize {
        (self.head_slot * BLOCK_CAPACITY + self.head_offset) as isize
    }

    /// Gets the element at `index`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: index < len, so the cell holds a live element.
        #[allow(unsafe_code)]
        let item = unsafe { &*self.cell_at(index) };
        Some(item)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: index < len, and `&mut self` guarantees exclusive access.
        #[allow(unsafe_code)]
        let item = unsafe { &mut *self.cell_at(index) };
        Some(item)
    }

    /// Gets the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::IndexOutOfBounds` if `index >= len`.
    pub fn try_get(&self, index: usize) -> Result<&T, BlockDequeError> {
        let length = self.len;
        self.get(index)
            .ok_or(BlockDequeError::IndexOutOfBounds { index, length })
    }

    /// Mutable variant of [`BlockDeque::try_get`].
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::IndexOutOfBounds` if `index >= len`.
    pub fn try_get_mut(&mut self, index: usize) -> Result<&mut T, BlockDequeError> {
        let length = self.len;
        self.get_mut(index)
            .ok_or(BlockDequeError::IndexOutOfBounds { index, length })
    }

    /// Checked access, same as [`BlockDeque::try_get`].
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::IndexOutOfBounds` if `index >= len`.
    pub fn at(&self, index: usize) -> Result<&T, BlockDequeError> {
        self.try_get(index)
    }

    /// Gets the element at `index` without checking it against the length.
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[allow(unsafe_code)]
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        &*self.cell_at(index)
    }

    /// Mutable variant of [`BlockDeque::get_unchecked`].
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[allow(unsafe_code)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        &mut *self.cell_at(index)
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len.checked_sub(1)?;
        self.get_mut(last)
    }

    /// # Errors
    ///
    /// Returns `BlockDequeError::EmptyDeque` if the deque is empty.
    pub fn try_front(&self) -> Result<&T, BlockDequeError> {
        self.front().ok_or(BlockDequeError::EmptyDeque)
    }

    /// # Errors
    ///
    /// Returns `BlockDequeError::EmptyDeque` if the deque is empty.
    pub fn try_back(&self) -> Result<&T, BlockDequeError> {
        self.back().ok_or(BlockDequeError::EmptyDeque)
    }

    /// Reallocates the index array to three times the occupied span and
    /// moves the occupied slots into its middle third. Blocks stay where
    /// they are; only their ids move. Returns the replaced layout.
    fn grow(&mut self) -> Result<PriorIndex, BlockDequeError> {
        let span = self.tail_slot - self.head_slot + 1;
        let slots = span
            .checked_mul(GROWTH_FACTOR)
            .ok_or(BlockDequeError::AllocationFailed { requested: usize::MAX })?;
        let mut index = try_alloc_index(slots)?;
        index[span..2 * span].copy_from_slice(&self.index[self.head_slot..=self.tail_slot]);

        tracing::debug!(
            old_slots = self.index.len(),
            new_slots = slots,
            span,
            "growing index array"
        );
        let prior = PriorIndex {
            index: mem::replace(&mut self.index, index),
            head_slot: self.head_slot,
            tail_slot: self.tail_slot,
        };
        self.head_slot = span;
        self.tail_slot = 2 * span - 1;
        self.generation += 1;
        Ok(prior)
    }

    /// Reserves the cell a push at `end` will write to, allocating a block
    /// and growing the index array if needed. The live range is untouched.
    ///
    /// The block is acquired before any growth, so a failed allocation
    /// leaves the index array and the generation as they were.
    fn stage(&mut self, end: End) -> Result<Stage, BlockDequeError> {
        if self.len > 0 {
            match end {
                End::Back if self.tail_offset < BLOCK_CAPACITY - 1 => {
                    return Ok(Stage {
                        slot: self.tail_slot,
                        offset: self.tail_offset + 1,
                        fresh: false,
                        prior: None,
                    });
                }
                End::Front if self.head_offset > 0 => {
                    return Ok(Stage {
                        slot: self.head_slot,
                        offset: self.head_offset - 1,
                        fresh: false,
                        prior: None,
                    });
                }
                _ => {}
            }
        }

        let id = self.arena.acquire()?;
        let exhausted = self.len > 0
            && match end {
                End::Back => self.tail_slot + 1 == self.index.len(),
                End::Front => self.head_slot == 0,
            };
        let prior = if exhausted {
            match self.grow() {
                Ok(prior) => Some(prior),
                Err(err) => {
                    self.arena.release(id);
                    return Err(err);
                }
            }
        } else {
            None
        };

        let (slot, offset) = match end {
            _ if self.len == 0 => (self.head_slot, 0),
            End::Back => (self.tail_slot + 1, 0),
            End::Front => (self.head_slot - 1, BLOCK_CAPACITY - 1),
        };
        self.index[slot] = Some(id);
        Ok(Stage {
            slot,
            offset,
            fresh: true,
            prior,
        })
    }

    /// Writes `value` into a staged cell and extends the live range over it.
    fn commit(&mut self, end: End, stage: Stage, value: T) {
        // SAFETY: the staged cell is inside an allocated block and outside
        // the live range, so it holds no element.
        #[allow(unsafe_code)]
        unsafe {
            self.cell(stage.slot, stage.offset).write(value);
        };
        if self.len == 0 {
            self.head_slot = stage.slot;
            self.head_offset = stage.offset;
            self.tail_slot = stage.slot;
            self.tail_offset = stage.offset;
        } else if end == End::Back {
            self.tail_slot = stage.slot;
            self.tail_offset = stage.offset;
        } else {
            self.head_slot = stage.slot;
            self.head_offset = stage.offset;
        }
        self.len += 1;
    }

    /// Inverse of `stage`: frees a block that was allocated for the push
    /// and puts back the index layout a growth replaced.
    fn unstage(&mut self, stage: Stage) {
        tracing::debug!(
            slot = stage.slot,
            fresh = stage.fresh,
            regrown = stage.prior.is_some(),
            "rolling back staged push"
        );
        if stage.fresh {
            self.release_slot(stage.slot);
        }
        if let Some(prior) = stage.prior {
            self.index = prior.index;
            self.head_slot = prior.head_slot;
            self.tail_slot = prior.tail_slot;
            self.generation -= 1;
        }
    }

    fn release_slot(&mut self, slot: usize) {
        if let Some(id) = self.index[slot].take() {
            self.arena.release(id);
        }
    }

    /// Stages a push, runs the element constructor, then commits. If the
    /// constructor fails or panics, the stage is undone.
    fn push_staged<E, F>(&mut self, end: End, make: F) -> Result<(), ElementError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let stage = self.stage(end)?;
        let guard = StageGuard {
            deque: self,
            end,
            stage: Some(stage),
        };
        match make() {
            Ok(value) => {
                guard.commit(value);
                Ok(())
            }
            Err(err) => {
                drop(guard);
                Err(ElementError::Element(err))
            }
        }
    }

    /// Appends an element at the back.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::AllocationFailed` if a block or a larger
    /// index array cannot be allocated. The deque is unchanged and `value`
    /// is dropped.
    pub fn push_back(&mut self, value: T) -> Result<(), BlockDequeError> {
        self.push_back_with(|| value)
    }

    /// Prepends an element at the front.
    ///
    /// # Errors
    ///
    /// Same as [`BlockDeque::push_back`].
    pub fn push_front(&mut self, value: T) -> Result<(), BlockDequeError> {
        self.push_front_with(|| value)
    }

    /// Appends the element produced by `make`. The cell is reserved first;
    /// if `make` panics, the reservation is undone before unwinding
    /// continues.
    ///
    /// # Errors
    ///
    /// Same as [`BlockDeque::push_back`].
    pub fn push_back_with<F>(&mut self, make: F) -> Result<(), BlockDequeError>
    where
        F: FnOnce() -> T,
    {
        self.push_staged(End::Back, || Ok::<T, Infallible>(make()))
            .map_err(deque_error)
    }

    /// Front counterpart of [`BlockDeque::push_back_with`].
    ///
    /// # Errors
    ///
    /// Same as [`BlockDeque::push_back`].
    pub fn push_front_with<F>(&mut self, make: F) -> Result<(), BlockDequeError>
    where
        F: FnOnce() -> T,
    {
        self.push_staged(End::Front, || Ok::<T, Infallible>(make()))
            .map_err(deque_error)
    }

    /// Appends the element produced by a fallible constructor.
    ///
    /// # Errors
    ///
    /// Returns `ElementError::Element` with the constructor's error, or
    /// `ElementError::Deque` if storage could not be reserved. Either way
    /// the deque is left exactly as before the call.
    pub fn try_push_back_with<E, F>(&mut self, make: F) -> Result<(), ElementError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.push_staged(End::Back, make)
    }

    /// Front counterpart of [`BlockDeque::try_push_back_with`].
    ///
    /// # Errors
    ///
    /// Same as [`BlockDeque::try_push_back_with`].
    pub fn try_push_front_with<E, F>(&mut self, make: F) -> Result<(), ElementError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.push_staged(End::Front, make)
    }

    /// Removes and returns the last element, or `None` if the deque is empty.
    ///
    /// The block that held the element is freed if it becomes empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let (slot, offset) = (self.tail_slot, self.tail_offset);
        // SAFETY: the tail cell holds the last live element; the live range
        // is shrunk right after, so it is never read again.
        #[allow(unsafe_code)]
        let value = unsafe { self.cell(slot, offset).read() };
        self.len -= 1;
        if self.len == 0 {
            self.release_slot(slot);
            self.collapse();
        } else if offset == 0 {
            self.release_slot(slot);
            self.tail_slot -= 1;
            self.tail_offset = BLOCK_CAPACITY - 1;
        } else {
            self.tail_offset -= 1;
        }
        Some(value)
    }

    /// Removes and returns the first element, or `None` if the deque is
    /// empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let (slot, offset) = (self.head_slot, self.head_offset);
        // SAFETY: the head cell holds the first live element.
        #[allow(unsafe_code)]
        let value = unsafe { self.cell(slot, offset).read() };
        self.len -= 1;
        if self.len == 0 {
            self.release_slot(slot);
            self.collapse();
        } else if offset == BLOCK_CAPACITY - 1 {
            self.release_slot(slot);
            self.head_slot += 1;
            self.head_offset = 0;
        } else {
            self.head_offset += 1;
        }
        Some(value)
    }

    /// # Errors
    ///
    /// Returns `BlockDequeError::EmptyDeque` if the deque is empty.
    pub fn try_pop_back(&mut self) -> Result<T, BlockDequeError> {
        self.pop_back().ok_or(BlockDequeError::EmptyDeque)
    }

    /// # Errors
    ///
    /// Returns `BlockDequeError::EmptyDeque` if the deque is empty.
    pub fn try_pop_front(&mut self) -> Result<T, BlockDequeError> {
        self.pop_front().ok_or(BlockDequeError::EmptyDeque)
    }

    /// Resets the cursor state of an empty deque to the start of the head
    /// slot.
    fn collapse(&mut self) {
        self.tail_slot = self.head_slot;
        self.head_offset = 0;
        self.tail_offset = 0;
    }

    /// Cursor at the first element (equal to `end()` when empty).
    #[must_use]
    pub fn begin(&self) -> Cursor {
        self.cursor_unchecked(0)
    }

    /// Cursor one past the last element.
    #[must_use]
    pub fn end(&self) -> Cursor {
        self.cursor_unchecked(self.len)
    }

    /// Cursor at logical position `index`; `index == len` gives `end()`.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::IndexOutOfBounds` if `index > len`.
    pub fn cursor_at(&self, index: usize) -> Result<Cursor, BlockDequeError> {
        if index > self.len {
            return Err(BlockDequeError::IndexOutOfBounds {
                index,
                length: self.len,
            });
        }
        Ok(self.cursor_unchecked(index))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn cursor_unchecked(&self, index: usize) -> Cursor {
        let (slot, offset) = self.locate(index);
        Cursor::new(slot as isize, offset, self.generation)
    }

    /// Logical position of a cursor checked against the current generation.
    /// `end()` is accepted only when `allow_end` is set.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    fn position_of(&self, cursor: Cursor, allow_end: bool) -> Result<usize, BlockDequeError> {
        if cursor.generation() != self.generation {
            return Err(BlockDequeError::StaleCursor {
                cursor_generation: cursor.generation(),
                deque_generation: self.generation,
            });
        }
        let position = cursor.linear() - self.head_linear();
        let len = self.len as isize;
        if position < 0 || position > len || (position == len && !allow_end) {
            return Err(BlockDequeError::CursorOutOfRange {
                position,
                length: self.len,
            });
        }
        Ok(position as usize)
    }

    /// Logical index of a cursor in `[begin, end]`.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::StaleCursor` or
    /// `BlockDequeError::CursorOutOfRange`.
    pub fn index_of(&self, cursor: Cursor) -> Result<usize, BlockDequeError> {
        self.position_of(cursor, true)
    }

    /// Dereferences a cursor in `[begin, end)`.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::StaleCursor` or
    /// `BlockDequeError::CursorOutOfRange`.
    pub fn get_at(&self, cursor: Cursor) -> Result<&T, BlockDequeError> {
        self.position_of(cursor, false)?;
        // SAFETY: the cursor is current and inside the live range.
        #[allow(unsafe_code)]
        let item = unsafe { &*self.cell_at_cursor(cursor) };
        Ok(item)
    }

    /// Mutable variant of [`BlockDeque::get_at`].
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::StaleCursor` or
    /// `BlockDequeError::CursorOutOfRange`.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Result<&mut T, BlockDequeError> {
        self.position_of(cursor, false)?;
        // SAFETY: the cursor is current and inside the live range.
        #[allow(unsafe_code)]
        let item = unsafe { &mut *self.cell_at_cursor(cursor) };
        Ok(item)
    }

    /// Swaps the elements at two live logical positions.
    fn swap_positions(&mut self, a: usize, b: usize) {
        let pa = self.cell_at(a);
        let pb = self.cell_at(b);
        // SAFETY: both positions are live and distinct.
        #[allow(unsafe_code)]
        unsafe {
            ptr::swap(pa, pb);
        };
    }

    /// Inserts `value` before the element `at` points to (or at the back if
    /// `at` is `end()`), by appending it and swapping it backward into
    /// place.
    ///
    /// Returns a cursor to the inserted element. All earlier cursors become
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::StaleCursor` or
    /// `BlockDequeError::CursorOutOfRange` for a bad cursor, and
    /// `BlockDequeError::AllocationFailed` if storage runs out. The deque is
    /// unchanged on error.
    pub fn insert(&mut self, at: Cursor, value: T) -> Result<Cursor, BlockDequeError> {
        self.try_insert_with(at, || Ok::<T, Infallible>(value))
            .map_err(deque_error)
    }

    /// Inserts the element produced by a fallible constructor before `at`.
    ///
    /// # Errors
    ///
    /// Returns `ElementError::Element` if the constructor fails, or
    /// `ElementError::Deque` for a bad cursor or allocation failure. The
    /// deque is unchanged on error.
    pub fn try_insert_with<E, F>(&mut self, at: Cursor, make: F) -> Result<Cursor, ElementError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let target = self.position_of(at, true)?;
        self.push_staged(End::Back, make)?;
        for position in (target + 1..self.len).rev() {
            self.swap_positions(position, position - 1);
        }
        self.generation += 1;
        Ok(self.cursor_unchecked(target))
    }

    /// Removes and returns the element `at` points to, by swapping it
    /// forward to the back and popping it.
    ///
    /// All earlier cursors become stale.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::StaleCursor` or
    /// `BlockDequeError::CursorOutOfRange` if `at` is not a current cursor
    /// in `[begin, end)`. The deque is unchanged on error.
    pub fn erase(&mut self, at: Cursor) -> Result<T, BlockDequeError> {
        let target = self.position_of(at, false)?;
        for position in target..self.len - 1 {
            self.swap_positions(position, position + 1);
        }
        let value = self.pop_back().ok_or(BlockDequeError::EmptyDeque)?;
        self.generation += 1;
        Ok(value)
    }

    /// Inserts `value` at logical position `index`, shifting later elements
    /// back by one.
    ///
    /// # Errors
    ///
    /// Returns `BlockDequeError::IndexOutOfBounds` if `index > len`, or
    /// `BlockDequeError::AllocationFailed` if storage runs out.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<(), BlockDequeError> {
        let at = self.cursor_at(index)?;
        self.insert(at, value).map(|_| ())
    }

    /// Removes and returns the element at `index`, or `None` if out of
    /// bounds.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        self.erase(self.cursor_unchecked(index)).ok()
    }

    /// Copies the deque element by element with a fallible copier.
    ///
    /// Elements are pushed to the back of a new deque one at a time. If a
    /// copy fails, every element copied so far is popped again before the
    /// error is returned, so a copy is never observed half-populated.
    ///
    /// # Errors
    ///
    /// Returns `ElementError::Element` with the copier's error, or
    /// `ElementError::Deque` if storage runs out.
    pub fn try_clone_with<E, F>(&self, mut copy: F) -> Result<Self, ElementError<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut target = Self::new();
        for item in self {
            if let Err(err) = target.try_push_back_with(|| copy(item)) {
                tracing::debug!(
                    copied = target.len(),
                    total = self.len,
                    "copy failed, rolling back"
                );
                while target.pop_back().is_some() {}
                return Err(err);
            }
        }
        Ok(target)
    }

    /// Replaces the contents of `self` with a copy of `other`.
    ///
    /// The copy is built first; `self` is only touched once it succeeded.
    ///
    /// # Errors
    ///
    /// Same as [`BlockDeque::try_clone_with`]; `self` is unchanged on error.
    pub fn try_assign_from<E, F>(&mut self, other: &Self, copy: F) -> Result<(), ElementError<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        *self = other.try_clone_with(copy)?;
        Ok(())
    }

    /// Drops every element front to back and frees every block.
    ///
    /// If an element's destructor panics, the remaining elements are still
    /// dropped and every block is freed before the panic propagates.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.destroy_all();
    }

    fn destroy_all(&mut self) {
        let len = self.len;
        // Forget the elements first so nothing is dropped twice.
        self.len = 0;
        let mut teardown = Teardown {
            deque: self,
            next: 0,
            len,
        };
        teardown.drop_remaining();
    }

    /// Returns a front-to-back iterator.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self, self.begin(), self.end(), self.len)
    }

    /// Returns a front-to-back iterator over mutable references.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let (begin, end, len) = (self.begin(), self.end(), self.len);
        IterMut::new(self, begin, end, len)
    }

    /// Returns a back-to-front iterator.
    #[must_use]
    pub fn iter_rev(&self) -> core::iter::Rev<Iter<'_, T>> {
        self.iter().rev()
    }
}

/// Undoes a staged push unless it was committed.
struct StageGuard<'a, T> {
    deque: &'a mut BlockDeque<T>,
    end: End,
    stage: Option<Stage>,
}

impl<T> StageGuard<'_, T> {
    fn commit(mut self, value: T) {
        if let Some(stage) = self.stage.take() {
            self.deque.commit(self.end, stage, value);
        }
    }
}

impl<T> Drop for StageGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(stage) = self.stage.take() {
            self.deque.unstage(stage);
        }
    }
}

/// Drops the elements of a deque that has already been marked empty, then
/// frees its blocks. Runs to completion on unwind too.
struct Teardown<'a, T> {
    deque: &'a mut BlockDeque<T>,
    next: usize,
    len: usize,
}

impl<T> Teardown<'_, T> {
    fn drop_remaining(&mut self) {
        while self.next < self.len {
            let cell = self.deque.cell_at(self.next);
            self.next += 1;
            // SAFETY: position was live and is dropped exactly once.
            #[allow(unsafe_code)]
            unsafe {
                ptr::drop_in_place(cell);
            };
        }
    }
}

impl<T> Drop for Teardown<'_, T> {
    fn drop(&mut self) {
        self.drop_remaining();
        for slot in 0..self.deque.index.len() {
            self.deque.release_slot(slot);
        }
        self.deque.collapse();
    }
}

fn try_alloc_index(slots: usize) -> Result<Vec<Option<BlockId>>, BlockDequeError> {
    let mut index = Vec::new();
    index
        .try_reserve_exact(slots)
        .map_err(|_| BlockDequeError::AllocationFailed { requested: slots })?;
    index.resize(slots, None);
    Ok(index)
}

fn deque_error(err: ElementError<Infallible>) -> BlockDequeError {
    match err {
        ElementError::Deque(err) => err,
        ElementError::Element(never) => match never {},
    }
}

impl<T> Drop for BlockDeque<T> {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl<T> Default for BlockDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for BlockDeque<T> {
    #[allow(clippy::panic)]
    fn clone(&self) -> Self {
        match self.try_clone_with(|item| Ok::<T, Infallible>(item.clone())) {
            Ok(copy) => copy,
            Err(err) => panic!("BlockDeque clone failed: {}", deque_error(err)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BlockDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for BlockDeque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for BlockDeque<T> {}

impl<T> Index<usize> for BlockDeque<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[allow(clippy::panic)]
    fn index(&self, index: usize) -> &T {
        let length = self.len;
        match self.get(index) {
            Some(item) => item,
            None => panic!("Index {index} out of bounds for deque of length {length}"),
        }
    }
}

impl<T> IndexMut<usize> for BlockDeque<T> {
    #[allow(clippy::panic)]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let length = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("Index {index} out of bounds for deque of length {length}"),
        }
    }
}

impl<T> Extend<T> for BlockDeque<T> {
    /// # Panics
    ///
    /// Panics if storage for an element cannot be allocated.
    #[allow(clippy::panic)]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push_back(value) {
                panic!("BlockDeque extend failed: {err}");
            }
        }
    }
}

impl<T> FromIterator<T> for BlockDeque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}
