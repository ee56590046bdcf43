use core::cmp::Ordering;
use core::ops::{Add, AddAssign, Sub, SubAssign};

use crate::block::BLOCK_CAPACITY;

#[allow(clippy::cast_possible_wrap)]
const CAPACITY: isize = BLOCK_CAPACITY as isize;

/// A position inside a `BlockDeque`, expressed as an index-array slot and
/// an offset inside that slot's block.
///
/// A cursor is a plain value: it does not borrow the deque, and it is
/// resolved against the deque only when passed back to it (`get_at`,
/// `insert`, `erase`, ...). Every cursor records the deque generation it was
/// taken in; growth of the index array and every mid-sequence shift start a
/// new generation, and older cursors are rejected with
/// `BlockDequeError::StaleCursor`.
///
/// Stepping crosses block boundaries: moving forward from offset
/// `BLOCK_CAPACITY - 1` lands on offset 0 of the next slot, and moving back
/// from offset 0 lands on the last offset of the previous slot. The slot is
/// signed so that the position just before the first slot is representable.
///
/// Cursors are ordered by slot, then by offset. Cursors of different
/// generations are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    slot: isize,
    offset: usize,
    generation: u64,
}

impl Cursor {
    pub(crate) const fn new(slot: isize, offset: usize, generation: u64) -> Self {
        Self {
            slot,
            offset,
            generation,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_linear(linear: isize, generation: u64) -> Self {
        Self {
            slot: linear.div_euclid(CAPACITY),
            offset: linear.rem_euclid(CAPACITY) as usize,
            generation,
        }
    }

    /// Slot of the index array this cursor points into.
    #[must_use]
    pub fn slot(&self) -> isize {
        self.slot
    }

    /// Offset inside the block, always in `0..BLOCK_CAPACITY`.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position counted in cells from the start of slot 0.
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn linear(&self) -> isize {
        self.slot * CAPACITY + self.offset as isize
    }

    /// The next position, crossing into the following slot after the last
    /// offset of a block.
    #[must_use]
    pub fn step_forward(self) -> Self {
        if self.offset < BLOCK_CAPACITY - 1 {
            Self {
                offset: self.offset + 1,
                ..self
            }
        } else {
            Self {
                slot: self.slot + 1,
                offset: 0,
                ..self
            }
        }
    }

    /// The previous position, crossing into the preceding slot before
    /// offset 0.
    #[must_use]
    pub fn step_backward(self) -> Self {
        if self.offset > 0 {
            Self {
                offset: self.offset - 1,
                ..self
            }
        } else {
            Self {
                slot: self.slot - 1,
                offset: BLOCK_CAPACITY - 1,
                ..self
            }
        }
    }

    /// Moves by `delta` positions; negative values move backward.
    #[must_use]
    pub fn offset_by(self, delta: isize) -> Self {
        Self::from_linear(self.linear() + delta, self.generation)
    }

    /// Signed number of elements from `origin` to `self`.
    ///
    /// Returns `None` if the cursors come from different generations.
    #[must_use]
    pub fn distance(&self, origin: &Cursor) -> Option<isize> {
        (self.generation == origin.generation).then(|| self.linear() - origin.linear())
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.generation != other.generation {
            return None;
        }
        Some(
            self.slot
                .cmp(&other.slot)
                .then_with(|| self.offset.cmp(&other.offset)),
        )
    }
}

impl Add<isize> for Cursor {
    type Output = Cursor;

    fn add(self, delta: isize) -> Cursor {
        self.offset_by(delta)
    }
}

impl Sub<isize> for Cursor {
    type Output = Cursor;

    fn sub(self, delta: isize) -> Cursor {
        self.offset_by(-delta)
    }
}

impl AddAssign<isize> for Cursor {
    fn add_assign(&mut self, delta: isize) {
        *self = self.offset_by(delta);
    }
}

impl SubAssign<isize> for Cursor {
    fn sub_assign(&mut self, delta: isize) {
        *self = self.offset_by(-delta);
    }
}

/// Signed distance between two cursors.
///
/// Generations are not compared; use [`Cursor::distance`] for a checked
/// variant.
impl Sub<Cursor> for Cursor {
    type Output = isize;

    fn sub(self, origin: Cursor) -> isize {
        self.linear() - origin.linear()
    }
}
