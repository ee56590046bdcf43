use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::core::BlockDeque;
use crate::cursor::Cursor;

/// Iterator over references to the elements of a `BlockDeque`.
///
/// Walks a pair of cursors toward each other, crossing block boundaries as
/// it goes. This iterator implements `Clone`.
pub struct Iter<'a, T> {
    deque: &'a BlockDeque<T>,
    front: Cursor,
    back: Cursor,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(deque: &'a BlockDeque<T>, front: Cursor, back: Cursor, remaining: usize) -> Self {
        Self {
            deque,
            front,
            back,
            remaining,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cell = self.deque.cell_at_cursor(self.front);
        self.front = self.front.step_forward();
        self.remaining -= 1;
        // SAFETY: the cursor was inside the live range, and the shared
        // borrow of the deque keeps the element alive for 'a.
        #[allow(unsafe_code)]
        let item = unsafe { &*cell };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.step_backward();
        self.remaining -= 1;
        let cell = self.deque.cell_at_cursor(self.back);
        // SAFETY: as in `next`.
        #[allow(unsafe_code)]
        let item = unsafe { &*cell };
        Some(item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a BlockDeque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over mutable references to the elements of a `BlockDeque`.
pub struct IterMut<'a, T> {
    // Shared view of the bookkeeping only; elements are reached through the
    // blocks' own pointers, each cell at most once.
    deque: &'a BlockDeque<T>,
    front: Cursor,
    back: Cursor,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(
        deque: &'a mut BlockDeque<T>,
        front: Cursor,
        back: Cursor,
        remaining: usize,
    ) -> Self {
        Self {
            deque,
            front,
            back,
            remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cell = self.deque.cell_at_cursor(self.front);
        self.front = self.front.step_forward();
        self.remaining -= 1;
        // SAFETY: the iterator was built from `&'a mut BlockDeque`, so no one
        // else can reach the elements, and every cell is yielded once.
        #[allow(unsafe_code)]
        let item = unsafe { &mut *cell };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.back.step_backward();
        self.remaining -= 1;
        let cell = self.deque.cell_at_cursor(self.back);
        // SAFETY: as in `next`.
        #[allow(unsafe_code)]
        let item = unsafe { &mut *cell };
        Some(item)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<'a, T> IntoIterator for &'a mut BlockDeque<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Owning iterator; pops elements from either end.
pub struct IntoIter<T> {
    deque: BlockDeque<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.deque.len();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.deque.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for BlockDeque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}
