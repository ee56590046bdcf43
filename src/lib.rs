#![no_std]
#![deny(unsafe_code)]

//! `BlockDeque`: a double-ended random-access buffer built from fixed-size blocks.
//!
//! Elements are stored in blocks of [`BLOCK_CAPACITY`] cells. An index array
//! of slots records which block holds which part of the sequence, so an
//! element's address is found with one division and one lookup.
//!
//! This crate is `no_std` compatible and only needs `alloc`.
//!
//! # Performance Characteristics
//!
//! ## Time Complexity
//! - `push_back()`, `push_front()`: amortized O(1). A push touches one block
//!   and occasionally allocates a block or grows the index array
//! - `pop_back()`, `pop_front()`: O(1), frees the block it empties
//! - `get()`, `[]`: O(1), two-level address translation
//! - `insert()`, `erase()`: O(distance to the back)
//! - Index growth: O(number of blocks), elements are never moved
//!
//! ## Memory Layout
//! - Blocks never move once allocated; growth only moves block ids inside
//!   the index array, which is reallocated to three times the occupied span
//!   with the occupied slots in the middle third
//! - A block is allocated when its first element is written and freed when
//!   its last element is removed
//!
//! ```
//! # use blockdeque::BlockDeque;
//! let mut deque = BlockDeque::new();
//!
//! deque.push_back(2).unwrap();
//! deque.push_back(3).unwrap();
//! deque.push_front(1).unwrap();
//!
//! assert_eq!(deque.len(), 3);
//! assert_eq!(deque[0], 1);
//! assert_eq!(deque.at(2), Ok(&3));
//! assert!(deque.at(3).is_err());
//!
//! assert_eq!(deque.pop_front(), Some(1));
//! assert_eq!(deque.pop_back(), Some(3));
//! ```
//!
//! # Cursors
//!
//! A [`Cursor`] is a (slot, offset) position. It does not borrow the deque;
//! it is handed back to `get_at`, `insert` or `erase`. Cursor arithmetic
//! crosses block boundaries:
//!
//! ```
//! # use blockdeque::BlockDeque;
//! let mut deque: BlockDeque<u32> = (0..20).collect();
//!
//! let fifth = deque.begin() + 5;
//! assert_eq!(deque.get_at(fifth), Ok(&5));
//! assert_eq!(deque.end() - deque.begin(), 20);
//!
//! assert_eq!(deque.erase(fifth), Ok(5));
//! assert_eq!(deque.len(), 19);
//! assert_eq!(deque[5], 6);
//!
//! // Cursors from before a shift are rejected.
//! assert!(deque.get_at(fifth).is_err());
//! ```
//!
//! # Rollback
//!
//! Pushes reserve their cell before the element is built. If building the
//! element fails, or the constructor panics, the reservation is undone and
//! the deque is left exactly as it was:
//!
//! ```
//! # use blockdeque::{BlockDeque, ElementError};
//! let mut deque: BlockDeque<String> = BlockDeque::new();
//! deque.push_back("kept".to_string()).unwrap();
//!
//! let result = deque.try_push_back_with(|| "bad".parse::<u8>().map(|n| n.to_string()));
//! assert!(matches!(result, Err(ElementError::Element(_))));
//! assert_eq!(deque.len(), 1);
//! assert_eq!(deque.allocated_blocks(), 1);
//! ```
//!
//! # Iterator Support
//!
//! ```
//! # use blockdeque::BlockDeque;
//! let mut deque: BlockDeque<i32> = (1..=4).collect();
//!
//! for value in &mut deque {
//!     *value *= 10;
//! }
//! let forward: Vec<_> = deque.iter().copied().collect();
//! let backward: Vec<_> = deque.iter_rev().copied().collect();
//! assert_eq!(forward, vec![10, 20, 30, 40]);
//! assert_eq!(backward, vec![40, 30, 20, 10]);
//! ```

extern crate alloc;

#[cfg(test)]
extern crate std;

mod block;
mod core;
mod cursor;
mod error;
mod iter;

pub use crate::block::BLOCK_CAPACITY;
pub use crate::core::BlockDeque;
pub use crate::cursor::Cursor;
pub use crate::error::{BlockDequeError, ElementError};
pub use crate::iter::{IntoIter, Iter, IterMut};
