use thiserror::Error;

/// Error types for `BlockDeque` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum BlockDequeError {
    /// Index is beyond the current deque length
    #[error("Index out of bounds: index {index} is beyond deque length {length}")]
    IndexOutOfBounds {
        /// Index that was accessed
        index: usize,
        /// Current length of the deque
        length: usize,
    },
    /// Element removal or access attempted on an empty deque
    #[error("Deque underflow: operation on empty deque")]
    EmptyDeque,
    /// The index array or a block could not be allocated
    #[error("Allocation failed: could not reserve {requested} slots")]
    AllocationFailed {
        /// Number of slots that were requested
        requested: usize,
    },
    /// Invalid parameter provided to a constructor
    #[error("Invalid BlockDeque configuration: {parameter} = {value}")]
    InvalidConfiguration {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value
        value: usize,
    },
    /// Cursor was taken before a growth or a mid-sequence shift
    #[error("Stale cursor: cursor generation {cursor_generation}, deque generation {deque_generation}")]
    StaleCursor {
        /// Generation recorded in the cursor
        cursor_generation: u64,
        /// Current generation of the deque
        deque_generation: u64,
    },
    /// Cursor points outside the range accepted by the operation
    #[error("Cursor out of range: position {position} is outside deque of length {length}")]
    CursorOutOfRange {
        /// Logical position of the cursor relative to the front
        position: isize,
        /// Current length of the deque
        length: usize,
    },
}

/// Error returned by operations that run a caller-supplied fallible
/// element constructor or copier.
///
/// The deque is rolled back before this error is returned, and the
/// element error is handed back unchanged.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ElementError<E> {
    /// The deque itself refused the operation
    #[error(transparent)]
    Deque(#[from] BlockDequeError),
    /// The element constructor or copier failed
    #[error("Element operation failed: {0}")]
    Element(E),
}

impl<E> ElementError<E> {
    /// Returns the element error, if that is what failed.
    pub fn into_element(self) -> Option<E> {
        match self {
            ElementError::Element(e) => Some(e),
            ElementError::Deque(_) => None,
        }
    }
}
