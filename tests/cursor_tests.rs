use blockdeque::{BlockDeque, BlockDequeError, BLOCK_CAPACITY};

#[test]
fn test_begin_end_on_empty_deque() {
    let deque: BlockDeque<u8> = BlockDeque::new();
    assert_eq!(deque.begin(), deque.end());
    assert_eq!(deque.end() - deque.begin(), 0);
    assert_eq!(deque.index_of(deque.end()), Ok(0));
}

#[test]
fn test_cursor_arithmetic_matches_indexing() {
    let mut deque = BlockDeque::new();
    for i in 0..30 {
        deque.push_back(i).unwrap();
    }
    for i in 1..=7 {
        deque.push_front(-i).unwrap();
    }

    let begin = deque.begin();
    for i in 0..deque.len() {
        let cursor = begin + i as isize;
        assert_eq!(deque.get_at(cursor), Ok(&deque[i]));
        assert_eq!(deque.index_of(cursor), Ok(i));
        assert_eq!(cursor - begin, i as isize);
    }
    assert_eq!(deque.end() - deque.begin(), deque.len() as isize);
    assert_eq!(deque.end() - 1, deque.cursor_at(deque.len() - 1).unwrap());
}

#[test]
fn test_cursor_stepping_walks_elements() {
    let deque: BlockDeque<usize> = (0..(BLOCK_CAPACITY * 3)).collect();

    let mut cursor = deque.begin();
    let mut seen = Vec::new();
    while cursor != deque.end() {
        seen.push(*deque.get_at(cursor).unwrap());
        cursor = cursor.step_forward();
    }
    assert_eq!(seen, (0..(BLOCK_CAPACITY * 3)).collect::<Vec<_>>());

    let mut cursor = deque.end();
    let mut seen_back = Vec::new();
    while cursor > deque.begin() {
        cursor = cursor.step_backward();
        seen_back.push(*deque.get_at(cursor).unwrap());
    }
    seen_back.reverse();
    assert_eq!(seen_back, seen);
}

#[test]
fn test_cursor_ordering() {
    let deque: BlockDeque<u32> = (0..40).collect();
    let a = deque.begin() + 15;
    let b = deque.begin() + 16;
    assert!(a < b);
    assert!(b > a);
    assert!(a <= b);
    assert_ne!(a.slot(), b.slot());
    assert_eq!(a.distance(&b), Some(-1));
}

#[test]
fn test_cursor_dereference_bounds() {
    let deque: BlockDeque<u32> = (0..5).collect();

    assert_eq!(
        deque.get_at(deque.end()),
        Err(BlockDequeError::CursorOutOfRange {
            position: 5,
            length: 5
        })
    );
    assert_eq!(
        deque.get_at(deque.begin() - 1),
        Err(BlockDequeError::CursorOutOfRange {
            position: -1,
            length: 5
        })
    );
}

#[test]
fn test_mutable_cursor_access() {
    let mut deque: BlockDeque<u32> = (0..20).collect();
    let cursor = deque.begin() + 17;
    *deque.get_at_mut(cursor).unwrap() = 100;
    assert_eq!(deque[17], 100);
}

#[test]
fn test_growth_invalidates_cursors() {
    let mut deque: BlockDeque<usize> = (0..(BLOCK_CAPACITY * 5)).collect();
    let cursor = deque.begin() + 3;
    let generation = deque.generation();

    deque.push_back(0).unwrap();
    assert_eq!(deque.generation(), generation + 1);

    assert_eq!(
        deque.get_at(cursor),
        Err(BlockDequeError::StaleCursor {
            cursor_generation: generation,
            deque_generation: generation + 1
        })
    );
    // A fresh cursor to the same position still works.
    assert_eq!(deque.get_at(deque.begin() + 3), Ok(&3));
}

#[test]
fn test_shift_invalidates_cursors() {
    let mut deque: BlockDeque<u32> = (0..10).collect();
    let stale = deque.begin() + 8;

    let inserted = deque.insert(deque.begin() + 2, 42).unwrap();
    assert!(deque.get_at(stale).is_err());
    assert!(deque.erase(stale).is_err());
    assert_eq!(deque.len(), 11);

    deque.erase(inserted).unwrap();
    assert!(deque.get_at(inserted).is_err());
    assert!(deque.iter().copied().eq(0..10));
}

#[test]
fn test_end_operations_keep_cursors_valid() {
    let mut deque: BlockDeque<u32> = (0..10).collect();
    let cursor = deque.begin() + 4;

    deque.push_back(10).unwrap();
    deque.push_front(100).unwrap();
    assert_eq!(deque.get_at(cursor), Ok(&4));
    assert_eq!(deque.index_of(cursor), Ok(5));
}

#[test]
fn test_insert_at_end_cursor() {
    let mut deque: BlockDeque<u32> = (0..16).collect();
    let at = deque.insert(deque.end(), 16).unwrap();
    assert_eq!(deque.index_of(at), Ok(16));
    assert_eq!(deque.back(), Some(&16));
}

#[test]
fn test_insert_into_empty_deque() {
    let mut deque = BlockDeque::new();
    let at = deque.insert(deque.begin(), "only").unwrap();
    assert_eq!(deque.get_at(at), Ok(&"only"));
    assert_eq!(deque.len(), 1);
}

#[test]
fn test_erase_front_and_back() {
    let mut deque: BlockDeque<u32> = (0..33).collect();
    assert_eq!(deque.erase(deque.begin()), Ok(0));
    assert_eq!(deque.erase(deque.end() - 1), Ok(32));
    assert!(deque.iter().copied().eq(1..32));
}

#[test]
fn test_erase_until_empty_frees_blocks() {
    let mut deque: BlockDeque<u32> = (0..40).collect();
    while !deque.is_empty() {
        let middle = deque.begin() + (deque.len() / 2) as isize;
        deque.erase(middle).unwrap();
    }
    assert_eq!(deque.allocated_blocks(), 0);
}
