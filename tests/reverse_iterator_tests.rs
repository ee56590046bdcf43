use blockdeque::BlockDeque;

#[test]
fn test_reverse_iterator_populated_deque() {
    let mut deque = BlockDeque::new();
    deque.push_back("first").unwrap();
    deque.push_back("second").unwrap();
    deque.push_back("third").unwrap();

    let items: Vec<_> = deque.iter_rev().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(*items[0], "third");
    assert_eq!(*items[1], "second");
    assert_eq!(*items[2], "first");
}

#[test]
fn test_reverse_iterator_empty_deque() {
    let deque: BlockDeque<u8> = BlockDeque::new();
    assert_eq!(deque.iter_rev().count(), 0);
}

#[test]
fn test_reverse_iterator_single_item() {
    let mut deque = BlockDeque::new();
    deque.push_front("only").unwrap();

    let items: Vec<_> = deque.iter_rev().collect();
    assert_eq!(items, vec![&"only"]);
}

#[test]
fn test_reverse_iterator_across_blocks() {
    let mut deque = BlockDeque::new();
    for i in 0..40 {
        deque.push_front(i).unwrap();
    }
    // push_front reverses the order, so reading backwards restores it.
    let items: Vec<_> = deque.iter_rev().copied().collect();
    assert_eq!(items, (0..40).collect::<Vec<_>>());
}

#[test]
fn test_reverse_iterator_partial_consumption() {
    let deque: BlockDeque<u32> = (0..20).collect();

    let mut iter = deque.iter_rev();
    assert_eq!(iter.next(), Some(&19));
    assert_eq!(iter.next(), Some(&18));
    assert_eq!(iter.size_hint(), (18, Some(18)));

    // The far end of a reversed iterator is the front of the deque.
    assert_eq!(iter.next_back(), Some(&0));
    assert_eq!(iter.len(), 17);
}

#[test]
fn test_reverse_mutable_iteration() {
    let mut deque: BlockDeque<u32> = (0..25).collect();
    let mut counter = 0;
    for value in deque.iter_mut().rev() {
        *value = counter;
        counter += 1;
    }
    assert_eq!(deque.front(), Some(&24));
    assert_eq!(deque.back(), Some(&0));
}

#[test]
fn test_reverse_owned_iteration() {
    let deque: BlockDeque<u32> = (0..18).collect();
    let items: Vec<_> = deque.into_iter().rev().collect();
    assert_eq!(items, (0..18).rev().collect::<Vec<_>>());
}
