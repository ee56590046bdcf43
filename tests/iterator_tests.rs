use blockdeque::{BlockDeque, BLOCK_CAPACITY};

#[test]
fn test_iterator_empty_deque() {
    let deque: BlockDeque<u8> = BlockDeque::new();

    let mut iter = deque.iter();
    assert_eq!(iter.next(), None);
    assert_eq!(iter.size_hint(), (0, Some(0)));
}

#[test]
fn test_iterator_populated_deque() {
    let mut deque = BlockDeque::new();
    deque.push_back("hello").unwrap();
    deque.push_back("world").unwrap();
    deque.push_front("test").unwrap();

    let mut iter = deque.iter();
    assert_eq!(iter.size_hint(), (3, Some(3)));

    assert_eq!(iter.next(), Some(&"test"));
    assert_eq!(iter.size_hint(), (2, Some(2)));

    assert_eq!(iter.next(), Some(&"hello"));
    assert_eq!(iter.size_hint(), (1, Some(1)));

    assert_eq!(iter.next(), Some(&"world"));
    assert_eq!(iter.size_hint(), (0, Some(0)));

    assert_eq!(iter.next(), None);
}

#[test]
fn test_iterator_crosses_blocks() {
    let mut deque = BlockDeque::new();
    for i in 0..(BLOCK_CAPACITY * 4 + 3) {
        deque.push_back(i).unwrap();
    }
    for i in 1..=5 {
        deque.push_front(1000 + i).unwrap();
    }

    let collected: Vec<_> = deque.iter().copied().collect();
    let mut expected: Vec<_> = (1..=5).rev().map(|i| 1000 + i).collect();
    expected.extend(0..(BLOCK_CAPACITY * 4 + 3));
    assert_eq!(collected, expected);
}

#[test]
fn test_iterator_is_cloneable() {
    let deque: BlockDeque<u32> = (0..40).collect();
    let mut iter = deque.iter();
    iter.nth(20);

    let rest: Vec<_> = iter.clone().copied().collect();
    assert_eq!(rest, (21..40).collect::<Vec<_>>());
    assert_eq!(iter.len(), 19);
}

#[test]
fn test_iterator_meets_in_the_middle() {
    let deque: BlockDeque<u32> = (0..33).collect();
    let mut iter = deque.iter();

    let mut front = Vec::new();
    let mut back = Vec::new();
    loop {
        match iter.next() {
            Some(v) => front.push(*v),
            None => break,
        }
        match iter.next_back() {
            Some(v) => back.push(*v),
            None => break,
        }
    }
    assert_eq!(front.len() + back.len(), 33);
    assert_eq!(front.last(), Some(&16));
    assert_eq!(back.last(), Some(&17));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);
}

#[test]
fn test_iter_mut_updates_in_place() {
    let mut deque: BlockDeque<u32> = (0..50).collect();
    for value in deque.iter_mut() {
        *value *= 2;
    }
    for value in &mut deque {
        *value += 1;
    }
    assert!(deque.iter().copied().eq((0..50).map(|v| v * 2 + 1)));

    if let Some(last) = deque.iter_mut().next_back() {
        *last = 0;
    }
    assert_eq!(deque.back(), Some(&0));
}

#[test]
fn test_into_iter_consumes() {
    let deque: BlockDeque<String> = (0..20).map(|i| i.to_string()).collect();
    let mut iter = deque.into_iter();

    assert_eq!(iter.len(), 20);
    assert_eq!(iter.next(), Some("0".to_string()));
    assert_eq!(iter.next_back(), Some("19".to_string()));

    let rest: Vec<_> = iter.collect();
    assert_eq!(rest.len(), 18);
    assert_eq!(rest[0], "1");
}

#[test]
fn test_for_loop_over_reference() {
    let deque: BlockDeque<u8> = (1..=4).collect();
    let mut sum = 0;
    for value in &deque {
        sum += value;
    }
    assert_eq!(sum, 10);
}

#[test]
fn test_extend() {
    let mut deque: BlockDeque<u32> = (0..10).collect();
    deque.extend(10..30);
    assert_eq!(deque.len(), 30);
    assert!(deque.iter().copied().eq(0..30));
}
