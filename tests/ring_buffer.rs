use snemo_trigger::{RingBuffer, TriggerError};

#[test]
fn evicts_the_oldest_entry_once_full() {
    let mut ring = RingBuffer::with_capacity(3).unwrap();
    for value in 0..3 {
        assert_eq!(ring.push(value), None);
    }
    assert!(ring.is_full());
    assert_eq!(ring.push(3), Some(0));
    assert_eq!(ring.len(), 3);
    assert_eq!(ring.front(), Some(&1));
    assert_eq!(ring.back(), Some(&3));
    assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(ring.iter().rev().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(ring.get(3), None);
}

#[test]
fn clear_resets_to_empty() {
    let mut ring = RingBuffer::with_capacity(2).unwrap();
    ring.push("a");
    ring.push("b");
    ring.push("c");
    ring.clear();
    assert!(ring.is_empty());
    assert_eq!(ring.front(), None);
    assert_eq!(ring.back(), None);
    assert_eq!(ring.capacity(), 2);
    ring.push("d");
    assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec!["d"]);
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(matches!(
        RingBuffer::<u32>::with_capacity(0),
        Err(TriggerError::InvalidState(_))
    ));
}
