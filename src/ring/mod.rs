//! Single-producer single-consumer byte queue.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    slots: Box<[AtomicU8]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Write half. One producer context only.
pub struct Producer {
    shared: Arc<Shared>,
}

/// Read half. One consumer loop only.
pub struct Consumer {
    shared: Arc<Shared>,
}

/// Create a queue holding up to `capacity` bytes, rounded up to a power
/// of two so index masking stays a single AND.
pub fn ring(capacity: usize) -> (Producer, Consumer) {
    let capacity = capacity.max(2).next_power_of_two();
    let slots = (0..capacity).map(|_| AtomicU8::new(0)).collect();
    let shared = Arc::new(Shared {
        slots,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });
    (Producer { shared: Arc::clone(&shared) }, Consumer { shared })
}

impl Producer {
    /// Append one byte. Returns false, changing nothing, when the queue
    /// is full.
    pub fn enqueue(&self, byte: u8) -> bool {
        let s = &self.shared;
        let tail = s.tail.load(Ordering::Relaxed);
        let head = s.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) == s.capacity() {
            return false;
        }
        let mask = s.capacity() - 1;
        s.slots[tail & mask].store(byte, Ordering::Relaxed);
        s.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }
}

impl Consumer {
    pub fn is_empty(&self) -> bool {
        let s = &self.shared;
        s.head.load(Ordering::Relaxed) == s.tail.load(Ordering::Acquire)
    }

    /// Pop the oldest byte, or None when the queue is empty.
    pub fn dequeue(&mut self) -> Option<u8> {
        let s = &self.shared;
        let head = s.head.load(Ordering::Relaxed);
        let tail = s.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let mask = s.capacity() - 1;
        let byte = s.slots[head & mask].load(Ordering::Relaxed);
        s.head.store(head.wrapping_add(1), Ordering::Release);
        Some(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = ring(8);
        for byte in [0x10, 0x20, 0x30] {
            assert!(tx.enqueue(byte));
        }
        assert_eq!(rx.dequeue(), Some(0x10));
        assert_eq!(rx.dequeue(), Some(0x20));
        assert_eq!(rx.dequeue(), Some(0x30));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_empty_queue() {
        let (_tx, mut rx) = ring(8);
        assert!(rx.is_empty());
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (tx, mut rx) = ring(4);
        for byte in 0..4u8 {
            assert!(tx.enqueue(byte));
        }
        assert!(!tx.enqueue(99));
        assert!(!tx.enqueue(100));
        for byte in 0..4u8 {
            assert_eq!(rx.dequeue(), Some(byte));
        }
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_capacity_rounds_up_to_power_of_two() {
        let (tx, mut rx) = ring(5);
        for byte in 0..8u8 {
            assert!(tx.enqueue(byte));
        }
        assert!(!tx.enqueue(8));
        assert_eq!(rx.dequeue(), Some(0));
    }

    #[test]
    fn test_wraparound() {
        let (tx, mut rx) = ring(4);
        for pass in 0..10u8 {
            for i in 0..3u8 {
                assert!(tx.enqueue(pass * 3 + i));
            }
            for i in 0..3u8 {
                assert_eq!(rx.dequeue(), Some(pass * 3 + i));
            }
        }
    }

    #[test]
    fn test_threaded_stream_keeps_order() {
        let (tx, mut rx) = ring(16);
        let count = 4096usize;
        let producer = std::thread::spawn(move || {
            for i in 0..count {
                let byte = (i * 31) as u8;
                while !tx.enqueue(byte) {
                    std::hint::spin_loop();
                }
            }
        });
        let mut received = Vec::with_capacity(count);
        while received.len() < count {
            if let Some(byte) = rx.dequeue() {
                received.push(byte);
            }
        }
        producer.join().unwrap();
        for (i, &byte) in received.iter().enumerate() {
            assert_eq!(byte, (i * 31) as u8);
        }
    }
}
