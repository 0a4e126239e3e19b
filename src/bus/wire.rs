//! The shared bus: eight data lines and one clock line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::DATA_LINES;

type EdgeHandler = Box<dyn FnMut() + Send>;

struct Lines {
    data: [AtomicBool; DATA_LINES],
    clock: AtomicBool,
    rising: Mutex<Vec<EdgeHandler>>,
}

#[derive(Clone)]
pub struct BusWire {
    lines: Arc<Lines>,
}

impl BusWire {
    pub fn new() -> Self {
        BusWire {
            lines: Arc::new(Lines {
                data: std::array::from_fn(|_| AtomicBool::new(false)),
                clock: AtomicBool::new(false),
                rising: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a clock rising-edge handler. Handlers run synchronously
    /// on the writer's thread and must only sample lines and enqueue.
    pub fn on_clock_rising<F>(&self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        if let Ok(mut rising) = self.lines.rising.lock() {
            rising.push(Box::new(handler));
        }
    }

    /// Level of one data line.
    pub fn data_high(&self, line: usize) -> bool {
        self.lines.data[line].load(Ordering::Acquire)
    }

    pub fn clock_high(&self) -> bool {
        self.lines.clock.load(Ordering::Acquire)
    }

    pub(crate) fn drive_data(&self, line: usize, high: bool) {
        self.lines.data[line].store(high, Ordering::Release);
    }

    /// Raise the clock and run every subscribed handler. The handler lock
    /// also serializes concurrent writers, so each reader sees whole bytes.
    pub(crate) fn assert_clock(&self) {
        self.lines.clock.store(true, Ordering::Release);
        if let Ok(mut rising) = self.lines.rising.lock() {
            for handler in rising.iter_mut() {
                handler();
            }
        }
    }

    pub(crate) fn deassert_clock(&self) {
        self.lines.clock.store(false, Ordering::Release);
    }
}

impl Default for BusWire {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_lines_hold_levels() {
        let wire = BusWire::new();
        wire.drive_data(0, true);
        wire.drive_data(7, true);
        assert!(wire.data_high(0));
        assert!(!wire.data_high(3));
        assert!(wire.data_high(7));
    }

    #[test]
    fn test_edge_handlers_run_on_assert() {
        let wire = BusWire::new();
        let (tx, mut rx) = crate::ring::ring(8);
        let sampled = wire.clone();
        wire.on_clock_rising(move || {
            let mut byte = 0u8;
            for line in 0..DATA_LINES {
                if sampled.data_high(line) {
                    byte |= 1 << line;
                }
            }
            tx.enqueue(byte);
        });

        for line in 0..DATA_LINES {
            wire.drive_data(line, 0xA5 & (1 << line) != 0);
        }
        wire.assert_clock();
        wire.deassert_clock();
        assert_eq!(rx.dequeue(), Some(0xA5));
        assert_eq!(rx.dequeue(), None);
    }
}
