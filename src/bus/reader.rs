//! Receiving end of the bus.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ring::{self, Consumer};

use super::wire::BusWire;
use super::{DATA_LINES, READY_BYTE};

/// A tap on the wire with its own sample queue; readers never see each
/// other consume.
pub struct BusReader {
    rx: Consumer,
}

impl BusReader {
    /// Subscribe to the wire's clock with a queue of `capacity` bytes.
    pub fn attach(wire: &BusWire, capacity: usize) -> Self {
        let (tx, rx) = ring::ring(capacity);
        let sampled = wire.clone();
        wire.on_clock_rising(move || {
            let mut byte = 0u8;
            for line in 0..DATA_LINES {
                if sampled.data_high(line) {
                    byte |= 1 << line;
                }
            }
            // Overflow drops the byte; the framer resyncs on the next packet
            let _ = tx.enqueue(byte);
        });
        BusReader { rx }
    }

    pub fn has_data(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Pop the oldest received byte.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.rx.dequeue()
    }

    /// Poll until the controller's ready byte arrives, discarding anything
    /// received before it. Returns false if `stop` was raised first.
    pub fn wait_ready(&mut self, stop: &AtomicBool) -> bool {
        while !stop.load(Ordering::Relaxed) {
            if self.has_data() {
                if self.read_byte() == Some(READY_BYTE) {
                    return true;
                }
            } else {
                std::thread::yield_now();
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::writer::BusWriter;
    use crate::hw::ManualTimer;
    use std::sync::Arc;

    #[test]
    fn test_wait_ready_discards_leading_junk() {
        let wire = BusWire::new();
        let mut reader = BusReader::attach(&wire, 16);
        let writer = BusWriter::new(wire.clone(), Arc::new(ManualTimer::new()), 10);
        writer.write_byte(0x00);
        writer.write_byte(0xEE);
        writer.send_ready();
        writer.write_byte(0x33);
        let stop = AtomicBool::new(false);
        assert!(reader.wait_ready(&stop));
        assert_eq!(reader.read_byte(), Some(0x33));
    }

    #[test]
    fn test_wait_ready_honors_stop() {
        let wire = BusWire::new();
        let mut reader = BusReader::attach(&wire, 16);
        let stop = AtomicBool::new(true);
        assert!(!reader.wait_ready(&stop));
    }
}
