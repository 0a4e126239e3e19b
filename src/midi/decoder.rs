//! Software UART receiver.

use std::sync::Arc;

use crate::hw::{InputLine, Timer};
use crate::ring::Producer;

use super::{bit_period_us, STATUS_KEEPALIVE};

pub struct SerialBitDecoder<L: InputLine> {
    line: L,
    timer: Arc<dyn Timer>,
    bit_us: u64,
    bytes: Producer,
}

impl<L: InputLine> SerialBitDecoder<L> {
    pub fn new(line: L, timer: Arc<dyn Timer>, baud: u32, bytes: Producer) -> Self {
        SerialBitDecoder { line, timer, bit_us: bit_period_us(baud), bytes }
    }

    /// Handle one start-bit edge: busy-wait through the ten bit slots,
    /// then queue the byte. Blocks the line's thread for one frame
    /// (320µs at MIDI rate). Keep-alives die here so the queue only
    /// carries message data.
    pub fn on_falling_edge(&mut self) {
        // Settle past the edge before the first sample
        self.timer.delay_us(1);
        let mut byte = 0u8;
        for slot in 0..10u32 {
            let high = self.line.is_high();
            if (1..=8).contains(&slot) && high {
                byte |= 1 << (slot - 1);
            }
            // No delay after the stop bit; the line is already idle again
            if slot < 9 {
                self.timer.delay_us(self.bit_us);
            }
        }
        if byte != STATUS_KEEPALIVE {
            let _ = self.bytes.enqueue(byte);
        }
    }
}
