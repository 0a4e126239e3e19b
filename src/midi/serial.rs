//! Hosted stand-in for the single-wire MIDI serial line.

use std::sync::{Arc, Mutex};

use crate::hw::{InputLine, Timer};

use super::bit_period_us;

struct Frame {
    start_us: u64,
    byte: u8,
}

struct Inner {
    timer: Arc<dyn Timer>,
    bit_us: u64,
    frame: Mutex<Option<Frame>>,
    falling: Mutex<Option<Box<dyn FnMut() + Send>>>,
}

/// The line idles high; a frame is a start bit (low), eight data bits
/// LSB-first, and a stop bit (high). The level at any instant is a pure
/// function of the clock, so a receiver that busy-waits through the
/// frame samples the waveform the hardware would see, under either timer.
#[derive(Clone)]
pub struct SerialWire {
    inner: Arc<Inner>,
}

impl SerialWire {
    pub fn new(timer: Arc<dyn Timer>, baud: u32) -> Self {
        SerialWire {
            inner: Arc::new(Inner {
                timer,
                bit_us: bit_period_us(baud),
                frame: Mutex::new(None),
                falling: Mutex::new(None),
            }),
        }
    }

    /// Register the start-bit edge handler. One receiver per line.
    pub fn on_falling<F>(&self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        if let Ok(mut falling) = self.inner.falling.lock() {
            *falling = Some(Box::new(handler));
        }
    }

    fn level_at(&self, now_us: u64) -> bool {
        let Ok(frame) = self.inner.frame.lock() else {
            return true;
        };
        let Some(frame) = frame.as_ref() else {
            return true; // idle
        };
        let since = now_us.saturating_sub(frame.start_us);
        match since / self.inner.bit_us {
            0 => false,                                           // start bit
            slot @ 1..=8 => frame.byte & (1 << (slot - 1)) != 0,  // data, LSB first
            _ => true,                                            // stop bit, then idle
        }
    }

    /// Clock one byte onto the line: fire the edge handler, then hold the
    /// frame until the stop bit has passed so frames never overlap.
    pub fn send_byte(&self, byte: u8) {
        let start_us = self.inner.timer.ticks_us();
        if let Ok(mut frame) = self.inner.frame.lock() {
            *frame = Some(Frame { start_us, byte });
        }
        if let Ok(mut falling) = self.inner.falling.lock() {
            if let Some(handler) = falling.as_mut() {
                handler();
            }
        }
        let end_us = start_us + 10 * self.inner.bit_us;
        let now_us = self.inner.timer.ticks_us();
        if now_us < end_us {
            self.inner.timer.delay_us(end_us - now_us);
        }
        if let Ok(mut frame) = self.inner.frame.lock() {
            *frame = None;
        }
    }
}

impl InputLine for SerialWire {
    fn is_high(&self) -> bool {
        self.level_at(self.inner.timer.ticks_us())
    }
}
