pub mod assembler;
pub mod decoder;
pub mod port;
pub mod serial;

pub use assembler::{DecodeMode, EventAssembler};
pub use decoder::SerialBitDecoder;
pub use port::MidiPort;
pub use serial::SerialWire;

/// MIDI active-sensing status byte; dropped at the byte layer.
pub const STATUS_KEEPALIVE: u8 = 0xFE;

/// Default MIDI wire rate.
pub const DEFAULT_BAUD: u32 = 31_250;

/// Bit period for a baud rate, in whole microseconds (32 at MIDI rate).
pub fn bit_period_us(baud: u32) -> u64 {
    (1_000_000 / baud.max(1)) as u64
}
