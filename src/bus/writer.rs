use std::sync::Arc;

use crate::hw::Timer;

use super::wire::BusWire;
use super::{DATA_LINES, PACKET_START, READY_BYTE};

pub struct BusWriter {
    wire: BusWire,
    timer: Arc<dyn Timer>,
    hold_us: u64,
}

impl BusWriter {
    pub fn new(wire: BusWire, timer: Arc<dyn Timer>, hold_us: u64) -> Self {
        BusWriter { wire, timer, hold_us }
    }

    /// Put one byte on the bus: data lines first, then a held clock
    /// pulse. Bit i of `byte` drives data line i.
    pub fn write_byte(&self, byte: u8) {
        for line in 0..DATA_LINES {
            self.wire.drive_data(line, byte & (1 << line) != 0);
        }
        self.wire.assert_clock();
        self.timer.delay_us(self.hold_us);
        self.wire.deassert_clock();
    }

    /// Frame and send one note packet.
    pub fn write_packet(&self, note: u8, motor: u8) {
        self.write_byte(PACKET_START);
        self.write_byte(note);
        self.write_byte(motor);
    }

    /// Announce that the controller is up. Sent once, before any packet.
    pub fn send_ready(&self) {
        self.write_byte(READY_BYTE);
    }
}
