pub mod packet;
pub mod reader;
pub mod wire;
pub mod writer;

pub use packet::{BusPacket, PacketAssembler};
pub use reader::BusReader;
pub use wire::BusWire;
pub use writer::BusWriter;

/// First byte of every note packet.
pub const PACKET_START: u8 = 0xEE;

/// Note code meaning "stop this motor"; also marks a free allocator slot.
pub const MOTOR_OFF: u8 = 0xFF;

/// Handshake byte the controller sends once its loop is up.
pub const READY_BYTE: u8 = 0x19;

/// Data lines on the bus; one byte per clock pulse.
pub const DATA_LINES: usize = 8;

/// Default clock hold time per byte, µs.
pub const DEFAULT_HOLD_US: u64 = 10;
