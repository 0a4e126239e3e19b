//! Note packets and their wire framing.

use super::{MOTOR_OFF, PACKET_START};

/// One bus instruction: a note code for one motor. `note` is a zero-based
/// key index, or [`MOTOR_OFF`] to stop the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusPacket {
    pub note: u8,
    pub motor: u8,
}

impl BusPacket {
    pub fn strike(note: u8, motor: u8) -> Self {
        BusPacket { note, motor }
    }

    pub fn release(motor: u8) -> Self {
        BusPacket { note: MOTOR_OFF, motor }
    }

    pub fn is_release(&self) -> bool {
        self.note == MOTOR_OFF
    }
}

/// Rebuilds packets from the raw byte stream.
///
/// Bytes outside a frame are discarded until a start sentinel shows up;
/// once inside, the next two bytes are payload whatever their value. A
/// lost byte corrupts at most one packet before the stream relocks, and
/// the garbage packet it may produce dies at the motor unit's guards.
#[derive(Default)]
pub struct PacketAssembler {
    state: Frame,
}

#[derive(Default)]
enum Frame {
    #[default]
    Idle,
    AwaitNote,
    AwaitMotor {
        note: u8,
    },
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received byte; returns a packet when one completes.
    pub fn push(&mut self, byte: u8) -> Option<BusPacket> {
        match self.state {
            Frame::Idle => {
                if byte == PACKET_START {
                    self.state = Frame::AwaitNote;
                }
                None
            }
            Frame::AwaitNote => {
                self.state = Frame::AwaitMotor { note: byte };
                None
            }
            Frame::AwaitMotor { note } => {
                self.state = Frame::Idle;
                Some(BusPacket { note, motor: byte })
            }
        }
    }
}
