//! Assembles the decoded byte stream into note events.

use crate::types::events::{NoteAction, NoteEvent, FIELD_UNUSED};

const STATUS_NOTE_ON: u8 = 0x9;
const STATUS_NOTE_OFF: u8 = 0x8;

/// What to do with an unrecognized status byte: live input keeps it as
/// an `Other` event, sequenced playback discards it and tries the next
/// byte as a status until a note boundary relocks the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Live,
    Sequenced,
}

pub struct EventAssembler {
    mode: DecodeMode,
    step: Step,
    action: NoteAction,
    channel: u8,
    key: u8,
}

enum Step {
    Action,
    Key,
    Velocity,
}

impl EventAssembler {
    pub fn new(mode: DecodeMode) -> Self {
        EventAssembler {
            mode,
            step: Step::Action,
            action: NoteAction::Other,
            channel: 0,
            key: 0,
        }
    }

    /// Feed one byte; returns an event when a 3-byte frame completes.
    pub fn push(&mut self, byte: u8) -> Option<NoteEvent> {
        match self.step {
            Step::Action => {
                self.action = match byte >> 4 {
                    STATUS_NOTE_ON => NoteAction::NoteOn,
                    STATUS_NOTE_OFF => NoteAction::NoteOff,
                    _ => {
                        if self.mode == DecodeMode::Sequenced {
                            // Rescan from the next byte
                            return None;
                        }
                        NoteAction::Other
                    }
                };
                self.channel = byte & 0x0F;
                self.step = Step::Key;
                None
            }
            Step::Key => {
                self.key = match self.action {
                    NoteAction::Other => FIELD_UNUSED,
                    _ => byte & 0x7F,
                };
                self.step = Step::Velocity;
                None
            }
            Step::Velocity => {
                let velocity = match self.action {
                    NoteAction::Other => FIELD_UNUSED,
                    _ => byte & 0x7F,
                };
                self.step = Step::Action;
                Some(NoteEvent {
                    action: self.action,
                    channel: self.channel,
                    key: self.key,
                    velocity,
                })
            }
        }
    }
}
