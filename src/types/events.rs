#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    /// Key pressed
    NoteOn,
    /// Key released
    NoteOff,
    /// Any other status byte (controller data, aftertouch, ...).
    /// Live input keeps these; sequenced playback never produces them.
    Other,
}

/// Key and velocity placeholder for events that have neither.
pub const FIELD_UNUSED: u8 = 0xFF;

/// One decoded event with its MIDI channel, key and velocity.
/// `Other` events carry [`FIELD_UNUSED`] in both data fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub action: NoteAction,
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
}

impl NoteEvent {
    /// Create a note on event
    pub fn note_on(channel: u8, key: u8, velocity: u8) -> Self {
        NoteEvent { action: NoteAction::NoteOn, channel, key, velocity }
    }

    /// Create a note off event
    pub fn note_off(channel: u8, key: u8, velocity: u8) -> Self {
        NoteEvent { action: NoteAction::NoteOff, channel, key, velocity }
    }

    /// Create a pass-through event for an unrecognized status byte
    pub fn other(channel: u8) -> Self {
        NoteEvent {
            action: NoteAction::Other,
            channel,
            key: FIELD_UNUSED,
            velocity: FIELD_UNUSED,
        }
    }

    /// A note on at velocity zero counts as a release on live input
    pub fn is_release(&self) -> bool {
        match self.action {
            NoteAction::NoteOff => true,
            NoteAction::NoteOn => self.velocity == 0,
            NoteAction::Other => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_uses_placeholder_fields() {
        let event = NoteEvent::other(3);
        assert_eq!(event.channel, 3);
        assert_eq!(event.key, FIELD_UNUSED);
        assert_eq!(event.velocity, FIELD_UNUSED);
    }

    #[test]
    fn test_release_detection() {
        assert!(NoteEvent::note_off(0, 60, 0).is_release());
        assert!(NoteEvent::note_on(0, 60, 0).is_release());
        assert!(!NoteEvent::note_on(0, 60, 64).is_release());
        assert!(!NoteEvent::other(0).is_release());
    }
}
