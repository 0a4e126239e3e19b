/// Piano key arithmetic. Keys on the wire are zero-based instrument
/// indices: 0 = A0 (27.5 Hz) up to 87 = C8 on a full keyboard.

/// MIDI key number of the lowest key on a standard piano (A0 = 21)
pub const DEFAULT_KEY_OFFSET: u8 = 21;

/// Keys on a full piano keyboard
pub const FULL_KEYBOARD: usize = 88;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Wire code for a MIDI key: the zero-based key index, computed with
/// wrapping arithmetic exactly as the units do. Keys below the offset
/// wrap to codes past any real keyboard and die at the step table.
pub fn wire_code(midi_key: u8, offset: u8) -> u8 {
    midi_key.wrapping_sub(offset)
}

/// Scientific pitch name for a zero-based piano key ("A0", "C#4", "C8")
pub fn key_name(key: u8) -> String {
    // A0 sits nine semitones above the C of its octave
    let n = key as usize + 9;
    format!("{}{}", NOTE_NAMES[n % 12], n / 12)
}
