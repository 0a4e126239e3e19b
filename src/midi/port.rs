//! Live MIDI input. The OS hands us whole messages where the hardware
//! sees a bit stream; either way the bytes land in the same serial queue.

use midir::{MidiInput, MidiInputConnection};

use crate::ring::Producer;
use crate::{Error, Result};

use super::STATUS_KEEPALIVE;

pub struct MidiPort {
    _connection: MidiInputConnection<()>,
}

impl MidiPort {
    /// Connect to an input port and stream its bytes into `bytes`.
    ///
    /// With a hint, the first port whose name contains it wins
    /// (case-insensitive). Without one, prefer something that looks like
    /// a piano, else take the first port.
    pub fn connect(hint: Option<&str>, bytes: Producer) -> Result<Self> {
        let midi_in = MidiInput::new("robopiano-input")
            .map_err(|e| Error::MidiInput(format!("init failed: {e}")))?;

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(Error::MidiInput("no MIDI input devices found".into()));
        }

        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_in.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();

        println!("\nAvailable MIDI input devices:");
        for (i, name) in names.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }

        let index = match hint {
            Some(hint) => {
                let wanted = hint.to_lowercase();
                names
                    .iter()
                    .position(|n| n.to_lowercase().contains(&wanted))
                    .ok_or_else(|| {
                        Error::MidiInput(format!(
                            "no port matching '{}' (have: {})",
                            hint,
                            names.join(", ")
                        ))
                    })?
            }
            None => names
                .iter()
                .position(|n| {
                    let n = n.to_lowercase();
                    n.contains("piano") || n.contains("keyboard")
                })
                .unwrap_or(0),
        };

        println!("\nConnecting to: {}\n", names[index]);

        let connection = midi_in
            .connect(
                &ports[index],
                "robopiano-input",
                move |_timestamp, message, _| {
                    for &byte in message {
                        if byte != STATUS_KEEPALIVE {
                            // Drop on overflow rather than block the callback
                            let _ = bytes.enqueue(byte);
                        }
                    }
                },
                (),
            )
            .map_err(|e| Error::MidiInput(format!("failed to connect: {e}")))?;

        Ok(Self { _connection: connection })
    }

    /// Names of every MIDI input port.
    pub fn list_devices() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("robopiano-list")
            .map_err(|e| Error::MidiInput(format!("init failed: {e}")))?;
        let mut devices = Vec::new();
        for port in midi_in.ports().iter() {
            if let Ok(name) = midi_in.port_name(port) {
                devices.push(name);
            }
        }
        Ok(devices)
    }
}
