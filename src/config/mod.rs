use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::allocator::ChannelMap;
use crate::bus::DEFAULT_HOLD_US;
use crate::midi::DEFAULT_BAUD;
use crate::tuning::StepTable;
use crate::types::note::{DEFAULT_KEY_OFFSET, FULL_KEYBOARD};
use crate::{Error, Result};

/// Most motors a single rig can address.
pub const MAX_MOTORS: usize = 16;

const MIDI_CHANNELS: usize = 16;

/// How the controller gets its notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Follow a MIDI input port, allocating motors first-fit.
    Live,
    /// Replay a recorded byte stream through the channel map.
    Sequenced,
}

/// Top-level rig description, one YAML file per instrument.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RigConfig {
    pub mode: Mode,

    /// Striking motors on the instrument.
    #[serde(default = "default_motors")]
    pub motors: usize,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub keyboard: KeyboardConfig,

    /// MIDI channel to motor indices, for sequenced mode. A motor may
    /// appear under several channels; unmapped channels drive nothing.
    #[serde(default)]
    pub channel_map: BTreeMap<u8, Vec<u8>>,

    #[serde(default)]
    pub tuning: TuningConfig,
}

/// Input source settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Substring of the MIDI port name to connect to (live mode).
    #[serde(default)]
    pub port: Option<String>,

    /// Raw MIDI byte stream to replay (sequenced mode).
    #[serde(default)]
    pub stream: Option<PathBuf>,

    /// Pause between replayed 3-byte messages, in milliseconds.
    #[serde(default)]
    pub pace_ms: u64,
}

/// Parallel bus settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    /// Clock hold time per byte, µs. Must match the units' sampling.
    #[serde(default = "default_hold_us")]
    pub hold_us: u64,
}

/// Serial MIDI line settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    #[serde(default = "default_baud")]
    pub baud: u32,
}

/// Keyboard geometry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyboardConfig {
    /// MIDI key number of the lowest key.
    #[serde(default = "default_key_offset")]
    pub key_offset: u8,

    /// Keys on the instrument.
    #[serde(default = "default_keys")]
    pub keys: usize,
}

/// Per-key step interval replacements
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TuningConfig {
    /// Key index to step interval in µs, replacing the computed entry.
    #[serde(default)]
    pub overrides: BTreeMap<u8, u32>,
}

impl RigConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let config: RigConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.motors == 0 || self.motors > MAX_MOTORS {
            return Err(Error::Config(format!(
                "motors must be between 1 and {}, got {}",
                MAX_MOTORS, self.motors
            )));
        }

        if self.bus.hold_us == 0 {
            return Err(Error::Config("bus.hold_us must be nonzero".into()));
        }

        if self.serial.baud == 0 {
            return Err(Error::Config("serial.baud must be nonzero".into()));
        }

        if self.keyboard.keys == 0 || self.keyboard.keys > 128 {
            return Err(Error::Config(format!(
                "keyboard.keys must be between 1 and 128, got {}",
                self.keyboard.keys
            )));
        }

        for (&channel, motors) in &self.channel_map {
            if channel as usize >= MIDI_CHANNELS {
                return Err(Error::Config(format!(
                    "channel_map: MIDI channel {} out of range (0-15)",
                    channel
                )));
            }
            for &motor in motors {
                if motor as usize >= self.motors {
                    return Err(Error::Config(format!(
                        "channel_map: channel {} names motor {}, rig has {}",
                        channel, motor, self.motors
                    )));
                }
            }
        }

        for (&key, &interval_us) in &self.tuning.overrides {
            if key as usize >= self.keyboard.keys {
                return Err(Error::Config(format!(
                    "tuning.overrides: key {} is past the keyboard ({} keys)",
                    key, self.keyboard.keys
                )));
            }
            if interval_us == 0 {
                return Err(Error::Config(format!(
                    "tuning.overrides: key {} must have a nonzero interval",
                    key
                )));
            }
        }

        if self.mode == Mode::Sequenced && self.input.stream.is_none() {
            return Err(Error::Config(
                "sequenced mode needs input.stream".into(),
            ));
        }

        Ok(())
    }

    /// Broadcast table in the form the allocator wants
    pub fn channel_map(&self) -> ChannelMap {
        ChannelMap::new(self.channel_map.iter().map(|(&c, m)| (c, m.clone())))
    }

    /// Step table with the overrides applied
    pub fn step_table(&self) -> StepTable {
        let mut table = StepTable::equal_tempered(self.keyboard.keys);
        for (&key, &interval_us) in &self.tuning.overrides {
            table.override_key(key, interval_us);
        }
        table
    }
}

// Default value functions for serde
fn default_motors() -> usize {
    8
}

fn default_hold_us() -> u64 {
    DEFAULT_HOLD_US
}

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_key_offset() -> u8 {
    DEFAULT_KEY_OFFSET
}

fn default_keys() -> usize {
    FULL_KEYBOARD
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig { hold_us: default_hold_us() }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig { baud: default_baud() }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        KeyboardConfig {
            key_offset: default_key_offset(),
            keys: default_keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_live_config() {
        let yaml = "mode: live\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, Mode::Live);
        assert_eq!(config.motors, 8);
        assert_eq!(config.bus.hold_us, 10);
        assert_eq!(config.serial.baud, 31_250);
        assert_eq!(config.keyboard.key_offset, 21);
        assert_eq!(config.keyboard.keys, 88);
        assert_eq!(config.input.pace_ms, 0);
    }

    #[test]
    fn test_parse_full_sequenced_config() {
        let yaml = r#"
mode: sequenced
motors: 8

input:
  stream: "scores/fur-elise.bin"
  pace_ms: 2

bus:
  hold_us: 10

serial:
  baud: 31250

keyboard:
  key_offset: 21
  keys: 88

channel_map:
  0: [0, 1, 2, 3]
  1: [4, 5, 6, 7]

tuning:
  overrides:
    34: 2551
"#;

        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, Mode::Sequenced);
        assert_eq!(config.channel_map[&0], vec![0, 1, 2, 3]);
        assert_eq!(config.tuning.overrides[&34], 2551);
    }

    #[test]
    fn test_validate_motor_count() {
        let yaml = "mode: live\nmotors: 0\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());

        let yaml = "mode: live\nmotors: 17\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_channel_map_bounds() {
        let yaml = "mode: live\nchannel_map:\n  16: [0]\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());

        let yaml = "mode: live\nmotors: 4\nchannel_map:\n  0: [4]\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sequenced_needs_stream() {
        let yaml = "mode: sequenced\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tuning_overrides() {
        let yaml = "mode: live\ntuning:\n  overrides:\n    88: 1000\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());

        let yaml = "mode: live\ntuning:\n  overrides:\n    30: 0\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_map_conversion() {
        let yaml = "mode: live\nmotors: 4\nchannel_map:\n  0: [1]\n  3: [1, 2]\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        let map = config.channel_map();
        assert_eq!(map.motors_for(0), &[1]);
        assert_eq!(map.motors_for(3), &[1, 2]);
        assert!(map.motors_for(5).is_empty());
    }

    #[test]
    fn test_step_table_gets_overrides() {
        let yaml = "mode: live\ntuning:\n  overrides:\n    34: 2551\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        let table = config.step_table();
        assert_eq!(table.interval_us(34), Some(2551));
        assert_eq!(table.interval_us(39), Some(3822));
    }

    #[test]
    fn test_rejects_zero_hold_time() {
        let yaml = "mode: live\nbus:\n  hold_us: 0\n";
        let config: RigConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
