pub mod allocator;
pub mod bus;
pub mod config;
pub mod hw;
pub mod midi;
pub mod ring;
pub mod sched;
pub mod tuning;
pub mod types;
pub mod ui;
pub mod units;

use thiserror::Error;

/// Errors surfaced while setting a rig up. Once the loops are running,
/// bad input is dropped rather than reported.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("MIDI input error: {0}")]
    MidiInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
