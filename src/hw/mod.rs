pub mod line;
pub mod timer;

pub use line::{InputLine, LoopbackLine, OutputLine, PulseProbe};
pub use timer::{ManualTimer, SystemTimer, Timer};
