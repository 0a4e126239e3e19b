//! Microsecond clock and delay source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Timer: Send + Sync {
    /// Microseconds since the timer's epoch.
    fn ticks_us(&self) -> u64;

    /// Wait `us` microseconds. Must be usable at single-microsecond scale.
    fn delay_us(&self, us: u64);
}

/// Monotonic process clock.
pub struct SystemTimer {
    epoch: Instant,
}

impl SystemTimer {
    pub fn new() -> Self {
        SystemTimer { epoch: Instant::now() }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn ticks_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn delay_us(&self, us: u64) {
        let target = self.ticks_us() + us;
        loop {
            let now = self.ticks_us();
            if now >= target {
                return;
            }
            // Sleep while far out, spin the last stretch
            if target - now > 500 {
                std::thread::sleep(Duration::from_micros(target - now - 300));
            } else {
                std::hint::spin_loop();
            }
        }
    }
}

/// Hand-cranked test clock. `delay_us` advances it, so code that
/// busy-waits through a waveform runs instantly and lands on exact
/// sample instants.
#[derive(Clone, Default)]
pub struct ManualTimer {
    now_us: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn ticks_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn delay_us(&self, us: u64) {
        self.advance(us);
    }
}
