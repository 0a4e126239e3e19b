use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Driven side of a line.
pub trait OutputLine: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// Sensed side of a line.
pub trait InputLine: Send {
    fn is_high(&self) -> bool;
}

/// A wire both ends share; clones observe the same level.
#[derive(Clone)]
pub struct LoopbackLine {
    level: Arc<AtomicBool>,
}

impl LoopbackLine {
    pub fn new(initial: bool) -> Self {
        LoopbackLine { level: Arc::new(AtomicBool::new(initial)) }
    }
}

impl OutputLine for LoopbackLine {
    fn set_high(&mut self) {
        self.level.store(true, Ordering::Release);
    }

    fn set_low(&mut self) {
        self.level.store(false, Ordering::Release);
    }
}

impl InputLine for LoopbackLine {
    fn is_high(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

/// Step-pin stand-in that counts rising edges.
#[derive(Clone, Default)]
pub struct PulseProbe {
    pulses: Arc<AtomicU64>,
}

impl PulseProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl OutputLine for PulseProbe {
    fn set_high(&mut self) {
        self.pulses.fetch_add(1, Ordering::SeqCst);
    }

    fn set_low(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_level_is_shared() {
        let mut line = LoopbackLine::new(false);
        let sensed = line.clone();
        assert!(!sensed.is_high());
        line.set_high();
        assert!(sensed.is_high());
        line.set_low();
        assert!(!sensed.is_high());
    }

    #[test]
    fn test_probe_counts_rising_edges_only() {
        let mut probe = PulseProbe::new();
        let watcher = probe.clone();
        for _ in 0..3 {
            probe.set_high();
            probe.set_low();
        }
        assert_eq!(watcher.count(), 3);
    }
}
