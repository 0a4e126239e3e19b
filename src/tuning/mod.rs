//! Step intervals per piano key.

pub struct StepTable {
    intervals_us: Vec<u32>,
}

impl StepTable {
    /// Equal-tempered table covering `keys` keys starting at A0 = 27.5 Hz.
    /// Each frequency is rounded to two decimals before inversion; the
    /// motor units were tabulated from a chart with that precision and
    /// these intervals must match theirs digit for digit.
    pub fn equal_tempered(keys: usize) -> Self {
        let intervals_us = (0..keys)
            .map(|key| {
                let hz = (27.5 * 2f64.powf(key as f64 / 12.0) * 100.0).round() / 100.0;
                (1_000_000.0 / hz).round() as u32
            })
            .collect();
        StepTable { intervals_us }
    }

    /// Replace one entry. Mechanical tweaks for individual motors come in
    /// from config this way; out-of-range keys are ignored.
    pub fn override_key(&mut self, key: u8, interval_us: u32) {
        if let Some(slot) = self.intervals_us.get_mut(key as usize) {
            *slot = interval_us;
        }
    }

    /// Step interval for a key code, if the keyboard has that key.
    pub fn interval_us(&self, key: u8) -> Option<u32> {
        self.intervals_us.get(key as usize).copied()
    }

    pub fn keys(&self) -> usize {
        self.intervals_us.len()
    }
}
