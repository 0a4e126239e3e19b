use std::collections::VecDeque;

use crate::bus::{BusPacket, MOTOR_OFF};
use crate::sched::MotorSnapshot;

/// Rows of note history kept for the scroll pane.
pub const HISTORY_ROWS: usize = 100;

/// One motor as the monitor shows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotorView {
    /// Wire note code currently held, if any.
    pub note: Option<u8>,
    /// Step interval while held, µs.
    pub interval_us: u32,
    /// Lifetime step count.
    pub pulses: u64,
}

/// Monitor state
/// Fed from two sides: packets the monitor overhears on the bus, and
/// periodic snapshots from the motor unit. Snapshots win.
pub struct MonitorApp {
    /// Whether the controller has announced itself yet
    pub ready: bool,
    /// Per-motor view, index = bus motor field
    pub motors: Vec<MotorView>,
    /// Keyboard span drawn in the piano strip
    pub keys: u8,
    /// Recent per-motor note rows, newest at the back
    pub history: VecDeque<Vec<Option<u8>>>,
    /// Whether to quit the application
    pub should_quit: bool,
}

impl MonitorApp {
    pub fn new(motors: usize, keys: u8) -> Self {
        Self {
            ready: false,
            motors: vec![MotorView::default(); motors],
            keys,
            history: VecDeque::with_capacity(HISTORY_ROWS),
            should_quit: false,
        }
    }

    /// The controller's hello byte was seen on the bus.
    pub fn observe_ready(&mut self) {
        self.ready = true;
    }

    /// Overheard packet; updates the view immediately so strikes show the
    /// same frame they happen. Unknown motor indices are ignored.
    pub fn apply_packet(&mut self, packet: BusPacket) {
        let Some(view) = self.motors.get_mut(packet.motor as usize) else {
            return;
        };
        view.note = if packet.note == MOTOR_OFF {
            None
        } else {
            Some(packet.note)
        };
    }

    /// Authoritative state from the motor unit.
    pub fn update_snapshots(&mut self, snapshots: &[MotorSnapshot]) {
        for (view, snap) in self.motors.iter_mut().zip(snapshots) {
            view.note = snap.active.then_some(snap.note);
            view.interval_us = snap.interval_us;
            view.pulses = snap.pulses;
        }
    }

    /// Push the current motor notes onto the history roll.
    pub fn tick(&mut self) {
        if !self.ready {
            return;
        }
        let row: Vec<Option<u8>> = self.motors.iter().map(|view| view.note).collect();
        if self.history.len() == HISTORY_ROWS {
            self.history.pop_front();
        }
        self.history.push_back(row);
    }

    /// Which motor holds the given wire code, for the piano strip.
    pub fn motor_for_key(&self, code: u8) -> Option<usize> {
        self.motors.iter().position(|view| view.note == Some(code))
    }

    /// Mark app for quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_sets_and_clears_note() {
        let mut app = MonitorApp::new(4, 88);
        app.apply_packet(BusPacket::strike(39, 2));
        assert_eq!(app.motors[2].note, Some(39));
        assert_eq!(app.motor_for_key(39), Some(2));
        app.apply_packet(BusPacket::release(2));
        assert_eq!(app.motors[2].note, None);
        assert_eq!(app.motor_for_key(39), None);
    }

    #[test]
    fn test_out_of_range_motor_is_ignored() {
        let mut app = MonitorApp::new(2, 88);
        app.apply_packet(BusPacket::strike(10, 7));
        assert!(app.motors.iter().all(|view| view.note.is_none()));
    }

    #[test]
    fn test_snapshots_override_overheard_state() {
        let mut app = MonitorApp::new(2, 88);
        app.apply_packet(BusPacket::strike(39, 0));
        let snaps = [
            MotorSnapshot { active: false, note: 0, interval_us: 0, pulses: 12 },
            MotorSnapshot { active: true, note: 48, interval_us: 2273, pulses: 3 },
        ];
        app.update_snapshots(&snaps);
        assert_eq!(app.motors[0].note, None);
        assert_eq!(app.motors[0].pulses, 12);
        assert_eq!(app.motors[1].note, Some(48));
        assert_eq!(app.motors[1].interval_us, 2273);
    }

    #[test]
    fn test_history_waits_for_ready_and_stays_capped() {
        let mut app = MonitorApp::new(1, 88);
        app.tick();
        assert!(app.history.is_empty());
        app.observe_ready();
        for i in 0..(HISTORY_ROWS + 5) {
            app.apply_packet(BusPacket::strike((i % 88) as u8, 0));
            app.tick();
        }
        assert_eq!(app.history.len(), HISTORY_ROWS);
        let newest = app.history.back().unwrap();
        assert_eq!(newest[0], Some(((HISTORY_ROWS + 4) % 88) as u8));
    }
}
