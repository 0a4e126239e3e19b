//! Per-motor step pulse scheduling.

use std::sync::Arc;

use crate::bus::{BusPacket, MOTOR_OFF};
use crate::hw::{OutputLine, Timer};
use crate::tuning::StepTable;

/// Published motor state for the monitor.
#[derive(Debug, Clone, Copy)]
pub struct MotorSnapshot {
    pub active: bool,
    pub note: u8,
    pub interval_us: u32,
    pub pulses: u64,
}

struct MotorState {
    active: bool,
    note: u8,
    interval_us: u32,
    deadline_us: u64,
    pulses: u64,
}

impl MotorState {
    fn idle() -> Self {
        MotorState {
            active: false,
            note: MOTOR_OFF,
            interval_us: 0,
            deadline_us: 0,
            pulses: 0,
        }
    }
}

pub struct StepScheduler<L: OutputLine> {
    motors: Vec<MotorState>,
    lines: Vec<L>,
    table: StepTable,
    timer: Arc<dyn Timer>,
}

impl<L: OutputLine> StepScheduler<L> {
    /// One scheduler per motor unit; the motor count is the line count.
    pub fn new(lines: Vec<L>, table: StepTable, timer: Arc<dyn Timer>) -> Self {
        let motors = lines.iter().map(|_| MotorState::idle()).collect();
        StepScheduler { motors, lines, table, timer }
    }

    pub fn motor_count(&self) -> usize {
        self.lines.len()
    }

    /// Apply one bus packet. Packets naming a motor this unit doesn't
    /// have, or a note outside the table, are dropped.
    pub fn apply(&mut self, packet: BusPacket) {
        let Some(motor) = self.motors.get_mut(packet.motor as usize) else {
            return;
        };
        if packet.note == MOTOR_OFF {
            motor.active = false;
            motor.note = MOTOR_OFF;
            return;
        }
        let Some(interval_us) = self.table.interval_us(packet.note) else {
            return;
        };
        motor.note = packet.note;
        motor.interval_us = interval_us;
        motor.deadline_us = self.timer.ticks_us() + interval_us as u64;
        motor.active = true;
    }

    /// One non-blocking pass: pulse every motor strictly past its deadline.
    pub fn poll(&mut self) {
        let now_us = self.timer.ticks_us();
        for (motor, line) in self.motors.iter_mut().zip(self.lines.iter_mut()) {
            if !motor.active || now_us <= motor.deadline_us {
                continue;
            }
            line.set_high();
            line.set_low();
            motor.pulses += 1;
            // Advance from the old deadline, not from now; poll jitter
            // must not accumulate into the period
            motor.deadline_us += motor.interval_us as u64;
        }
    }

    pub fn snapshot(&self) -> Vec<MotorSnapshot> {
        self.motors
            .iter()
            .map(|m| MotorSnapshot {
                active: m.active,
                note: m.note,
                interval_us: m.interval_us,
                pulses: m.pulses,
            })
            .collect()
    }
}
