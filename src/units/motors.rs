//! Motor unit loop: handshake, then interleave bus intake with stepping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::bus::{BusReader, PacketAssembler};
use crate::hw::{OutputLine, Timer};
use crate::sched::{MotorSnapshot, StepScheduler};

/// Snapshot cadence for the monitor, µs.
const SNAPSHOT_EVERY_US: u64 = 16_000;

/// Wait for the controller, then run until `stop` is raised. At most one
/// bus byte is consumed per pass so a burst of packets cannot starve the
/// step timing.
pub fn run<L: OutputLine>(
    mut reader: BusReader,
    mut scheduler: StepScheduler<L>,
    timer: Arc<dyn Timer>,
    snapshots: Sender<Vec<MotorSnapshot>>,
    stop: Arc<AtomicBool>,
    chatty: bool,
) {
    if chatty {
        println!("waiting for controller...");
    }
    if !reader.wait_ready(&stop) {
        return;
    }
    if chatty {
        println!("connected");
    }
    let mut framer = PacketAssembler::new();
    let mut last_snapshot_us = 0u64;
    while !stop.load(Ordering::Relaxed) {
        if reader.has_data() {
            if let Some(byte) = reader.read_byte() {
                if let Some(packet) = framer.push(byte) {
                    if chatty {
                        println!("packet note {:02x} motor {:02x}", packet.note, packet.motor);
                    }
                    scheduler.apply(packet);
                }
            }
        }
        scheduler.poll();
        let now_us = timer.ticks_us();
        if now_us.saturating_sub(last_snapshot_us) >= SNAPSHOT_EVERY_US {
            // The monitor may be slow or gone; never wait on it
            let _ = snapshots.try_send(scheduler.snapshot());
            last_snapshot_us = now_us;
        }
    }
}
