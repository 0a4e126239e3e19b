use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::allocator::VoiceAllocator;
use crate::bus::BusWriter;
use crate::midi::EventAssembler;
use crate::ring::Consumer;

/// Drain the serial queue through the assembler and allocator until
/// `stop` is raised. Sends the ready byte first; the motor units sit in
/// their handshake loop until they see it.
pub fn run(
    mut serial_rx: Consumer,
    mut assembler: EventAssembler,
    mut allocator: VoiceAllocator,
    writer: BusWriter,
    stop: Arc<AtomicBool>,
    chatty: bool,
) {
    writer.send_ready();
    while !stop.load(Ordering::Relaxed) {
        let Some(byte) = serial_rx.dequeue() else {
            std::thread::yield_now();
            continue;
        };
        if chatty {
            println!("rx {byte:02x}");
        }
        let Some(event) = assembler.push(byte) else {
            continue;
        };
        for packet in allocator.handle_event(event) {
            writer.write_packet(packet.note, packet.motor);
        }
        if chatty {
            let held: Vec<String> = allocator
                .pool()
                .held()
                .iter()
                .map(|k| k.to_string())
                .collect();
            println!("motors: {}", held.join(" "));
        }
    }
}
