use crate::bus::{BusPacket, MOTOR_OFF};
use crate::types::events::{NoteAction, NoteEvent};
use crate::types::note;

/// Broadcast table for sequenced input: MIDI channel to motor indices.
/// A channel may drive any number of motors, a motor may serve several
/// channels, and an unmapped channel drives nothing.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    motors: [Vec<u8>; 16],
}

impl ChannelMap {
    /// Build from (channel, motors) pairs. Channels past 15 are ignored.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u8, Vec<u8>)>,
    {
        let mut map = ChannelMap::default();
        for (channel, motors) in entries {
            if let Some(slot) = map.motors.get_mut(channel as usize) {
                *slot = motors;
            }
        }
        map
    }

    pub fn motors_for(&self, channel: u8) -> &[u8] {
        self.motors
            .get(channel as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Which MIDI key each motor is holding; [`MOTOR_OFF`] marks a free slot.
pub struct MotorPool {
    held: Vec<u8>,
}

impl MotorPool {
    pub fn new(motors: usize) -> Self {
        MotorPool { held: vec![MOTOR_OFF; motors] }
    }

    pub fn motors(&self) -> usize {
        self.held.len()
    }

    /// Held key per motor, [`MOTOR_OFF`] where idle.
    pub fn held(&self) -> &[u8] {
        &self.held
    }

    fn first_free(&self) -> Option<usize> {
        self.held.iter().position(|&k| k == MOTOR_OFF)
    }

    fn first_holding(&self, key: u8) -> Option<usize> {
        self.held.iter().position(|&k| k == key)
    }
}

enum Policy {
    Live,
    Sequenced(ChannelMap),
}

pub struct VoiceAllocator {
    pool: MotorPool,
    key_offset: u8,
    policy: Policy,
}

impl VoiceAllocator {
    /// First-fit allocator for live playing.
    pub fn live(motors: usize, key_offset: u8) -> Self {
        VoiceAllocator {
            pool: MotorPool::new(motors),
            key_offset,
            policy: Policy::Live,
        }
    }

    /// Broadcast allocator for recorded streams.
    pub fn sequenced(motors: usize, key_offset: u8, map: ChannelMap) -> Self {
        VoiceAllocator {
            pool: MotorPool::new(motors),
            key_offset,
            policy: Policy::Sequenced(map),
        }
    }

    pub fn pool(&self) -> &MotorPool {
        &self.pool
    }

    /// Turn one event into bus packets, updating the pool. Events that
    /// can't be honored (pool full, key not held, unknown action) produce
    /// nothing.
    pub fn handle_event(&mut self, event: NoteEvent) -> Vec<BusPacket> {
        match &self.policy {
            Policy::Live => live_packets(&mut self.pool, self.key_offset, event),
            Policy::Sequenced(map) => broadcast_packets(&mut self.pool, map, self.key_offset, event),
        }
    }
}

fn live_packets(pool: &mut MotorPool, key_offset: u8, event: NoteEvent) -> Vec<BusPacket> {
    match event.action {
        NoteAction::Other => Vec::new(),
        NoteAction::NoteOn if !event.is_release() => {
            let Some(motor) = pool.first_free() else {
                return Vec::new(); // every motor busy
            };
            pool.held[motor] = event.key;
            vec![BusPacket::strike(
                note::wire_code(event.key, key_offset),
                motor as u8,
            )]
        }
        // Note off, or note on at velocity zero
        NoteAction::NoteOn | NoteAction::NoteOff => {
            let Some(motor) = pool.first_holding(event.key) else {
                return Vec::new(); // nothing holds this key
            };
            pool.held[motor] = MOTOR_OFF;
            vec![BusPacket::release(motor as u8)]
        }
    }
}

fn broadcast_packets(
    pool: &mut MotorPool,
    map: &ChannelMap,
    key_offset: u8,
    event: NoteEvent,
) -> Vec<BusPacket> {
    let mut packets = Vec::new();
    match event.action {
        // Any velocity strikes, zero included; the recorded streams
        // encode releases as explicit note offs
        NoteAction::NoteOn => {
            for &motor in map.motors_for(event.channel) {
                if let Some(held) = pool.held.get_mut(motor as usize) {
                    *held = event.key;
                    packets.push(BusPacket::strike(
                        note::wire_code(event.key, key_offset),
                        motor,
                    ));
                }
            }
        }
        NoteAction::NoteOff => {
            for &motor in map.motors_for(event.channel) {
                if let Some(held) = pool.held.get_mut(motor as usize) {
                    *held = MOTOR_OFF;
                    packets.push(BusPacket::release(motor));
                }
            }
        }
        NoteAction::Other => {}
    }
    packets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::note::DEFAULT_KEY_OFFSET;

    fn live(motors: usize) -> VoiceAllocator {
        VoiceAllocator::live(motors, DEFAULT_KEY_OFFSET)
    }

    #[test]
    fn test_live_first_fit_ascending() {
        let mut alloc = live(3);
        let first = alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        let second = alloc.handle_event(NoteEvent::note_on(0, 62, 64));
        assert_eq!(first, vec![BusPacket::strike(39, 0)]);
        assert_eq!(second, vec![BusPacket::strike(41, 1)]);
        assert_eq!(alloc.pool().held(), &[60, 62, MOTOR_OFF]);
    }

    #[test]
    fn test_live_pool_exhausted_drops_event() {
        let mut alloc = live(2);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        alloc.handle_event(NoteEvent::note_on(0, 62, 64));
        let third = alloc.handle_event(NoteEvent::note_on(0, 64, 64));
        assert!(third.is_empty());
        assert_eq!(alloc.pool().held(), &[60, 62]);
    }

    #[test]
    fn test_live_release_frees_lowest_holder() {
        // The same key held twice releases one motor per note off
        let mut alloc = live(3);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        let first_off = alloc.handle_event(NoteEvent::note_off(0, 60, 0));
        assert_eq!(first_off, vec![BusPacket::release(0)]);
        assert_eq!(alloc.pool().held(), &[MOTOR_OFF, 60, MOTOR_OFF]);
        let second_off = alloc.handle_event(NoteEvent::note_off(0, 60, 0));
        assert_eq!(second_off, vec![BusPacket::release(1)]);
    }

    #[test]
    fn test_live_velocity_zero_note_on_releases() {
        let mut alloc = live(2);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        let off = alloc.handle_event(NoteEvent::note_on(0, 60, 0));
        assert_eq!(off, vec![BusPacket::release(0)]);
        assert_eq!(alloc.pool().held(), &[MOTOR_OFF, MOTOR_OFF]);
    }

    #[test]
    fn test_live_release_of_unheld_key_is_silent() {
        let mut alloc = live(2);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        let off = alloc.handle_event(NoteEvent::note_off(0, 61, 0));
        assert!(off.is_empty());
        assert_eq!(alloc.pool().held(), &[60, MOTOR_OFF]);
    }

    #[test]
    fn test_live_other_event_is_silent() {
        let mut alloc = live(2);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        assert!(alloc.handle_event(NoteEvent::other(0)).is_empty());
        assert_eq!(alloc.pool().held(), &[60, MOTOR_OFF]);
    }

    #[test]
    fn test_live_reuses_freed_motor() {
        let mut alloc = live(2);
        alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        alloc.handle_event(NoteEvent::note_on(0, 62, 64));
        alloc.handle_event(NoteEvent::note_off(0, 60, 0));
        let next = alloc.handle_event(NoteEvent::note_on(0, 64, 64));
        assert_eq!(next, vec![BusPacket::strike(43, 0)]);
    }

    #[test]
    fn test_live_key_below_offset_still_plays_through() {
        // The wire code wraps past the keyboard and dies at the far end
        let mut alloc = live(1);
        let packets = alloc.handle_event(NoteEvent::note_on(0, 5, 64));
        assert_eq!(packets, vec![BusPacket::strike(240, 0)]);
    }

    #[test]
    fn test_sequenced_broadcasts_to_mapped_motors() {
        let map = ChannelMap::new([(0u8, vec![0, 1, 2]), (1u8, vec![3])]);
        let mut alloc = VoiceAllocator::sequenced(4, DEFAULT_KEY_OFFSET, map);
        let on = alloc.handle_event(NoteEvent::note_on(0, 60, 64));
        assert_eq!(
            on,
            vec![
                BusPacket::strike(39, 0),
                BusPacket::strike(39, 1),
                BusPacket::strike(39, 2),
            ]
        );
        let off = alloc.handle_event(NoteEvent::note_off(0, 60, 0));
        assert_eq!(
            off,
            vec![
                BusPacket::release(0),
                BusPacket::release(1),
                BusPacket::release(2),
            ]
        );
        assert_eq!(alloc.pool().held(), &[MOTOR_OFF; 4]);
    }

    #[test]
    fn test_sequenced_unmapped_channel_is_silent() {
        let map = ChannelMap::new([(0u8, vec![0])]);
        let mut alloc = VoiceAllocator::sequenced(2, DEFAULT_KEY_OFFSET, map);
        assert!(alloc.handle_event(NoteEvent::note_on(5, 60, 64)).is_empty());
    }

    #[test]
    fn test_sequenced_motor_may_serve_two_channels() {
        let map = ChannelMap::new([(0u8, vec![1]), (3u8, vec![1, 2])]);
        let mut alloc = VoiceAllocator::sequenced(3, DEFAULT_KEY_OFFSET, map);
        let from_three = alloc.handle_event(NoteEvent::note_on(3, 60, 64));
        assert_eq!(
            from_three,
            vec![BusPacket::strike(39, 1), BusPacket::strike(39, 2)]
        );
        let from_zero = alloc.handle_event(NoteEvent::note_on(0, 62, 64));
        assert_eq!(from_zero, vec![BusPacket::strike(41, 1)]);
        assert_eq!(alloc.pool().held(), &[MOTOR_OFF, 62, 60]);
    }

    #[test]
    fn test_sequenced_velocity_zero_still_strikes() {
        let map = ChannelMap::new([(0u8, vec![0])]);
        let mut alloc = VoiceAllocator::sequenced(1, DEFAULT_KEY_OFFSET, map);
        let packets = alloc.handle_event(NoteEvent::note_on(0, 60, 0));
        assert_eq!(packets, vec![BusPacket::strike(39, 0)]);
    }

    #[test]
    fn test_pool_reports_size() {
        assert_eq!(MotorPool::new(8).motors(), 8);
    }
}
