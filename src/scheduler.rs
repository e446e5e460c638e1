//! Packet construction and dispatch.
//!
//! [`CommandStation`] turns semantic requests (set a speed, switch a
//! function output, throw a turnout, stop everything) into DCC packets,
//! multiplexes four prioritized queues into a single packet stream, and feeds
//! that stream to whichever [`TrackOutput`] backend it owns. Call
//! [`update`](CommandStation::update) from the main loop as often as
//! practical; it returns immediately while the backend is still busy, and a
//! late call only means idle ones on the rails.

use crate::packet::{AddressKind, MultifunctionKind, Packet, PacketKind, MAX_PACKET_LEN};
use crate::queue::{EmergencyQueue, PacketQueue, RepeatQueue};
use crate::track::TrackOutput;

const E_STOP_QUEUE_SIZE: usize = 2;
const HIGH_PRIORITY_QUEUE_SIZE: usize = 10;
const LOW_PRIORITY_QUEUE_SIZE: usize = 10;
const REPEAT_QUEUE_SIZE: usize = 10;

/// Every 5th dispatch lets the low-priority queue compete with fresh
/// high-priority traffic; every 11th does the same for the repeat queue.
const LOW_PRIORITY_INTERVAL: u8 = 5;
const REPEAT_INTERVAL: u8 = 11;

const SPEED_REPEAT: u8 = 3;
const FUNCTION_REPEAT: u8 = 3;
const OPS_MODE_WRITE_REPEAT: u8 = 3;
const ACCESSORY_REPEAT: u8 = 2;
const E_STOP_REPEAT: u8 = 10;

/// RP 9.2.4 power-up quiescence: 20 reset packets, then 10 idle packets.
const STARTUP_RESET_REPEAT: u8 = 20;
const STARTUP_IDLE_REPEAT: u8 = 10;

/// Decoder speed-step modes.
///
/// Numeric configuration values go through
/// [`from_steps`](SpeedSteps::from_steps), which rejects anything but
/// 14, 28 and 128.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedSteps {
    S14,
    S28,
    S128,
}

impl SpeedSteps {
    pub fn from_steps(steps: u8) -> Option<Self> {
        match steps {
            14 => Some(SpeedSteps::S14),
            28 => Some(SpeedSteps::S28),
            128 => Some(SpeedSteps::S128),
            _ => None,
        }
    }

    pub fn steps(self) -> u8 {
        match self {
            SpeedSteps::S14 => 14,
            SpeedSteps::S28 => 28,
            SpeedSteps::S128 => 128,
        }
    }
}

impl Default for SpeedSteps {
    fn default() -> Self {
        SpeedSteps::S128
    }
}

/// Linear map of a magnitude in [2, 127] onto [2, `top`].
fn scale_speed(abs_speed: u8, top: u8) -> u8 {
    2 + ((abs_speed as u16 - 2) * (top as u16 - 2) / 125) as u8
}

/// A DCC command station: builds packets, schedules them fairly across
/// decoders, and keeps the track backend fed.
///
/// All command methods return whether the packet was accepted; a full queue
/// rejects and leaves no other trace.
pub struct CommandStation<T> {
    track: T,
    default_speed_steps: SpeedSteps,
    /// Address of the most recently emitted packet; the dispatcher avoids
    /// addressing the same decoder twice in a row when other traffic waits.
    last_packet_address: u16,
    packet_counter: u8,
    e_stop_queue: EmergencyQueue<E_STOP_QUEUE_SIZE>,
    high_priority_queue: PacketQueue<HIGH_PRIORITY_QUEUE_SIZE>,
    low_priority_queue: PacketQueue<LOW_PRIORITY_QUEUE_SIZE>,
    repeat_queue: RepeatQueue<REPEAT_QUEUE_SIZE>,
}

impl<T: TrackOutput> CommandStation<T> {
    pub fn new(track: T) -> Self {
        CommandStation {
            track,
            default_speed_steps: SpeedSteps::default(),
            last_packet_address: 0xFF,
            packet_counter: 1,
            e_stop_queue: EmergencyQueue::new(),
            high_priority_queue: PacketQueue::new(),
            low_priority_queue: PacketQueue::new(),
            repeat_queue: RepeatQueue::new(),
        }
    }

    /// Step mode used by [`set_speed`](CommandStation::set_speed) when the
    /// caller does not name one.
    pub fn set_default_speed_steps(&mut self, steps: SpeedSteps) {
        self.default_speed_steps = steps;
    }

    /// Queue the power-up sequence: decoders are guaranteed a window of
    /// reset packets followed by idle packets before any command. Call once
    /// after the hardware backend is running.
    pub fn setup(&mut self) {
        let mut reset = Packet::new(0x00, AddressKind::Short);
        reset.set_data(&[0x00]);
        reset.set_kind(PacketKind::RESET);
        reset.set_repeat(STARTUP_RESET_REPEAT);
        self.e_stop_queue.insert(&reset);

        let mut idle = Packet::new(0xFF, AddressKind::Short);
        idle.set_data(&[0x00]);
        idle.set_kind(PacketKind::IDLE);
        idle.set_repeat(STARTUP_IDLE_REPEAT);
        self.e_stop_queue.insert(&idle);
    }

    /// Set a decoder's speed and direction.
    ///
    /// `speed` is signed: the sign is the direction, `0` routes to the
    /// single-decoder emergency stop, magnitude `1` is a regular stop, and
    /// magnitudes 2..=127 map onto the step mode's range. `steps = None`
    /// uses the configured default mode.
    pub fn set_speed(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        speed: i8,
        steps: Option<SpeedSteps>,
    ) -> bool {
        match steps.unwrap_or(self.default_speed_steps) {
            SpeedSteps::S14 => self.set_speed_14(address, address_kind, speed, true),
            SpeedSteps::S28 => self.set_speed_28(address, address_kind, speed),
            SpeedSteps::S128 => self.set_speed_128(address, address_kind, speed),
        }
    }

    /// 14-step speed command. `f0` drives the headlight bit, which sits at
    /// bit 4 of the speed byte in this mode.
    pub fn set_speed_14(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        speed: i8,
        f0: bool,
    ) -> bool {
        if speed == 0 {
            return self.e_stop_one(address, address_kind);
        }
        let (forward, abs) = split_speed(speed);
        let mut data = 0x40;
        if abs >= 2 {
            data |= scale_speed(abs, 15);
        }
        if forward {
            data |= 0x20;
        }
        if f0 {
            data |= 0x10;
        }
        self.queue_speed(address, address_kind, &[data])
    }

    /// 28-step speed command.
    pub fn set_speed_28(&mut self, address: u16, address_kind: AddressKind, speed: i8) -> bool {
        if speed == 0 {
            return self.e_stop_one(address, address_kind);
        }
        let (forward, abs) = split_speed(speed);
        let mut data = 0x40;
        if abs >= 2 {
            data |= scale_speed(abs, 31);
            // the least significant of the five speed bits travels in bit 4
            data = (data & 0xE0) | ((data & 0x1F) >> 1) | ((data & 0x01) << 4);
        }
        if forward {
            data |= 0x20;
        }
        self.queue_speed(address, address_kind, &[data])
    }

    /// 128-step speed command.
    pub fn set_speed_128(&mut self, address: u16, address_kind: AddressKind, speed: i8) -> bool {
        if speed == 0 {
            return self.e_stop_one(address, address_kind);
        }
        let (forward, abs) = split_speed(speed);
        let mut low = if abs == 1 { 0x00 } else { abs };
        if forward {
            low |= 0x80;
        }
        self.queue_speed(address, address_kind, &[0x3F, low])
    }

    fn queue_speed(&mut self, address: u16, address_kind: AddressKind, data: &[u8]) -> bool {
        let mut p = Packet::new(address, address_kind);
        p.set_data(data);
        p.set_kind(PacketKind::SPEED);
        p.set_repeat(SPEED_REPEAT);
        self.high_priority_queue.insert(&p)
    }

    /// Set all of F0..=F12 in one call. Function state is not tracked here:
    /// every call must carry the complete picture.
    pub fn set_functions(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        f0_to_4: u8,
        f5_to_8: u8,
        f9_to_12: u8,
    ) -> bool {
        self.set_functions_0_to_4(address, address_kind, f0_to_4)
            && self.set_functions_5_to_8(address, address_kind, f5_to_8)
            && self.set_functions_9_to_12(address, address_kind, f9_to_12)
    }

    /// As [`set_functions`](CommandStation::set_functions), with F0..=F12
    /// packed into bits 0..=12 of one word.
    pub fn set_functions_word(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        functions: u16,
    ) -> bool {
        self.set_functions(
            address,
            address_kind,
            (functions & 0x1F) as u8,
            (functions >> 5 & 0x0F) as u8,
            (functions >> 9 & 0x0F) as u8,
        )
    }

    /// F0..F4 group. F0 sits at bit 0 of `functions` here but at bit 4 on
    /// the wire; F1..F4 occupy wire bits 0..3.
    pub fn set_functions_0_to_4(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        functions: u8,
    ) -> bool {
        let data = 0x80 | (functions >> 1 & 0x0F) | (functions & 0x01) << 4;
        self.queue_function(address, address_kind, PacketKind::FUNCTION_GROUP_1, data)
    }

    /// F5..F8 group, bits 0..3.
    pub fn set_functions_5_to_8(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        functions: u8,
    ) -> bool {
        let data = 0xB0 | functions & 0x0F;
        self.queue_function(address, address_kind, PacketKind::FUNCTION_GROUP_2, data)
    }

    /// F9..F12 group, bits 0..3.
    pub fn set_functions_9_to_12(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        functions: u8,
    ) -> bool {
        let data = 0xA0 | functions & 0x0F;
        self.queue_function(address, address_kind, PacketKind::FUNCTION_GROUP_3, data)
    }

    fn queue_function(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        kind: PacketKind,
        data: u8,
    ) -> bool {
        let mut p = Packet::new(address, address_kind);
        p.set_data(&[data]);
        p.set_kind(kind);
        p.set_repeat(FUNCTION_REPEAT);
        self.low_priority_queue.insert(&p)
    }

    /// Activate output `function` (0..=3) of a basic accessory decoder.
    pub fn set_basic_accessory(&mut self, address: u16, function: u8) -> bool {
        self.queue_basic_accessory(address, 0x01 | (function & 0x03) << 1)
    }

    /// Deactivate output `function` (0..=3) of a basic accessory decoder.
    pub fn unset_basic_accessory(&mut self, address: u16, function: u8) -> bool {
        self.queue_basic_accessory(address, (function & 0x03) << 1)
    }

    fn queue_basic_accessory(&mut self, address: u16, data: u8) -> bool {
        let mut p = Packet::new(address, AddressKind::Short);
        p.set_data(&[data]);
        p.set_kind(PacketKind::BASIC_ACCESSORY);
        p.set_repeat(ACCESSORY_REPEAT);
        self.low_priority_queue.insert(&p)
    }

    /// Write a configuration variable on the main track (ops mode).
    /// CV numbers run 1..=1024.
    pub fn ops_program_cv(
        &mut self,
        address: u16,
        address_kind: AddressKind,
        cv: u16,
        value: u8,
    ) -> bool {
        if cv == 0 || cv > 1024 {
            return false;
        }
        let cv = cv - 1;
        let mut p = Packet::new(address, address_kind);
        p.set_data(&[0xEC | (cv >> 8) as u8 & 0x03, cv as u8, value]);
        p.set_kind(PacketKind::OPS_MODE_WRITE);
        p.set_repeat(OPS_MODE_WRITE_REPEAT);
        self.low_priority_queue.insert(&p)
    }

    /// Emergency-stop one decoder and drop its pending commands: whatever
    /// was queued for it is about to be meaningless.
    pub fn e_stop_one(&mut self, address: u16, address_kind: AddressKind) -> bool {
        let mut p = Packet::new(address, address_kind);
        p.set_data(&[0x41]);
        p.set_kind(PacketKind::E_STOP);
        p.set_repeat(E_STOP_REPEAT);
        let accepted = self.e_stop_queue.insert(&p);
        self.high_priority_queue.forget(address, address_kind);
        self.low_priority_queue.forget(address, address_kind);
        self.repeat_queue.forget(address, address_kind);
        accepted
    }

    /// Emergency-stop every locomotive (broadcast) and flush all pending
    /// traffic.
    pub fn e_stop_all(&mut self) -> bool {
        let mut p = Packet::new(0x00, AddressKind::Short);
        p.set_data(&[0x71]);
        p.set_kind(PacketKind::E_STOP);
        p.set_repeat(E_STOP_REPEAT);
        let accepted = self.e_stop_queue.insert(&p);
        self.high_priority_queue.clear();
        self.low_priority_queue.clear();
        self.repeat_queue.clear();
        accepted
    }

    /// Feed the backend if it is ready for another packet.
    ///
    /// Emergency traffic always wins. Otherwise the high-priority queue
    /// leads, with the low-priority and repeat queues let through on their
    /// intervals, and no decoder is addressed twice in a row while a
    /// different address is waiting. With nothing to send, an idle packet
    /// keeps the rails alive.
    pub fn update(&mut self) {
        if !self.track.need_packet() {
            return;
        }

        let mut packet = Packet::default();
        if !self.e_stop_queue.is_empty() {
            if let Some(p) = self.e_stop_queue.read() {
                packet = p;
            }
        } else {
            let last = self.last_packet_address;
            let do_high = self
                .high_priority_queue
                .head_address()
                .map_or(false, |a| a != last);
            let do_low = self
                .low_priority_queue
                .head_address()
                .map_or(false, |a| a != last)
                && !(self.packet_counter % LOW_PRIORITY_INTERVAL != 0 && do_high);
            let do_repeat = self
                .repeat_queue
                .head_address()
                .map_or(false, |a| a != last)
                && !(self.packet_counter % REPEAT_INTERVAL != 0 && (do_high || do_low));

            let selected = if do_high {
                self.high_priority_queue.read()
            } else if do_low {
                self.low_priority_queue.read()
            } else if do_repeat {
                self.repeat_queue.read()
            } else {
                None
            };
            if let Some(p) = selected {
                self.packet_counter = self.packet_counter.wrapping_add(1);
                packet = p;
            }
            self.requeue_for_repeat(&packet);
        }

        self.last_packet_address = packet.address();

        let mut buf = [0u8; MAX_PACKET_LEN];
        let mut len = packet.serialize(&mut buf);
        if len == 0 {
            // kinds without a wire form degrade to idle
            len = Packet::default().serialize(&mut buf);
        }
        self.track.supply_packet(&buf[..len]);
    }

    /// Idle packets are filler and e-stops re-emit from the emergency queue
    /// on their own; everything else gets its remaining repeats.
    fn requeue_for_repeat(&mut self, packet: &Packet) {
        match packet.kind() {
            PacketKind::Multifunction(MultifunctionKind::Idle)
            | PacketKind::Multifunction(MultifunctionKind::EStop) => {}
            _ => {
                self.repeat_queue.insert(packet);
            }
        }
    }

    /// The owned track backend.
    pub fn track(&mut self) -> &mut T {
        &mut self.track
    }

    /// Release the track backend.
    pub fn free(self) -> T {
        self.track
    }
}

fn split_speed(speed: i8) -> (bool, u8) {
    (speed >= 0, (speed as i16).unsigned_abs() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    struct CaptureTrack {
        ready: bool,
        sent: Vec<Vec<u8>>,
    }

    impl CaptureTrack {
        fn new() -> Self {
            CaptureTrack {
                ready: true,
                sent: Vec::new(),
            }
        }
    }

    impl TrackOutput for CaptureTrack {
        fn need_packet(&mut self) -> bool {
            self.ready
        }

        fn supply_packet(&mut self, bytes: &[u8]) {
            self.sent.push(bytes.to_vec());
        }
    }

    fn station() -> CommandStation<CaptureTrack> {
        CommandStation::new(CaptureTrack::new())
    }

    const IDLE: &[u8] = &[0xFF, 0x00, 0xFF];

    #[test]
    fn update_respects_backend_readiness() {
        let mut cs = station();
        cs.track().ready = false;
        cs.update();
        assert!(cs.track().sent.is_empty());
        cs.track().ready = true;
        cs.update();
        assert_eq!(cs.track().sent.len(), 1);
    }

    #[test]
    fn warm_up_sequence() {
        let mut cs = station();
        cs.setup();
        for _ in 0..31 {
            cs.update();
        }
        let sent = &cs.track().sent;
        for packet in &sent[..20] {
            assert_eq!(packet[..], [0x00, 0x00, 0x00]);
        }
        for packet in &sent[20..30] {
            assert_eq!(packet[..], *IDLE);
        }
        // warm-up drained; the rails stay on idle
        assert_eq!(sent[30][..], *IDLE);
    }

    #[test]
    fn speed_outranks_functions() {
        let mut cs = station();
        assert!(cs.set_functions_0_to_4(5, AddressKind::Short, 0x01));
        assert!(cs.set_speed_128(5, AddressKind::Short, 0x11));
        for _ in 0..4 {
            cs.update();
        }
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x05, 0x3F, 0x91, 0xAB]);
        assert!(sent[1..].iter().any(|p| p[..] == [0x05, 0x90, 0x95]));
    }

    #[test]
    fn no_back_to_back_address_when_alternative_waits() {
        let mut cs = station();
        assert!(cs.set_speed_128(7, AddressKind::Short, 10));
        cs.update();
        assert!(cs.set_speed_128(7, AddressKind::Short, 20));
        assert!(cs.set_functions_0_to_4(9, AddressKind::Short, 0x01));
        cs.update();
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x07, 0x3F, 0x8A, 0xB2]);
        assert_eq!(sent[1][..], [0x09, 0x90, 0x99]);
        assert_eq!(sent[2][..], [0x07, 0x3F, 0x94, 0xAC]);
    }

    #[test]
    fn same_address_repeats_when_nothing_else_waits() {
        let mut cs = station();
        assert!(cs.set_speed_128(7, AddressKind::Short, 10));
        cs.update();
        assert!(cs.set_speed_128(7, AddressKind::Short, 20));
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x07, 0x3F, 0x8A, 0xB2]);
        // the fresh command waits one idle cycle rather than re-addressing 7
        assert_eq!(sent[1][..], *IDLE);
    }

    #[test]
    fn broadcast_e_stop_flushes_everything() {
        let mut cs = station();
        cs.set_speed_128(3, AddressKind::Short, 40);
        cs.set_speed_128(4, AddressKind::Short, 40);
        cs.set_functions_0_to_4(3, AddressKind::Short, 0x01);
        cs.set_basic_accessory(8, 1);
        cs.update();
        assert!(cs.e_stop_all());

        let already_sent = cs.track().sent.len();
        for _ in 0..E_STOP_REPEAT as usize + 2 {
            cs.update();
        }
        let sent = &cs.track().sent;
        for packet in &sent[already_sent..already_sent + E_STOP_REPEAT as usize] {
            assert_eq!(packet[..], [0x00, 0x71, 0x71]);
        }
        // queues were flushed: nothing but idle afterwards
        for packet in &sent[already_sent + E_STOP_REPEAT as usize..] {
            assert_eq!(packet[..], *IDLE);
        }
    }

    #[test]
    fn single_e_stop_purges_that_decoder() {
        let mut cs = station();
        cs.set_speed_128(7, AddressKind::Short, 40);
        cs.set_functions_0_to_4(7, AddressKind::Short, 0x01);
        cs.set_speed_128(9, AddressKind::Short, 40);
        assert!(cs.e_stop_one(7, AddressKind::Short));

        for _ in 0..30 {
            cs.update();
        }
        let sent = &cs.track().sent;
        // the burst leads
        for packet in &sent[..E_STOP_REPEAT as usize] {
            assert_eq!(packet[..], [0x07, 0x41, 0x46]);
        }
        // address 7 never reappears outside the e-stop itself
        for packet in &sent[E_STOP_REPEAT as usize..] {
            assert_ne!(packet[0], 0x07);
        }
        // address 9 still runs
        assert!(sent.iter().any(|p| p[0] == 0x09));
    }

    #[test]
    fn speed_zero_routes_to_e_stop() {
        let mut cs = station();
        assert!(cs.set_speed_128(3, AddressKind::Short, 0));
        cs.update();
        assert_eq!(cs.track().sent[0][..], [0x03, 0x41, 0x42]);
    }

    #[test]
    fn speed_one_is_regular_stop() {
        let mut cs = station();
        assert!(cs.set_speed_128(3, AddressKind::Short, 1));
        assert!(cs.set_speed_128(4, AddressKind::Short, -1));
        cs.update();
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x03, 0x3F, 0x80, 0xBC]);
        assert_eq!(sent[1][..], [0x04, 0x3F, 0x00, 0x3B]);
    }

    #[test]
    fn speed_14_places_f0_at_bit_4() {
        let mut cs = station();
        assert!(cs.set_speed_14(3, AddressKind::Short, 5, true));
        assert!(cs.set_speed_14(4, AddressKind::Short, 5, false));
        cs.update();
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][1], 0x72);
        assert_eq!(sent[1][1], 0x62);
    }

    #[test]
    fn speed_28_relocates_low_bit() {
        let mut cs = station();
        assert!(cs.set_speed_28(3, AddressKind::Short, 127));
        cs.update();
        // full speed: step 31 = 0b11111, low bit moved up to bit 4
        assert_eq!(cs.track().sent[0][1], 0x7F);
    }

    #[test]
    fn default_speed_steps_select_encoding() {
        let mut cs = station();
        cs.set_default_speed_steps(SpeedSteps::S28);
        assert!(cs.set_speed(3, AddressKind::Short, 5, None));
        assert!(cs.set_speed(4, AddressKind::Short, 5, Some(SpeedSteps::S128)));
        cs.update();
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0].len(), 3);
        assert_eq!(sent[1][..2], [0x04, 0x3F]);
        assert_eq!(SpeedSteps::from_steps(127), None);
        assert_eq!(SpeedSteps::from_steps(28), Some(SpeedSteps::S28));
    }

    #[test]
    fn functions_word_unpacks_groups() {
        let mut cs = station();
        // F0, F5 and F9
        assert!(cs.set_functions_word(3, AddressKind::Short, 1 << 0 | 1 << 5 | 1 << 9));
        for _ in 0..12 {
            cs.update();
        }
        let sent = &cs.track().sent;
        assert!(sent.iter().any(|p| p[1] == 0x90));
        assert!(sent.iter().any(|p| p[1] == 0xB1));
        assert!(sent.iter().any(|p| p[1] == 0xA1));
    }

    #[test]
    fn accessory_commands() {
        let mut cs = station();
        assert!(cs.set_basic_accessory(5, 1));
        cs.update();
        assert!(cs.unset_basic_accessory(5, 1));
        cs.update();
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x85, 0xFB, 0x85 ^ 0xFB]);
        assert!(sent.iter().any(|p| p[..] == [0x85, 0xFA, 0x85 ^ 0xFA]));
    }

    #[test]
    fn ops_mode_cv_write() {
        let mut cs = station();
        assert!(cs.ops_program_cv(3, AddressKind::Short, 29, 0x05));
        cs.update();
        let sent = &cs.track().sent;
        assert_eq!(sent[0][..], [0x03, 0xEC, 0x1C, 0x05, 0xF6]);

        assert!(!cs.ops_program_cv(3, AddressKind::Short, 0, 0x05));
        assert!(!cs.ops_program_cv(3, AddressKind::Short, 1025, 0x05));
        assert!(cs.ops_program_cv(3, AddressKind::Short, 1024, 0x05));
    }

    #[test]
    fn full_queue_rejects() {
        let mut cs = station();
        for address in 1..=10 {
            assert!(cs.set_basic_accessory(address, 0));
        }
        assert!(!cs.set_basic_accessory(11, 0));
        // same address coalesces instead
        assert!(cs.set_basic_accessory(10, 1));
    }

    #[test]
    fn commands_repeat_their_budget() {
        let mut cs = station();
        assert!(cs.set_speed_128(3, AddressKind::Short, 10));
        for _ in 0..40 {
            cs.update();
        }
        let sent = &cs.track().sent;
        let copies = sent
            .iter()
            .filter(|p| p[..] == [0x03, 0x3F, 0x8A, 0xB6])
            .count();
        // initial emission plus the repeat-queue circulations
        assert_eq!(copies, 1 + SPEED_REPEAT as usize);
    }
}
