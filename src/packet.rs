//! DCC packet values and their on-wire byte form.

/// Longest serialized packet: two address bytes, three data bytes, one XOR.
pub const MAX_PACKET_LEN: usize = 6;

/// Decoder addressing mode.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressKind {
    /// 7-bit address, one address byte on the wire.
    Short,
    /// 14-bit address, two address bytes on the wire.
    Long,
}

/// Multifunction (locomotive) decoder packet kinds.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MultifunctionKind {
    Idle,
    EStop,
    Speed,
    /// F0..F4 group.
    FunctionGroup1,
    /// F5..F8 group.
    FunctionGroup2,
    /// F9..F12 group.
    FunctionGroup3,
    Reset,
    /// Ops-mode (main track) CV write.
    OpsModeWrite,
}

/// Accessory decoder packet kinds.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessoryKind {
    Basic,
    Extended,
}

/// Semantic class of a packet, partitioned by decoder family.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketKind {
    Multifunction(MultifunctionKind),
    Accessory(AccessoryKind),
    Other,
}

impl PacketKind {
    pub const IDLE: Self = PacketKind::Multifunction(MultifunctionKind::Idle);
    pub const E_STOP: Self = PacketKind::Multifunction(MultifunctionKind::EStop);
    pub const SPEED: Self = PacketKind::Multifunction(MultifunctionKind::Speed);
    pub const FUNCTION_GROUP_1: Self = PacketKind::Multifunction(MultifunctionKind::FunctionGroup1);
    pub const FUNCTION_GROUP_2: Self = PacketKind::Multifunction(MultifunctionKind::FunctionGroup2);
    pub const FUNCTION_GROUP_3: Self = PacketKind::Multifunction(MultifunctionKind::FunctionGroup3);
    pub const RESET: Self = PacketKind::Multifunction(MultifunctionKind::Reset);
    pub const OPS_MODE_WRITE: Self = PacketKind::Multifunction(MultifunctionKind::OpsModeWrite);
    pub const BASIC_ACCESSORY: Self = PacketKind::Accessory(AccessoryKind::Basic);
}

/// A single DCC packet: address, semantic kind, up to three payload bytes and
/// a remaining-transmission count.
///
/// The default value is an idle packet (address 0xFF, one 0x00 data byte,
/// repeat 0), so an unpopulated slot is always safe to put on the rails.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    address: u16,
    address_kind: AddressKind,
    kind: PacketKind,
    data: [u8; 3],
    size: u8,
    repeat: u8,
}

impl Packet {
    /// New idle-kind packet for the given decoder.
    pub const fn new(address: u16, address_kind: AddressKind) -> Self {
        Packet {
            address,
            address_kind,
            kind: PacketKind::IDLE,
            data: [0; 3],
            size: 1,
            repeat: 0,
        }
    }

    /// The default idle packet, usable in `const` context.
    pub const IDLE: Self = Packet::new(0xFF, AddressKind::Short);

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn address_kind(&self) -> AddressKind {
        self.address_kind
    }

    pub fn set_address(&mut self, address: u16, address_kind: AddressKind) {
        self.address = address;
        self.address_kind = address_kind;
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: PacketKind) {
        self.kind = kind;
    }

    /// Remaining transmissions, 0..=63.
    pub fn repeat(&self) -> u8 {
        self.repeat
    }

    /// Repeat counts are six bits wide; larger values are masked.
    pub fn set_repeat(&mut self, repeat: u8) {
        self.repeat = repeat & 0x3F;
    }

    /// Count of valid payload bytes, 0..=3.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Copy in the payload bytes. At most three are kept.
    pub fn set_data(&mut self, data: &[u8]) {
        let len = data.len().min(self.data.len());
        self.data[..len].copy_from_slice(&data[..len]);
        self.size = len as u8;
    }

    /// Serialize to the on-wire byte stream, trailing XOR included.
    ///
    /// `buf` must hold at least [`MAX_PACKET_LEN`] bytes. Returns the number
    /// of bytes written; 0 for kinds that have no wire form (the scheduler
    /// substitutes an idle packet for those).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        debug_assert!(buf.len() >= MAX_PACKET_LEN);

        let mut len = match self.kind {
            PacketKind::Multifunction(MultifunctionKind::Idle) => {
                buf[0] = 0xFF;
                1
            }
            PacketKind::Multifunction(_) => match self.address_kind {
                AddressKind::Long => {
                    buf[0] = (self.address >> 8) as u8 | 0xC0;
                    buf[1] = self.address as u8;
                    2
                }
                AddressKind::Short => {
                    buf[0] = self.address as u8 & 0x7F;
                    1
                }
            },
            PacketKind::Accessory(AccessoryKind::Basic) => {
                // {preamble} 0 10AAAAAA 0 1AAACDDD 0 EEEEEEEE 1
                // The second byte carries the ones-complement of the upper
                // address bits.
                buf[0] = 0x80 | (self.address & 0x3F) as u8;
                buf[1] = 0x88 | (!(self.address >> 2)) as u8 & 0x70 | (self.data[0] & 0x07);
                2
            }
            _ => return 0,
        };

        let skip = match self.kind {
            // data[0] is already folded into the second address byte
            PacketKind::Accessory(AccessoryKind::Basic) => 1,
            _ => 0,
        };
        for i in skip..self.size as usize {
            buf[len] = self.data[i];
            len += 1;
        }

        let mut xor = 0;
        for &byte in &buf[..len] {
            xor ^= byte;
        }
        buf[len] = xor;
        len + 1
    }
}

impl Default for Packet {
    fn default() -> Self {
        Packet::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_on_wire() {
        let p = Packet::default();
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 3);
        assert_eq!(buf[..3], [0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn reset_on_wire() {
        let mut p = Packet::new(0x00, AddressKind::Short);
        p.set_kind(PacketKind::RESET);
        p.set_data(&[0x00]);
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 3);
        assert_eq!(buf[..3], [0x00, 0x00, 0x00]);
    }

    #[test]
    fn short_address_speed() {
        let mut p = Packet::new(3, AddressKind::Short);
        p.set_kind(PacketKind::SPEED);
        p.set_data(&[0x3F, 0x91]);
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 4);
        assert_eq!(buf[..4], [0x03, 0x3F, 0x91, 0xAD]);
    }

    #[test]
    fn long_address_prefix() {
        let mut p = Packet::new(0x1234, AddressKind::Long);
        p.set_kind(PacketKind::SPEED);
        p.set_data(&[0x3F, 0x91]);
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 5);
        assert_eq!(buf[0], 0xD2);
        assert_eq!(buf[1], 0x34);
        assert_eq!(buf[4], 0xD2 ^ 0x34 ^ 0x3F ^ 0x91);
    }

    #[test]
    fn basic_accessory_address_complement() {
        let mut p = Packet::new(5, AddressKind::Short);
        p.set_kind(PacketKind::BASIC_ACCESSORY);
        p.set_data(&[0x01]);
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 3);
        assert_eq!(buf[0], 0x85);
        assert_eq!(buf[1], 0xF9);
        assert_eq!(buf[2], 0x85 ^ 0xF9);
    }

    #[test]
    fn unknown_kind_has_no_wire_form() {
        let mut p = Packet::new(9, AddressKind::Short);
        p.set_kind(PacketKind::Other);
        let mut buf = [0u8; MAX_PACKET_LEN];
        assert_eq!(p.serialize(&mut buf), 0);
    }

    #[test]
    fn repeat_is_six_bits() {
        let mut p = Packet::default();
        p.set_repeat(200);
        assert_eq!(p.repeat(), 200 & 0x3F);
    }

    #[test]
    fn data_capped_at_three_bytes() {
        let mut p = Packet::default();
        p.set_data(&[1, 2, 3, 4, 5]);
        assert_eq!(p.size(), 3);
    }
}
