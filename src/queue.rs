//! Fixed-capacity packet queues.
//!
//! Three queue policies share one ring-buffer value: plain FIFO
//! ([`PacketQueue`]), re-circulation of packets that still have repeats left
//! ([`RepeatQueue`]), and an in-place burst of the head packet
//! ([`EmergencyQueue`]). Capacity is a type parameter, so each queue owns its
//! storage inline and nothing allocates.

use crate::packet::{AddressKind, Packet};

/// Bounded FIFO of packets, implemented as a circular buffer.
///
/// Insertion coalesces: a packet with the same address and kind as one
/// already queued overwrites that entry in place instead of taking a new
/// slot, so a burst of commands for one decoder collapses to the latest.
pub struct PacketQueue<const N: usize> {
    slots: [Packet; N],
    read_pos: usize,
    write_pos: usize,
    written: usize,
}

impl<const N: usize> PacketQueue<N> {
    pub const fn new() -> Self {
        PacketQueue {
            slots: [Packet::IDLE; N],
            read_pos: 0,
            write_pos: 0,
            written: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    pub fn is_full(&self) -> bool {
        self.written == N
    }

    /// Address of the next packet to be read, if any.
    pub fn head_address(&self) -> Option<u16> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.read_pos].address())
        }
    }

    /// Queue `packet`, coalescing with a queued packet for the same decoder
    /// address and kind. Returns false when the queue is full and no
    /// coalescing target exists.
    pub fn insert(&mut self, packet: &Packet) -> bool {
        let mut idx = self.read_pos;
        for _ in 0..self.written {
            let slot = &mut self.slots[idx];
            if slot.address() == packet.address() && slot.kind() == packet.kind() {
                *slot = *packet;
                return true;
            }
            idx = (idx + 1) % N;
        }

        if self.is_full() {
            return false;
        }
        self.slots[self.write_pos] = *packet;
        self.write_pos = (self.write_pos + 1) % N;
        self.written += 1;
        true
    }

    /// Pop the oldest packet.
    pub fn read(&mut self) -> Option<Packet> {
        if self.is_empty() {
            return None;
        }
        let packet = self.slots[self.read_pos];
        self.read_pos = (self.read_pos + 1) % N;
        self.written -= 1;
        Some(packet)
    }

    /// Drop every queued packet for the given decoder, compacting the ring.
    /// Returns whether anything matched.
    pub fn forget(&mut self, address: u16, address_kind: AddressKind) -> bool {
        let mut found = false;
        let mut kept = 0;
        let mut idx = self.read_pos;
        for _ in 0..self.written {
            let slot = self.slots[idx];
            if slot.address() == address && slot.address_kind() == address_kind {
                found = true;
            } else {
                self.slots[(self.read_pos + kept) % N] = slot;
                kept += 1;
            }
            idx = (idx + 1) % N;
        }
        self.written = kept;
        self.write_pos = (self.read_pos + kept) % N;
        found
    }

    /// Empty the queue and reset every slot to the idle packet.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.written = 0;
        for slot in self.slots.iter_mut() {
            *slot = Packet::IDLE;
        }
    }
}

/// A queue whose packets circulate until their repeat count is spent.
///
/// `read` hands back the head packet and, while its repeat count is nonzero,
/// re-enqueues it at the tail with the count decremented. A packet inserted
/// with repeat `R` is therefore read exactly `R` times.
pub struct RepeatQueue<const N: usize> {
    inner: PacketQueue<N>,
}

impl<const N: usize> RepeatQueue<N> {
    pub const fn new() -> Self {
        RepeatQueue {
            inner: PacketQueue::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn head_address(&self) -> Option<u16> {
        self.inner.head_address()
    }

    /// Packets with no repeats left are not worth queueing.
    pub fn insert(&mut self, packet: &Packet) -> bool {
        if packet.repeat() == 0 {
            return false;
        }
        self.inner.insert(packet)
    }

    pub fn read(&mut self) -> Option<Packet> {
        let mut packet = self.inner.read()?;
        if packet.repeat() > 0 {
            packet.set_repeat(packet.repeat() - 1);
            self.insert(&packet);
        }
        Some(packet)
    }

    pub fn forget(&mut self, address: u16, address_kind: AddressKind) -> bool {
        self.inner.forget(address, address_kind)
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }
}

/// A queue that emits its head packet as a burst.
///
/// Each `read` decrements the head's repeat count in place; while the count
/// is nonzero the head is returned without advancing, so an entry with repeat
/// `R` is emitted `R` times back-to-back before the queue moves on.
pub struct EmergencyQueue<const N: usize> {
    inner: PacketQueue<N>,
}

impl<const N: usize> EmergencyQueue<N> {
    pub const fn new() -> Self {
        EmergencyQueue {
            inner: PacketQueue::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn insert(&mut self, packet: &Packet) -> bool {
        self.inner.insert(packet)
    }

    pub fn read(&mut self) -> Option<Packet> {
        if self.inner.is_empty() {
            return None;
        }
        let head = &mut self.inner.slots[self.inner.read_pos];
        let repeat = head.repeat().saturating_sub(1);
        head.set_repeat(repeat);
        if repeat > 0 {
            Some(*head)
        } else {
            self.inner.read()
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }
}
