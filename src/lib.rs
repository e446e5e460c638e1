#![no_std]

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! A pure Rust NMRA DCC command station driver.
//!
//! This crate generates the Digital Command Control baseband signal for a
//! model-railway layout: two complementary GPIO levels feed an H-bridge that
//! puts the bipolar waveform on the rails, and locomotive or accessory
//! decoders pick out the packets addressed to them.
//!
//! The driver is split along the two execution contexts of a typical
//! microcontroller deployment:
//!
//! * [`Wavegen`] is the bit-timing engine. It runs inside a hardware timer's
//!   compare-match ISR (the timer toggles the output pins in hardware) and
//!   shapes each packet into its preamble, byte-start, data and end bits with
//!   58 µs / 100 µs half-periods. With nothing queued it emits a safe stream
//!   of '1' bits.
//! * [`CommandStation`] is the packet scheduler. It builds packets for
//!   semantic requests (speed, function outputs, turnouts, ops-mode CV
//!   writes, emergency stop) and multiplexes four prioritized queues into
//!   the engine, one packet at a time, without starving any class and
//!   without addressing the same decoder twice in a row while other traffic
//!   waits.
//!
//! The two meet at the [`TrackOutput`] seam. On real hardware that is a
//! [`SharedWavegen`] in a `static`, with the platform's timer glue
//! implementing [`WaveformHardware`]; for bring-up there is also a blocking
//! [`BlockingTrack`] backend that bit-bangs packets over any
//! `embedded-hal` output pins.
//!
//! # Usage
//!
//! Timer-driven operation:
//!
//! ```ignore
//! use dcc_station::{BitTiming, CommandStation, AddressKind, SharedWavegen, Wavegen};
//!
//! static WAVEGEN: SharedWavegen =
//!     SharedWavegen::new(Wavegen::new(BitTiming::new(16_000_000)));
//!
//! // platform timer ISR, fired on every compare match
//! fn timer_compare_isr() {
//!     WAVEGEN.on_compare_match(&mut timer());
//! }
//!
//! let mut station = CommandStation::new(&WAVEGEN);
//! station.setup();
//! station.set_speed_128(3, AddressKind::Short, 64);
//! loop {
//!     station.update();
//! }
//! ```
//!
//! Software-timed bring-up on any `embedded-hal` platform:
//!
//! ```ignore
//! use dcc_station::{BlockingTrack, CommandStation, AddressKind};
//!
//! let track = BlockingTrack::new(pin_a, pin_b, delay);
//! let mut station = CommandStation::new(track);
//! station.setup();
//! station.set_basic_accessory(12, 0);
//! loop {
//!     station.update();
//! }
//! ```

#[cfg(test)]
extern crate std;

pub mod blocking;
pub mod error;
pub mod packet;
pub mod queue;
pub mod scheduler;
pub mod track;
pub mod wavegen;

pub use crate::blocking::BlockingTrack;
pub use crate::error::Error;
pub use crate::packet::{
    AccessoryKind, AddressKind, MultifunctionKind, Packet, PacketKind, MAX_PACKET_LEN,
};
pub use crate::queue::{EmergencyQueue, PacketQueue, RepeatQueue};
pub use crate::scheduler::{CommandStation, SpeedSteps};
pub use crate::track::{SharedWavegen, TrackOutput};
pub use crate::wavegen::{BitTiming, Wavegen, WaveformHardware};
