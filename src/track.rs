//! Handoff between the scheduler's foreground loop and the waveform ISR.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::wavegen::{Wavegen, WaveformHardware};

/// Where the scheduler puts finished packets.
///
/// Hides the backend behind the two operations the scheduler needs: ask
/// whether the previous packet has drained, and hand over the next one by
/// value. Implemented for [`&SharedWavegen`](SharedWavegen) (timer ISR
/// backend) and [`BlockingTrack`](crate::blocking::BlockingTrack)
/// (software-timed backend).
pub trait TrackOutput {
    /// True when the backend can accept the next packet.
    fn need_packet(&mut self) -> bool;

    /// Hand over a serialized packet. Must only be called after
    /// [`need_packet`](TrackOutput::need_packet) reported true.
    fn supply_packet(&mut self, bytes: &[u8]);
}

/// A [`Wavegen`] shareable between the foreground and the timer ISR.
///
/// Both sides go through a critical section, so the foreground's packet copy
/// can never interleave with an ISR step; this is the whole of the locking
/// discipline the driver needs. Intended to live in a `static`:
///
/// ```ignore
/// static WAVEGEN: SharedWavegen = SharedWavegen::new(Wavegen::new(BitTiming::new(16_000_000)));
///
/// // timer compare ISR
/// fn on_timer_compare() {
///     WAVEGEN.on_compare_match(&mut timer_handle());
/// }
///
/// let mut station = CommandStation::new(&WAVEGEN);
/// ```
pub struct SharedWavegen {
    inner: Mutex<RefCell<Wavegen>>,
}

impl SharedWavegen {
    pub const fn new(wavegen: Wavegen) -> Self {
        SharedWavegen {
            inner: Mutex::new(RefCell::new(wavegen)),
        }
    }

    /// Step the generator on a timer compare event. Call from the ISR.
    pub fn on_compare_match<H: WaveformHardware>(&self, hw: &mut H) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).on_compare_match(hw));
    }
}

impl TrackOutput for &SharedWavegen {
    fn need_packet(&mut self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).need_packet())
    }

    fn supply_packet(&mut self, bytes: &[u8]) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).supply_packet(bytes));
    }
}
