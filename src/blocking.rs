//! Software-timed track backend.
//!
//! Bit-bangs the DCC waveform over any two [`OutputPin`]s and a [`DelayUs`],
//! re-using the same [`Wavegen`] state machine the timer ISR path runs, so
//! the half-period sequence on the pins is identical. Each packet blocks for
//! its full air time (roughly 5-8 ms), which is fine for bring-up and
//! accessory-only setups but leaves the rails idle between `update` calls;
//! production setups want the timer-driven
//! [`SharedWavegen`](crate::track::SharedWavegen) instead.

use embedded_hal::delay::DelayUs;
use embedded_hal::digital::OutputPin;

use crate::error::Error;
use crate::track::TrackOutput;
use crate::wavegen::{BitTiming, Wavegen, WaveformHardware};

/// Mirror of the pin level and pending half-period, standing in for the
/// timer hardware.
struct LevelShim {
    high: bool,
    half_period_us: u16,
}

impl WaveformHardware for LevelShim {
    fn load_half_period(&mut self, ticks: u16) {
        self.half_period_us = ticks;
    }

    fn output_is_high(&self) -> bool {
        self.high
    }
}

/// Drives an H-bridge from two complementary GPIOs with busy-wait timing.
pub struct BlockingTrack<A, B, D> {
    signal: A,
    inverted: B,
    delay: D,
    wavegen: Wavegen,
    shim: LevelShim,
}

impl<A, B, D, E> BlockingTrack<A, B, D>
where
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    D: DelayUs,
    E: core::fmt::Debug,
{
    /// `signal` and `inverted` feed the two H-bridge gate inputs; they are
    /// always driven to opposite levels.
    pub fn new(signal: A, inverted: B, delay: D) -> Self {
        BlockingTrack {
            signal,
            inverted,
            delay,
            wavegen: Wavegen::new(BitTiming::in_micros()),
            shim: LevelShim {
                high: false,
                half_period_us: 0,
            },
        }
    }

    /// Put one serialized packet on the rails, blocking until the end bit's
    /// final half-cycle has elapsed.
    pub fn transmit(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.wavegen.supply_packet(bytes);
        self.drive_level(false)?;
        loop {
            self.drive_level(!self.shim.high)?;
            self.wavegen.on_compare_match(&mut self.shim);
            self.delay.delay_us(u32::from(self.shim.half_period_us));
            if self.wavegen.is_idle() && !self.shim.high {
                return Ok(());
            }
        }
    }

    /// Release the pins and delay provider.
    pub fn free(self) -> (A, B, D) {
        (self.signal, self.inverted, self.delay)
    }

    fn drive_level(&mut self, high: bool) -> Result<(), Error<E>> {
        if high {
            self.signal.set_high()?;
            self.inverted.set_low()?;
        } else {
            self.signal.set_low()?;
            self.inverted.set_high()?;
        }
        self.shim.high = high;
        Ok(())
    }
}

impl<A, B, D, E> TrackOutput for BlockingTrack<A, B, D>
where
    A: OutputPin<Error = E>,
    B: OutputPin<Error = E>,
    D: DelayUs,
    E: core::fmt::Debug,
{
    fn need_packet(&mut self) -> bool {
        true
    }

    /// Transmits synchronously. Pin failures cannot be reported through this
    /// interface; use [`transmit`](BlockingTrack::transmit) directly when the
    /// pins are fallible.
    fn supply_packet(&mut self, bytes: &[u8]) {
        let _ = self.transmit(bytes);
    }
}
