use core::fmt::Debug;

/// Errors surfaced by the software-timed track backend.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<PINE: Debug> {
    /// One of the H-bridge pins failed to switch.
    Pin(PINE),
}

impl<PINE: Debug> From<PINE> for Error<PINE> {
    fn from(e: PINE) -> Self {
        Error::Pin(e)
    }
}
