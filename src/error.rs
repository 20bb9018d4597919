//! Error definitions for the SW3538 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<I2cError> {
    /// Every retry of an I2C transaction failed; carries the last bus error.
    I2c(I2cError),
    /// Chip did not answer plausibly (identity registers read back as 0xFF/0x00).
    NotResponding,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::NotResponding => write!(f, "chip not responding"),
        }
    }
}
