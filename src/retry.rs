//! Bounded retry policy shared by the read and write paths.

/// Attempt budget and inter-attempt delay schedule for one bus transaction.
///
/// After failed attempt `n` (0-based) the driver waits `delay_ms(n)` before
/// trying again; the wait is also taken after the final failure so a caller
/// retrying at a higher level never hammers a stuck bus.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub initial_delay_ms: u32,
    /// Multiplier applied to the delay after each failure (1 = fixed delay).
    pub growth: u32,
}

impl RetryPolicy {
    /// Register reads: 5 attempts, 10/20/40/80/160 ms backoff.
    pub const READ: Self = Self::new(5, 10, 2);
    /// Register writes: 3 attempts, fixed 5 ms between them.
    pub const WRITE: Self = Self::new(3, 5, 1);

    pub const fn new(max_attempts: u8, initial_delay_ms: u32, growth: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            growth,
        }
    }

    /// Delay to apply after failed attempt `attempt` (0-based).
    pub fn delay_ms(&self, attempt: u8) -> u32 {
        self.initial_delay_ms
            .saturating_mul(self.growth.saturating_pow(attempt as u32))
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping on
    /// `delay` between failures. Returns the last error on exhaustion.
    pub fn run<T, E, D, F>(&self, delay: &mut D, mut op: F) -> Result<T, E>
    where
        D: embedded_hal::delay::DelayNs,
        F: FnMut(u8) -> Result<T, E>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    delay.delay_ms(self.delay_ms(attempt));
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Async version of [`run`](Self::run).
    #[cfg(feature = "async")]
    pub async fn run_async<T, E, D, F>(&self, delay: &mut D, mut op: F) -> Result<T, E>
    where
        D: embedded_hal_async::delay::DelayNs,
        F: core::ops::AsyncFnMut(u8) -> Result<T, E>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    delay.delay_ms(self.delay_ms(attempt)).await;
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_schedule_doubles() {
        let p = RetryPolicy::READ;
        let delays: [u32; 5] = core::array::from_fn(|i| p.delay_ms(i as u8));
        assert_eq!(delays, [10, 20, 40, 80, 160]);
    }

    #[test]
    fn write_schedule_is_fixed() {
        let p = RetryPolicy::WRITE;
        assert_eq!(p.delay_ms(0), 5);
        assert_eq!(p.delay_ms(2), 5);
    }

    #[test]
    fn delay_saturates() {
        let p = RetryPolicy::new(40, 1_000, 10);
        assert_eq!(p.delay_ms(30), u32::MAX);
    }
}
