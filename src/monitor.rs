//! Owning-loop helper tying the driver to the adaptive scheduler.
//!
//! Collaborators (display, console) only see [`Monitor::latest`]; the bus is
//! touched exclusively from [`Monitor::poll`].

use crate::data_types::TelemetrySnapshot;
use crate::driver::Sw3538;
use crate::error::Error;
use crate::scheduler::{AdaptivePollScheduler, PollConfig};

pub struct Monitor<I2C, D> {
    driver: Sw3538<I2C, D>,
    scheduler: AdaptivePollScheduler,
    latest: Option<TelemetrySnapshot>,
    failures: u32,
}

impl<I2C, D> Monitor<I2C, D> {
    pub fn new(driver: Sw3538<I2C, D>, config: PollConfig, now_ms: u32) -> Self {
        Self {
            driver,
            scheduler: AdaptivePollScheduler::new(config, now_ms),
            latest: None,
            failures: 0,
        }
    }

    /// Most recent successfully decoded snapshot.
    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.latest.as_ref()
    }

    pub fn scheduler(&self) -> &AdaptivePollScheduler {
        &self.scheduler
    }

    /// Force the next passes to run at the fastest rate (e.g. after user input).
    pub fn notify_change(&mut self) {
        self.scheduler.notify_change();
    }

    /// Number of failed passes since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    pub fn driver_mut(&mut self) -> &mut Sw3538<I2C, D> {
        &mut self.driver
    }

    pub fn free(self) -> Sw3538<I2C, D> {
        self.driver
    }

    fn record(&mut self, snapshot: TelemetrySnapshot) -> TelemetrySnapshot {
        self.scheduler.observe_current(snapshot.total_current_ma());
        self.scheduler.observe_state(
            snapshot.fast_charge_active,
            snapshot.path1_online,
            snapshot.path2_online,
        );
        self.latest = Some(snapshot);
        self.failures = 0;
        snapshot
    }

    fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        warn!("acquisition failed ({} in a row), keeping previous snapshot", self.failures);
    }
}

impl<I2C, D> Monitor<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
{
    /// Run one acquisition pass if the scheduler says it is due.
    ///
    /// Returns `None` when not due. On failure the previous snapshot stays in
    /// place and the error is handed back; the next due poll simply retries.
    pub fn poll(&mut self, now_ms: u32) -> Option<Result<TelemetrySnapshot, Error<I2C::Error>>> {
        if !self.scheduler.should_poll_now(now_ms) {
            return None;
        }
        Some(match self.driver.acquire() {
            Ok(snapshot) => Ok(self.record(snapshot)),
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        })
    }
}

#[cfg(feature = "async")]
impl<I2C, D> Monitor<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`poll`](Self::poll).
    pub async fn poll_async(&mut self, now_ms: u32) -> Option<Result<TelemetrySnapshot, Error<I2C::Error>>> {
        if !self.scheduler.should_poll_now(now_ms) {
            return None;
        }
        Some(match self.driver.acquire_async().await {
            Ok(snapshot) => Ok(self.record(snapshot)),
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        })
    }
}
