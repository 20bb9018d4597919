//! Adaptive polling interval: snaps to the fastest rate on any change and
//! backs off geometrically while readings stay stable.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    pub min_interval_ms: u32,
    pub max_interval_ms: u32,
    /// Current delta (mA) above which a pass counts as a change.
    pub epsilon_ma: u32,
    /// Interval multiplier applied after `stable_passes` quiet passes.
    pub backoff: u32,
    pub stable_passes: u8,
}

impl PollConfig {
    pub const fn new() -> Self {
        Self {
            min_interval_ms: 200,
            max_interval_ms: 5_000,
            epsilon_ma: 50,
            backoff: 2,
            stable_passes: 5,
        }
    }

    pub const fn with_epsilon_ma(mut self, epsilon_ma: u32) -> Self {
        self.epsilon_ma = epsilon_ma;
        self
    }

    pub const fn with_backoff(mut self, backoff: u32) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn with_max_interval_ms(mut self, max_interval_ms: u32) -> Self {
        self.max_interval_ms = max_interval_ms;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptivePollScheduler {
    config: PollConfig,
    interval_ms: u32,
    last_poll_ms: u32,
    last_current_ma: i32,
    stable_count: u8,
    last_fast_charge: bool,
    last_path1_online: bool,
    last_path2_online: bool,
}

impl AdaptivePollScheduler {
    /// Start at the minimum interval so the first readings arrive quickly.
    pub const fn new(config: PollConfig, now_ms: u32) -> Self {
        Self {
            config,
            interval_ms: config.min_interval_ms,
            last_poll_ms: now_ms,
            last_current_ma: 0,
            stable_count: 0,
            last_fast_charge: false,
            last_path1_online: false,
            last_path2_online: false,
        }
    }

    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub const fn stable_count(&self) -> u8 {
        self.stable_count
    }

    pub const fn last_current_ma(&self) -> i32 {
        self.last_current_ma
    }

    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// True once `interval_ms` has elapsed since the last poll; a true result
    /// restarts the interval at `now_ms`. Safe across tick-counter wrap-around.
    pub fn should_poll_now(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_poll_ms) < self.interval_ms {
            return false;
        }
        self.last_poll_ms = now_ms;
        trace!("poll due, interval {}ms", self.interval_ms);
        true
    }

    /// Drop to the fastest rate and restart the stability count.
    pub fn notify_change(&mut self) {
        if self.interval_ms != self.config.min_interval_ms {
            debug!("change detected, interval {}ms -> {}ms", self.interval_ms, self.config.min_interval_ms);
        }
        self.interval_ms = self.config.min_interval_ms;
        self.stable_count = 0;
    }

    /// Feed the aggregate output current of the latest pass.
    pub fn observe_current(&mut self, total_current_ma: i32) {
        let current = total_current_ma.max(0);
        if current.abs_diff(self.last_current_ma) > self.config.epsilon_ma {
            self.notify_change();
        } else {
            self.stable_count = self.stable_count.saturating_add(1);
            if self.stable_count >= self.config.stable_passes {
                // A ceiling below the floor pins the interval at the floor.
                let floor = self.config.min_interval_ms;
                let ceiling = self.config.max_interval_ms.max(floor);
                let widened = self
                    .interval_ms
                    .saturating_mul(self.config.backoff)
                    .max(floor)
                    .min(ceiling);
                if widened != self.interval_ms {
                    debug!("stable, interval {}ms -> {}ms", self.interval_ms, widened);
                }
                self.interval_ms = widened;
                self.stable_count = 0;
            }
        }
        self.last_current_ma = current;
    }

    /// Feed the discrete state of the latest pass; any flip counts as a change.
    pub fn observe_state(&mut self, fast_charge_active: bool, path1_online: bool, path2_online: bool) {
        if fast_charge_active != self.last_fast_charge
            || path1_online != self.last_path1_online
            || path2_online != self.last_path2_online
        {
            self.notify_change();
        }
        self.last_fast_charge = fast_charge_active;
        self.last_path1_online = path1_online;
        self.last_path2_online = path2_online;
    }
}
