//! Full acquisition pass: identity and status registers, ADC enable/read/disable, decode.

use crate::data_types::{ACQUISITION_CHANNELS, AdcChannel, RawReadings, SnapshotWarnings, TelemetrySnapshot};
use crate::driver::Sw3538;
use crate::error::Error;
use crate::registers::{BUS_IDLE_VALUE, addr};

fn log_snapshot(snapshot: &TelemetrySnapshot) {
    if snapshot.warnings.contains(SnapshotWarnings::MAX_POWER_SUSPECT) {
        warn!("suspicious max power: {}W", snapshot.max_power_w);
    }
    if snapshot.warnings.contains(SnapshotWarnings::NTC_OUT_OF_RANGE) {
        warn!("NTC temperature out of range, discarded");
    }
    debug!(
        "vin={}mV vout={}mV i1={}mA i2={}mA fc={} {}",
        snapshot.input_voltage_mv,
        snapshot.output_voltage_mv,
        snapshot.current_path1_ma,
        snapshot.current_path2_ma,
        snapshot.fast_charge_active,
        snapshot.fast_charge_protocol.as_str()
    );
}

impl<I2C, D> Sw3538<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
{
    /// Run one acquisition pass and decode it. Any bus failure aborts the pass;
    /// no partially filled snapshot is ever returned.
    pub fn acquire(&mut self) -> Result<TelemetrySnapshot, Error<I2C::Error>> {
        let raw = self.read_raw()?;
        let snapshot = TelemetrySnapshot::decode(&raw, &self.config);
        log_snapshot(&snapshot);
        Ok(snapshot)
    }

    /// Capture the raw register bytes and ADC codes of one pass.
    pub fn read_raw(&mut self) -> Result<RawReadings, Error<I2C::Error>> {
        let version = self.read_reg(addr::VERSION)?;
        let max_power = self.read_reg(addr::MAX_POWER)?;
        if version == BUS_IDLE_VALUE && max_power == BUS_IDLE_VALUE {
            error!("version and max power both 0xFF, bus looks disconnected");
            return Err(Error::NotResponding);
        }

        let fast_charge = self.read_reg(addr::FAST_CHARGE_IND)?;
        let sys_status0 = self.read_reg(addr::SYS_STATUS0)?;
        let sys_status1 = self.read_reg(addr::SYS_STATUS1)?;

        for channel in ACQUISITION_CHANNELS {
            self.enable_channel(channel)?;
        }

        let path1_current = self.read_channel(AdcChannel::Path1Current)?;
        let path2_current = self.read_channel(AdcChannel::Path2Current)?;
        let input_voltage = self.read_channel(AdcChannel::InputVoltage)?;
        let output_voltage = self.read_channel(AdcChannel::OutputVoltageScaled)?;
        let ntc_voltage = self.read_channel(AdcChannel::NtcVoltage)?;
        let ntc_current = self.read_reg(addr::NTC_CURRENT)?;

        for channel in ACQUISITION_CHANNELS {
            self.disable_channel(channel)?;
        }

        Ok(RawReadings {
            version,
            max_power,
            fast_charge,
            sys_status0,
            sys_status1,
            path1_current,
            path2_current,
            input_voltage,
            output_voltage,
            ntc_voltage,
            ntc_current,
        })
    }
}

#[cfg(feature = "async")]
impl<I2C, D> Sw3538<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`acquire`](Self::acquire).
    pub async fn acquire_async(&mut self) -> Result<TelemetrySnapshot, Error<I2C::Error>> {
        let raw = self.read_raw_async().await?;
        let snapshot = TelemetrySnapshot::decode(&raw, &self.config);
        log_snapshot(&snapshot);
        Ok(snapshot)
    }

    pub async fn read_raw_async(&mut self) -> Result<RawReadings, Error<I2C::Error>> {
        let version = self.read_reg_async(addr::VERSION).await?;
        let max_power = self.read_reg_async(addr::MAX_POWER).await?;
        if version == BUS_IDLE_VALUE && max_power == BUS_IDLE_VALUE {
            error!("version and max power both 0xFF, bus looks disconnected");
            return Err(Error::NotResponding);
        }

        let fast_charge = self.read_reg_async(addr::FAST_CHARGE_IND).await?;
        let sys_status0 = self.read_reg_async(addr::SYS_STATUS0).await?;
        let sys_status1 = self.read_reg_async(addr::SYS_STATUS1).await?;

        for channel in ACQUISITION_CHANNELS {
            self.enable_channel_async(channel).await?;
        }

        let path1_current = self.read_channel_async(AdcChannel::Path1Current).await?;
        let path2_current = self.read_channel_async(AdcChannel::Path2Current).await?;
        let input_voltage = self.read_channel_async(AdcChannel::InputVoltage).await?;
        let output_voltage = self.read_channel_async(AdcChannel::OutputVoltageScaled).await?;
        let ntc_voltage = self.read_channel_async(AdcChannel::NtcVoltage).await?;
        let ntc_current = self.read_reg_async(addr::NTC_CURRENT).await?;

        for channel in ACQUISITION_CHANNELS {
            self.disable_channel_async(channel).await?;
        }

        Ok(RawReadings {
            version,
            max_power,
            fast_charge,
            sys_status0,
            sys_status1,
            path1_current,
            path2_current,
            input_voltage,
            output_voltage,
            ntc_voltage,
            ntc_current,
        })
    }
}
