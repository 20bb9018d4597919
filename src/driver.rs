//! SW3538 register transport, write gates and ADC channel access.
//! Blocking helpers live here; the async mirror is behind the `async` feature.

use crate::data_types::{AdcChannel, NtcBias, TelemetryConfig};
use crate::error::Error;
use crate::registers::{
    ADC_LATCH_DELAY_MS, ALT_I2C_ADDRESS, BUS_IDLE_VALUE, DEFAULT_I2C_ADDRESS, GATE_ARM_SEQUENCE,
    NtcCurrentBits, VERSION_MASK, adc_code_from_bytes, addr,
};
use crate::retry::RetryPolicy;

/// SW3538 driver. Owns the bus handle and the delay provider used for retry
/// backoff and ADC settling.
pub struct Sw3538<I2C, D> {
    pub(crate) i2c: I2C,
    pub(crate) delay: D,
    pub(crate) address: u8,
    pub(crate) config: TelemetryConfig,
    pub(crate) read_policy: RetryPolicy,
    pub(crate) write_policy: RetryPolicy,
}

impl<I2C, D> Sw3538<I2C, D> {
    /// Create a new driver instance with the default I2C address (0x3C).
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_I2C_ADDRESS)
    }

    /// Create a new driver instance with a custom I2C address.
    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            config: TelemetryConfig::default(),
            read_policy: RetryPolicy::READ,
            write_policy: RetryPolicy::WRITE,
        }
    }

    /// Create a driver for a chip strapped with A0 = VCC (0x3D).
    pub fn with_alt_address(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, ALT_I2C_ADDRESS)
    }

    /// Replace the plausibility limits used when decoding a pass.
    pub fn with_config(mut self, config: TelemetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the read/write retry policies.
    pub fn with_retry_policies(mut self, read: RetryPolicy, write: RetryPolicy) -> Self {
        self.read_policy = read;
        self.write_policy = write;
        self
    }

    /// Return the 7-bit I2C address configured for this instance.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Release the bus and delay provider.
    pub fn free(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> Sw3538<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
{
    /// Read a single register (repeated-start write of the address, then one byte).
    pub fn read_reg(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let Self {
            i2c,
            delay,
            address,
            read_policy,
            ..
        } = self;
        let mut buf = [0u8; 1];
        read_policy
            .run(delay, |attempt| {
                i2c.write_read(*address, &[reg], &mut buf).inspect_err(|_| {
                    warn!("read {=u8:#x} attempt {} failed", reg, attempt + 1);
                })
            })
            .map_err(|e| {
                error!("read {=u8:#x}: all attempts failed", reg);
                Error::I2c(e)
            })?;
        if buf[0] == BUS_IDLE_VALUE {
            warn!("register {=u8:#x} returned 0xFF", reg);
        }
        trace!("read {=u8:#x} -> {=u8:#x}", reg, buf[0]);
        Ok(buf[0])
    }

    /// Write a single register (address and value in one transaction).
    pub fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let Self {
            i2c,
            delay,
            address,
            write_policy,
            ..
        } = self;
        trace!("write {=u8:#x} <- {=u8:#x}", reg, value);
        write_policy
            .run(delay, |attempt| {
                i2c.write(*address, &[reg, value]).inspect_err(|_| {
                    warn!("write {=u8:#x} attempt {} failed", reg, attempt + 1);
                })
            })
            .map_err(|e| {
                error!("write {=u8:#x}: all attempts failed", reg);
                Error::I2c(e)
            })
    }

    /// Update masked bits in a register (read-modify-write).
    pub fn update_reg(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(reg)?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg(reg, new)
    }

    fn arm_gate(&mut self, gate: u8) -> Result<(), Error<I2C::Error>> {
        for value in GATE_ARM_SEQUENCE {
            self.write_reg(gate, value).inspect_err(|_| {
                error!("gate {=u8:#x}: write {=u8:#x} failed", gate, value);
            })?;
        }
        debug!("gate {=u8:#x} armed", gate);
        Ok(())
    }

    /// Arm the general I2C write gate (0x10). Must precede every protected write.
    pub fn arm_write_gate(&mut self) -> Result<(), Error<I2C::Error>> {
        self.arm_gate(addr::I2C_WRITE_GATE)
    }

    /// Arm the force-operation gate (0x15). Must precede every ADC enable/disable.
    pub fn arm_force_operation_gate(&mut self) -> Result<(), Error<I2C::Error>> {
        self.arm_gate(addr::FORCE_OP_GATE)
    }

    /// Enable sampling on `channel` by setting its bit in 0x18.
    pub fn enable_channel(&mut self, channel: AdcChannel) -> Result<(), Error<I2C::Error>> {
        self.arm_force_operation_gate()?;
        let mask = self.read_reg(addr::ADC_ENABLE)?;
        self.write_reg(addr::ADC_ENABLE, mask | (1 << channel.enable_bit()))?;
        debug!("ADC {} enabled", channel);
        Ok(())
    }

    /// Disable sampling on `channel` by clearing its bit in 0x19.
    pub fn disable_channel(&mut self, channel: AdcChannel) -> Result<(), Error<I2C::Error>> {
        self.arm_force_operation_gate()?;
        let mask = self.read_reg(addr::ADC_DISABLE)?;
        self.write_reg(addr::ADC_DISABLE, mask & !(1 << channel.enable_bit()))?;
        debug!("ADC {} disabled", channel);
        Ok(())
    }

    /// Latch `channel` into the data registers and return its raw code.
    pub fn read_channel(&mut self, channel: AdcChannel) -> Result<u16, Error<I2C::Error>> {
        let id = channel.id();
        self.write_reg(addr::ADC_SELECT, id)?;
        self.delay.delay_ms(ADC_LATCH_DELAY_MS);
        let low = self.read_reg(addr::ADC_DATA_LOW)?;
        let high = self.read_reg(addr::ADC_DATA_HIGH)?;
        let code = adc_code_from_bytes(id, low, high);
        debug!("ADC {} = {}", channel, code);
        Ok(code)
    }

    /// Basic communication check: the version register must not read 0x00 or 0xFF.
    pub fn probe(&mut self) -> Result<u8, Error<I2C::Error>> {
        let version = self.read_reg(addr::VERSION)?;
        if version == 0x00 || version == BUS_IDLE_VALUE {
            error!("probe failed: version register {=u8:#x}", version);
            return Err(Error::NotResponding);
        }
        info!("SW3538 found at {=u8:#x}, version {}", self.address, version & VERSION_MASK);
        Ok(version & VERSION_MASK)
    }

    /// Select the NTC bias current source.
    pub fn set_ntc_bias(&mut self, bias: NtcBias) -> Result<(), Error<I2C::Error>> {
        self.arm_write_gate()?;
        let value = match bias {
            NtcBias::Ua20 => 0,
            NtcBias::Ua40 => NtcCurrentBits::BIAS_40UA.bits(),
        };
        self.update_reg(addr::NTC_CURRENT, NtcCurrentBits::BIAS_40UA.bits(), value)?;
        info!("NTC bias set to {}", bias);
        Ok(())
    }

    /// Read back the NTC bias current source.
    pub fn ntc_bias(&mut self) -> Result<NtcBias, Error<I2C::Error>> {
        Ok(NtcBias::from_register(self.read_reg(addr::NTC_CURRENT)?))
    }
}

#[cfg(feature = "async")]
impl<I2C, D> Sw3538<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`read_reg`](Self::read_reg).
    pub async fn read_reg_async(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let Self {
            i2c,
            delay,
            address,
            read_policy,
            ..
        } = self;
        let address = *address;
        let mut buf = [0u8; 1];
        read_policy
            .run_async(delay, async |attempt: u8| {
                i2c.write_read(address, &[reg], &mut buf).await.inspect_err(|_| {
                    warn!("read {=u8:#x} attempt {} failed", reg, attempt + 1);
                })
            })
            .await
            .map_err(|e| {
                error!("read {=u8:#x}: all attempts failed", reg);
                Error::I2c(e)
            })?;
        if buf[0] == BUS_IDLE_VALUE {
            warn!("register {=u8:#x} returned 0xFF", reg);
        }
        trace!("read {=u8:#x} -> {=u8:#x}", reg, buf[0]);
        Ok(buf[0])
    }

    /// Async version of [`write_reg`](Self::write_reg).
    pub async fn write_reg_async(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let Self {
            i2c,
            delay,
            address,
            write_policy,
            ..
        } = self;
        let address = *address;
        trace!("write {=u8:#x} <- {=u8:#x}", reg, value);
        write_policy
            .run_async(delay, async |attempt: u8| {
                i2c.write(address, &[reg, value]).await.inspect_err(|_| {
                    warn!("write {=u8:#x} attempt {} failed", reg, attempt + 1);
                })
            })
            .await
            .map_err(|e| {
                error!("write {=u8:#x}: all attempts failed", reg);
                Error::I2c(e)
            })
    }

    pub async fn update_reg_async(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg_async(reg).await?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg_async(reg, new).await
    }

    async fn arm_gate_async(&mut self, gate: u8) -> Result<(), Error<I2C::Error>> {
        for value in GATE_ARM_SEQUENCE {
            self.write_reg_async(gate, value).await.inspect_err(|_| {
                error!("gate {=u8:#x}: write {=u8:#x} failed", gate, value);
            })?;
        }
        debug!("gate {=u8:#x} armed", gate);
        Ok(())
    }

    pub async fn arm_write_gate_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.arm_gate_async(addr::I2C_WRITE_GATE).await
    }

    pub async fn arm_force_operation_gate_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.arm_gate_async(addr::FORCE_OP_GATE).await
    }

    pub async fn enable_channel_async(&mut self, channel: AdcChannel) -> Result<(), Error<I2C::Error>> {
        self.arm_force_operation_gate_async().await?;
        let mask = self.read_reg_async(addr::ADC_ENABLE).await?;
        self.write_reg_async(addr::ADC_ENABLE, mask | (1 << channel.enable_bit()))
            .await?;
        debug!("ADC {} enabled", channel);
        Ok(())
    }

    pub async fn disable_channel_async(&mut self, channel: AdcChannel) -> Result<(), Error<I2C::Error>> {
        self.arm_force_operation_gate_async().await?;
        let mask = self.read_reg_async(addr::ADC_DISABLE).await?;
        self.write_reg_async(addr::ADC_DISABLE, mask & !(1 << channel.enable_bit()))
            .await?;
        debug!("ADC {} disabled", channel);
        Ok(())
    }

    pub async fn read_channel_async(&mut self, channel: AdcChannel) -> Result<u16, Error<I2C::Error>> {
        let id = channel.id();
        self.write_reg_async(addr::ADC_SELECT, id).await?;
        self.delay.delay_ms(ADC_LATCH_DELAY_MS).await;
        let low = self.read_reg_async(addr::ADC_DATA_LOW).await?;
        let high = self.read_reg_async(addr::ADC_DATA_HIGH).await?;
        let code = adc_code_from_bytes(id, low, high);
        debug!("ADC {} = {}", channel, code);
        Ok(code)
    }

    pub async fn probe_async(&mut self) -> Result<u8, Error<I2C::Error>> {
        let version = self.read_reg_async(addr::VERSION).await?;
        if version == 0x00 || version == BUS_IDLE_VALUE {
            error!("probe failed: version register {=u8:#x}", version);
            return Err(Error::NotResponding);
        }
        info!("SW3538 found at {=u8:#x}, version {}", self.address, version & VERSION_MASK);
        Ok(version & VERSION_MASK)
    }

    pub async fn set_ntc_bias_async(&mut self, bias: NtcBias) -> Result<(), Error<I2C::Error>> {
        self.arm_write_gate_async().await?;
        let value = match bias {
            NtcBias::Ua20 => 0,
            NtcBias::Ua40 => NtcCurrentBits::BIAS_40UA.bits(),
        };
        self.update_reg_async(addr::NTC_CURRENT, NtcCurrentBits::BIAS_40UA.bits(), value)
            .await?;
        info!("NTC bias set to {}", bias);
        Ok(())
    }

    pub async fn ntc_bias_async(&mut self) -> Result<NtcBias, Error<I2C::Error>> {
        Ok(NtcBias::from_register(self.read_reg_async(addr::NTC_CURRENT).await?))
    }
}
