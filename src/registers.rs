//! Register map, bitfields and conversion helpers for SW3538.
//! Addresses and scale factors follow the datasheet; the chip uses single-byte register addressing.

/// Default I2C address with A0 tied to GND.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x3C;
/// Alternate I2C address with A0 tied to VCC.
pub const ALT_I2C_ADDRESS: u8 = 0x3D;

/// Register addresses (8-bit).
pub mod addr {
    /// Chip version, bits 1-0.
    pub const VERSION: u8 = 0x00;
    /// System max power, bits 6-0, 1 W LSB.
    pub const MAX_POWER: u8 = 0x02;
    /// Fast charge indication (protocol, PD version, active flags).
    pub const FAST_CHARGE_IND: u8 = 0x09;
    /// System status 0: per-path BUCK state.
    pub const SYS_STATUS0: u8 = 0x0A;
    /// System status 1: per-path online state.
    pub const SYS_STATUS1: u8 = 0x0D;
    /// I2C write enable gate (0x20, 0x40, 0x80 arm sequence).
    pub const I2C_WRITE_GATE: u8 = 0x10;
    /// Force operation enable gate (same arm sequence).
    pub const FORCE_OP_GATE: u8 = 0x15;
    /// ADC channel enable mask (set bit to enable).
    pub const ADC_ENABLE: u8 = 0x18;
    /// ADC channel disable mask (clear bit to disable).
    pub const ADC_DISABLE: u8 = 0x19;
    /// ADC data select; writing a channel id latches it into DATA_LOW/DATA_HIGH.
    pub const ADC_SELECT: u8 = 0x40;
    pub const ADC_DATA_LOW: u8 = 0x41;
    pub const ADC_DATA_HIGH: u8 = 0x42;
    /// NTC bias current select, bit 7.
    pub const NTC_CURRENT: u8 = 0x44;
}

/// Values written in order to a gate register to arm it.
pub const GATE_ARM_SEQUENCE: [u8; 3] = [0x20, 0x40, 0x80];

/// Value returned by a disconnected bus (pulled-up SDA).
pub const BUS_IDLE_VALUE: u8 = 0xFF;

/// Settling time between selecting an ADC channel and reading its data registers.
pub const ADC_LATCH_DELAY_MS: u32 = 5;

pub const VERSION_MASK: u8 = 0x03;
pub const MAX_POWER_MASK: u8 = 0x7F;

/// Channel whose data is 14 bits wide (unit-converted output voltage).
pub const ADC_CHANNEL_14BIT: u8 = 11;

/// Path current: 2.5 mA per LSB (5 mΩ sense).
pub const CURRENT_LSB_UA: u32 = 2_500;
/// Input voltage: 10 mV per LSB.
pub const VIN_LSB_MV: u32 = 10;
/// Unit-converted output voltage: 1 mV per LSB.
pub const VOUT_LSB_MV: u32 = 1;
/// NTC pin voltage: 1.2 mV per LSB.
pub const NTC_LSB_MV: f32 = 1.2;

/// Beta-equation thermistor constants (10 kΩ @ 25 °C, B = 3950).
pub const NTC_T0_K: f32 = 298.15;
pub const NTC_R0_KOHM: f32 = 10.0;
pub const NTC_BETA: f32 = 3950.0;
pub const KELVIN_OFFSET: f32 = 273.15;

bitflags::bitflags! {
    /// FAST_CHARGE_IND register bits (0x09).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FastChargeBits: u8 {
        /// Bit 7: a voltage-raising protocol is active.
        const VOLTAGE_PROTOCOL = 1 << 7;
        /// Bit 6: a fast charge protocol has been indicated.
        const PROTOCOL_IND     = 1 << 6;
        /// Bits 5-4: PD version.
        const PD_VER0          = 1 << 4;
        const PD_VER1          = 1 << 5;
        /// Bits 3-0: protocol code.
        const PROTO0           = 1 << 0;
        const PROTO1           = 1 << 1;
        const PROTO2           = 1 << 2;
        const PROTO3           = 1 << 3;
    }

    /// SYS_STATUS0 register bits (0x0A).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SysStatus0Bits: u8 {
        const PATH1_BUCK = 1 << 0;
        const PATH2_BUCK = 1 << 1;
    }

    /// SYS_STATUS1 register bits (0x0D). Note the path order is swapped relative to 0x0A.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SysStatus1Bits: u8 {
        const PATH2_ONLINE = 1 << 0;
        const PATH1_ONLINE = 1 << 1;
    }

    /// NTC_CURRENT register bits (0x44).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NtcCurrentBits: u8 {
        /// Bit 7: 0 = 20 µA bias, 1 = 40 µA bias.
        const BIAS_40UA = 1 << 7;
    }
}

/// Combine the latched ADC data bytes. Channel 11 carries 14 bits (7 from the
/// high byte); every other channel carries 12 bits (4 from the high byte).
pub fn adc_code_from_bytes(channel_id: u8, low: u8, high: u8) -> u16 {
    let high_mask = if channel_id == ADC_CHANNEL_14BIT { 0x7F } else { 0x0F };
    (((high & high_mask) as u16) << 8) | low as u16
}

/// Decode FAST_CHARGE_IND into (active, PD version code, protocol code).
pub fn decode_fast_charge(bits: FastChargeBits) -> (bool, u8, u8) {
    let active = bits.intersects(FastChargeBits::VOLTAGE_PROTOCOL | FastChargeBits::PROTOCOL_IND);
    let pd = (bits.bits() >> 4) & 0b11;
    let proto = bits.bits() & 0x0F;
    (active, pd, proto)
}

/// Convert a path current ADC code to milliamps.
pub fn code_to_current_ma(code: u16) -> i32 {
    (code as u32 * CURRENT_LSB_UA / 1_000) as i32
}

/// Convert an input voltage ADC code to millivolts.
pub fn code_to_vin_mv(code: u16) -> u16 {
    (code as u32 * VIN_LSB_MV).min(u16::MAX as u32) as u16
}

/// Convert a unit-converted output voltage ADC code to millivolts.
pub fn code_to_vout_mv(code: u16) -> u16 {
    (code as u32 * VOUT_LSB_MV).min(u16::MAX as u32) as u16
}

/// Convert an NTC ADC code to millivolts at the NTC pin.
pub fn code_to_ntc_mv(code: u16) -> f32 {
    code as f32 * NTC_LSB_MV
}

/// Thermistor temperature (°C) from resistance (kΩ) using the Beta equation.
pub fn beta_temperature_c(r_kohm: f32) -> f32 {
    let inv_t = 1.0 / NTC_T0_K + (1.0 / NTC_BETA) * libm::logf(r_kohm / NTC_R0_KOHM);
    1.0 / inv_t - KELVIN_OFFSET
}
