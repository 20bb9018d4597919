//! Data types for the SW3538 driver: ADC channels, protocol enums and the telemetry snapshot.

use crate::registers::NtcCurrentBits;

/// ADC channels selectable through the data-select register (0x40).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdcChannel {
    /// Path 1 protocol current (idis1).
    Path1Current,
    /// Path 2 protocol current (idis2).
    Path2Current,
    /// Raw output voltage.
    OutputVoltage,
    /// Input voltage. Off by default; must be enabled before each read pass.
    InputVoltage,
    /// NTC pin voltage.
    NtcVoltage,
    /// Unit-converted output voltage (14-bit, 1 mV/LSB).
    OutputVoltageScaled,
}

impl AdcChannel {
    /// Id written to the data-select register.
    pub const fn id(self) -> u8 {
        match self {
            AdcChannel::Path1Current => 1,
            AdcChannel::Path2Current => 2,
            AdcChannel::OutputVoltage => 5,
            AdcChannel::InputVoltage => 6,
            AdcChannel::NtcVoltage => 7,
            AdcChannel::OutputVoltageScaled => 11,
        }
    }

    /// Bit in the 0x18/0x19 enable masks. The unit-converted output voltage is
    /// derived from the output-voltage converter and shares its bit.
    pub const fn enable_bit(self) -> u8 {
        match self {
            AdcChannel::OutputVoltageScaled => 5,
            other => other.id(),
        }
    }
}

/// Channels enabled for an acquisition pass, in the order they are armed.
pub const ACQUISITION_CHANNELS: [AdcChannel; 5] = [
    AdcChannel::InputVoltage,
    AdcChannel::OutputVoltage,
    AdcChannel::Path2Current,
    AdcChannel::Path1Current,
    AdcChannel::NtcVoltage,
];

/// Fast charge protocol reported in FAST_CHARGE_IND bits 3-0.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FastChargeProtocol {
    None,
    Qc2_0,
    Qc3_0,
    Qc3Plus,
    Fcp,
    Scp,
    PdFix,
    PdPps,
    Pe1_1,
    Pe2_0,
    Vooc1_0,
    Vooc4_0,
    Sfcp,
    Afc,
    Tfcp,
    Reserved,
}

impl FastChargeProtocol {
    pub fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => Self::None,
            1 => Self::Qc2_0,
            2 => Self::Qc3_0,
            3 => Self::Qc3Plus,
            4 => Self::Fcp,
            5 => Self::Scp,
            6 => Self::PdFix,
            7 => Self::PdPps,
            8 => Self::Pe1_1,
            9 => Self::Pe2_0,
            10 => Self::Vooc1_0,
            11 => Self::Vooc4_0,
            13 => Self::Sfcp,
            14 => Self::Afc,
            15 => Self::Tfcp,
            _ => Self::Reserved,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Qc2_0 => "QC2.0",
            Self::Qc3_0 => "QC3.0",
            Self::Qc3Plus => "QC3+",
            Self::Fcp => "FCP",
            Self::Scp => "SCP",
            Self::PdFix => "PD-FIX",
            Self::PdPps => "PD-PPS",
            Self::Pe1_1 => "PE1.1",
            Self::Pe2_0 => "PE2.0",
            Self::Vooc1_0 => "VOOC1.0",
            Self::Vooc4_0 => "VOOC4.0",
            Self::Sfcp => "SFCP",
            Self::Afc => "AFC",
            Self::Tfcp => "TFCP",
            Self::Reserved => "RESERVED",
        }
    }
}

/// PD version reported in FAST_CHARGE_IND bits 5-4.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PdVersion {
    Reserved,
    Pd2_0,
    Pd3_0,
}

impl PdVersion {
    pub fn from_code(code: u8) -> Self {
        match code & 0b11 {
            1 => Self::Pd2_0,
            2 => Self::Pd3_0,
            _ => Self::Reserved,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "Reserved",
            Self::Pd2_0 => "PD2.0",
            Self::Pd3_0 => "PD3.0",
        }
    }
}

/// NTC bias current source (NTC_CURRENT bit 7).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NtcBias {
    Ua20,
    Ua40,
}

impl NtcBias {
    pub fn from_register(value: u8) -> Self {
        if NtcCurrentBits::from_bits_truncate(value).contains(NtcCurrentBits::BIAS_40UA) {
            Self::Ua40
        } else {
            Self::Ua20
        }
    }

    pub const fn microamps(self) -> f32 {
        match self {
            Self::Ua20 => 20.0,
            Self::Ua40 => 40.0,
        }
    }
}

/// Plausibility limits applied while decoding a pass.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TelemetryConfig {
    /// Lowest accepted NTC temperature (°C, inclusive).
    pub ntc_min_c: i16,
    /// Highest accepted NTC temperature (°C, inclusive).
    pub ntc_max_c: i16,
    /// Max-power readings above this are flagged as suspect.
    pub max_power_ceiling_w: u8,
}

impl TelemetryConfig {
    pub const fn new(ntc_min_c: i16, ntc_max_c: i16, max_power_ceiling_w: u8) -> Self {
        Self {
            ntc_min_c,
            ntc_max_c,
            max_power_ceiling_w,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new(-40, 125, 100)
    }
}

bitflags::bitflags! {
    /// Non-fatal anomalies noticed while decoding a pass.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SnapshotWarnings: u8 {
        /// Max power exceeded the configured ceiling.
        const MAX_POWER_SUSPECT = 1 << 0;
        /// NTC temperature fell outside the accepted range and was discarded.
        const NTC_OUT_OF_RANGE  = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SnapshotWarnings {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SnapshotWarnings({=u8:#x})", self.bits())
    }
}

/// Register bytes and ADC codes captured during one acquisition pass.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawReadings {
    pub version: u8,
    pub max_power: u8,
    pub fast_charge: u8,
    pub sys_status0: u8,
    pub sys_status1: u8,
    pub path1_current: u16,
    pub path2_current: u16,
    pub input_voltage: u16,
    pub output_voltage: u16,
    pub ntc_voltage: u16,
    pub ntc_current: u8,
}

/// One fully decoded acquisition pass.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    pub chip_version: u8,
    pub max_power_w: u8,
    pub fast_charge_active: bool,
    pub fast_charge_protocol: FastChargeProtocol,
    pub pd_version: PdVersion,
    pub path1_online: bool,
    pub path2_online: bool,
    pub path1_buck_active: bool,
    pub path2_buck_active: bool,
    pub current_path1_ma: i32,
    pub current_path2_ma: i32,
    pub input_voltage_mv: u16,
    pub output_voltage_mv: u16,
    /// `None` when the computed temperature was outside the accepted range.
    pub ntc_temperature_c: Option<i16>,
    pub warnings: SnapshotWarnings,
}

impl TelemetrySnapshot {
    /// Decode a complete set of raw readings.
    pub fn decode(raw: &RawReadings, config: &TelemetryConfig) -> Self {
        use crate::registers::*;

        let mut warnings = SnapshotWarnings::empty();

        let max_power_w = raw.max_power & MAX_POWER_MASK;
        if max_power_w > config.max_power_ceiling_w {
            warnings |= SnapshotWarnings::MAX_POWER_SUSPECT;
        }

        let (fast_charge_active, pd, proto) =
            decode_fast_charge(FastChargeBits::from_bits_truncate(raw.fast_charge));
        let status0 = SysStatus0Bits::from_bits_truncate(raw.sys_status0);
        let status1 = SysStatus1Bits::from_bits_truncate(raw.sys_status1);

        let ntc_temperature_c = ntc_temperature_c(
            raw.ntc_voltage,
            NtcBias::from_register(raw.ntc_current),
            config,
        );
        if ntc_temperature_c.is_none() {
            warnings |= SnapshotWarnings::NTC_OUT_OF_RANGE;
        }

        Self {
            chip_version: raw.version & VERSION_MASK,
            max_power_w,
            fast_charge_active,
            fast_charge_protocol: FastChargeProtocol::from_code(proto),
            pd_version: PdVersion::from_code(pd),
            path1_online: status1.contains(SysStatus1Bits::PATH1_ONLINE),
            path2_online: status1.contains(SysStatus1Bits::PATH2_ONLINE),
            path1_buck_active: status0.contains(SysStatus0Bits::PATH1_BUCK),
            path2_buck_active: status0.contains(SysStatus0Bits::PATH2_BUCK),
            current_path1_ma: code_to_current_ma(raw.path1_current),
            current_path2_ma: code_to_current_ma(raw.path2_current),
            input_voltage_mv: code_to_vin_mv(raw.input_voltage),
            output_voltage_mv: code_to_vout_mv(raw.output_voltage),
            ntc_temperature_c,
            warnings,
        }
    }

    /// Sum of both path currents.
    pub fn total_current_ma(&self) -> i32 {
        self.current_path1_ma + self.current_path2_ma
    }

    /// Output power estimate from output voltage and total current.
    pub fn output_power_mw(&self) -> u32 {
        let ma = self.total_current_ma().max(0) as u32;
        self.output_voltage_mv as u32 * ma / 1_000
    }

    /// Identity sanity check: silicon revision fits in two bits and max power is under the ceiling.
    pub fn is_plausible(&self, config: &TelemetryConfig) -> bool {
        self.chip_version <= 3 && self.max_power_w <= config.max_power_ceiling_w
    }
}

/// NTC temperature in °C, or `None` when outside `config`'s accepted range.
pub fn ntc_temperature_c(code: u16, bias: NtcBias, config: &TelemetryConfig) -> Option<i16> {
    let mv = crate::registers::code_to_ntc_mv(code);
    // mV / µA = kΩ
    let r_kohm = mv / bias.microamps();
    let celsius = crate::registers::beta_temperature_c(r_kohm);
    if !celsius.is_finite() {
        return None;
    }
    // Truncate toward zero before the range check.
    let whole = celsius as i32;
    if whole < config.ntc_min_c as i32 || whole > config.ntc_max_c as i32 {
        None
    } else {
        Some(whole as i16)
    }
}

impl core::fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let yes_no = |b: bool| if b { "Yes" } else { "No" };
        let open_closed = |b: bool| if b { "Open" } else { "Closed" };
        writeln!(f, "--- SW3538 Data ---")?;
        writeln!(f, "Chip Version: {}", self.chip_version)?;
        writeln!(f, "System Max Power: {}W", self.max_power_w)?;
        writeln!(
            f,
            "Fast Charge Status: {}",
            if self.fast_charge_active { "Active" } else { "Inactive" }
        )?;
        writeln!(f, "Fast Charge Protocol: {}", self.fast_charge_protocol.as_str())?;
        writeln!(f, "PD Version: {}", self.pd_version.as_str())?;
        writeln!(f, "Path 1 Online: {}", yes_no(self.path1_online))?;
        writeln!(f, "Path 2 Online: {}", yes_no(self.path2_online))?;
        writeln!(f, "Path 1 BUCK Status: {}", open_closed(self.path1_buck_active))?;
        writeln!(f, "Path 2 BUCK Status: {}", open_closed(self.path2_buck_active))?;
        writeln!(f, "Path 1 Current: {}mA", self.current_path1_ma)?;
        writeln!(f, "Path 2 Current: {}mA", self.current_path2_ma)?;
        writeln!(f, "Input Voltage: {}mV", self.input_voltage_mv)?;
        writeln!(f, "Output Voltage: {}mV", self.output_voltage_mv)?;
        match self.ntc_temperature_c {
            Some(t) => writeln!(f, "NTC Temperature: {}C", t)?,
            None => writeln!(f, "NTC Temperature: N/A")?,
        }
        write!(f, "-------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntc_reference_and_extremes() {
        let cfg = TelemetryConfig::default();
        // 167 * 1.2 mV / 20 µA = 10.02 kΩ, just under 25 °C
        assert_eq!(ntc_temperature_c(167, NtcBias::Ua20, &cfg), Some(24));
        assert_eq!(ntc_temperature_c(333, NtcBias::Ua40, &cfg), Some(25));
        // 245.7 kΩ -> about -33 °C
        assert_eq!(ntc_temperature_c(4095, NtcBias::Ua20, &cfg), Some(-33));
        assert_eq!(ntc_temperature_c(4095, NtcBias::Ua40, &cfg), Some(-22));
        // 0.18 kΩ -> well above 125 °C
        assert_eq!(ntc_temperature_c(3, NtcBias::Ua20, &cfg), None);
        // open/short NTC
        assert_eq!(ntc_temperature_c(0, NtcBias::Ua20, &cfg), None);
    }

    #[test]
    fn ntc_narrow_range_rejects_cold() {
        let cfg = TelemetryConfig::new(0, 100, 100);
        assert_eq!(ntc_temperature_c(4095, NtcBias::Ua20, &cfg), None);
        assert_eq!(ntc_temperature_c(167, NtcBias::Ua20, &cfg), Some(24));
    }

    #[test]
    fn protocol_codes() {
        assert_eq!(FastChargeProtocol::from_code(6), FastChargeProtocol::PdFix);
        assert_eq!(FastChargeProtocol::from_code(12), FastChargeProtocol::Reserved);
        assert_eq!(FastChargeProtocol::from_code(15).as_str(), "TFCP");
        assert_eq!(PdVersion::from_code(3), PdVersion::Reserved);
    }

    #[test]
    fn enable_bits_fit_mask_register() {
        for ch in ACQUISITION_CHANNELS {
            assert!(ch.enable_bit() < 8);
        }
        assert_eq!(AdcChannel::OutputVoltageScaled.enable_bit(), 5);
    }
}
