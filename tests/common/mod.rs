#![allow(dead_code)]

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::Transaction as I2cTrans;

pub const ADDR: u8 = 0x3C;

/// DelayNs that records every requested wait in milliseconds.
#[derive(Default)]
pub struct RecordingDelay {
    pub ms: Vec<u32>,
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

pub fn rd(reg: u8, value: u8) -> I2cTrans {
    I2cTrans::write_read(ADDR, vec![reg], vec![value])
}

pub fn rd_err(reg: u8) -> I2cTrans {
    I2cTrans::write_read(ADDR, vec![reg], vec![0]).with_error(ErrorKind::Other)
}

pub fn wr(reg: u8, value: u8) -> I2cTrans {
    I2cTrans::write(ADDR, vec![reg, value])
}

pub fn wr_err(reg: u8, value: u8) -> I2cTrans {
    I2cTrans::write(ADDR, vec![reg, value]).with_error(ErrorKind::Other)
}

pub fn gate(reg: u8) -> Vec<I2cTrans> {
    vec![wr(reg, 0x20), wr(reg, 0x40), wr(reg, 0x80)]
}

/// Force-op gate, then set `bit` in 0x18 (mask currently reads back as 0).
pub fn enable(bit: u8) -> Vec<I2cTrans> {
    let mut t = gate(0x15);
    t.push(rd(0x18, 0x00));
    t.push(wr(0x18, 1 << bit));
    t
}

/// Force-op gate, then clear `bit` in 0x19 (mask currently reads back as 0xFF).
pub fn disable(bit: u8) -> Vec<I2cTrans> {
    let mut t = gate(0x15);
    t.push(rd(0x19, 0xFF));
    t.push(wr(0x19, !(1 << bit)));
    t
}

pub fn channel(id: u8, low: u8, high: u8) -> Vec<I2cTrans> {
    vec![wr(0x40, id), rd(0x41, low), rd(0x42, high)]
}

/// Register values fed to one scripted acquisition pass.
#[derive(Clone, Copy)]
pub struct PassScript {
    pub version: u8,
    pub max_power: u8,
    pub fast_charge: u8,
    pub status0: u8,
    pub status1: u8,
    /// (low, high) pairs as latched in 0x41/0x42.
    pub path1: (u8, u8),
    pub path2: (u8, u8),
    pub vin: (u8, u8),
    pub vout: (u8, u8),
    pub ntc: (u8, u8),
    pub ntc_current: u8,
}

impl Default for PassScript {
    fn default() -> Self {
        Self {
            version: 0x02,
            max_power: 0x0A,
            fast_charge: 0xA6,
            status0: 0x01,
            status1: 0x02,
            // 400 * 2.5 mA = 1000 mA; junk in the upper nibble must be masked
            path1: (0x90, 0xF1),
            path2: (0x00, 0x00),
            // 500 * 10 mV
            vin: (0xF4, 0x01),
            // 9000 mV, bit 7 of the high byte is not data
            vout: (0x28, 0xA3),
            // 167 * 1.2 mV / 20 µA = 10.02 kΩ
            ntc: (0xA7, 0x00),
            ntc_current: 0x00,
        }
    }
}

pub fn identity(s: &PassScript) -> Vec<I2cTrans> {
    vec![
        rd(0x00, s.version),
        rd(0x02, s.max_power),
        rd(0x09, s.fast_charge),
        rd(0x0A, s.status0),
        rd(0x0D, s.status1),
    ]
}

pub const ENABLE_ORDER: [u8; 5] = [6, 5, 2, 1, 7];

pub fn full_pass(s: &PassScript) -> Vec<I2cTrans> {
    let mut t = identity(s);
    for bit in ENABLE_ORDER {
        t.extend(enable(bit));
    }
    t.extend(channel(1, s.path1.0, s.path1.1));
    t.extend(channel(2, s.path2.0, s.path2.1));
    t.extend(channel(6, s.vin.0, s.vin.1));
    t.extend(channel(11, s.vout.0, s.vout.1));
    t.extend(channel(7, s.ntc.0, s.ntc.1));
    t.push(rd(0x44, s.ntc_current));
    for bit in ENABLE_ORDER {
        t.extend(disable(bit));
    }
    t
}
