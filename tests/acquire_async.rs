#![cfg(feature = "async")]

mod common;

use common::*;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
use sw3538_rs::data_types::{AdcChannel, FastChargeProtocol, PdVersion};
use sw3538_rs::{Error, Monitor, PollConfig, Sw3538};

#[tokio::test]
async fn read_retries_with_backoff_then_succeeds() {
    let expectations = [rd_err(0x00), rd_err(0x00), rd(0x00, 0x02)];
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    assert_eq!(driver.read_reg_async(0x00).await, Ok(0x02));
    let (mut i2c, delay) = driver.free();
    assert_eq!(delay.ms, vec![10, 20]);
    i2c.done();
}

#[tokio::test]
async fn write_exhausts_fixed_schedule() {
    let expectations = [wr_err(0x40, 1), wr_err(0x40, 1), wr_err(0x40, 1)];
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    assert!(matches!(driver.write_reg_async(0x40, 1).await, Err(Error::I2c(_))));
    let (mut i2c, delay) = driver.free();
    assert_eq!(delay.ms, vec![5, 5, 5]);
    i2c.done();
}

#[tokio::test]
async fn full_pass_decodes_snapshot() {
    let expectations = full_pass(&PassScript::default());
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    let snap = driver.acquire_async().await.unwrap();

    assert_eq!(snap.chip_version, 2);
    assert_eq!(snap.pd_version, PdVersion::Pd3_0);
    assert_eq!(snap.fast_charge_protocol, FastChargeProtocol::PdFix);
    assert!(snap.path1_online);
    assert_eq!(snap.current_path1_ma, 1_000);
    assert_eq!(snap.input_voltage_mv, 5_000);
    assert_eq!(snap.output_voltage_mv, 9_000);
    assert_eq!(snap.ntc_temperature_c, Some(24));
    assert!(snap.warnings.is_empty());

    let (mut i2c, delay) = driver.free();
    assert_eq!(delay.ms, vec![5; 5]);
    i2c.done();
}

#[tokio::test]
async fn pass_recovers_from_transient_status_read() {
    let script = PassScript::default();
    let mut expectations = vec![rd(0x00, script.version), rd(0x02, script.max_power), rd_err(0x09)];
    expectations.extend(full_pass(&script).into_iter().skip(2));
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    let snap = driver.acquire_async().await.unwrap();
    assert!(snap.fast_charge_active);

    let (mut i2c, delay) = driver.free();
    // one read backoff, then the five latch waits
    assert_eq!(delay.ms, vec![10, 5, 5, 5, 5, 5]);
    i2c.done();
}

#[tokio::test]
async fn both_identity_registers_ff_fails_without_further_traffic() {
    let expectations = [rd(0x00, 0xFF), rd(0x02, 0xFF)];
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    assert_eq!(driver.acquire_async().await, Err(Error::NotResponding));
    driver.free().0.done();
}

#[tokio::test]
async fn gate_failure_aborts_channel_enable() {
    let expectations = [wr(0x15, 0x20), wr_err(0x15, 0x40), wr_err(0x15, 0x40), wr_err(0x15, 0x40)];
    let mut driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    let res = driver.enable_channel_async(AdcChannel::InputVoltage).await;
    assert!(matches!(res, Err(Error::I2c(_))));
    driver.free().0.done();
}

#[tokio::test]
async fn monitor_keeps_previous_snapshot_on_failure() {
    let mut expectations = full_pass(&PassScript::default());
    expectations.extend((0..5).map(|_| rd_err(0x00)));
    let driver = Sw3538::new(I2cMock::new(&expectations), RecordingDelay::default());
    let mut monitor = Monitor::new(driver, PollConfig::default(), 0);

    assert!(monitor.poll_async(100).await.is_none());
    let first = monitor.poll_async(200).await.unwrap().unwrap();
    assert_eq!(monitor.latest(), Some(&first));

    assert!(matches!(monitor.poll_async(400).await, Some(Err(Error::I2c(_)))));
    assert_eq!(monitor.latest(), Some(&first));
    assert_eq!(monitor.consecutive_failures(), 1);

    monitor.free().free().0.done();
}
