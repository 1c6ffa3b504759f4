extern crate ds3231_rtc;

use anyhow::anyhow;
use ds3231_rtc::{Ds3231, SquareWaveMode};
use linux_embedded_hal::I2cdev;
use std::thread::sleep;
use std::time::Duration;

/// Cycles the INT/SQW pin through each square-wave rate,
/// so the output can be checked with a scope or frequency counter.
/// Each rate is requested twice: the second request should not
/// produce a control register write (visible with `RUST_LOG=debug`).
fn main() -> anyhow::Result<()> {
  env_logger::init();

  let i2c = I2cdev::new("/dev/i2c-1")?;
  let mut rtc = Ds3231::new(i2c);
  rtc.setup().map_err(|e| anyhow!("setup: {}", e))?;

  let modes = [
    SquareWaveMode::Rate1Hz,
    SquareWaveMode::Rate1024Hz,
    SquareWaveMode::Rate4096Hz,
    SquareWaveMode::Rate8192Hz,
  ];
  for mode in modes {
    rtc.set_square_wave_mode(mode).map_err(|e| anyhow!("{}", e))?;
    rtc.set_square_wave_mode(mode).map_err(|e| anyhow!("{}", e))?;
    println!("{:?}: control {}", mode, rtc.register_image().control);
    sleep(Duration::from_secs(5));
  }

  // back to the power-on interrupt mode
  rtc.set_square_wave_mode(SquareWaveMode::AlarmInterrupt).map_err(|e| anyhow!("{}", e))?;
  Ok(())
}
