extern crate ds3231_rtc;

use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use ds3231_rtc::{Ds3231, HostClock};
use linux_embedded_hal::I2cdev;
use std::thread::sleep;

/**
Example that sets the RTC from the linux system clock, then
periodically reads it back the way a host scheduler would call `update`.

The following was tested by enabling i2c-1 on a Raspberry Pi 3+
using `sudo raspi-config`
and connecting the SDA, SCL, GND, and 3.3V pins from RPi to the RTC.
Run with `RUST_LOG=debug` to see every register transfer.
*/

/// Host clock backed by the system clock.
/// Setting the system time needs privileges, so this only reports the drift.
struct SystemClock;

impl HostClock for SystemClock {
  fn utc_now(&mut self) -> Option<NaiveDateTime> {
    Some(Utc::now().naive_utc())
  }

  fn synchronize_epoch(&mut self, epoch: i64) {
    let sys_timestamp = Utc::now().timestamp();
    println!("rtc: {} sys: {} drift: {}", epoch, sys_timestamp, sys_timestamp - epoch);
  }
}

fn main() -> anyhow::Result<()> {
  env_logger::init();

  // Initialize the I2C device
  let i2c = I2cdev::new("/dev/i2c-1")?;

  // Create a new instance of the DS3231 driver
  let mut rtc = Ds3231::new(i2c);
  rtc.setup().map_err(|e| anyhow!("setup: {}", e))?;
  rtc.dump_config();

  let mut clock = SystemClock;
  let written = rtc.write_time(&mut clock).map_err(|e| anyhow!("write_time: {}", e))?;
  println!("RTC set to {}", written);

  loop {
    sleep(rtc.update_interval());
    rtc.update(&mut clock);
  }
}
