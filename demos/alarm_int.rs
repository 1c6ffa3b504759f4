extern crate ds3231_rtc;

use anyhow::anyhow;
use chrono::{Timelike, Utc};
use ds3231_rtc::{AlarmNumber, AlarmType, DateTimeAccess, Ds3231, SquareWaveMode};
use linux_embedded_hal::I2cdev;
use std::time::Duration;
// use direct linux gpio access using cdev rather than via constrained embedded_hal methods
use gpiocdev::line::EdgeDetection;

/// Example testing real RTC alarm interrupts,
/// assuming linux environment (such as Raspberry Pi 3+)
/// with DS3231 attached to i2c1.
/// Connect:
/// - SDA, SCL, GND, and 3.3V pins from rpi to the RTC
/// - GPIO 17 (physical pin 11) from rpi to the INT/SQW pin of the RTC

fn dump_edge_events(gpio_int_req: &gpiocdev::Request) {
  while Ok(true) == gpio_int_req.has_edge_event() {
    if let Ok(inner_evt) = gpio_int_req.read_edge_event() {
      println!("{:?}", inner_evt);
    }
  }
}

fn main() -> anyhow::Result<()> {
  env_logger::init();

  let i2c = I2cdev::new("/dev/i2c-1")?;
  let mut rtc = Ds3231::new(i2c);
  rtc.setup().map_err(|e| anyhow!("setup: {}", e))?;

  // align the RTC with the system clock
  let sys_datetime = Utc::now().naive_utc();
  rtc.set_datetime(&sys_datetime).map_err(|e| anyhow!("set_datetime: {}", e))?;

  // route alarms to the INT pin, and clear any stale alarm flags
  rtc.set_square_wave_mode(SquareWaveMode::AlarmInterrupt).map_err(|e| anyhow!("{}", e))?;
  rtc.reset_alarm(AlarmNumber::Alarm1).map_err(|e| anyhow!("{}", e))?;
  rtc.reset_alarm(AlarmNumber::Alarm2).map_err(|e| anyhow!("{}", e))?;

  // fire when the seconds next match, with the interrupt pin asserted
  let init_dt = rtc.datetime().map_err(|e| anyhow!("datetime: {}", e))?;
  let alarm_second = ((init_dt.second() + 10) % 60) as u8;
  rtc.set_alarm(AlarmType::ALARM_1_MATCH_SECOND_WITH_INTERRUPT, alarm_second, 0, 0, 0)
    .map_err(|e| anyhow!("set_alarm: {}", e))?;
  let setting = rtc.alarm(AlarmNumber::Alarm1).map_err(|e| anyhow!("{}", e))?;
  println!("init_dt: {} alarm: {:?}", init_dt, setting);

  // This is a specific configuration for Raspberry Pi -- YMMV
  let gpio_int_req = gpiocdev::Request::builder()
    .on_chip("/dev/gpiochip0")
    .with_line(17)
    // INT/SQW is open drain and active low
    .as_active_low()
    .with_edge_detection(EdgeDetection::FallingEdge)
    .request()?;

  for _i in 0..6 {
    let cur_dt = rtc.datetime().map_err(|e| anyhow!("{}", e))?;
    if let Ok(true) = gpio_int_req.wait_edge_event(Duration::from_secs(5)) {
      println!("Edge events at {}", cur_dt);
      dump_edge_events(&gpio_int_req);
      let status = rtc.register_image().status;
      println!("status before reset: {}", status);
      rtc.reset_alarm(AlarmNumber::Alarm1).map_err(|e| anyhow!("{}", e))?;
      break;
    }
    println!("No edge events at {}", cur_dt);
  }

  // disarm the alarm interrupt
  rtc.set_alarm(AlarmType::ALARM_1_MATCH_SECOND, alarm_second, 0, 0, 0)
    .map_err(|e| anyhow!("{}", e))?;
  Ok(())
}
