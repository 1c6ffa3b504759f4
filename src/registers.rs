//! DS3231 hardware description: register map, bit flags,
//! and shift/mask views over each register group.
//!
//! Every view wraps the raw bytes exactly as they travel on the bus,
//! so a group can be written back without disturbing bits the driver
//! doesn't own.

use core::fmt;

use crate::alarm::{AlarmSetting, AlarmType};
use crate::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Fixed i2c bus address of the device (7-bit)
pub const DS3231_ADDRESS: u8 = 0x68;

// Register group start addresses
pub const REG_TIME: u8 = 0x00;
pub const REG_ALARM1: u8 = 0x07;
pub const REG_ALARM2: u8 = 0x0B;
pub const REG_CONTROL: u8 = 0x0E;
pub const REG_STATUS: u8 = 0x0F;

// Register group lengths, in bytes
pub const TIME_LEN: usize = 7;
pub const ALARM1_LEN: usize = 4;
pub const ALARM2_LEN: usize = 3;

/// The longest single write: register pointer plus the time group
pub(crate) const MAX_WRITE_LEN: usize = 1 + TIME_LEN;

// Time register bits that are not part of a BCD field:
const HOUR_12_24_BIT: u8 = 1 << 6;
const HOUR_PM_BIT: u8 = 1 << 5; // only meaningful in 12-hour mode
const CENTURY_BIT: u8 = 1 << 7;

// Alarm register bits:
const ALARM_MATCH_BIT: u8 = 1 << 7; // Mx "don't care" bit, one per alarm byte
const ALARM_DAY_MODE_BIT: u8 = 1 << 6; // DY/DT: set for day-of-week

// Control register bits: EOSC BBSQW CONV RS2 RS1 INTCN A2IE A1IE
const CTRL_ALARM1_INT_ENABLE_BIT: u8 = 1 << 0;
const CTRL_ALARM2_INT_ENABLE_BIT: u8 = 1 << 1;
const CTRL_INT_CONTROL_BIT: u8 = 1 << 2;
const CTRL_RATE_SHIFT: u8 = 3;
const CTRL_RATE_MASK: u8 = 0b11 << CTRL_RATE_SHIFT;
const CTRL_CONVERT_TEMP_BIT: u8 = 1 << 5;
const CTRL_BATTERY_SQW_BIT: u8 = 1 << 6;
const CTRL_OSC_DISABLE_BIT: u8 = 1 << 7;

// Status register bits: OSF - - - EN32kHz BSY A2F A1F
const STAT_ALARM1_FLAG_BIT: u8 = 1 << 0;
const STAT_ALARM2_FLAG_BIT: u8 = 1 << 1;
const STAT_BUSY_BIT: u8 = 1 << 2;
const STAT_EN32KHZ_BIT: u8 = 1 << 3;
const STAT_OSC_STOP_BIT: u8 = 1 << 7;

// Width of the BCD tens digit, per field
const SECONDS_TENS_WIDTH: u8 = 3;
const MINUTES_TENS_WIDTH: u8 = 3;
const HOURS_TENS_WIDTH: u8 = 2;
const DAY_TENS_WIDTH: u8 = 2;
const MONTH_TENS_WIDTH: u8 = 1;
const YEAR_TENS_WIDTH: u8 = 4;
const HOURS_12_TENS_WIDTH: u8 = 1;
const WEEKDAY_MASK: u8 = 0b0000_0111;

const UNITS_MASK: u8 = 0x0F;
const TENS_SHIFT: u8 = 4;

fn tens_mask(tens_width: u8) -> u8 {
  ((1u8 << tens_width) - 1) << TENS_SHIFT
}

// Decode one BCD field from a byte, ignoring bits above the tens digit
fn bcd_field(byte: u8, tens_width: u8) -> u8 {
  let tens = (byte & tens_mask(tens_width)) >> TENS_SHIFT;
  (byte & UNITS_MASK) + 10 * tens
}

// Encode `value` into the BCD field of `byte`, preserving bits above the tens digit
fn with_bcd_field(byte: u8, tens_width: u8, value: u8) -> u8 {
  let field_mask = tens_mask(tens_width) | UNITS_MASK;
  let encoded = (((value / 10) << TENS_SHIFT) & tens_mask(tens_width)) | (value % 10);
  (byte & !field_mask) | encoded
}

fn bcd_units_valid(byte: u8) -> bool {
  (byte & UNITS_MASK) <= 9
}

// Alarm hours are always written in 24-hour mode
fn alarm_hour_byte(byte: u8, hour: u8) -> u8 {
  with_bcd_field(byte & !HOUR_12_24_BIT, HOURS_TENS_WIDTH, hour)
}

fn bit(byte: u8, mask: u8) -> bool {
  0 != (byte & mask)
}

fn with_bit(byte: u8, mask: u8, set: bool) -> u8 {
  if set { byte | mask } else { byte & !mask }
}

/// Timekeeping registers 0x00..=0x06
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRegisters {
  pub raw: [u8; TIME_LEN],
}

impl TimeRegisters {
  pub fn second(&self) -> u8 { bcd_field(self.raw[0], SECONDS_TENS_WIDTH) }
  pub fn minute(&self) -> u8 { bcd_field(self.raw[1], MINUTES_TENS_WIDTH) }
  /// Hour of day, 0..=23, whichever hour mode the chip is in
  pub fn hour(&self) -> u8 {
    let hour_byte = self.raw[2];
    if bit(hour_byte, HOUR_12_24_BIT) {
      let hour_12 = bcd_field(hour_byte, HOURS_12_TENS_WIDTH) % 12;
      if bit(hour_byte, HOUR_PM_BIT) { hour_12 + 12 } else { hour_12 }
    }
    else {
      bcd_field(hour_byte, HOURS_TENS_WIDTH)
    }
  }
  /// Day of week, 1..=7 with 1 being Sunday
  pub fn weekday(&self) -> u8 { self.raw[3] & WEEKDAY_MASK }
  pub fn day(&self) -> u8 { bcd_field(self.raw[4], DAY_TENS_WIDTH) }
  pub fn month(&self) -> u8 { bcd_field(self.raw[5], MONTH_TENS_WIDTH) }
  /// Year offset from 2000, 0..=99
  pub fn year(&self) -> u8 { bcd_field(self.raw[6], YEAR_TENS_WIDTH) }

  /// Whether the chip is counting hours in 12-hour mode.
  /// This driver only ever writes 24-hour mode.
  pub fn is_12_hour_mode(&self) -> bool { bit(self.raw[2], HOUR_12_24_BIT) }

  pub fn century(&self) -> bool { bit(self.raw[5], CENTURY_BIT) }

  pub fn set_second(&mut self, second: u8) {
    self.raw[0] = with_bcd_field(self.raw[0], SECONDS_TENS_WIDTH, second);
  }

  pub fn set_minute(&mut self, minute: u8) {
    self.raw[1] = with_bcd_field(self.raw[1], MINUTES_TENS_WIDTH, minute);
  }

  /// Sets the hour (0..=23) and selects 24-hour mode
  pub fn set_hour(&mut self, hour: u8) {
    self.raw[2] = with_bcd_field(self.raw[2] & !HOUR_12_24_BIT, HOURS_TENS_WIDTH, hour);
  }

  pub fn set_weekday(&mut self, weekday: u8) {
    self.raw[3] = (self.raw[3] & !WEEKDAY_MASK) | (weekday & WEEKDAY_MASK);
  }

  pub fn set_day(&mut self, day: u8) {
    self.raw[4] = with_bcd_field(self.raw[4], DAY_TENS_WIDTH, day);
  }

  pub fn set_month(&mut self, month: u8) {
    self.raw[5] = with_bcd_field(self.raw[5], MONTH_TENS_WIDTH, month);
  }

  pub fn set_year(&mut self, year: u8) {
    self.raw[6] = with_bcd_field(self.raw[6], YEAR_TENS_WIDTH, year);
  }

  /// True when every units digit holds 0..=9.
  /// Tens digits are range-limited by their field width,
  /// except the year tens digit which is a full nibble.
  pub fn is_bcd_valid(&self) -> bool {
    self.raw.iter().all(|b| bcd_units_valid(*b))
      && (self.raw[6] >> TENS_SHIFT) <= 9
  }
}

impl TimeRegisters {
  /// Encode a calendar time. Only years 2000..=2099 fit the registers.
  pub fn from_datetime(datetime: &NaiveDateTime) -> Option<Self> {
    let year = datetime.year().checked_sub(2000).filter(|y| (0..=99).contains(y))?;
    let mut regs = Self::default();
    regs.set_second(datetime.second() as u8);
    regs.set_minute(datetime.minute() as u8);
    regs.set_hour(datetime.hour() as u8);
    regs.set_weekday(datetime.weekday().number_from_sunday() as u8);
    regs.set_day(datetime.day() as u8);
    regs.set_month(datetime.month() as u8);
    regs.set_year(year as u8);
    Some(regs)
  }

  /// Decode into a calendar time, or `None` if any field is out of range.
  /// The weekday is range-checked but otherwise unused: the date alone determines it.
  pub fn to_datetime(&self) -> Option<NaiveDateTime> {
    if !self.is_bcd_valid() || !(1..=7).contains(&self.weekday()) {
      return None;
    }
    NaiveDate::from_ymd_opt(2000 + i32::from(self.year()), self.month().into(), self.day().into())?
      .and_hms_opt(self.hour().into(), self.minute().into(), self.second().into())
  }
}

impl fmt::Display for TimeRegisters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}:{:02} 20{:02}-{:02}-{:02} wd {}",
           self.hour(), self.minute(), self.second(),
           self.year(), self.month(), self.day(), self.weekday())
  }
}

/// Alarm 1 registers 0x07..=0x0A
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alarm1Registers {
  pub raw: [u8; ALARM1_LEN],
}

impl Alarm1Registers {
  pub fn second(&self) -> u8 { bcd_field(self.raw[0], SECONDS_TENS_WIDTH) }
  pub fn minute(&self) -> u8 { bcd_field(self.raw[1], MINUTES_TENS_WIDTH) }
  pub fn hour(&self) -> u8 { bcd_field(self.raw[2], HOURS_TENS_WIDTH) }
  pub fn day(&self) -> u8 { bcd_field(self.raw[3], DAY_TENS_WIDTH) }
  pub fn m1(&self) -> bool { bit(self.raw[0], ALARM_MATCH_BIT) }
  pub fn m2(&self) -> bool { bit(self.raw[1], ALARM_MATCH_BIT) }
  pub fn m3(&self) -> bool { bit(self.raw[2], ALARM_MATCH_BIT) }
  pub fn m4(&self) -> bool { bit(self.raw[3], ALARM_MATCH_BIT) }
  /// Set when the day field holds a day of week rather than a date
  pub fn day_mode(&self) -> bool { bit(self.raw[3], ALARM_DAY_MODE_BIT) }

  /// Overwrite every alarm 1 field from an alarm type and its time fields
  pub fn encode(&mut self, alarm_type: AlarmType, second: u8, minute: u8, hour: u8, day: u8) {
    self.raw[0] = with_bit(
      with_bcd_field(self.raw[0], SECONDS_TENS_WIDTH, second), ALARM_MATCH_BIT, alarm_type.m1());
    self.raw[1] = with_bit(
      with_bcd_field(self.raw[1], MINUTES_TENS_WIDTH, minute), ALARM_MATCH_BIT, alarm_type.m2());
    self.raw[2] = with_bit(
      alarm_hour_byte(self.raw[2], hour), ALARM_MATCH_BIT, alarm_type.m3());
    let day_byte = with_bit(
      with_bcd_field(self.raw[3], DAY_TENS_WIDTH, day), ALARM_DAY_MODE_BIT, alarm_type.day_mode());
    self.raw[3] = with_bit(day_byte, ALARM_MATCH_BIT, alarm_type.m4());
  }

  pub fn decode(&self, interrupt: bool) -> AlarmSetting {
    let alarm_type = AlarmType::from_parts(
      false, self.m1(), self.m2(), self.m3(), self.m4(), self.day_mode(), interrupt);
    AlarmSetting {
      alarm_type,
      second: self.second(),
      minute: self.minute(),
      hour: self.hour(),
      day: self.day(),
    }
  }
}

impl fmt::Display for Alarm1Registers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Alarm1 - {:02}:{:02}:{:02} {}:{:02} M1:{} M2:{} M3:{} M4:{}",
           self.hour(), self.minute(), self.second(),
           if self.day_mode() { "DoW" } else { "DoM" }, self.day(),
           self.m1() as u8, self.m2() as u8, self.m3() as u8, self.m4() as u8)
  }
}

/// Alarm 2 registers 0x0B..=0x0D. There is no seconds register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alarm2Registers {
  pub raw: [u8; ALARM2_LEN],
}

impl Alarm2Registers {
  pub fn minute(&self) -> u8 { bcd_field(self.raw[0], MINUTES_TENS_WIDTH) }
  pub fn hour(&self) -> u8 { bcd_field(self.raw[1], HOURS_TENS_WIDTH) }
  pub fn day(&self) -> u8 { bcd_field(self.raw[2], DAY_TENS_WIDTH) }
  pub fn m2(&self) -> bool { bit(self.raw[0], ALARM_MATCH_BIT) }
  pub fn m3(&self) -> bool { bit(self.raw[1], ALARM_MATCH_BIT) }
  pub fn m4(&self) -> bool { bit(self.raw[2], ALARM_MATCH_BIT) }
  pub fn day_mode(&self) -> bool { bit(self.raw[2], ALARM_DAY_MODE_BIT) }

  /// Overwrite every alarm 2 field. M1 has no register on this alarm and is ignored.
  pub fn encode(&mut self, alarm_type: AlarmType, minute: u8, hour: u8, day: u8) {
    self.raw[0] = with_bit(
      with_bcd_field(self.raw[0], MINUTES_TENS_WIDTH, minute), ALARM_MATCH_BIT, alarm_type.m2());
    self.raw[1] = with_bit(
      alarm_hour_byte(self.raw[1], hour), ALARM_MATCH_BIT, alarm_type.m3());
    let day_byte = with_bit(
      with_bcd_field(self.raw[2], DAY_TENS_WIDTH, day), ALARM_DAY_MODE_BIT, alarm_type.day_mode());
    self.raw[2] = with_bit(day_byte, ALARM_MATCH_BIT, alarm_type.m4());
  }

  /// Alarm 2 always matches on second 00, reported as M1 clear
  pub fn decode(&self, interrupt: bool) -> AlarmSetting {
    let alarm_type = AlarmType::from_parts(
      true, false, self.m2(), self.m3(), self.m4(), self.day_mode(), interrupt);
    AlarmSetting {
      alarm_type,
      second: 0,
      minute: self.minute(),
      hour: self.hour(),
      day: self.day(),
    }
  }
}

impl fmt::Display for Alarm2Registers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Alarm2 - {:02}:{:02} {}:{:02} M2:{} M3:{} M4:{}",
           self.hour(), self.minute(),
           if self.day_mode() { "DoW" } else { "DoM" }, self.day(),
           self.m2() as u8, self.m3() as u8, self.m4() as u8)
  }
}

/// Control register 0x0E
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control(pub u8);

impl Control {
  pub fn alarm1_interrupt(&self) -> bool { bit(self.0, CTRL_ALARM1_INT_ENABLE_BIT) }
  pub fn alarm2_interrupt(&self) -> bool { bit(self.0, CTRL_ALARM2_INT_ENABLE_BIT) }
  /// INTCN: set routes alarms to the INT/SQW pin, clear outputs the square wave
  pub fn interrupt_control(&self) -> bool { bit(self.0, CTRL_INT_CONTROL_BIT) }
  /// RS2:RS1 square-wave rate select, 0..=3
  pub fn rate(&self) -> u8 { (self.0 & CTRL_RATE_MASK) >> CTRL_RATE_SHIFT }
  pub fn convert_temperature(&self) -> bool { bit(self.0, CTRL_CONVERT_TEMP_BIT) }
  pub fn battery_square_wave(&self) -> bool { bit(self.0, CTRL_BATTERY_SQW_BIT) }
  /// EOSC: when set the oscillator stops while on battery power
  pub fn oscillator_disabled(&self) -> bool { bit(self.0, CTRL_OSC_DISABLE_BIT) }

  pub fn set_alarm1_interrupt(&mut self, enable: bool) {
    self.0 = with_bit(self.0, CTRL_ALARM1_INT_ENABLE_BIT, enable);
  }

  pub fn set_alarm2_interrupt(&mut self, enable: bool) {
    self.0 = with_bit(self.0, CTRL_ALARM2_INT_ENABLE_BIT, enable);
  }

  pub fn set_interrupt_control(&mut self, enable: bool) {
    self.0 = with_bit(self.0, CTRL_INT_CONTROL_BIT, enable);
  }

  pub fn set_rate(&mut self, rate: u8) {
    self.0 = (self.0 & !CTRL_RATE_MASK) | ((rate << CTRL_RATE_SHIFT) & CTRL_RATE_MASK);
  }
}

impl fmt::Display for Control {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "A1I:{} A2I:{} INT_SQW:{} RS:{} CT:{} BSQW:{} OSC:{}",
           on_off(self.alarm1_interrupt()),
           on_off(self.alarm2_interrupt()),
           if self.interrupt_control() { "INT" } else { "SQW" },
           self.rate(),
           on_off(self.convert_temperature()),
           on_off(self.battery_square_wave()),
           on_off(!self.oscillator_disabled()))
  }
}

/// Status register 0x0F
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
  pub fn alarm1_active(&self) -> bool { bit(self.0, STAT_ALARM1_FLAG_BIT) }
  pub fn alarm2_active(&self) -> bool { bit(self.0, STAT_ALARM2_FLAG_BIT) }
  pub fn busy(&self) -> bool { bit(self.0, STAT_BUSY_BIT) }
  pub fn en32khz(&self) -> bool { bit(self.0, STAT_EN32KHZ_BIT) }
  /// OSF: the oscillator stopped at some point, timekeeping is unreliable
  pub fn oscillator_stopped(&self) -> bool { bit(self.0, STAT_OSC_STOP_BIT) }

  pub fn set_alarm1_active(&mut self, active: bool) {
    self.0 = with_bit(self.0, STAT_ALARM1_FLAG_BIT, active);
  }

  pub fn set_alarm2_active(&mut self, active: bool) {
    self.0 = with_bit(self.0, STAT_ALARM2_FLAG_BIT, active);
  }

  pub fn set_oscillator_stopped(&mut self, stopped: bool) {
    self.0 = with_bit(self.0, STAT_OSC_STOP_BIT, stopped);
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "A1:{} A2:{} BSY:{} 32K:{} OSC:{}",
           on_off(self.alarm1_active()),
           on_off(self.alarm2_active()),
           if self.busy() { "YES" } else { "NO" },
           on_off(self.en32khz()),
           on_off(!self.oscillator_stopped()))
  }
}

fn on_off(value: bool) -> &'static str {
  if value { "ON" } else { "OFF" }
}

/// In-memory mirror of every register group the driver touches.
/// Each group is only current right after it was read from the chip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterImage {
  pub time: TimeRegisters,
  pub alarm1: Alarm1Registers,
  pub alarm2: Alarm2Registers,
  pub control: Control,
  pub status: Status,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alarm::AlarmNumber;

  #[test]
  fn test_bcd_round_trip_over_field_ranges() {
    let mut regs = TimeRegisters::default();
    for v in 0..=59 {
      regs.set_second(v);
      regs.set_minute(v);
      assert_eq!(regs.second(), v);
      assert_eq!(regs.minute(), v);
    }
    for v in 0..=23 {
      regs.set_hour(v);
      assert_eq!(regs.hour(), v);
    }
    for v in 1..=31 {
      regs.set_day(v);
      assert_eq!(regs.day(), v);
    }
    for v in 1..=12 {
      regs.set_month(v);
      assert_eq!(regs.month(), v);
    }
    for v in 0..=99 {
      regs.set_year(v);
      assert_eq!(regs.year(), v);
    }
  }

  #[test]
  fn test_time_fields_pack_into_expected_bytes() {
    let mut regs = TimeRegisters::default();
    regs.set_second(58);
    regs.set_minute(59);
    regs.set_hour(23);
    regs.set_weekday(7);
    regs.set_day(31);
    regs.set_month(12);
    regs.set_year(23);
    assert_eq!(regs.raw, [0x58, 0x59, 0x23, 0x07, 0x31, 0x12, 0x23]);
    assert!(regs.is_bcd_valid());
  }

  #[test]
  fn test_set_hour_selects_24_hour_mode() {
    let mut regs = TimeRegisters { raw: [0, 0, 0x52, 0, 0, 0, 0] };
    assert!(regs.is_12_hour_mode());
    regs.set_hour(17);
    assert!(!regs.is_12_hour_mode());
    assert_eq!(regs.raw[2], 0x17);
  }

  #[test]
  fn test_hour_decodes_12_hour_mode() {
    // 12-hour mode, PM, 11 o'clock
    let regs = TimeRegisters { raw: [0, 0, 0x40 | 0x20 | 0x11, 1, 1, 1, 0] };
    assert_eq!(regs.hour(), 23);
    // 12-hour mode, AM, 12 o'clock is midnight
    let regs = TimeRegisters { raw: [0, 0, 0x40 | 0x12, 1, 1, 1, 0] };
    assert_eq!(regs.hour(), 0);
    // 12-hour mode, PM, 12 o'clock is noon
    let regs = TimeRegisters { raw: [0, 0, 0x40 | 0x20 | 0x12, 1, 1, 1, 0] };
    assert_eq!(regs.hour(), 12);
  }

  #[test]
  fn test_datetime_conversion() {
    let dt = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
      .and_hms_opt(13, 45, 7).unwrap();
    let regs = TimeRegisters::from_datetime(&dt).unwrap();
    // 2024-02-29 is a Thursday: 5 counting from Sunday = 1
    assert_eq!(regs.raw, [0x07, 0x45, 0x13, 0x05, 0x29, 0x02, 0x24]);
    assert_eq!(regs.to_datetime(), Some(dt));
  }

  #[test]
  fn test_datetime_outside_2000s_is_not_encodable() {
    let dt = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert!(TimeRegisters::from_datetime(&dt).is_none());
    let dt = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert!(TimeRegisters::from_datetime(&dt).is_none());
  }

  #[test]
  fn test_impossible_dates_do_not_decode() {
    // February 30th
    let regs = TimeRegisters { raw: [0, 0, 0, 1, 0x30, 0x02, 0x23] };
    assert!(regs.to_datetime().is_none());
    // month 0
    let regs = TimeRegisters { raw: [0, 0, 0, 1, 0x01, 0x00, 0x23] };
    assert!(regs.to_datetime().is_none());
    // hour 24
    let regs = TimeRegisters { raw: [0, 0, 0x24, 1, 0x01, 0x01, 0x23] };
    assert!(regs.to_datetime().is_none());
    // weekday 0
    let regs = TimeRegisters { raw: [0, 0, 0, 0, 0x01, 0x01, 0x23] };
    assert!(regs.to_datetime().is_none());
  }

  #[test]
  fn test_field_setters_preserve_unrelated_bits() {
    let mut regs = TimeRegisters { raw: [0, 0, 0, 0xF8, 0, 0x80, 0] };
    regs.set_weekday(3);
    regs.set_month(9);
    assert_eq!(regs.raw[3], 0xFB);
    assert!(regs.century());
    assert_eq!(regs.month(), 9);
  }

  #[test]
  fn test_bad_bcd_nibbles_are_detected() {
    let regs = TimeRegisters { raw: [0x0A, 0, 0, 1, 1, 1, 0] };
    assert!(!regs.is_bcd_valid());
    let regs = TimeRegisters { raw: [0, 0, 0, 1, 1, 1, 0xA0] };
    assert!(!regs.is_bcd_valid());
  }

  #[test]
  fn test_alarm1_encode_sets_match_and_day_mode_bits() {
    let mut regs = Alarm1Registers::default();
    let alarm_type = AlarmType::from_parts(false, true, false, true, false, true, false);
    regs.encode(alarm_type, 45, 30, 21, 5);
    assert_eq!(regs.raw, [0x80 | 0x45, 0x30, 0x80 | 0x21, 0x40 | 0x05]);
    assert!(regs.m1());
    assert!(!regs.m2());
    assert!(regs.m3());
    assert!(!regs.m4());
    assert!(regs.day_mode());
  }

  #[test]
  fn test_alarm2_encode_has_no_seconds() {
    let mut regs = Alarm2Registers::default();
    regs.encode(AlarmType::ALARM_2_MATCH_DAY_OF_WEEK_HOUR_MINUTE, 15, 8, 2);
    assert_eq!(regs.raw, [0x15, 0x08, 0x40 | 0x02]);
    let setting = regs.decode(false);
    assert_eq!(setting.alarm_type.alarm_number(), AlarmNumber::Alarm2);
    assert_eq!(setting.second, 0);
    assert_eq!(setting.day, 2);
    assert!(setting.alarm_type.day_mode());
  }

  #[test]
  fn test_alarm_encode_selects_24_hour_mode() {
    let mut alarm1 = Alarm1Registers { raw: [0x00, 0x00, 0x40, 0x80] };
    alarm1.encode(AlarmType::ALARM_1_MATCH_HOUR_MINUTE_SECOND, 0, 0, 23, 0);
    assert_eq!(alarm1.raw, [0x00, 0x00, 0x23, 0x80]);

    let mut alarm2 = Alarm2Registers { raw: [0x00, 0x40 | 0x20 | 0x11, 0x80] };
    alarm2.encode(AlarmType::ALARM_2_MATCH_HOUR_MINUTE, 0, 21, 0);
    assert_eq!(alarm2.raw, [0x00, 0x21, 0x80]);
  }

  #[test]
  fn test_control_rate_and_flags() {
    // power-on value: INTCN set, RS = 0b11
    let mut ctrl = Control(0b0001_1100);
    assert!(ctrl.interrupt_control());
    assert_eq!(ctrl.rate(), 3);
    ctrl.set_rate(1);
    ctrl.set_interrupt_control(false);
    ctrl.set_alarm2_interrupt(true);
    assert_eq!(ctrl.0, 0b0000_1010);
    assert!(!ctrl.alarm1_interrupt());
    assert!(ctrl.alarm2_interrupt());
  }

  #[test]
  fn test_status_flags() {
    let mut stat = Status(0b1000_1011);
    assert!(stat.oscillator_stopped());
    assert!(stat.en32khz());
    assert!(stat.alarm1_active());
    assert!(stat.alarm2_active());
    assert!(!stat.busy());
    stat.set_oscillator_stopped(false);
    stat.set_alarm2_active(false);
    assert_eq!(stat.0, 0b0000_1001);
  }
}
