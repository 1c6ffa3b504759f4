#![cfg_attr(not(test), no_std)]

pub use rtcc::{
  DateTimeAccess, NaiveDate, NaiveDateTime, Datelike, Timelike,
};

use core::fmt;
use core::time::Duration;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::{debug, error, info, warn};

mod alarm;
pub mod registers;

pub use alarm::{AlarmNumber, AlarmSetting, AlarmType, SquareWaveMode};
pub use registers::RegisterImage;

use registers::{
  Alarm1Registers, Alarm2Registers, Control, Status, TimeRegisters,
  ALARM1_LEN, ALARM2_LEN, DS3231_ADDRESS, MAX_WRITE_LEN,
  REG_ALARM1, REG_ALARM2, REG_CONTROL, REG_STATUS, REG_TIME, TIME_LEN,
};

/// Default period between host clock synchronizations
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(15);

/// All possible errors in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
  /// I2C bus error, on read or write
  Comm(E),
  /// The time registers hold a time that doesn't exist (bad BCD, impossible date)
  InvalidDecodedTime,
  /// The host clock has no valid time yet, or its time doesn't fit the RTC's 2000..=2099 range
  InvalidHostTime,
  /// An alarm field is out of range
  InvalidInputData,
  /// The oscillator stopped at some point; the chip time can't be trusted
  OscillatorStopped,
  /// Setup failed to talk to the chip; the driver won't touch the bus again
  Failed,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Comm(e) => write!(f, "i2c communication error: {:?}", e),
      Error::InvalidDecodedTime => f.write_str("invalid time in RTC registers"),
      Error::InvalidHostTime => f.write_str("invalid host time"),
      Error::InvalidInputData => f.write_str("invalid alarm field"),
      Error::OscillatorStopped => f.write_str("RTC oscillator stopped"),
      Error::Failed => f.write_str("RTC marked failed during setup"),
    }
  }
}

/// The host side of time synchronization
pub trait HostClock {
  /// Current UTC time, or `None` if the host clock hasn't been set yet
  fn utc_now(&mut self) -> Option<NaiveDateTime>;

  /// Accept a new reference time, in seconds since the unix epoch
  fn synchronize_epoch(&mut self, epoch: i64);
}

/// An i2c mux sitting between the host and the RTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mux {
  /// i2c address of the mux itself
  pub address: u8,
  /// the mux channel assigned to the RTC
  pub channel: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// 7-bit i2c address of the RTC
  pub address: u8,
  pub mux: Option<Mux>,
  /// How often the host scheduler should call `update`
  pub update_interval: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      address: DS3231_ADDRESS,
      mux: None,
      update_interval: DEFAULT_UPDATE_INTERVAL,
    }
  }
}

/// DS3231
/// Extremely Accurate I2C-Integrated RTC/TCXO/Crystal
/// rust no_std driver (utilizes the embedded_hal i2c interface)
///
/// The driver keeps a mirror of the chip's registers and updates
/// the control and status registers with read-modify-write sequences,
/// so bits it doesn't own are left as the chip reported them.
pub struct Ds3231<I2C> {
  i2c: I2C,
  config: Config,
  image: RegisterImage,
  failed: bool,
}

impl<I2C, E> Ds3231<I2C>
  where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: fmt::Debug,
{

  /// New driver instance, assumes that there is no i2c mux
  /// sitting between the RTC and the host.
  pub fn new(i2c: I2C) -> Self {
    Self::with_config(i2c, Config::default())
  }

  /// Allows the caller to create a new driver instance with
  /// an i2c mux between the RTC and the host.
  /// - `mux_addr` : the i2c address of the mux itself
  /// - `mux_chan` : the mux channel assigned to the RTC
  pub fn new_with_mux(i2c: I2C, mux_addr: u8, mux_chan: u8) -> Self {
    let config = Config {
      mux: Some(Mux { address: mux_addr, channel: mux_chan }),
      ..Config::default()
    };
    Self::with_config(i2c, config)
  }

  pub fn with_config(i2c: I2C, config: Config) -> Self {
    Ds3231 {
      i2c,
      config,
      image: RegisterImage::default(),
      failed: false,
    }
  }

  /// Destroy the driver instance, returning the i2c bus
  pub fn release(self) -> I2C {
    self.i2c
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// The period at which the host scheduler should call `update`
  pub fn update_interval(&self) -> Duration {
    self.config.update_interval
  }

  /// The last register values read from (or written to) the chip
  pub fn register_image(&self) -> &RegisterImage {
    &self.image
  }

  /// True once `setup` has failed to communicate with the chip
  pub fn is_failed(&self) -> bool {
    self.failed
  }

  /// Read every register group once.
  /// Any bus failure here marks the driver permanently failed.
  pub fn setup(&mut self) -> Result<(), Error<E>> {
    self.ensure_operational()?;
    info!("Setting up DS3231...");
    let res = self.read_all_registers();
    if res.is_err() {
      error!("Communication with DS3231 failed!");
      self.failed = true;
    }
    res
  }

  /// Log the driver configuration
  pub fn dump_config(&self) {
    info!("DS3231:");
    info!("  Address: {:#04x}", self.config.address);
    if let Some(mux) = self.config.mux {
      info!("  Mux: {:#04x} channel {:#010b}", mux.address, mux.channel);
    }
    info!("  Update interval: {} ms", self.config.update_interval.as_millis());
    if self.failed {
      error!("Communication with DS3231 failed!");
    }
  }

  /// Periodic hook: push the RTC time to the host clock.
  /// Failures only abandon this cycle; the next call tries again.
  pub fn update<C: HostClock>(&mut self, clock: &mut C) {
    if self.failed {
      return;
    }
    if let Err(err) = self.read_time(clock) {
      debug!("Skipping RTC sync this cycle: {}", err);
    }
  }

  /// Synchronize the host clock from the RTC.
  /// Returns the time handed to the host clock, or `None` if
  /// the RTC oscillator has stopped and its time can't be trusted.
  pub fn read_time<C: HostClock>(&mut self, clock: &mut C)
    -> Result<Option<NaiveDateTime>, Error<E>> {
    self.ensure_operational()?;
    self.read_status()?;
    if self.image.status.oscillator_stopped() {
      warn!("RTC halted, not syncing to system clock.");
      return Ok(None);
    }
    self.read_time_registers()?;
    let Some(rtc_time) = self.image.time.to_datetime() else {
      error!("Invalid RTC time, not syncing to system clock.");
      return Err(Error::InvalidDecodedTime);
    };
    clock.synchronize_epoch(rtc_time.and_utc().timestamp());
    Ok(Some(rtc_time))
  }

  /// Set the RTC from the host clock, restarting the oscillator if it had stopped.
  /// Returns the time written.
  pub fn write_time<C: HostClock>(&mut self, clock: &mut C) -> Result<NaiveDateTime, Error<E>> {
    self.ensure_operational()?;
    let Some(now) = clock.utc_now() else {
      error!("Invalid system time, not syncing to RTC.");
      return Err(Error::InvalidHostTime);
    };
    self.write_datetime(&now)?;
    Ok(now)
  }

  /// Configure one of the two alarms.
  /// `alarm_type` selects the alarm, its match bits, day mode and interrupt enable.
  /// Alarm 2 has no seconds register: `second` is ignored for it.
  /// `day` is a day of week (1..=7) when `alarm_type.day_mode()` is set, else a date (1..=31).
  /// Fields whose match bit is set are ignored by the chip; 0 is accepted there.
  pub fn set_alarm(&mut self, alarm_type: AlarmType,
                   second: u8, minute: u8, hour: u8, day: u8) -> Result<(), Error<E>> {
    self.ensure_operational()?;
    let alarm_number = alarm_type.alarm_number();
    let max_day = if alarm_type.day_mode() { 7 } else { 31 };
    // a matched day of 0 can never fire; with M4 set the day is ignored
    let day_ok = day <= max_day && (alarm_type.m4() || day >= 1);
    let second_ok = alarm_number == AlarmNumber::Alarm2 || second <= 59;
    if !second_ok || !day_ok || minute > 59 || hour > 23 {
      return Err(Error::InvalidInputData);
    }

    self.read_control()?;
    let interrupt = alarm_type.interrupt();
    let interrupt_changed = match alarm_number {
      AlarmNumber::Alarm1 => {
        self.read_alarm1()?;
        self.image.alarm1.encode(alarm_type, second, minute, hour, day);
        self.write_alarm1()?;
        let changed = self.image.control.alarm1_interrupt() != interrupt;
        self.image.control.set_alarm1_interrupt(interrupt);
        changed
      }
      AlarmNumber::Alarm2 => {
        self.read_alarm2()?;
        self.image.alarm2.encode(alarm_type, minute, hour, day);
        self.write_alarm2()?;
        let changed = self.image.control.alarm2_interrupt() != interrupt;
        self.image.control.set_alarm2_interrupt(interrupt);
        changed
      }
    };
    // control is shared with the other alarm and the square wave: only touch it on change
    if interrupt_changed {
      self.write_control()?;
    }
    Ok(())
  }

  /// Read back the current configuration of one alarm
  pub fn alarm(&mut self, alarm_number: AlarmNumber) -> Result<AlarmSetting, Error<E>> {
    self.ensure_operational()?;
    self.read_control()?;
    match alarm_number {
      AlarmNumber::Alarm1 => {
        self.read_alarm1()?;
        Ok(self.image.alarm1.decode(self.image.control.alarm1_interrupt()))
      }
      AlarmNumber::Alarm2 => {
        self.read_alarm2()?;
        Ok(self.image.alarm2.decode(self.image.control.alarm2_interrupt()))
      }
    }
  }

  /// Select between alarm interrupt output and a square wave on the INT/SQW pin.
  /// The control register is only written if the mode actually changes.
  pub fn set_square_wave_mode(&mut self, mode: SquareWaveMode) -> Result<(), Error<E>> {
    self.ensure_operational()?;
    self.read_control()?;
    let control = &mut self.image.control;
    let changed = match mode.rate_bits() {
      None => {
        let changed = !control.interrupt_control();
        control.set_interrupt_control(true);
        changed
      }
      Some(rate) => {
        let changed = control.interrupt_control() || control.rate() != rate;
        control.set_interrupt_control(false);
        control.set_rate(rate);
        changed
      }
    };
    if changed {
      self.write_control()?;
    }
    Ok(())
  }

  /// Acknowledge an alarm by clearing its flag.
  /// The status register is written back even if the flag was already clear.
  pub fn reset_alarm(&mut self, alarm_number: AlarmNumber) -> Result<(), Error<E>> {
    self.ensure_operational()?;
    self.read_status()?;
    let status = &mut self.image.status;
    match alarm_number {
      AlarmNumber::Alarm1 if status.alarm1_active() => status.set_alarm1_active(false),
      AlarmNumber::Alarm2 if status.alarm2_active() => status.set_alarm2_active(false),
      _ => {}
    }
    self.write_status()
  }

  fn ensure_operational(&self) -> Result<(), Error<E>> {
    if self.failed { Err(Error::Failed) } else { Ok(()) }
  }

  fn read_all_registers(&mut self) -> Result<(), Error<E>> {
    self.read_time_registers()?;
    self.read_alarm1()?;
    self.read_alarm2()?;
    self.read_control()?;
    self.read_status()
  }

  // Encode and write the full time group, clearing a stopped-oscillator flag first
  fn write_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), Error<E>> {
    let Some(time) = TimeRegisters::from_datetime(datetime) else {
      error!("System time {} is outside the RTC range, not syncing to RTC.", datetime);
      return Err(Error::InvalidHostTime);
    };
    self.read_status()?;
    if self.image.status.oscillator_stopped() {
      self.image.status.set_oscillator_stopped(false);
      self.write_status()?;
    }
    self.image.time = time;
    self.write_time_registers()
  }

  // If using an i2c mux, tell the mux to select our channel
  fn select_mux_channel(&mut self) -> Result<(), Error<E>> {
    if let Some(mux) = self.config.mux {
      self.i2c.write(mux.address, &[mux.channel]).map_err(Error::Comm)
    }
    else {
      Ok(())
    }
  }

  // read a block of registers all at once
  fn read_group(&mut self, reg: u8, read_buf: &mut [u8]) -> Result<(), Error<E>> {
    self.select_mux_channel()?;
    self.i2c.write_read(self.config.address, &[reg], read_buf).map_err(|e| {
      error!("Can't read I2C data.");
      Error::Comm(e)
    })
  }

  // write a block of registers all at once
  fn write_group(&mut self, reg: u8, data: &[u8]) -> Result<(), Error<E>> {
    self.select_mux_channel()?;
    let mut write_buf = [0u8; MAX_WRITE_LEN];
    write_buf[0] = reg;
    write_buf[1..=data.len()].copy_from_slice(data);
    self.i2c.write(self.config.address, &write_buf[..=data.len()]).map_err(|e| {
      error!("Can't write I2C data.");
      Error::Comm(e)
    })
  }

  fn read_time_registers(&mut self) -> Result<(), Error<E>> {
    let mut raw = [0u8; TIME_LEN];
    self.read_group(REG_TIME, &mut raw)?;
    self.image.time = TimeRegisters { raw };
    debug!("Read  {}", self.image.time);
    Ok(())
  }

  fn write_time_registers(&mut self) -> Result<(), Error<E>> {
    let raw = self.image.time.raw;
    self.write_group(REG_TIME, &raw)?;
    debug!("Write {}", self.image.time);
    Ok(())
  }

  fn read_alarm1(&mut self) -> Result<(), Error<E>> {
    let mut raw = [0u8; ALARM1_LEN];
    self.read_group(REG_ALARM1, &mut raw)?;
    self.image.alarm1 = Alarm1Registers { raw };
    debug!("Read  {}", self.image.alarm1);
    Ok(())
  }

  fn write_alarm1(&mut self) -> Result<(), Error<E>> {
    let raw = self.image.alarm1.raw;
    self.write_group(REG_ALARM1, &raw)?;
    debug!("Write {}", self.image.alarm1);
    Ok(())
  }

  fn read_alarm2(&mut self) -> Result<(), Error<E>> {
    let mut raw = [0u8; ALARM2_LEN];
    self.read_group(REG_ALARM2, &mut raw)?;
    self.image.alarm2 = Alarm2Registers { raw };
    debug!("Read  {}", self.image.alarm2);
    Ok(())
  }

  fn write_alarm2(&mut self) -> Result<(), Error<E>> {
    let raw = self.image.alarm2.raw;
    self.write_group(REG_ALARM2, &raw)?;
    debug!("Write {}", self.image.alarm2);
    Ok(())
  }

  fn read_control(&mut self) -> Result<(), Error<E>> {
    let mut raw = [0u8; 1];
    self.read_group(REG_CONTROL, &mut raw)?;
    self.image.control = Control(raw[0]);
    debug!("Read  {}", self.image.control);
    Ok(())
  }

  fn write_control(&mut self) -> Result<(), Error<E>> {
    self.write_group(REG_CONTROL, &[self.image.control.0])?;
    debug!("Write {}", self.image.control);
    Ok(())
  }

  fn read_status(&mut self) -> Result<(), Error<E>> {
    let mut raw = [0u8; 1];
    self.read_group(REG_STATUS, &mut raw)?;
    self.image.status = Status(raw[0]);
    debug!("Read  {}", self.image.status);
    Ok(())
  }

  fn write_status(&mut self) -> Result<(), Error<E>> {
    self.write_group(REG_STATUS, &[self.image.status.0])?;
    debug!("Write {}", self.image.status);
    Ok(())
  }

}

impl<I2C, E> DateTimeAccess for Ds3231<I2C>
  where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: fmt::Debug,
{
  type Error = Error<E>;

  /// Reads the time registers directly, without involving a host clock.
  /// Fails with `OscillatorStopped` if the chip has lost time since it was last set.
  fn datetime(&mut self) -> Result<NaiveDateTime, Self::Error> {
    self.ensure_operational()?;
    self.read_status()?;
    if self.image.status.oscillator_stopped() {
      return Err(Error::OscillatorStopped);
    }
    self.read_time_registers()?;
    self.image.time.to_datetime().ok_or(Error::InvalidDecodedTime)
  }

  /// Only datetimes from 2000 through 2099 can be stored
  fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), Self::Error> {
    self.ensure_operational()?;
    self.write_datetime(datetime)
  }

}
