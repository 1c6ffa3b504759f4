//! Alarm and square-wave configuration types

/// Selects one of the two hardware alarms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmNumber {
  Alarm1,
  Alarm2,
}

/// Alarm configuration bitmask.
///
/// - bits 0..=3: the M1..M4 match bits, copied verbatim into the alarm registers.
///   A set Mx bit means the corresponding field (second, minute, hour, day) is ignored.
/// - bit 4: day mode, set when `day` is a day of week rather than a day of month
/// - bit 6: enable the alarm interrupt on the INT/SQW pin
/// - bit 7: target alarm 2 rather than alarm 1
///
/// The associated constants cover every combination the hardware supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmType(pub u8);

impl AlarmType {
  pub const M1: u8 = 0x01;
  pub const M2: u8 = 0x02;
  pub const M3: u8 = 0x04;
  pub const M4: u8 = 0x08;
  pub const DAY_MODE: u8 = 0x10;
  pub const INTERRUPT: u8 = 0x40;
  pub const ALARM_NUMBER: u8 = 0x80;

  pub const ALARM_1_EVERY_SECOND: Self = Self(0x0F);
  pub const ALARM_1_EVERY_SECOND_WITH_INTERRUPT: Self = Self(0x4F);
  pub const ALARM_1_MATCH_SECOND: Self = Self(0x0E);
  pub const ALARM_1_MATCH_SECOND_WITH_INTERRUPT: Self = Self(0x4E);
  pub const ALARM_1_MATCH_MINUTE_SECOND: Self = Self(0x0C);
  pub const ALARM_1_MATCH_MINUTE_SECOND_WITH_INTERRUPT: Self = Self(0x4C);
  pub const ALARM_1_MATCH_HOUR_MINUTE_SECOND: Self = Self(0x08);
  pub const ALARM_1_MATCH_HOUR_MINUTE_SECOND_WITH_INTERRUPT: Self = Self(0x48);
  pub const ALARM_1_MATCH_DAY_OF_MONTH_HOUR_MINUTE_SECOND: Self = Self(0x00);
  pub const ALARM_1_MATCH_DAY_OF_MONTH_HOUR_MINUTE_SECOND_WITH_INTERRUPT: Self = Self(0x40);
  pub const ALARM_1_MATCH_DAY_OF_WEEK_HOUR_MINUTE_SECOND: Self = Self(0x10);
  pub const ALARM_1_MATCH_DAY_OF_WEEK_HOUR_MINUTE_SECOND_WITH_INTERRUPT: Self = Self(0x50);
  pub const ALARM_2_EVERY_MINUTE: Self = Self(0x8E);
  pub const ALARM_2_EVERY_MINUTE_WITH_INTERRUPT: Self = Self(0xCE);
  pub const ALARM_2_MATCH_MINUTE: Self = Self(0x8C);
  pub const ALARM_2_MATCH_MINUTE_WITH_INTERRUPT: Self = Self(0xCC);
  pub const ALARM_2_MATCH_HOUR_MINUTE: Self = Self(0x88);
  pub const ALARM_2_MATCH_HOUR_MINUTE_WITH_INTERRUPT: Self = Self(0xC8);
  pub const ALARM_2_MATCH_DAY_OF_MONTH_HOUR_MINUTE: Self = Self(0x80);
  pub const ALARM_2_MATCH_DAY_OF_MONTH_HOUR_MINUTE_WITH_INTERRUPT: Self = Self(0xC0);
  pub const ALARM_2_MATCH_DAY_OF_WEEK_HOUR_MINUTE: Self = Self(0x90);
  pub const ALARM_2_MATCH_DAY_OF_WEEK_HOUR_MINUTE_WITH_INTERRUPT: Self = Self(0xD0);

  /// Assemble an alarm type from its individual flags
  pub fn from_parts(alarm2: bool, m1: bool, m2: bool, m3: bool, m4: bool,
                    day_mode: bool, interrupt: bool) -> Self {
    let flags = [
      (alarm2, Self::ALARM_NUMBER),
      (m1, Self::M1),
      (m2, Self::M2),
      (m3, Self::M3),
      (m4, Self::M4),
      (day_mode, Self::DAY_MODE),
      (interrupt, Self::INTERRUPT),
    ];
    Self(flags.iter().filter(|(set, _)| *set).fold(0, |acc, (_, bit)| acc | bit))
  }

  pub fn alarm_number(&self) -> AlarmNumber {
    if self.has(Self::ALARM_NUMBER) { AlarmNumber::Alarm2 } else { AlarmNumber::Alarm1 }
  }

  pub fn m1(&self) -> bool { self.has(Self::M1) }
  pub fn m2(&self) -> bool { self.has(Self::M2) }
  pub fn m3(&self) -> bool { self.has(Self::M3) }
  pub fn m4(&self) -> bool { self.has(Self::M4) }
  pub fn day_mode(&self) -> bool { self.has(Self::DAY_MODE) }
  pub fn interrupt(&self) -> bool { self.has(Self::INTERRUPT) }

  /// Same alarm with the interrupt flag set or cleared
  pub fn with_interrupt(self, enable: bool) -> Self {
    if enable { Self(self.0 | Self::INTERRUPT) } else { Self(self.0 & !Self::INTERRUPT) }
  }

  fn has(&self, bits: u8) -> bool {
    0 != (self.0 & bits)
  }
}

/// An alarm as read back from the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSetting {
  pub alarm_type: AlarmType,
  /// Always 0 for alarm 2, which fires on second 00
  pub second: u8,
  pub minute: u8,
  pub hour: u8,
  /// Day of month, or day of week when `alarm_type.day_mode()` is set
  pub day: u8,
}

/// What the INT/SQW pin outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareWaveMode {
  /// 1 Hz square wave
  Rate1Hz,
  /// 1.024 kHz square wave
  Rate1024Hz,
  /// 4.096 kHz square wave
  Rate4096Hz,
  /// 8.192 kHz square wave
  Rate8192Hz,
  /// Active-low alarm interrupt output
  AlarmInterrupt,
}

impl SquareWaveMode {
  /// The RS2:RS1 control field value, or `None` for interrupt mode
  pub fn rate_bits(&self) -> Option<u8> {
    match self {
      SquareWaveMode::Rate1Hz => Some(0b00),
      SquareWaveMode::Rate1024Hz => Some(0b01),
      SquareWaveMode::Rate4096Hz => Some(0b10),
      SquareWaveMode::Rate8192Hz => Some(0b11),
      SquareWaveMode::AlarmInterrupt => None,
    }
  }
}
