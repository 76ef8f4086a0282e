// Copyright (c) 2017-2021 Rene van der Meer
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Calendar time and the 7-byte time register block.
//!
//! The clock registers (0x08-0x0E) and the alarm registers (0x10-0x16) share
//! the same layout: seconds, minutes, hours, day of month, weekday, month and
//! year, each stored as packed BCD. In the alarm registers, bit 7 of each
//! byte enables matching on that field.
//!
//! Only the 24-hour mode is supported. Years are stored as an offset from
//! [`EPOCH_YEAR`].
//!
//! [`EPOCH_YEAR`]: constant.EPOCH_YEAR.html

use std::ops::{BitOr, BitOrAssign};

use crate::bcd;
use crate::register::ALARM_ENABLE;

/// Number of registers in a time block.
pub const BLOCK_LEN: usize = 7;

/// First year of the 100-year range the year register covers.
pub const EPOCH_YEAR: u16 = 2000;

// Position of each field within a time block.
const SECONDS: usize = 0;
const MINUTES: usize = 1;
const HOURS: usize = 2;
const DAY: usize = 3;
const WEEKDAY: usize = 4;
const MONTH: usize = 5;
const YEAR: usize = 6;

// The upper two bits of the hours register select 12-hour mode and AM/PM.
const HOURS_MASK: u8 = 0x3F;

/// A calendar date and time of day.
///
/// `month` starts at 1, `weekday` starts at 0 for Sunday, and `year` holds
/// all four digits.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct CalendarTime {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub day: u8,
    pub month: u8,
    pub year: u16,
    pub weekday: u8,
}

impl CalendarTime {
    /// Constructs a new `CalendarTime`, and derives its weekday from the date.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> CalendarTime {
        CalendarTime {
            seconds,
            minutes,
            hours,
            day,
            month,
            year,
            weekday: weekday(year, month, day),
        }
    }

    /// Returns a copy with `weekday` replaced.
    ///
    /// Only useful for alarms. Time written to the clock registers always
    /// gets its weekday derived from the date.
    pub fn with_weekday(self, weekday: u8) -> CalendarTime {
        CalendarTime { weekday, ..self }
    }

    /// Returns `true` if the year lies after 2020 and every field is within
    /// its calendar range.
    ///
    /// The weekday isn't checked, and neither is the number of days in the
    /// month.
    pub fn is_plausible(&self) -> bool {
        self.year > 2020
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hours <= 23
            && self.minutes <= 59
            && self.seconds <= 59
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDateTime> for CalendarTime {
    fn from(datetime: chrono::NaiveDateTime) -> CalendarTime {
        use chrono::{Datelike, Timelike};

        CalendarTime::new(
            datetime.year() as u16,
            datetime.month() as u8,
            datetime.day() as u8,
            datetime.hour() as u8,
            datetime.minute() as u8,
            datetime.second() as u8,
        )
    }
}

#[cfg(feature = "chrono")]
impl CalendarTime {
    /// Converts to a `chrono::NaiveDateTime`.
    ///
    /// Returns `None` if the fields don't form a valid date and time.
    pub fn to_naive_date_time(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDate::from_ymd_opt(i32::from(self.year), self.month.into(), self.day.into())?
            .and_hms_opt(
                self.hours.into(),
                self.minutes.into(),
                self.seconds.into(),
            )
    }
}

/// Set of time fields that have to match for the alarm to trigger.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct AlarmFields(u8);

impl AlarmFields {
    pub const NONE: AlarmFields = AlarmFields(0x00);
    pub const SECONDS: AlarmFields = AlarmFields(0x01);
    pub const MINUTES: AlarmFields = AlarmFields(0x02);
    pub const HOURS: AlarmFields = AlarmFields(0x04);
    pub const DAY: AlarmFields = AlarmFields(0x08);
    pub const WEEKDAY: AlarmFields = AlarmFields(0x10);
    pub const MONTH: AlarmFields = AlarmFields(0x20);
    pub const YEAR: AlarmFields = AlarmFields(0x40);
    pub const ALL: AlarmFields = AlarmFields(0x7F);

    /// Returns `true` if every field in `other` is also in `self`.
    pub fn contains(self, other: AlarmFields) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns `true` if no fields are selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw bitmask.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for AlarmFields {
    type Output = AlarmFields;

    fn bitor(self, rhs: AlarmFields) -> AlarmFields {
        AlarmFields(self.0 | rhs.0)
    }
}

impl BitOrAssign for AlarmFields {
    fn bitor_assign(&mut self, rhs: AlarmFields) {
        self.0 |= rhs.0;
    }
}

// Pairs each alarm field with its position in the time block.
const ALARM_FIELD_POSITIONS: [(AlarmFields, usize); BLOCK_LEN] = [
    (AlarmFields::SECONDS, SECONDS),
    (AlarmFields::MINUTES, MINUTES),
    (AlarmFields::HOURS, HOURS),
    (AlarmFields::DAY, DAY),
    (AlarmFields::WEEKDAY, WEEKDAY),
    (AlarmFields::MONTH, MONTH),
    (AlarmFields::YEAR, YEAR),
];

/// Returns the day of the week for a Gregorian calendar date, with 0 for
/// Sunday through 6 for Saturday.
///
/// `month` starts at 1.
pub fn weekday(year: u16, month: u8, day: u8) -> u8 {
    // Sakamoto's method.
    const OFFSETS: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

    let month = month.clamp(1, 12);
    let year = if month < 3 {
        year.saturating_sub(1)
    } else {
        year
    };

    let days = u32::from(year) + u32::from(year / 4) - u32::from(year / 100)
        + u32::from(year / 400)
        + u32::from(OFFSETS[usize::from(month - 1)])
        + u32::from(day);

    (days % 7) as u8
}

fn pack(time: &CalendarTime, weekday: u8, fields: AlarmFields) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];

    block[SECONDS] = bcd::to_bcd(time.seconds);
    block[MINUTES] = bcd::to_bcd(time.minutes);
    block[HOURS] = bcd::to_bcd(time.hours);
    block[DAY] = bcd::to_bcd(time.day);
    // The weekday register counts from 1.
    block[WEEKDAY] = bcd::to_bcd(weekday.wrapping_add(1));
    block[MONTH] = bcd::to_bcd(time.month);
    block[YEAR] = bcd::to_bcd((time.year % 100) as u8);

    for (field, position) in ALARM_FIELD_POSITIONS.iter() {
        if fields.contains(*field) {
            block[*position] |= ALARM_ENABLE;
        }
    }

    block
}

/// Encodes `time` for the clock registers.
///
/// The weekday stored in the block is derived from the date. `time.weekday`
/// is ignored.
pub fn encode_clock(time: &CalendarTime) -> [u8; BLOCK_LEN] {
    pack(time, weekday(time.year, time.month, time.day), AlarmFields::NONE)
}

/// Encodes `time` for the alarm registers, and sets the alarm enable bit
/// for every field in `fields`.
///
/// Unlike [`encode_clock`], the weekday is taken from `time.weekday` as is.
///
/// [`encode_clock`]: fn.encode_clock.html
pub fn encode_alarm(time: &CalendarTime, fields: AlarmFields) -> [u8; BLOCK_LEN] {
    pack(time, time.weekday, fields)
}

/// Decodes a block read from the clock registers.
pub fn decode(block: &[u8; BLOCK_LEN]) -> CalendarTime {
    CalendarTime {
        seconds: bcd::to_binary(block[SECONDS]),
        minutes: bcd::to_binary(block[MINUTES]),
        hours: bcd::to_binary(block[HOURS] & HOURS_MASK),
        day: bcd::to_binary(block[DAY]),
        month: bcd::to_binary(block[MONTH]),
        year: EPOCH_YEAR + u16::from(bcd::to_binary(block[YEAR])),
        weekday: bcd::to_binary(block[WEEKDAY]).saturating_sub(1),
    }
}

/// Decodes a block read from the alarm registers, and returns the time
/// together with the fields that have their alarm enable bit set.
pub fn decode_alarm(block: &[u8; BLOCK_LEN]) -> (CalendarTime, AlarmFields) {
    let mut fields = AlarmFields::NONE;
    let mut stripped = *block;

    for (field, position) in ALARM_FIELD_POSITIONS.iter() {
        if stripped[*position] & ALARM_ENABLE != 0 {
            fields |= *field;
            stripped[*position] &= !ALARM_ENABLE;
        }
    }

    (decode(&stripped), fields)
}
