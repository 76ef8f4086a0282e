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

//! Register map of the RV-3029-C2.
//!
//! Every addressable location is a variant of [`Register`]. The flag bits of
//! the control and status registers are available as raw masks in the
//! submodules named after each register, and as named booleans through the
//! register types generated for [`RegisterBits`].
//!
//! [`Register`]: enum.Register.html
//! [`RegisterBits`]: trait.RegisterBits.html

use std::fmt;

/// Number of addressable register locations (0x00 through 0x3F).
pub const REGISTER_COUNT: usize = 0x40;

/// Register addresses.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Register {
    Control1 = 0x00,
    InterruptControl = 0x01,
    InterruptFlags = 0x02,
    Status = 0x03,
    Reset = 0x04,

    Seconds = 0x08,
    Minutes = 0x09,
    Hours = 0x0A,
    Days = 0x0B,
    Weekdays = 0x0C,
    Months = 0x0D,
    Years = 0x0E,

    AlarmSeconds = 0x10,
    AlarmMinutes = 0x11,
    AlarmHours = 0x12,
    AlarmDays = 0x13,
    AlarmWeekdays = 0x14,
    AlarmMonths = 0x15,
    AlarmYears = 0x16,

    TimerLow = 0x18,
    TimerHigh = 0x19,

    Temperature = 0x20,

    UserEeprom0 = 0x28,
    UserEeprom1 = 0x29,

    EepromControl = 0x30,
    XtalOffset = 0x31,
    XtalCoefficient = 0x32,
    XtalT0 = 0x33,

    Ram0 = 0x38,
    Ram1 = 0x39,
    Ram2 = 0x3A,
    Ram3 = 0x3B,
    Ram4 = 0x3C,
    Ram5 = 0x3D,
    Ram6 = 0x3E,
    Ram7 = 0x3F,
}

impl Register {
    /// Returns the register's bus address.
    #[inline]
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Control 1 (0x00) bit masks.
pub mod control1 {
    pub const WE: u8 = 0x01;
    pub const TE: u8 = 0x02;
    pub const TAR: u8 = 0x04;
    pub const EERE: u8 = 0x08;
    pub const SRON: u8 = 0x10;
    pub const TD0: u8 = 0x20;
    pub const TD1: u8 = 0x40;
    pub const CLK_INT: u8 = 0x80;
}

/// Control INT (0x01) and Control INT Flag (0x02) bit masks.
///
/// Both registers share the same layout. Bits in Control INT enable an
/// interrupt source, the matching bits in Control INT Flag report it.
pub mod interrupt {
    pub const ALARM: u8 = 0x01;
    pub const TIMER: u8 = 0x02;
    pub const V1: u8 = 0x04;
    pub const V2: u8 = 0x08;
    pub const SYSTEM_RESET: u8 = 0x10;
}

/// Control Status (0x03) bit masks.
pub mod status {
    pub const V1F: u8 = 0x04;
    pub const V2F: u8 = 0x08;
    pub const SR: u8 = 0x10;
    pub const PON: u8 = 0x20;
    pub const EEBUSY: u8 = 0x80;
}

/// Control Reset (0x04) bit masks.
pub mod reset {
    pub const SYSR: u8 = 0x10;
}

/// EEPROM Control (0x30) bit masks.
pub mod eeprom_control {
    pub const THP: u8 = 0x01;
    pub const THE: u8 = 0x02;
    pub const FD0: u8 = 0x04;
    pub const FD1: u8 = 0x08;
    pub const R1K: u8 = 0x10;
    pub const R5K: u8 = 0x20;
    pub const R20K: u8 = 0x40;
    pub const R80K: u8 = 0x80;

    /// All trickle charge resistor selection bits.
    pub const TRICKLE_CHARGE: u8 = R1K | R5K | R20K | R80K;
    /// All clock output frequency selection bits.
    pub const CLOCK_OUT: u8 = FD0 | FD1;
}

/// Alarm enable bit, set in the alarm registers for fields that take part
/// in alarm matching.
pub const ALARM_ENABLE: u8 = 0x80;

/// A register whose flag bits can be accessed as named booleans.
pub trait RegisterBits: From<u8> + Into<u8> + Copy {
    /// The register this type is read from and written to.
    const REGISTER: Register;
}

register_bits! {
    /// Control 1 register.
    Control1: Register::Control1 {
        /// WE. Periodic clock-out gating.
        watch_enable = control1::WE,
        /// TE. Countdown timer is running.
        timer_enable = control1::TE,
        /// TAR. Countdown timer reloads after reaching zero.
        timer_auto_reload = control1::TAR,
        /// EERE. Automatic refresh of the configuration from EEPROM.
        eeprom_refresh_enable = control1::EERE,
        /// SROn. Self-recovery function.
        self_recovery = control1::SRON,
        timer_d0 = control1::TD0,
        timer_d1 = control1::TD1,
        /// CLK/INT. Routes the clock output to the CLKOUT pin.
        clock_out = control1::CLK_INT,
    }
}

register_bits! {
    /// Control INT register.
    InterruptControl: Register::InterruptControl {
        alarm = interrupt::ALARM,
        timer = interrupt::TIMER,
        voltage_low_1 = interrupt::V1,
        voltage_low_2 = interrupt::V2,
        system_reset = interrupt::SYSTEM_RESET,
    }
}

register_bits! {
    /// Control INT Flag register.
    InterruptFlags: Register::InterruptFlags {
        alarm = interrupt::ALARM,
        timer = interrupt::TIMER,
        voltage_low_1 = interrupt::V1,
        voltage_low_2 = interrupt::V2,
        system_reset = interrupt::SYSTEM_RESET,
    }
}

register_bits! {
    /// Control Status register.
    Status: Register::Status {
        /// V1F. Supply dropped below the temperature compensation threshold.
        voltage_low_1 = status::V1F,
        /// V2F. Supply dropped below the oscillator threshold. Time data
        /// can't be trusted.
        voltage_low_2 = status::V2F,
        /// SR. A system reset occurred.
        system_reset = status::SR,
        /// PON. A power-on reset occurred.
        power_on_reset = status::PON,
        /// EEbusy. An EEPROM transfer is in progress.
        eeprom_busy = status::EEBUSY,
    }
}

register_bits! {
    /// EEPROM Control register.
    EepromControl: Register::EepromControl {
        thermometer_period = eeprom_control::THP,
        thermometer_enable = eeprom_control::THE,
        clock_out_fd0 = eeprom_control::FD0,
        clock_out_fd1 = eeprom_control::FD1,
        trickle_charge_1k = eeprom_control::R1K,
        trickle_charge_5k = eeprom_control::R5K,
        trickle_charge_20k = eeprom_control::R20K,
        trickle_charge_80k = eeprom_control::R80K,
    }
}

impl Status {
    /// Returns `true` if either voltage-low flag is set.
    pub fn voltage_low(&self) -> bool {
        self.voltage_low_1 || self.voltage_low_2
    }
}

/// Contents of every register location, as returned by [`dump_registers`].
///
/// Locations that couldn't be read are `None`.
///
/// [`dump_registers`]: ../struct.Rv3029.html#method.dump_registers
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RegisterDump {
    values: [Option<u8>; REGISTER_COUNT],
}

impl RegisterDump {
    pub(crate) fn new(values: [Option<u8>; REGISTER_COUNT]) -> RegisterDump {
        RegisterDump { values }
    }

    /// Returns the value read from `address`, or `None` if it was unreadable
    /// or lies outside the register map.
    pub fn get(&self, address: u8) -> Option<u8> {
        self.values.get(address as usize).copied().flatten()
    }

    /// Returns all entries, indexed by address.
    pub fn values(&self) -> &[Option<u8>] {
        &self.values
    }
}

// 8 registers per row, prefixed with the address of the first entry.
impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.values.chunks(8).enumerate() {
            write!(f, "{:02x}:", row * 8)?;
            for value in chunk {
                match value {
                    Some(value) => write!(f, " {:02X}", value)?,
                    None => write!(f, " --")?,
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
