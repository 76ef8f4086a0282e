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

//! Device facade.
//!
//! [`Rv3029`] owns the bus transport and the delay provider, and keeps track
//! of the last time read from or written to the device, together with
//! whether that time can be trusted.
//!
//! Call [`begin`] once after power-up. It disables all interrupt sources,
//! and checks the status register for a power loss. If the clock lost its
//! time, the power-loss flags are acknowledged and [`is_valid`] returns
//! `false` until the time is set again. Otherwise the current time is read.
//!
//! Configuration stored in the EEPROM-backed control register (trickle
//! charge and clock output frequency) is only rewritten when the requested
//! setting differs from the current one.
//!
//! [`Rv3029`]: struct.Rv3029.html
//! [`begin`]: struct.Rv3029.html#method.begin
//! [`is_valid`]: struct.Rv3029.html#method.is_valid

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::eeprom;
use crate::error::{Accumulator, Error, Result};
use crate::interface::Transport;
use crate::power::{self, ValidityLatch};
use crate::register::{
    eeprom_control, Control1, EepromControl, InterruptControl, InterruptFlags, Register,
    RegisterDump, REGISTER_COUNT,
};
use crate::time::{self, AlarmFields, CalendarTime, BLOCK_LEN};

/// Offset subtracted from the raw temperature register value to get degrees
/// Celsius.
pub const TEMPERATURE_OFFSET: i16 = 60;

/// Returned by [`temperature`] when the temperature register can't be read.
///
/// [`temperature`]: struct.Rv3029.html#method.temperature
pub const TEMPERATURE_UNAVAILABLE: i16 = -999;

/// Number of user RAM bytes.
pub const USER_RAM_LEN: usize = 8;

/// Number of user EEPROM bytes.
pub const USER_EEPROM_LEN: usize = 2;

/// Countdown timer source clock frequencies.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum TimerFrequency {
    /// 0.5 Hz.
    Hz0_5,
    /// 1 Hz.
    Hz1,
    /// 8 Hz.
    Hz8,
    /// 32 Hz.
    Hz32,
}

impl TimerFrequency {
    // TD0 and TD1 in Control 1.
    fn bits(self) -> (bool, bool) {
        match self {
            TimerFrequency::Hz0_5 => (true, true),
            TimerFrequency::Hz1 => (false, true),
            TimerFrequency::Hz8 => (true, false),
            TimerFrequency::Hz32 => (false, false),
        }
    }
}

/// Trickle charge series resistors.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum TrickleResistor {
    /// 1 kΩ.
    R1k,
    /// 5 kΩ.
    R5k,
    /// 20 kΩ.
    R20k,
    /// 80 kΩ.
    R80k,
}

impl TrickleResistor {
    fn bits(self) -> u8 {
        match self {
            TrickleResistor::R1k => eeprom_control::R1K,
            TrickleResistor::R5k => eeprom_control::R5K,
            TrickleResistor::R20k => eeprom_control::R20K,
            TrickleResistor::R80k => eeprom_control::R80K,
        }
    }
}

/// Clock output frequencies.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ClockOutFrequency {
    /// 1 Hz.
    Hz1,
    /// 32 Hz.
    Hz32,
    /// 1024 Hz.
    Hz1024,
    /// 32768 Hz.
    Hz32768,
}

impl ClockOutFrequency {
    fn bits(self) -> u8 {
        match self {
            ClockOutFrequency::Hz1 => eeprom_control::FD0 | eeprom_control::FD1,
            ClockOutFrequency::Hz32 => eeprom_control::FD1,
            ClockOutFrequency::Hz1024 => eeprom_control::FD0,
            ClockOutFrequency::Hz32768 => 0,
        }
    }
}

/// Driver for the RV-3029-C2 real-time clock.
///
/// `T` provides register access, usually an [`I2cInterface`]. `D` is used
/// for the short blocking waits in the power-loss acknowledgement and the
/// EEPROM write sequence.
///
/// The driver assumes exclusive access to the device. Multi-step sequences
/// aren't guarded against concurrent access through a shared bus.
///
/// [`I2cInterface`]: struct.I2cInterface.html
#[derive(Debug)]
pub struct Rv3029<T, D> {
    bus: T,
    delay: D,
    time: CalendarTime,
    validity: ValidityLatch,
}

impl<T, D> Rv3029<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Constructs a new `Rv3029`.
    ///
    /// No bus traffic takes place until [`begin`] or any other method is
    /// called. The time is considered invalid until it has been read or set.
    ///
    /// [`begin`]: #method.begin
    pub fn new(bus: T, delay: D) -> Rv3029<T, D> {
        Rv3029 {
            bus,
            delay,
            time: CalendarTime::default(),
            validity: ValidityLatch::new(),
        }
    }

    /// Consumes the `Rv3029`, and returns the transport and delay provider.
    pub fn release(self) -> (T, D) {
        (self.bus, self.delay)
    }

    /// Initializes the device.
    ///
    /// Disables and clears all interrupts, then reads the status register.
    /// If a power-on reset, system reset or oscillator voltage drop was
    /// detected, the time is marked invalid and the power-loss flags are
    /// acknowledged. Otherwise the current time is read.
    ///
    /// A failed status read aborts immediately. Every step of the
    /// acknowledgement is attempted even if an earlier one fails.
    pub fn begin(&mut self) -> Result<(), T::Error> {
        let status = power::disable_interrupts_and_read_status(&mut self.bus)?;

        if power::power_lost(&status) {
            self.validity.invalidate();
            power::acknowledge_power_loss(&mut self.bus, &mut self.delay, status)
        } else {
            self.update_time().map(|_| ())
        }
    }

    /// Returns `true` if the last known time can be trusted.
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Returns the last known time.
    ///
    /// This doesn't access the device. Call [`update_time`] first to read
    /// the current time.
    ///
    /// [`update_time`]: #method.update_time
    pub fn time(&self) -> CalendarTime {
        self.time
    }

    /// Reads the current time from the device.
    ///
    /// If the time was considered invalid, and the value read is plausible,
    /// it's considered valid from now on.
    pub fn update_time(&mut self) -> Result<CalendarTime, T::Error> {
        let mut block = [0u8; BLOCK_LEN];
        self.bus
            .read_registers(Register::Seconds.addr(), &mut block)?;

        let time = time::decode(&block);
        self.time = time;
        self.validity.observe_read(&time);

        Ok(time)
    }

    /// Sets the current time.
    ///
    /// The weekday is derived from the date, and `time.weekday` is ignored.
    /// All seven clock registers are written in a single transaction. On
    /// success, the time is considered valid.
    pub fn set_time(&mut self, time: &CalendarTime) -> Result<(), T::Error> {
        let block = time::encode_clock(time);
        self.bus
            .write_registers(Register::Seconds.addr(), &block)?;

        self.time = time.with_weekday(time::weekday(time.year, time.month, time.day));
        self.validity.observe_write();
        debug!("RTC time set to {:?}", self.time);

        Ok(())
    }

    /// Sets the alarm.
    ///
    /// Only the fields in `fields` are compared against the current time.
    /// Unlike [`set_time`], `time.weekday` is stored as is, so the alarm can
    /// match a weekday that differs from the one the date falls on.
    ///
    /// [`set_time`]: #method.set_time
    pub fn set_alarm(&mut self, time: &CalendarTime, fields: AlarmFields) -> Result<(), T::Error> {
        let block = time::encode_alarm(time, fields);
        self.bus
            .write_registers(Register::AlarmSeconds.addr(), &block)?;

        Ok(())
    }

    /// Reads the alarm, and returns the alarm time together with the fields
    /// taking part in alarm matching.
    pub fn alarm(&mut self) -> Result<(CalendarTime, AlarmFields), T::Error> {
        let mut block = [0u8; BLOCK_LEN];
        self.bus
            .read_registers(Register::AlarmSeconds.addr(), &mut block)?;

        Ok(time::decode_alarm(&block))
    }

    /// Enables the alarm interrupt.
    pub fn enable_alarm_interrupt(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|interrupt: &mut InterruptControl| interrupt.alarm = true)?;

        Ok(())
    }

    /// Disables the alarm interrupt.
    pub fn disable_alarm_interrupt(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|interrupt: &mut InterruptControl| interrupt.alarm = false)?;

        Ok(())
    }

    /// Returns `true` if the alarm triggered.
    pub fn alarm_interrupt_flag(&mut self) -> Result<bool, T::Error> {
        Ok(self.bus.read_bits::<InterruptFlags>()?.alarm)
    }

    /// Clears the alarm interrupt flag.
    pub fn clear_alarm_interrupt_flag(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|flags: &mut InterruptFlags| flags.alarm = false)?;

        Ok(())
    }

    /// Configures the countdown timer.
    ///
    /// The timer, its interrupt and its interrupt flag are disabled and
    /// cleared first. `value` is written to both timer registers in a single
    /// transaction. If `repeat` is `true`, the timer reloads `value` each
    /// time it reaches zero. `interrupt` enables the timer interrupt, and
    /// `start` starts the timer.
    ///
    /// Every step is attempted even if an earlier one fails.
    pub fn set_timer(
        &mut self,
        value: u16,
        frequency: TimerFrequency,
        repeat: bool,
        interrupt: bool,
        start: bool,
    ) -> Result<(), T::Error> {
        let mut outcome: Accumulator<T::Error> = Accumulator::new();

        outcome.record(self.disable_timer());
        outcome.record(self.disable_timer_interrupt());
        outcome.record(self.clear_timer_interrupt_flag());

        outcome.record(
            self.bus
                .write_registers(Register::TimerLow.addr(), &value.to_le_bytes())
                .map_err(Error::Bus),
        );

        let (d0, d1) = frequency.bits();
        outcome.record(
            self.bus
                .modify_bits(|control: &mut Control1| {
                    control.timer_auto_reload = repeat;
                    control.timer_d0 = d0;
                    control.timer_d1 = d1;
                    if start {
                        control.timer_enable = true;
                    }
                })
                .map_err(Error::Bus),
        );

        if interrupt {
            outcome.record(self.enable_timer_interrupt());
        }

        outcome.finish()
    }

    /// Starts the countdown timer.
    pub fn enable_timer(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|control: &mut Control1| control.timer_enable = true)?;

        Ok(())
    }

    /// Stops the countdown timer.
    pub fn disable_timer(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|control: &mut Control1| control.timer_enable = false)?;

        Ok(())
    }

    /// Enables the timer interrupt.
    pub fn enable_timer_interrupt(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|interrupt: &mut InterruptControl| interrupt.timer = true)?;

        Ok(())
    }

    /// Disables the timer interrupt.
    pub fn disable_timer_interrupt(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|interrupt: &mut InterruptControl| interrupt.timer = false)?;

        Ok(())
    }

    /// Returns `true` if the countdown timer reached zero.
    pub fn timer_interrupt_flag(&mut self) -> Result<bool, T::Error> {
        Ok(self.bus.read_bits::<InterruptFlags>()?.timer)
    }

    /// Clears the timer interrupt flag.
    pub fn clear_timer_interrupt_flag(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|flags: &mut InterruptFlags| flags.timer = false)?;

        Ok(())
    }

    /// Reads the temperature in degrees Celsius.
    pub fn read_temperature(&mut self) -> Result<i16, T::Error> {
        let raw = self.bus.read_register(Register::Temperature.addr())?;

        Ok(i16::from(raw) - TEMPERATURE_OFFSET)
    }

    /// Reads the temperature in degrees Celsius.
    ///
    /// Returns [`TEMPERATURE_UNAVAILABLE`] if the temperature register can't
    /// be read.
    ///
    /// [`TEMPERATURE_UNAVAILABLE`]: constant.TEMPERATURE_UNAVAILABLE.html
    pub fn temperature(&mut self) -> i16 {
        self.read_temperature()
            .unwrap_or(TEMPERATURE_UNAVAILABLE)
    }

    /// Enables the trickle charger for the backup supply, using the
    /// specified series resistor.
    pub fn enable_trickle_charge(&mut self, resistor: TrickleResistor) -> Result<(), T::Error> {
        eeprom::update_control(
            &mut self.bus,
            &mut self.delay,
            eeprom_control::TRICKLE_CHARGE,
            resistor.bits(),
        )
    }

    /// Disables the trickle charger.
    pub fn disable_trickle_charge(&mut self) -> Result<(), T::Error> {
        eeprom::update_control(
            &mut self.bus,
            &mut self.delay,
            eeprom_control::TRICKLE_CHARGE,
            0,
        )
    }

    /// Routes the clock output to the CLKOUT pin at the specified frequency.
    ///
    /// Both steps are attempted even if the first one fails.
    pub fn enable_clock_out(&mut self, frequency: ClockOutFrequency) -> Result<(), T::Error> {
        let mut outcome: Accumulator<T::Error> = Accumulator::new();

        outcome.record(
            self.bus
                .modify_bits(|control: &mut Control1| control.clock_out = true)
                .map_err(Error::Bus),
        );
        outcome.record(eeprom::update_control(
            &mut self.bus,
            &mut self.delay,
            eeprom_control::CLOCK_OUT,
            frequency.bits(),
        ));

        outcome.finish()
    }

    /// Disconnects the clock output from the CLKOUT pin.
    ///
    /// The selected frequency is left unchanged.
    pub fn disable_clock_out(&mut self) -> Result<(), T::Error> {
        self.bus
            .modify_bits(|control: &mut Control1| control.clock_out = false)?;

        Ok(())
    }

    /// Reads the EEPROM control register.
    pub fn eeprom_control(&mut self) -> Result<EepromControl, T::Error> {
        Ok(self.bus.read_bits()?)
    }

    /// Reads the user RAM.
    pub fn read_user_ram(&mut self) -> Result<[u8; USER_RAM_LEN], T::Error> {
        let mut buffer = [0u8; USER_RAM_LEN];
        self.bus.read_registers(Register::Ram0.addr(), &mut buffer)?;

        Ok(buffer)
    }

    /// Writes the user RAM in a single transaction.
    ///
    /// The user RAM is volatile, and loses its contents when both the main
    /// and backup supply fail.
    pub fn write_user_ram(&mut self, values: &[u8; USER_RAM_LEN]) -> Result<(), T::Error> {
        self.bus.write_registers(Register::Ram0.addr(), values)?;

        Ok(())
    }

    /// Reads the user EEPROM.
    pub fn read_user_eeprom(&mut self) -> Result<[u8; USER_EEPROM_LEN], T::Error> {
        let mut buffer = [0u8; USER_EEPROM_LEN];
        self.bus
            .read_registers(Register::UserEeprom0.addr(), &mut buffer)?;

        Ok(buffer)
    }

    /// Writes the user EEPROM.
    ///
    /// Each byte that differs from its current value is written through the
    /// EEPROM write sequence. Unchanged bytes aren't rewritten. Both bytes
    /// are attempted even if the first write fails.
    pub fn write_user_eeprom(&mut self, values: &[u8; USER_EEPROM_LEN]) -> Result<(), T::Error> {
        let current = self.read_user_eeprom()?;
        let registers = [Register::UserEeprom0, Register::UserEeprom1];

        let mut outcome: Accumulator<T::Error> = Accumulator::new();
        for ((register, value), current) in registers.iter().zip(values).zip(current.iter()) {
            if value == current {
                debug!("{:?} already set to {:#04x}, skipping write", register, value);
                continue;
            }

            outcome.record(eeprom::write(
                &mut self.bus,
                &mut self.delay,
                *register,
                *value,
            ));
        }

        outcome.finish()
    }

    /// Reads every register location from 0x00 through 0x3F.
    ///
    /// Locations that can't be read show up as `None`. The dump doesn't stop
    /// at the first failure.
    pub fn dump_registers(&mut self) -> RegisterDump {
        let mut values = [None; REGISTER_COUNT];

        for (address, value) in values.iter_mut().enumerate() {
            *value = self.bus.read_register(address as u8).ok();
            if value.is_none() {
                debug!("Register {:#04x} unreadable", address);
            }
        }

        RegisterDump::new(values)
    }
}
