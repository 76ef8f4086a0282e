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

//! EEPROM write sequence.
//!
//! The EEPROM control register and the user EEPROM bytes are backed by
//! nonvolatile memory. Writing them takes four phases:
//!
//! 1. Enter: check the supply voltage, then clear the EERE bit to disable
//!    automatic refresh and wait until the EEPROM isn't busy.
//! 2. Write the target register.
//! 3. Wait until the EEPROM transfer completes.
//! 4. Exit: set the EERE bit again.
//!
//! The exit phase always runs, so the device isn't left with automatic
//! refresh disabled after a failed write.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::error::{Accumulator, Error, Result, Stage};
use crate::interface::Transport;
use crate::register::{Control1, Register, Status};

/// Maximum number of times the EEPROM busy flag is polled.
pub const BUSY_POLL_LIMIT: u32 = 100;

/// Delay between two polls of the EEPROM busy flag, in milliseconds.
pub const BUSY_POLL_INTERVAL_MS: u32 = 1;

/// Polls the EEPROM busy flag until it clears.
///
/// Returns `Err(Error::Timeout(Stage::BusyWait))` if the flag is still set
/// after [`BUSY_POLL_LIMIT`] polls.
///
/// [`BUSY_POLL_LIMIT`]: constant.BUSY_POLL_LIMIT.html
pub fn busy_wait<T, D>(bus: &mut T, delay: &mut D) -> Result<(), T::Error>
where
    T: Transport,
    D: DelayNs,
{
    for _ in 0..BUSY_POLL_LIMIT {
        let status: Status = bus.read_bits()?;
        if !status.eeprom_busy {
            return Ok(());
        }

        delay.delay_ms(BUSY_POLL_INTERVAL_MS);
    }

    warn!(
        "EEPROM still busy after {} polls, giving up",
        BUSY_POLL_LIMIT
    );

    Err(Error::Timeout(Stage::BusyWait))
}

/// Prepares the device for a direct EEPROM write.
///
/// If a voltage-low flag is set, both flags are cleared and the status is
/// checked once more, since the flag may be left over from an earlier
/// brownout. A flag that's still set results in
/// `Err(Error::Timeout(Stage::BrownoutRecovery))`.
pub fn enter<T, D>(bus: &mut T, delay: &mut D) -> Result<(), T::Error>
where
    T: Transport,
    D: DelayNs,
{
    let mut status: Status = bus.read_bits()?;

    if status.voltage_low() {
        debug!("Voltage-low flag set before EEPROM access, clearing and checking again");

        status.voltage_low_1 = false;
        status.voltage_low_2 = false;
        bus.write_bits(status)?;
        status = bus.read_bits()?;

        if status.voltage_low() {
            warn!("Supply voltage too low for EEPROM access");
            return Err(Error::Timeout(Stage::BrownoutRecovery));
        }
    }

    bus.modify_bits(|control: &mut Control1| control.eeprom_refresh_enable = false)?;

    busy_wait(bus, delay)
}

/// Re-enables automatic EEPROM refresh.
pub fn exit<T: Transport>(bus: &mut T) -> Result<(), T::Error> {
    bus.modify_bits(|control: &mut Control1| control.eeprom_refresh_enable = true)?;

    Ok(())
}

/// Writes `value` to the EEPROM-backed `register`.
///
/// A failed enter phase skips the write itself. The exit phase runs
/// regardless, and the first error encountered is returned.
pub fn write<T, D>(bus: &mut T, delay: &mut D, register: Register, value: u8) -> Result<(), T::Error>
where
    T: Transport,
    D: DelayNs,
{
    let mut outcome: Accumulator<T::Error> = Accumulator::new();

    match enter(bus, delay) {
        Ok(()) => {
            outcome.record(
                bus.write_register(register.addr(), value)
                    .map_err(Error::Bus),
            );
            outcome.record(busy_wait(bus, delay));
        }
        Err(err) => outcome.record::<()>(Err(err)),
    }

    outcome.record(exit(bus));

    outcome.finish()
}

/// Updates the EEPROM control register.
///
/// Clears the bits in `clear`, then sets the bits in `set`. The write
/// sequence only runs if the resulting value differs from the current one.
pub fn update_control<T, D>(bus: &mut T, delay: &mut D, clear: u8, set: u8) -> Result<(), T::Error>
where
    T: Transport,
    D: DelayNs,
{
    let current = bus.read_register(Register::EepromControl.addr())?;
    let updated = (current & !clear) | set;

    if updated == current {
        debug!(
            "EEPROM control already set to {:#04x}, skipping write",
            current
        );
        return Ok(());
    }

    write(bus, delay, Register::EepromControl, updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::fake::{BusFault, FakeBus, Op};
    use crate::register::{control1, eeprom_control, status};

    const STATUS: u8 = 0x03;
    const CONTROL1: u8 = 0x00;
    const EEPROM_CONTROL: u8 = 0x30;

    fn bus() -> FakeBus {
        let bus = FakeBus::new();
        bus.set(Register::Control1, control1::EERE);
        bus
    }

    #[test]
    fn busy_flag_clears_after_three_polls() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.queue_status(&[status::EEBUSY, status::EEBUSY, status::EEBUSY, 0x00]);

        busy_wait(&mut bus, &mut delay).unwrap();
        assert_eq!(bus.delays(), 3);
        assert_eq!(bus.log().len(), 7);
    }

    #[test]
    fn busy_flag_never_clears() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.set(Register::Status, status::EEBUSY);

        assert_eq!(
            busy_wait(&mut bus, &mut delay),
            Err(Error::Timeout(Stage::BusyWait))
        );
        assert_eq!(bus.delays(), BUSY_POLL_LIMIT as usize);
    }

    #[test]
    fn write_sequence() {
        let mut bus = bus();
        let mut delay = bus.delay();

        write(&mut bus, &mut delay, Register::UserEeprom1, 0x42).unwrap();
        assert_eq!(
            bus.log(),
            vec![
                // Enter
                Op::Read(STATUS),
                Op::Read(CONTROL1),
                Op::Write(CONTROL1, 0x00),
                Op::Read(STATUS),
                // Write
                Op::Write(0x29, 0x42),
                Op::Read(STATUS),
                // Exit
                Op::Read(CONTROL1),
                Op::Write(CONTROL1, control1::EERE),
            ]
        );
        assert_eq!(bus.get(Register::UserEeprom1), 0x42);
    }

    #[test]
    fn transient_brownout_is_recovered() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.queue_status(&[status::V1F | status::PON, status::PON]);

        write(&mut bus, &mut delay, Register::EepromControl, 0x80).unwrap();
        let log = bus.log();

        assert_eq!(log[0], Op::Read(STATUS));
        assert_eq!(log[1], Op::Write(STATUS, status::PON));
        assert_eq!(log[2], Op::Read(STATUS));
        assert!(log.contains(&Op::Write(EEPROM_CONTROL, 0x80)));
        assert_eq!(bus.get(Register::Control1), control1::EERE);
    }

    #[test]
    fn persistent_brownout_refuses_write() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.queue_status(&[status::V2F, status::V2F]);

        assert_eq!(
            write(&mut bus, &mut delay, Register::EepromControl, 0x80),
            Err(Error::Timeout(Stage::BrownoutRecovery))
        );
        assert!(!bus
            .writes()
            .iter()
            .any(|op| matches!(op, Op::Write(EEPROM_CONTROL, _))));
        // Exit still ran, and found EERE untouched.
        assert_eq!(bus.log().last(), Some(&Op::Read(CONTROL1)));
    }

    #[test]
    fn post_write_timeout_still_exits() {
        let mut bus = bus();
        let mut delay = bus.delay();
        // Enter sees a quiet EEPROM, the write then leaves it busy.
        bus.queue_status(&[0x00, 0x00]);
        bus.set(Register::Status, status::EEBUSY);

        assert_eq!(
            write(&mut bus, &mut delay, Register::UserEeprom0, 0x01),
            Err(Error::Timeout(Stage::BusyWait))
        );
        assert_eq!(bus.delays(), BUSY_POLL_LIMIT as usize);
        assert_eq!(bus.log().last(), Some(&Op::Write(CONTROL1, control1::EERE)));
    }

    #[test]
    fn failed_status_read_skips_write() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.fail(STATUS);

        assert_eq!(
            write(&mut bus, &mut delay, Register::UserEeprom0, 0x01),
            Err(Error::Bus(BusFault))
        );
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn unchanged_control_value_skips_sequence() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.set(Register::EepromControl, eeprom_control::R5K | eeprom_control::FD0);

        update_control(
            &mut bus,
            &mut delay,
            eeprom_control::TRICKLE_CHARGE,
            eeprom_control::R5K,
        )
        .unwrap();
        assert_eq!(bus.log(), vec![Op::Read(EEPROM_CONTROL)]);
    }

    #[test]
    fn changed_control_value_is_written() {
        let mut bus = bus();
        let mut delay = bus.delay();
        bus.set(Register::EepromControl, eeprom_control::R80K | eeprom_control::FD0);

        update_control(
            &mut bus,
            &mut delay,
            eeprom_control::TRICKLE_CHARGE,
            eeprom_control::R1K,
        )
        .unwrap();
        assert_eq!(
            bus.get(Register::EepromControl),
            eeprom_control::R1K | eeprom_control::FD0
        );
    }
}
