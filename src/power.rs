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

//! Power status interpretation and time validity.
//!
//! The RV-3029-C2 reports power problems through the PON, SR, V1F and V2F
//! flags of the status register. After a power-on reset, a system reset or
//! an oscillator-threshold voltage drop (V2F), the clock registers hold
//! meaningless data until they're written again.
//!
//! Whether the driver trusts the time it reads is tracked by a
//! [`ValidityLatch`], owned by [`Rv3029`].
//!
//! [`ValidityLatch`]: struct.ValidityLatch.html
//! [`Rv3029`]: ../struct.Rv3029.html

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::error::{Accumulator, Error, Result};
use crate::interface::Transport;
use crate::register::{reset, InterruptControl, InterruptFlags, Register, Status};
use crate::time::CalendarTime;

/// Time allowed for the device to settle after a system reset command, in
/// milliseconds.
pub const RESET_SETTLE_MS: u32 = 1;

/// One-way flag that tracks whether the time read from the device can be
/// trusted.
///
/// The latch starts out unset. It's set by a successful write of the clock
/// registers, or by reading a plausible time while unset. Once set, it only
/// clears when [`invalidate`] is called after a power loss.
///
/// [`invalidate`]: #method.invalidate
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct ValidityLatch {
    valid: bool,
}

impl ValidityLatch {
    /// Constructs a new, unset `ValidityLatch`.
    pub fn new() -> ValidityLatch {
        ValidityLatch { valid: false }
    }

    /// Returns `true` if the time is considered trustworthy.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Records a time value read from the clock registers.
    ///
    /// Sets the latch if it isn't set yet and `time` is plausible.
    /// Implausible data never clears a set latch.
    pub fn observe_read(&mut self, time: &CalendarTime) {
        if !self.valid && time.is_plausible() {
            debug!("Time read from RTC is plausible, marking it valid");
            self.valid = true;
        }
    }

    /// Records a successful write of the clock registers.
    pub fn observe_write(&mut self) {
        self.valid = true;
    }

    /// Clears the latch after a power loss was detected.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Returns `true` if `status` shows that the clock lost its time.
pub fn power_lost(status: &Status) -> bool {
    status.power_on_reset || status.system_reset || status.voltage_low_2
}

/// Disables every interrupt source and clears all pending interrupt flags,
/// then reads the status register.
///
/// Both writes are attempted even if the first one fails. Any failure
/// aborts before the status is returned.
pub fn disable_interrupts_and_read_status<T>(bus: &mut T) -> Result<Status, T::Error>
where
    T: Transport,
{
    let mut outcome: Accumulator<T::Error> = Accumulator::new();
    outcome.record(bus.write_bits(InterruptControl::default()).map_err(Error::Bus));
    outcome.record(bus.write_bits(InterruptFlags::default()).map_err(Error::Bus));

    let status = bus.read_bits::<Status>().map_err(Error::Bus);

    outcome.and(status)
}

/// Acknowledges a power loss.
///
/// Clears PON, SR, V1F and V2F in `status`, issues a system reset, waits
/// [`RESET_SETTLE_MS`], and writes the cleared status back. Every step runs
/// even if an earlier one failed, and the first error is returned.
///
/// [`RESET_SETTLE_MS`]: constant.RESET_SETTLE_MS.html
pub fn acknowledge_power_loss<T, D>(
    bus: &mut T,
    delay: &mut D,
    mut status: Status,
) -> Result<(), T::Error>
where
    T: Transport,
    D: DelayNs,
{
    warn!(
        "RTC power loss detected (PON: {}, SR: {}, V2F: {}), time is invalid",
        status.power_on_reset, status.system_reset, status.voltage_low_2
    );

    status.power_on_reset = false;
    status.system_reset = false;
    status.voltage_low_1 = false;
    status.voltage_low_2 = false;

    let mut outcome: Accumulator<T::Error> = Accumulator::new();
    outcome.record(
        bus.write_register(Register::Reset.addr(), reset::SYSR)
            .map_err(Error::Bus),
    );
    delay.delay_ms(RESET_SETTLE_MS);
    outcome.record(bus.write_bits(status).map_err(Error::Bus));

    outcome.finish()
}
