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

//! Error type shared by every operation that touches the device.

use std::error;
use std::fmt;
use std::result;

/// Protocol stages that can time out.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Stage {
    /// The EEPROM busy flag didn't clear within the maximum number of polls.
    BusyWait,
    /// A voltage-low flag was still set after clearing it and checking again.
    /// The EEPROM can't be written at this supply voltage.
    BrownoutRecovery,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Stage::BusyWait => write!(f, "EEPROM busy-wait"),
            Stage::BrownoutRecovery => write!(f, "brownout recovery"),
        }
    }
}

/// Errors that can occur when accessing the RV-3029-C2.
///
/// After any error, the operation should be considered not applied, and
/// the device state unknown. Read the relevant registers again before
/// trusting cached values.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The transport reported a failed bus transaction.
    Bus(E),
    /// A bounded wait inside a multi-step protocol ran out.
    Timeout(Stage),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Bus(ref err) => write!(f, "Bus error: {:?}", err),
            Error::Timeout(stage) => write!(f, "Timed out during {}", stage),
        }
    }
}

impl<E: fmt::Debug> error::Error for Error<E> {}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Error<E> {
        Error::Bus(err)
    }
}

/// Result type returned from methods that can have `rv3029::Error`s.
pub type Result<T, E> = result::Result<T, Error<E>>;

/// Runs every step of a sequence regardless of earlier failures, and keeps
/// the first error.
#[derive(Debug)]
pub(crate) struct Accumulator<E> {
    first_error: Option<Error<E>>,
}

impl<E> Accumulator<E> {
    pub(crate) fn new() -> Accumulator<E> {
        Accumulator { first_error: None }
    }

    pub(crate) fn record<T>(&mut self, result: Result<T, E>) {
        if let Err(err) = result {
            if self.first_error.is_none() {
                self.first_error = Some(err);
            }
        }
    }

    /// Returns the first recorded error, or `result` if every step so far
    /// succeeded.
    pub(crate) fn and<T>(self, result: Result<T, E>) -> Result<T, E> {
        match self.first_error {
            Some(err) => Err(err),
            None => result,
        }
    }

    pub(crate) fn finish(self) -> Result<(), E> {
        self.and(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_keeps_first_error() {
        let mut outcome: Accumulator<u8> = Accumulator::new();
        outcome.record::<()>(Ok(()));
        outcome.record::<()>(Err(Error::Bus(1)));
        outcome.record::<()>(Err(Error::Timeout(Stage::BusyWait)));

        assert_eq!(outcome.finish(), Err(Error::Bus(1)));
    }

    #[test]
    fn accumulator_passes_result_through() {
        let outcome: Accumulator<u8> = Accumulator::new();
        assert_eq!(outcome.and(Ok(7)), Ok(7));
    }

    #[test]
    fn display() {
        let err: Error<u8> = Error::Timeout(Stage::BrownoutRecovery);
        assert_eq!(err.to_string(), "Timed out during brownout recovery");
        assert_eq!(Error::Bus(3u8).to_string(), "Bus error: 3");
    }
}
