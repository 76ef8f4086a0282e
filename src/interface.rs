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

//! Register access over the bus.
//!
//! The driver talks to the RV-3029-C2 exclusively through the [`Transport`]
//! trait, which offers single and multi-register reads and writes. Each
//! call is expected to be a single bus transaction that either completes or
//! fails.
//!
//! [`I2cInterface`] implements `Transport` for any bus that implements the
//! `embedded-hal` v1.0.0 [`I2c`] trait. Buses that only implement the
//! `embedded-hal` v0.2.7 blocking traits can be used through
//! `LegacyI2cInterface`, which is included when the `embedded-hal-0` feature
//! flag is enabled.
//!
//! [`Transport`]: trait.Transport.html
//! [`I2cInterface`]: struct.I2cInterface.html
//! [`I2c`]: ../../embedded_hal/i2c/trait.I2c.html

use embedded_hal::i2c::I2c;

use crate::register::RegisterBits;

#[cfg(feature = "embedded-hal-0")]
mod legacy;

#[cfg(test)]
pub(crate) mod fake;

#[cfg(feature = "embedded-hal-0")]
pub use self::legacy::LegacyI2cInterface;

/// Default 7-bit I2C slave address of the RV-3029-C2.
pub const DEFAULT_ADDRESS: u8 = 0x56;

/// Register level access to the device.
pub trait Transport {
    /// Error reported when a bus transaction fails.
    type Error;

    /// Reads a single register.
    fn read_register(&mut self, address: u8) -> Result<u8, Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Self::Error>;

    /// Fills `buffer` with consecutive registers, starting at `address`.
    fn read_registers(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `values` to consecutive registers, starting at `address`, in a
    /// single transaction.
    fn write_registers(&mut self, address: u8, values: &[u8]) -> Result<(), Self::Error>;

    /// Reads a register and decodes its flag bits.
    fn read_bits<R: RegisterBits>(&mut self) -> Result<R, Self::Error>
    where
        Self: Sized,
    {
        Ok(R::from(self.read_register(R::REGISTER.addr())?))
    }

    /// Encodes flag bits and writes them to their register.
    fn write_bits<R: RegisterBits>(&mut self, bits: R) -> Result<(), Self::Error>
    where
        Self: Sized,
    {
        self.write_register(R::REGISTER.addr(), bits.into())
    }

    /// Reads a register, lets `update` change its flag bits, and writes the
    /// result back.
    ///
    /// The write is skipped when `update` leaves the value unchanged.
    fn modify_bits<R, F>(&mut self, update: F) -> Result<(), Self::Error>
    where
        Self: Sized,
        R: RegisterBits,
        F: FnOnce(&mut R),
    {
        let address = R::REGISTER.addr();
        let current = self.read_register(address)?;

        let mut bits = R::from(current);
        update(&mut bits);
        let updated: u8 = bits.into();

        if updated != current {
            self.write_register(address, updated)?;
        }

        Ok(())
    }
}

/// `Transport` implementation for `embedded-hal` v1.0.0 I2C buses.
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Constructs a new `I2cInterface` using the default slave address.
    pub fn new(i2c: I2C) -> I2cInterface<I2C> {
        I2cInterface::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Constructs a new `I2cInterface` using the specified 7-bit slave
    /// address.
    pub fn with_address(i2c: I2C, address: u8) -> I2cInterface<I2C> {
        I2cInterface { i2c, address }
    }

    /// Returns the slave address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Consumes the `I2cInterface`, and returns the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Transport for I2cInterface<I2C> {
    type Error = I2C::Error;

    // Sequence: START → Address + Write Bit → Register → Repeated START →
    // Address + Read Bit → Incoming Byte → STOP
    fn read_register(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buffer = [0u8; 1];
        self.i2c.write_read(self.address, &[address], &mut buffer)?;

        Ok(buffer[0])
    }

    // Sequence: START → Address + Write Bit → Register → Outgoing Byte → STOP
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[address, value])
    }

    fn read_registers(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[address], buffer)
    }

    // The register address and data go out in one transaction, so a
    // concurrent reader never observes a partially written block.
    fn write_registers(&mut self, address: u8, values: &[u8]) -> Result<(), Self::Error> {
        let mut bytes = Vec::with_capacity(values.len() + 1);
        bytes.push(address);
        bytes.extend_from_slice(values);

        self.i2c.write(self.address, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{control1, Control1, Register};

    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn read_register() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![Register::Temperature.addr()],
            vec![0x55],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c.clone());

        assert_eq!(interface.read_register(Register::Temperature.addr()), Ok(0x55));
        i2c.done();
    }

    #[test]
    fn block_write_is_one_transaction() {
        let expectations = [I2cTransaction::write(
            0x57,
            vec![Register::Seconds.addr(), 1, 2, 3, 4, 5, 6, 7],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::with_address(i2c.clone(), 0x57);

        interface
            .write_registers(Register::Seconds.addr(), &[1, 2, 3, 4, 5, 6, 7])
            .unwrap();
        i2c.done();
    }

    #[test]
    fn block_read() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![Register::Ram0.addr()],
            vec![8, 7, 6],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c.clone());

        let mut buffer = [0u8; 3];
        interface
            .read_registers(Register::Ram0.addr(), &mut buffer)
            .unwrap();
        assert_eq!(buffer, [8, 7, 6]);
        i2c.done();
    }

    #[test]
    fn bus_error_is_reported() {
        let expectations = [I2cTransaction::write(
            DEFAULT_ADDRESS,
            vec![Register::Reset.addr(), 0x10],
        )
        .with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c.clone());

        assert_eq!(
            interface.write_register(Register::Reset.addr(), 0x10),
            Err(ErrorKind::Other)
        );
        i2c.done();
    }

    #[test]
    fn modify_skips_unchanged_value() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![Register::Control1.addr()],
            vec![control1::EERE],
        )];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c.clone());

        interface
            .modify_bits(|control: &mut Control1| control.eeprom_refresh_enable = true)
            .unwrap();
        i2c.done();
    }

    #[test]
    fn modify_writes_changed_value() {
        let expectations = [
            I2cTransaction::write_read(
                DEFAULT_ADDRESS,
                vec![Register::Control1.addr()],
                vec![control1::EERE | control1::TE],
            ),
            I2cTransaction::write(
                DEFAULT_ADDRESS,
                vec![Register::Control1.addr(), control1::TE],
            ),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(i2c.clone());

        interface
            .modify_bits(|control: &mut Control1| control.eeprom_refresh_enable = false)
            .unwrap();
        i2c.done();
    }
}
