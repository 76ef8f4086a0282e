use embedded_hal_0::blocking::i2c::{Write, WriteRead};

use super::{Transport, DEFAULT_ADDRESS};

/// `Transport` implementation for `embedded-hal` v0.2.7 blocking I2C buses.
///
/// This type is only included when the `embedded-hal-0` feature flag is
/// enabled.
#[derive(Debug)]
pub struct LegacyI2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> LegacyI2cInterface<I2C> {
    /// Constructs a new `LegacyI2cInterface` using the default slave address.
    pub fn new(i2c: I2C) -> LegacyI2cInterface<I2C> {
        LegacyI2cInterface::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Constructs a new `LegacyI2cInterface` using the specified 7-bit slave
    /// address.
    pub fn with_address(i2c: I2C, address: u8) -> LegacyI2cInterface<I2C> {
        LegacyI2cInterface { i2c, address }
    }

    /// Consumes the `LegacyI2cInterface`, and returns the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Transport for LegacyI2cInterface<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = E;

    fn read_register(&mut self, address: u8) -> Result<u8, E> {
        let mut buffer = [0u8; 1];
        self.i2c.write_read(self.address, &[address], &mut buffer)?;

        Ok(buffer[0])
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[address, value])
    }

    fn read_registers(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[address], buffer)
    }

    fn write_registers(&mut self, address: u8, values: &[u8]) -> Result<(), E> {
        let mut bytes = Vec::with_capacity(values.len() + 1);
        bytes.push(address);
        bytes.extend_from_slice(values);

        self.i2c.write(self.address, &bytes)
    }
}
