//! RV3029 is a driver for the Micro Crystal RV-3029-C2 real-time clock
//! module, a temperature compensated RTC with a battery backup switchover,
//! connected through I2C.
//!
//! The driver works with any bus that implements the `embedded-hal` v1.0.0
//! [`I2c`] trait through [`I2cInterface`]. Buses that implement the
//! `embedded-hal` v0.2.7 blocking I2C traits are supported through
//! `LegacyI2cInterface` when the `embedded-hal-0` feature flag is enabled.
//!
//! Besides reading and setting the time, [`Rv3029`] covers the alarm, the
//! countdown timer, the temperature sensor, the trickle charger for the
//! backup supply, the clock output, and the user RAM and EEPROM.
//!
//! ## Time validity
//!
//! The clock registers don't hold a meaningful time after the RTC lost power.
//! [`Rv3029::begin`] detects a power loss through the status register, and
//! [`Rv3029::is_valid`] reports whether the time can be trusted.
//!
//! ## Example
//!
//! ```no_run
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::i2c::I2c;
//! use rv3029::{CalendarTime, I2cInterface, Rv3029};
//!
//! fn init<I2C: I2c, D: DelayNs>(i2c: I2C, delay: D) -> rv3029::Result<(), I2C::Error> {
//!     let mut rtc = Rv3029::new(I2cInterface::new(i2c), delay);
//!     rtc.begin()?;
//!
//!     if !rtc.is_valid() {
//!         rtc.set_time(&CalendarTime::new(2025, 6, 1, 12, 0, 0))?;
//!     }
//!
//!     let now = rtc.update_time()?;
//!     println!("{:04}-{:02}-{:02}", now.year, now.month, now.day);
//!
//!     Ok(())
//! }
//! ```
//!
//! [`I2c`]: ../embedded_hal/i2c/trait.I2c.html
//! [`I2cInterface`]: struct.I2cInterface.html
//! [`Rv3029`]: struct.Rv3029.html
//! [`Rv3029::begin`]: struct.Rv3029.html#method.begin
//! [`Rv3029::is_valid`]: struct.Rv3029.html#method.is_valid

// Used by rustdoc to link other crates to rv3029's docs
#![doc(html_root_url = "https://docs.rs/rv3029/0.1.0")]

#[macro_use]
mod macros;

pub mod bcd;
pub mod eeprom;
mod error;
#[cfg(feature = "hal")]
pub mod hal;
mod interface;
pub mod power;
pub mod register;
mod rtc;
pub mod time;

pub use crate::error::{Error, Result, Stage};
#[cfg(feature = "embedded-hal-0")]
pub use crate::interface::LegacyI2cInterface;
pub use crate::interface::{I2cInterface, Transport, DEFAULT_ADDRESS};
pub use crate::rtc::{
    ClockOutFrequency, Rv3029, TimerFrequency, TrickleResistor, TEMPERATURE_OFFSET,
    TEMPERATURE_UNAVAILABLE, USER_EEPROM_LEN, USER_RAM_LEN,
};
pub use crate::time::{AlarmFields, CalendarTime};
