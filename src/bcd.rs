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

//! Binary-coded decimal (BCD) conversion.
//!
//! The RV-3029-C2 stores every calendar field as packed BCD, with the tens
//! digit in the high nibble and the units digit in the low nibble.

/// Converts a packed BCD byte to its binary value.
///
/// Nibbles above 9 aren't rejected. The device never returns them for
/// calendar fields, and the result for such input is meaningless.
#[inline]
pub fn to_binary(bcd: u8) -> u8 {
    ((bcd >> 4) * 10) + (bcd & 0x0F)
}

/// Converts a binary value in the range 0-99 to packed BCD.
///
/// Values above 99 don't fit in two digits, and produce a truncated nibble
/// pair instead of an error, the same way the register would store them.
#[inline]
pub fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_to_bcd() {
        assert_eq!(to_bcd(0), 0x00);
        assert_eq!(to_bcd(9), 0x09);
        assert_eq!(to_bcd(10), 0x10);
        assert_eq!(to_bcd(59), 0x59);
        assert_eq!(to_bcd(99), 0x99);
    }

    #[test]
    fn bcd_to_binary() {
        assert_eq!(to_binary(0x00), 0);
        assert_eq!(to_binary(0x31), 31);
        assert_eq!(to_binary(0x59), 59);
        assert_eq!(to_binary(0x99), 99);
    }

    #[test]
    fn valid_bcd_bytes_survive_conversion() {
        for tens in 0..=9u8 {
            for units in 0..=9u8 {
                let bcd = (tens << 4) | units;
                assert_eq!(to_bcd(to_binary(bcd)), bcd);
            }
        }
    }

    #[test]
    fn minutes_and_seconds_survive_conversion() {
        for value in 0..=59u8 {
            assert_eq!(to_binary(to_bcd(value)), value);
        }
    }

    #[test]
    fn out_of_range_value_is_truncated() {
        // Tens digit 12 isn't a decimal digit.
        assert_eq!(to_bcd(123), 0xC3);
        // Tens digit 25 loses its upper bit.
        assert_eq!(to_bcd(255), 0x95);
    }
}
