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

// Generates a register type that exposes each flag bit as a named `bool`.
// Bits that aren't listed are kept in `reserved`, so a value read from the
// device is written back unchanged apart from the flags that were modified.
macro_rules! register_bits {
    (
        $(#[$meta:meta])*
        $name:ident: $register:path {
            $(
                $(#[$field_meta:meta])*
                $field:ident = $mask:expr,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: bool,
            )+
            reserved: u8,
        }

        impl $name {
            const FLAGS: u8 = 0 $(| $mask)+;
        }

        impl From<u8> for $name {
            fn from(value: u8) -> $name {
                $name {
                    $($field: (value & $mask) != 0,)+
                    reserved: value & !$name::FLAGS,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(bits: $name) -> u8 {
                let mut value = bits.reserved;
                $(
                    if bits.$field {
                        value |= $mask;
                    }
                )+
                value
            }
        }

        impl $crate::register::RegisterBits for $name {
            const REGISTER: $crate::register::Register = $register;
        }
    };
}
