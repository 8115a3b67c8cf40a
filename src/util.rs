// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Crate-private utilities.

/// A wrapper around [`str`] references whose [`PartialEq`] and [`Eq`]
/// implementations are ASCII-case-insensitive.
pub struct Caseless<'a>(pub &'a str);

impl PartialEq for Caseless<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl Eq for Caseless<'_> {}

/// Defines a wrapper around a [`u16`] code point of the DNS (a class or
/// an RR type), with constants for the known values and
/// [`Debug`](std::fmt::Debug), [`Display`](std::fmt::Display), and
/// [`FromStr`](std::str::FromStr) implementations that use the
/// mnemonics. Unknown values are written and read in the generic form
/// of [RFC 3597 § 5] (e.g. `TYPE65280`), using the given prefix.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
macro_rules! define_code {
    (
        $(#[$meta:meta])*
        pub struct $name:ident, $generic_prefix:literal {
            $($konst:ident = $value:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub struct $name(u16);

        impl $name {
            $(pub const $konst: Self = Self($value);)*

            /// Returns the mnemonic for this value, if it has one.
            pub fn mnemonic(self) -> Option<&'static str> {
                match self {
                    $(Self::$konst => Some(stringify!($konst)),)*
                    _ => None,
                }
            }
        }

        impl From<u16> for $name {
            fn from(raw: u16) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                $(
                    if $crate::util::Caseless(text) == $crate::util::Caseless(stringify!($konst)) {
                        return Ok(Self::$konst);
                    }
                )*
                $crate::util::parse_generic_code(text, $generic_prefix).map(Self)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                match self.mnemonic() {
                    Some(mnemonic) => f.write_str(mnemonic),
                    None => write!(f, "{}{}", $generic_prefix, self.0),
                }
            }
        }
    };
}

/// Parses the generic form `<PREFIX><N>` of a class or type.
pub fn parse_generic_code(text: &str, prefix: &str) -> Result<u16, &'static str> {
    match text.get(0..prefix.len()) {
        Some(start) if start.eq_ignore_ascii_case(prefix) => text[prefix.len()..]
            .parse::<u16>()
            .or(Err("value is not a valid unsigned 16-bit integer")),
        _ => Err("unknown mnemonic"),
    }
}

/// Converts a nibble into an ASCII hex character. Upper-case hex digits
/// are used, as is customary for DS digests. The passed value must be
/// less than 16.
pub fn nibble_to_ascii_hex_digit(nibble: u8) -> u8 {
    assert!(nibble < 16);
    if nibble < 10 {
        b'0' + nibble
    } else {
        b'A' + nibble - 10
    }
}

/// Converts an ASCII hexadecimal digit to its numeric value. This
/// returns [`None`] if `digit` is not one of the ASCII characters
/// `0` through `9`, `A` through `F`, or `a` through `f`.
pub fn ascii_hex_digit_to_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

/// Writes `octets` as a hexadecimal string.
pub fn to_hex(octets: &[u8]) -> String {
    let mut hex = String::with_capacity(2 * octets.len());
    for octet in octets {
        hex.push(nibble_to_ascii_hex_digit(octet >> 4) as char);
        hex.push(nibble_to_ascii_hex_digit(octet & 0xf) as char);
    }
    hex
}

/// Parses a hexadecimal string (of even length) into octets.
pub fn from_hex(text: &str) -> Option<Vec<u8>> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let high = ascii_hex_digit_to_nibble(pair[0])?;
            let low = ascii_hex_digit_to_nibble(pair[1])?;
            Some(high << 4 | low)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_works() {
        assert_eq!(to_hex(&[0x00, 0x2b, 0xff]), "002BFF");
        assert_eq!(from_hex("002bFF"), Some(vec![0x00, 0x2b, 0xff]));
        assert_eq!(from_hex("abc"), None);
        assert_eq!(from_hex("zz"), None);
    }

    #[test]
    fn parse_generic_code_works() {
        assert_eq!(parse_generic_code("TYPE65280", "TYPE"), Ok(65280));
        assert_eq!(parse_generic_code("class1", "CLASS"), Ok(1));
        assert!(parse_generic_code("TYPE65536", "TYPE").is_err());
        assert!(parse_generic_code("BOGUS", "TYPE").is_err());
    }
}
