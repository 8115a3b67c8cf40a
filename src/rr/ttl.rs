// Copyright 2022 Matthew Ingwersen.
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

//! Implementation of the [`Ttl`] structure.

use std::fmt;
use std::str::FromStr;

/// Represents the TTL of a resource record.
///
/// This type wraps `u32` to implement [RFC 2181 § 8]: values with the
/// most significant bit set are treated as zero.
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Ttl(u32);

impl From<u32> for Ttl {
    fn from(raw: u32) -> Self {
        if raw > i32::MAX as u32 {
            Self(0)
        } else {
            Self(raw)
        }
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

/// Parses a TTL given either as a plain number of seconds or in the
/// BIND style with unit suffixes (`1h30m`, `2d`, `1W`). Units are
/// case-insensitive.
impl FromStr for Ttl {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err("empty TTL");
        } else if let Ok(seconds) = text.parse::<u32>() {
            return Ok(Self::from(seconds));
        }

        let mut total: u32 = 0;
        let mut current: Option<u32> = None;
        for c in text.chars() {
            if let Some(digit) = c.to_digit(10) {
                let value = current.unwrap_or(0);
                current = Some(
                    value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or("TTL is too large")?,
                );
            } else {
                let multiplier = match c.to_ascii_lowercase() {
                    's' => 1,
                    'm' => 60,
                    'h' => 60 * 60,
                    'd' => 24 * 60 * 60,
                    'w' => 7 * 24 * 60 * 60,
                    _ => return Err("invalid TTL unit"),
                };
                let value = current.take().ok_or("TTL unit without a number")?;
                total = value
                    .checked_mul(multiplier)
                    .and_then(|v| total.checked_add(v))
                    .ok_or("TTL is too large")?;
            }
        }
        if current.is_some() {
            return Err("TTL has a trailing number without a unit");
        }
        Ok(Self::from(total))
    }
}

impl fmt::Debug for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
