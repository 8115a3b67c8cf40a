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

//! Implementation of types relating to DNS questions.

use std::fmt;
use std::str::FromStr;

use crate::class::Class;
use crate::name::Name;
use crate::rr::Type;
use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query.
///
/// Defined in [RFC 1035 § 4.1.2], a DNS question includes
///
/// * the QNAME, which is the domain name whose records are being
///   queried;
/// * the [QTYPE](Qtype), which specifies what types of records are
///   desired; and
/// * the [QCLASS](Qclass), which specifies which DNS class(es) to search.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Qtype,
    pub qclass: Qclass,
}

impl Question {
    /// Creates a question of class IN.
    pub fn new(qname: Name, qtype: impl Into<Qtype>) -> Self {
        Self {
            qname,
            qtype: qtype.into(),
            qclass: Class::IN.into(),
        }
    }
}

/// Writes the question as in the question section of `dig` output.
impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ";{}\t\t{}\t{}", self.qname, self.qclass, self.qtype)
    }
}

////////////////////////////////////////////////////////////////////////
// QTYPES AND QCLASSES                                                //
////////////////////////////////////////////////////////////////////////

/// Defines a question-only code (QTYPE or QCLASS) that extends a data
/// code (TYPE or CLASS) with extra values. Mnemonics of the data code
/// are accepted and displayed for all other values.
macro_rules! define_question_code {
    (
        $(#[$meta:meta])*
        pub struct $name:ident extends $data:ident {
            $($konst:ident = $value:literal => [$($text:literal),+],)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, Hash, PartialEq)]
        pub struct $name(u16);

        impl $name {
            $(pub const $konst: Self = Self($value);)*
        }

        impl From<u16> for $name {
            fn from(raw: u16) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u16 {
            fn from(code: $name) -> Self {
                code.0
            }
        }

        impl From<$data> for $name {
            fn from(data: $data) -> Self {
                Self(data.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match *self {
                    $(Self::$konst => f.write_str([$($text),+][0]),)*
                    _ => fmt::Display::fmt(&$data::from(self.0), f),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self)
            }
        }

        impl FromStr for $name {
            type Err = &'static str;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                $($(
                    if Caseless(text) == Caseless($text) {
                        return Ok(Self::$konst);
                    }
                )+)*
                $data::from_str(text).map(Into::into)
            }
        }
    };
}

define_question_code! {
    /// The QTYPE of a DNS [question](Question).
    ///
    /// QTYPE values include data TYPEs (see [`Type`]), but may also
    /// include values that ask for a range of TYPEs (e.g.
    /// [*](Qtype::ANY)) or for zone transfers (e.g. [AXFR](Qtype::AXFR)).
    pub struct Qtype extends Type {
        IXFR = 251 => ["IXFR"],
        AXFR = 252 => ["AXFR"],
        MAILB = 253 => ["MAILB"],
        MAILA = 254 => ["MAILA"],
        ANY = 255 => ["ANY", "*"],
    }
}

define_question_code! {
    /// The QCLASS of a DNS [question](Question).
    ///
    /// This may be a defined DNS [`Class`], or another value such as
    /// [*](`Qclass::ANY`) that asks for several classes at once.
    pub struct Qclass extends Class {
        NONE = 254 => ["NONE"],
        ANY = 255 => ["ANY", "*"],
    }
}

impl Qtype {
    /// Returns whether this QTYPE asks for a zone transfer or a group
    /// of mail types, which this engine does not implement.
    pub fn is_unsupported_meta(self) -> bool {
        matches!(self, Self::IXFR | Self::AXFR | Self::MAILB | Self::MAILA)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
