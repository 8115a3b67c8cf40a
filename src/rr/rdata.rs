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

//! Typed RDATA and its presentation format.
//!
//! The [`Rdata`] enumeration carries the parsed RDATA of every type the
//! engine needs to look inside of (for CNAME/DNAME indirection,
//! additional section processing, negative answers, and DNSSEC
//! material), plus an opaque variant for everything else. Parsing from
//! and writing to the zone-file presentation format is implemented
//! here; there is no wire format.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use super::{Ttl, Type};
use crate::name::{self, Name};
use crate::util;

////////////////////////////////////////////////////////////////////////
// RDATA TYPES                                                        //
////////////////////////////////////////////////////////////////////////

/// The RDATA of a resource record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rdata {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(Name),
    Cname(Name),
    Dname(Name),
    Ptr(Name),
    Soa(Soa),
    Mx {
        preference: u16,
        exchange: Name,
    },
    Txt(Vec<Box<[u8]>>),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Box<[u8]>,
    },
    Dnskey {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Box<[u8]>,
    },
    Rrsig(Rrsig),
    Nsec {
        next_domain: Name,
        types: Vec<Type>,
    },

    /// RDATA of a type without a typed representation, kept as the
    /// octets given in the generic [RFC 3597] form.
    ///
    /// [RFC 3597]: https://datatracker.ietf.org/doc/html/rfc3597
    Unknown(Box<[u8]>),
}

/// The RDATA of an SOA record ([RFC 1035 § 3.3.13]).
///
/// [RFC 1035 § 3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// The RDATA of an RRSIG record ([RFC 4034 § 3]).
///
/// [RFC 4034 § 3]: https://datatracker.ietf.org/doc/html/rfc4034#section-3
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rrsig {
    pub type_covered: Type,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: Ttl,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer: Name,
    pub signature: Box<[u8]>,
}

impl Rdata {
    /// Returns the RR type this RDATA belongs to. The type of
    /// [`Rdata::Unknown`] is not recorded, so this returns `None` for
    /// it.
    pub fn rr_type(&self) -> Option<Type> {
        let rr_type = match self {
            Self::A(_) => Type::A,
            Self::Aaaa(_) => Type::AAAA,
            Self::Ns(_) => Type::NS,
            Self::Cname(_) => Type::CNAME,
            Self::Dname(_) => Type::DNAME,
            Self::Ptr(_) => Type::PTR,
            Self::Soa(_) => Type::SOA,
            Self::Mx { .. } => Type::MX,
            Self::Txt(_) => Type::TXT,
            Self::Srv { .. } => Type::SRV,
            Self::Ds { .. } => Type::DS,
            Self::Dnskey { .. } => Type::DNSKEY,
            Self::Rrsig(_) => Type::RRSIG,
            Self::Nsec { .. } => Type::NSEC,
            Self::Unknown(_) => return None,
        };
        Some(rr_type)
    }

    /// Returns the domain name embedded in this RDATA that calls for
    /// additional section processing, if any: the NSDNAME of an NS
    /// record, the EXCHANGE of an MX record, or the TARGET of an SRV
    /// record.
    pub fn additional_name(&self) -> Option<&Name> {
        match self {
            Self::Ns(nsdname) => Some(nsdname),
            Self::Mx { exchange, .. } => Some(exchange),
            Self::Srv { target, .. } if !target.is_root() => Some(target),
            _ => None,
        }
    }

    /// Parses RDATA of type `rr_type` from its presentation format.
    /// Relative domain names are completed with `origin`.
    pub fn parse(rr_type: Type, text: &str, origin: &Name) -> Result<Self, Error> {
        let tokens = tokenize(text)?;
        let mut fields = Fields {
            tokens: tokens.iter(),
            origin,
        };
        if tokens.first().map_or(false, |t| !t.quoted && t.text == "\\#") {
            fields.next("\\#")?;
            return parse_generic(rr_type, &mut fields);
        }

        let rdata = match rr_type {
            Type::A => Self::A(fields.parse("address").or(Err(Error::InvalidAddress))?),
            Type::AAAA => Self::Aaaa(fields.parse("address").or(Err(Error::InvalidAddress))?),
            Type::NS => Self::Ns(fields.name("NSDNAME")?),
            Type::CNAME => Self::Cname(fields.name("CNAME")?),
            Type::DNAME => Self::Dname(fields.name("target")?),
            Type::PTR => Self::Ptr(fields.name("PTRDNAME")?),
            Type::SOA => Self::Soa(Soa {
                mname: fields.name("MNAME")?,
                rname: fields.name("RNAME")?,
                serial: fields.integer("SERIAL")?,
                refresh: fields.integer("REFRESH")?,
                retry: fields.integer("RETRY")?,
                expire: fields.integer("EXPIRE")?,
                minimum: fields.integer("MINIMUM")?,
            }),
            Type::MX => Self::Mx {
                preference: fields.integer("PREFERENCE")?,
                exchange: fields.name("EXCHANGE")?,
            },
            Type::TXT => {
                let mut strings = Vec::new();
                for token in fields.tokens.by_ref() {
                    strings.push(decode_character_string(&token.text)?);
                }
                if strings.is_empty() {
                    return Err(Error::MissingField("TXT-DATA"));
                }
                Self::Txt(strings)
            }
            Type::SRV => Self::Srv {
                priority: fields.integer("priority")?,
                weight: fields.integer("weight")?,
                port: fields.integer("port")?,
                target: fields.name("target")?,
            },
            Type::DS => Self::Ds {
                key_tag: fields.integer("key tag")?,
                algorithm: fields.integer("algorithm")?,
                digest_type: fields.integer("digest type")?,
                digest: util::from_hex(&fields.rest("digest")?)
                    .ok_or(Error::InvalidHex)?
                    .into_boxed_slice(),
            },
            Type::DNSKEY => Self::Dnskey {
                flags: fields.integer("flags")?,
                protocol: fields.integer("protocol")?,
                algorithm: fields.integer("algorithm")?,
                public_key: decode_base64(&fields.rest("public key")?)?,
            },
            Type::RRSIG => Self::Rrsig(Rrsig {
                type_covered: fields
                    .next("type covered")?
                    .parse()
                    .or(Err(Error::InvalidType))?,
                algorithm: fields.integer("algorithm")?,
                labels: fields.integer("labels")?,
                original_ttl: Ttl::from(fields.integer::<u32>("original TTL")?),
                expiration: parse_time(fields.next("signature expiration")?)?,
                inception: parse_time(fields.next("signature inception")?)?,
                key_tag: fields.integer("key tag")?,
                signer: fields.name("signer's name")?,
                signature: decode_base64(&fields.rest("signature")?)?,
            }),
            Type::NSEC => Self::Nsec {
                next_domain: fields.name("next domain name")?,
                types: fields
                    .tokens
                    .by_ref()
                    .map(|t| t.text.parse().or(Err(Error::InvalidType)))
                    .collect::<Result<_, _>>()?,
            },
            _ => return Err(Error::GenericFormRequired),
        };

        if fields.tokens.next().is_some() {
            Err(Error::ExtraData)
        } else {
            Ok(rdata)
        }
    }
}

/// Parses the remainder of RDATA in the generic `\# <length> <hex>`
/// form. This is only accepted for types without a typed
/// representation.
fn parse_generic(rr_type: Type, fields: &mut Fields) -> Result<Rdata, Error> {
    if rr_type_has_typed_form(rr_type) {
        return Err(Error::GenericFormForKnownType);
    }
    let length: usize = fields.integer("RDATA length")?;
    let octets = if length == 0 {
        Vec::new()
    } else {
        util::from_hex(&fields.rest("RDATA")?).ok_or(Error::InvalidHex)?
    };
    if octets.len() != length {
        Err(Error::GenericLengthMismatch)
    } else if fields.tokens.next().is_some() {
        Err(Error::ExtraData)
    } else {
        Ok(Rdata::Unknown(octets.into_boxed_slice()))
    }
}

fn rr_type_has_typed_form(rr_type: Type) -> bool {
    matches!(
        rr_type,
        Type::A
            | Type::AAAA
            | Type::NS
            | Type::CNAME
            | Type::DNAME
            | Type::PTR
            | Type::SOA
            | Type::MX
            | Type::TXT
            | Type::SRV
            | Type::DS
            | Type::DNSKEY
            | Type::RRSIG
            | Type::NSEC
    )
}

impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::A(address) => write!(f, "{}", address),
            Self::Aaaa(address) => write!(f, "{}", address),
            Self::Ns(name) | Self::Cname(name) | Self::Dname(name) | Self::Ptr(name) => {
                write!(f, "{}", name)
            }
            Self::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum,
            ),
            Self::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            Self::Txt(strings) => {
                for (i, string) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write_character_string(f, string)?;
                }
                Ok(())
            }
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            Self::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => write!(
                f,
                "{} {} {} {}",
                key_tag,
                algorithm,
                digest_type,
                util::to_hex(digest),
            ),
            Self::Dnskey {
                flags,
                protocol,
                algorithm,
                public_key,
            } => write!(
                f,
                "{} {} {} {}",
                flags,
                protocol,
                algorithm,
                BASE64.encode(public_key),
            ),
            Self::Rrsig(rrsig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                rrsig.type_covered,
                rrsig.algorithm,
                rrsig.labels,
                rrsig.original_ttl,
                DisplayTime(rrsig.expiration),
                DisplayTime(rrsig.inception),
                rrsig.key_tag,
                rrsig.signer,
                BASE64.encode(&rrsig.signature),
            ),
            Self::Nsec { next_domain, types } => {
                write!(f, "{}", next_domain)?;
                for rr_type in types {
                    write!(f, " {}", rr_type)?;
                }
                Ok(())
            }
            Self::Unknown(octets) if octets.is_empty() => f.write_str("\\# 0"),
            Self::Unknown(octets) => write!(f, "\\# {} {}", octets.len(), util::to_hex(octets)),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when parsing RDATA from its presentation format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    MissingField(&'static str),
    InvalidInteger(&'static str),
    InvalidName(&'static str, name::Error),
    InvalidAddress,
    InvalidBase64,
    InvalidHex,
    InvalidTime,
    InvalidType,
    CharacterStringTooLong,
    UnterminatedString,
    InvalidEscape,
    ExtraData,
    GenericFormRequired,
    GenericFormForKnownType,
    GenericLengthMismatch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "the {} field is missing", field),
            Self::InvalidInteger(field) => write!(f, "the {} field is not a valid integer", field),
            Self::InvalidName(field, error) => {
                write!(f, "the {} field is not a valid name: {}", field, error)
            }
            Self::InvalidAddress => f.write_str("invalid IP address"),
            Self::InvalidBase64 => f.write_str("invalid base64 data"),
            Self::InvalidHex => f.write_str("invalid hexadecimal data"),
            Self::InvalidTime => f.write_str("invalid signature time"),
            Self::InvalidType => f.write_str("invalid RR type"),
            Self::CharacterStringTooLong => {
                f.write_str("character string is longer than 255 octets")
            }
            Self::UnterminatedString => f.write_str("unterminated quoted string"),
            Self::InvalidEscape => f.write_str("invalid escape sequence"),
            Self::ExtraData => f.write_str("extra data after the RDATA"),
            Self::GenericFormRequired => {
                f.write_str("RDATA of this type must be given in the \\# generic form")
            }
            Self::GenericFormForKnownType => {
                f.write_str("the \\# generic form is not supported for this type")
            }
            Self::GenericLengthMismatch => {
                f.write_str("the \\# RDATA length does not match the data given")
            }
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TOKENIZING AND FIELDS                                              //
////////////////////////////////////////////////////////////////////////

/// A whitespace-separated token of presentation-format RDATA. Escape
/// sequences are left in place; quotes are removed.
#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
}

fn tokenize(text: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = text.chars();
    let mut current: Option<Token> = None;
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or(Error::InvalidEscape)?;
                let token = current.get_or_insert_with(|| Token {
                    text: String::new(),
                    quoted: false,
                });
                token.text.push('\\');
                token.text.push(escaped);
            }
            '"' if in_quotes => {
                in_quotes = false;
                tokens.extend(current.take());
            }
            '"' => {
                tokens.extend(current.take());
                in_quotes = true;
                current = Some(Token {
                    text: String::new(),
                    quoted: true,
                });
            }
            c if c.is_whitespace() && !in_quotes => tokens.extend(current.take()),
            c => current
                .get_or_insert_with(|| Token {
                    text: String::new(),
                    quoted: false,
                })
                .text
                .push(c),
        }
    }

    if in_quotes {
        Err(Error::UnterminatedString)
    } else {
        tokens.extend(current);
        Ok(tokens)
    }
}

/// A cursor over the tokens of presentation-format RDATA.
struct Fields<'a> {
    tokens: std::slice::Iter<'a, Token>,
    origin: &'a Name,
}

impl<'a> Fields<'a> {
    fn next(&mut self, field: &'static str) -> Result<&'a str, Error> {
        self.tokens
            .next()
            .map(|t| t.text.as_str())
            .ok_or(Error::MissingField(field))
    }

    fn parse<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, Error> {
        self.next(field)?
            .parse()
            .or(Err(Error::InvalidInteger(field)))
    }

    fn integer<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, Error> {
        self.parse(field)
    }

    fn name(&mut self, field: &'static str) -> Result<Name, Error> {
        Name::parse_relative(self.next(field)?, self.origin)
            .map_err(|e| Error::InvalidName(field, e))
    }

    /// Concatenates all remaining tokens. Base64 and hexadecimal fields
    /// may contain whitespace.
    fn rest(&mut self, field: &'static str) -> Result<String, Error> {
        let rest: String = self.tokens.by_ref().map(|t| t.text.as_str()).collect();
        if rest.is_empty() {
            Err(Error::MissingField(field))
        } else {
            Ok(rest)
        }
    }
}

////////////////////////////////////////////////////////////////////////
// FIELD HELPERS                                                      //
////////////////////////////////////////////////////////////////////////

/// Decodes the escapes of a `<character-string>` ([RFC 1035 § 5.1]).
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
fn decode_character_string(text: &str) -> Result<Box<[u8]>, Error> {
    let mut octets = Vec::new();
    let mut remaining = text.as_bytes();
    while let Some((&octet, rest)) = remaining.split_first() {
        if octet == b'\\' {
            match rest {
                [d1, d2, d3, ..]
                    if d1.is_ascii_digit() && d2.is_ascii_digit() && d3.is_ascii_digit() =>
                {
                    let value = 100 * (d1 - b'0') as u16 + 10 * (d2 - b'0') as u16
                        + (d3 - b'0') as u16;
                    octets.push(u8::try_from(value).or(Err(Error::InvalidEscape))?);
                    remaining = &rest[3..];
                }
                [d, ..] if d.is_ascii_digit() => return Err(Error::InvalidEscape),
                [other, ..] => {
                    octets.push(*other);
                    remaining = &rest[1..];
                }
                [] => return Err(Error::InvalidEscape),
            }
        } else {
            octets.push(octet);
            remaining = rest;
        }
    }
    if octets.len() > 255 {
        Err(Error::CharacterStringTooLong)
    } else {
        Ok(octets.into_boxed_slice())
    }
}

fn write_character_string(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    f.write_str("\"")?;
    for &octet in octets {
        match octet {
            b'"' | b'\\' => write!(f, "\\{}", octet as char)?,
            b' ' => f.write_str(" ")?,
            o if o.is_ascii_graphic() => write!(f, "{}", o as char)?,
            o => write!(f, "\\{:03}", o)?,
        }
    }
    f.write_str("\"")
}

fn decode_base64(text: &str) -> Result<Box<[u8]>, Error> {
    BASE64
        .decode(text)
        .map(Vec::into_boxed_slice)
        .or(Err(Error::InvalidBase64))
}

/// Parses an RRSIG time field, which is either `YYYYMMDDHHmmSS` (UTC)
/// or a plain number of seconds since the epoch ([RFC 4034 § 3.2]).
///
/// [RFC 4034 § 3.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.2
fn parse_time(text: &str) -> Result<u32, Error> {
    if text.len() != 14 {
        return text.parse().or(Err(Error::InvalidTime));
    }
    let field = |range: std::ops::Range<usize>| -> Result<u8, Error> {
        text.get(range)
            .and_then(|s| s.parse().ok())
            .ok_or(Error::InvalidTime)
    };
    let year: i32 = text
        .get(0..4)
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidTime)?;
    let month = Month::try_from(field(4..6)?).or(Err(Error::InvalidTime))?;
    let date = Date::from_calendar_date(year, month, field(6..8)?).or(Err(Error::InvalidTime))?;
    let time = Time::from_hms(field(8..10)?, field(10..12)?, field(12..14)?)
        .or(Err(Error::InvalidTime))?;
    let seconds = PrimitiveDateTime::new(date, time)
        .assume_utc()
        .unix_timestamp();
    // Serial number arithmetic (RFC 1982) applies, so times wrap.
    Ok(seconds.rem_euclid(1 << 32) as u32)
}

/// Displays an RRSIG time field as `YYYYMMDDHHmmSS`.
struct DisplayTime(u32);

impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match OffsetDateTime::from_unix_timestamp(self.0.into()) {
            Ok(datetime) => write!(
                f,
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                datetime.year(),
                u8::from(datetime.month()),
                datetime.day(),
                datetime.hour(),
                datetime.minute(),
                datetime.second(),
            ),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
