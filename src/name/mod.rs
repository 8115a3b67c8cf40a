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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrayvec::ArrayVec;

mod error;
mod label;
pub use error::Error;
pub use label::Label;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// An absolute domain name.
///
/// A `Name` is stored as its non-null labels, leftmost first; the
/// terminal root label is implicit. The root name `.` therefore has no
/// stored labels at all. Construction always checks that the name would
/// fit in 255 octets on the wire.
///
/// Equality, hashing, and ordering are ASCII-case-insensitive (see
/// [`Label`]), while [`Display`](fmt::Display) reproduces the case the
/// name was created with.
///
/// `Name`s are usually created through the [`FromStr`] implementation,
/// which requires a fully-qualified name in presentation format, or
/// through [`Name::parse_relative`], which also accepts names relative
/// to an origin (as in zone files).
#[derive(Clone)]
pub struct Name {
    labels: Vec<Label>,
}

////////////////////////////////////////////////////////////////////////
// NAME PUBLIC API                                                    //
////////////////////////////////////////////////////////////////////////

impl Name {
    /// Returns the root name `.`.
    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    /// Creates a `Name` from labels given leftmost first. Fails if the
    /// result would be too long.
    pub fn from_labels(labels: Vec<Label>) -> Result<Self, Error> {
        let name = Self { labels };
        if name.wire_len() > MAX_WIRE_LEN {
            Err(Error::NameTooLong)
        } else {
            Ok(name)
        }
    }

    /// Parses a name in presentation format. If `text` is `@`, the
    /// result is `origin`; if it does not end with an unescaped `.`, it
    /// is taken to be relative to `origin`.
    pub fn parse_relative(text: &str, origin: &Name) -> Result<Self, Error> {
        if text == "@" {
            return Ok(origin.clone());
        }
        let (mut labels, absolute) = parse_labels(text)?;
        if !absolute {
            labels.extend(origin.labels.iter().cloned());
        }
        Self::from_labels(labels)
    }

    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.labels.len() >= other.labels.len()
            && self
                .labels
                .iter()
                .rev()
                .zip(other.labels.iter().rev())
                .all(|(a, b)| a == b)
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns whether the `Name` is a wildcard domain name (i.e.,
    /// whether its first label is `*`).
    pub fn is_wildcard(&self) -> bool {
        self.labels.first().map_or(false, Label::is_asterisk)
    }

    /// Returns the number of non-null labels in this `Name`. The root
    /// has zero.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Returns an iterator over the non-null labels of this `Name`,
    /// leftmost first.
    pub fn labels(&self) -> std::slice::Iter<Label> {
        self.labels.iter()
    }

    /// Returns the length of the uncompressed on-the-wire
    /// representation of this `Name`.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Returns the superdomain obtained by skipping the first `skip`
    /// labels of the `Name`, or `None` if there aren't enough labels.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        self.labels.get(skip..).map(|labels| Self {
            labels: labels.to_vec(),
        })
    }

    /// Like [`Name::superdomain`], but panics if `skip` exceeds the
    /// label count. Any suffix of a valid name is itself valid, so the
    /// zone tree uses this when it builds names for new nodes.
    pub(crate) fn suffix(&self, skip: usize) -> Name {
        Self {
            labels: self.labels[skip..].to_vec(),
        }
    }

    /// Returns the label at `index`, counting from the left.
    pub fn label(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    /// Returns a new `Name` with `label` prepended.
    pub fn prepend(&self, label: Label) -> Result<Name, Error> {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push(label);
        labels.extend(self.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// Returns the wildcard name `*.<self>`.
    pub fn wildcard_child(&self) -> Result<Name, Error> {
        self.prepend(Label::asterisk())
    }

    /// Replaces `suffix`, which this `Name` must be equal to or a
    /// subdomain of, with `replacement`. This is the substitution
    /// performed for DNAME records ([RFC 6672 § 2.2]).
    ///
    /// [RFC 6672 § 2.2]: https://datatracker.ietf.org/doc/html/rfc6672#section-2.2
    pub fn replace_suffix(&self, suffix: &Name, replacement: &Name) -> Result<Name, Error> {
        if !self.eq_or_subdomain_of(suffix) {
            return Err(Error::NotASuffix);
        }
        let keep = self.labels.len() - suffix.labels.len();
        let mut labels = Vec::with_capacity(keep + replacement.labels.len());
        labels.extend(self.labels[..keep].iter().cloned());
        labels.extend(replacement.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// Returns a copy of this `Name` with all ASCII letters lowercased.
    ///
    /// This is provided with [RFC 4034 § 6.2] (DNSSEC canonical RR
    /// form) in mind.
    ///
    /// [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2
    pub fn to_ascii_lowercase(&self) -> Name {
        Self {
            labels: self.labels.iter().map(Label::to_ascii_lowercase).collect(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.labels.is_empty() {
            f.write_str(".")
        } else {
            for label in self.labels.iter() {
                write!(f, "{}.", label)?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` employs DNSSEC's canonical
/// ordering of domain names. Per [RFC 4034 § 6.1], `Name`s are ordered
/// as strings of labels read from right to left.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels.iter().rev().cmp(other.labels.iter().rev())
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.labels.len());
        for label in self.labels.iter() {
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING                                                            //
////////////////////////////////////////////////////////////////////////

/// Parses a fully-qualified domain name in presentation format. The
/// escape sequences `\DDD` and `\X` of [RFC 4343 § 2.1] are supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (labels, absolute) = parse_labels(s)?;
        if absolute {
            Self::from_labels(labels)
        } else {
            Err(Error::NonNullTerminal)
        }
    }
}

/// Splits `text` into labels, returning them along with whether the
/// text ended in an unescaped `.` (i.e., was absolute).
fn parse_labels(text: &str) -> Result<(Vec<Label>, bool), Error> {
    if text.is_empty() {
        return Err(Error::StrEmpty);
    } else if text == "." {
        return Ok((Vec::new(), true));
    }

    let mut labels = Vec::new();
    let mut current: ArrayVec<u8, MAX_LABEL_LEN> = ArrayVec::new();
    let mut remaining_octets = text.as_bytes();
    let mut absolute = false;

    // NOTE: to check that the string is ASCII, it suffices to check
    // that each octet is ASCII as we go. This is because all
    // multi-byte characters start with an octet that is not ASCII.
    while let Some(&octet) = remaining_octets.first() {
        absolute = false;
        if octet == b'\\' {
            let (value, consumed) = parse_escape(&remaining_octets[1..])?;
            current.try_push(value).or(Err(Error::LabelTooLong))?;
            remaining_octets = &remaining_octets[consumed + 1..];
        } else if octet == b'.' {
            labels.push(Label::try_from(current.as_slice())?);
            current.clear();
            remaining_octets = &remaining_octets[1..];
            absolute = true;
        } else if !octet.is_ascii() {
            return Err(Error::StrNotAscii);
        } else {
            current.try_push(octet).or(Err(Error::LabelTooLong))?;
            remaining_octets = &remaining_octets[1..];
        }
    }
    if !current.is_empty() {
        labels.push(Label::try_from(current.as_slice())?);
    }

    // Check the length as early as possible, so that callers building
    // on the labels (e.g. appending an origin) start from a valid name.
    if labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1 > MAX_WIRE_LEN {
        Err(Error::NameTooLong)
    } else {
        Ok((labels, absolute))
    }
}

/// Parses an escape sequence. We expect `remaining_octets` to start
/// with the octet immediately *after* the backslash that introduces the
/// escape sequence.
fn parse_escape(remaining_octets: &[u8]) -> Result<(u8, usize), Error> {
    match remaining_octets {
        [] => Err(Error::InvalidEscape),
        [d1, d2, d3, ..] if d1.is_ascii_digit() && d2.is_ascii_digit() && d3.is_ascii_digit() => {
            let value =
                100 * (d1 - b'0') as usize + 10 * (d2 - b'0') as usize + (d3 - b'0') as usize;
            u8::try_from(value)
                .map(|v| (v, 3))
                .or(Err(Error::InvalidEscape))
        }
        [d, ..] if d.is_ascii_digit() => Err(Error::InvalidEscape),
        [other, ..] if other.is_ascii() => Ok((*other, 1)),
        _ => Err(Error::StrNotAscii),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
