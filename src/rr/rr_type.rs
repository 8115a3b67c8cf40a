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

//! Implementation of the [`Type`] structure.

use crate::message::Qtype;

define_code! {
    /// Represents the TYPE of a resource record.
    ///
    /// This is a wrapper around the [`u16`] TYPE value, with constants
    /// for the types the engine knows about. Any other value is still
    /// representable, and is handled as opaque data per [RFC 3597].
    ///
    /// [RFC 3597]: https://datatracker.ietf.org/doc/html/rfc3597
    pub struct Type, "TYPE" {
        A = 1,
        NS = 2,
        CNAME = 5,
        SOA = 6,
        PTR = 12,
        MX = 15,
        TXT = 16,
        AAAA = 28,
        SRV = 33,
        DNAME = 39,
        DS = 43,
        RRSIG = 46,
        NSEC = 47,
        DNSKEY = 48,
    }
}

impl Type {
    /// Returns whether this is a type of DNSSEC proof material (RRSIG
    /// or NSEC). Such RRsets may share an owner with a CNAME, and they
    /// are only placed in responses when DNSSEC processing is
    /// requested.
    pub fn is_dnssec_proof(self) -> bool {
        matches!(self, Self::RRSIG | Self::NSEC)
    }
}

impl From<Qtype> for Type {
    fn from(qtype: Qtype) -> Self {
        Self::from(u16::from(qtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_displays_according_to_rfc3597() {
        // TYPE65280 is from the private use range, so it should always
        // be unknown.
        assert_eq!(Type::from(0xff00).to_string(), "TYPE65280");
        assert_eq!(Type::DNAME.to_string(), "DNAME");
    }

    #[test]
    fn type_parses_according_to_rfc3597() {
        let type_a: Type = "TYPE1".parse().unwrap();
        let type_65280: Type = "TYPE65280".parse().unwrap();
        assert_eq!(type_a, Type::A);
        assert_eq!(u16::from(type_65280), 65280);
        assert_eq!("rrsig".parse::<Type>(), Ok(Type::RRSIG));
    }

    #[test]
    fn dnssec_proof_types() {
        assert!(Type::RRSIG.is_dnssec_proof());
        assert!(Type::NSEC.is_dnssec_proof());
        assert!(!Type::DS.is_dnssec_proof());
        assert!(!Type::A.is_dnssec_proof());
    }
}
