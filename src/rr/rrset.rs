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

//! Implementation of the [`Rrset`] and [`RrsetList`] structures.

use std::fmt;

use super::{Rdata, Record, Ttl, Type};
use crate::class::Class;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RRSETS                                                             //
////////////////////////////////////////////////////////////////////////

/// All of the records sharing an owner, TYPE, and CLASS.
///
/// An `Rrset` has a single TTL. When records with differing TTLs are
/// added, the TTL of the first one is kept ([RFC 2181 § 5.2] calls for
/// such data to be treated as an error, but servers in practice serve
/// it anyway). Records whose RDATA is already present are ignored.
///
/// [RFC 2181 § 5.2]: https://datatracker.ietf.org/doc/html/rfc2181#section-5.2
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rrset {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    rdatas: Vec<Rdata>,
}

#[allow(clippy::len_without_is_empty)] // An Rrset built by push_rdata is never empty.
impl Rrset {
    /// Creates a new `Rrset` with no RDATA.
    pub fn new(owner: Name, rr_type: Type, class: Class, ttl: Ttl) -> Self {
        Self {
            owner,
            rr_type,
            class,
            ttl,
            rdatas: Vec::new(),
        }
    }

    /// Adds RDATA to the `Rrset`, returning whether it was new.
    pub fn push_rdata(&mut self, rdata: Rdata) -> bool {
        if self.rdatas.contains(&rdata) {
            false
        } else {
            self.rdatas.push(rdata);
            true
        }
    }

    /// Returns an iterator over the RDATA of this `Rrset`, in the order
    /// it was added.
    pub fn rdatas(&self) -> std::slice::Iter<Rdata> {
        self.rdatas.iter()
    }

    /// Returns the number of records in this `Rrset`.
    pub fn len(&self) -> usize {
        self.rdatas.len()
    }

    /// Returns a copy of this `Rrset` with the owner replaced. This is
    /// how wildcard synthesis ([RFC 4592 § 3.3]) rewrites the owner of
    /// the source of synthesis to QNAME.
    ///
    /// [RFC 4592 § 3.3]: https://datatracker.ietf.org/doc/html/rfc4592#section-3.3
    pub fn with_owner(&self, owner: &Name) -> Self {
        Self {
            owner: owner.clone(),
            ..self.clone()
        }
    }

    /// Returns a copy of this `Rrset` with the TTL replaced.
    pub fn with_ttl(&self, ttl: Ttl) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }

    /// Returns the individual records of the `Rrset`.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rdatas.iter().map(move |rdata| {
            Record::new(
                self.owner.clone(),
                self.rr_type,
                self.class,
                self.ttl,
                rdata.clone(),
            )
        })
    }
}

/// Writes each record on its own line.
impl fmt::Display for Rrset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, record) in self.records().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", record)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// RRSET LISTS                                                        //
////////////////////////////////////////////////////////////////////////

/// Stores all of the RRsets at a node in the DNS tree, sorted by TYPE.
#[derive(Clone, Debug, Default)]
pub struct RrsetList {
    rrsets: Vec<Rrset>,
}

impl RrsetList {
    /// Creates a new, empty `RrsetList`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the `RrsetList`.
    ///
    /// The caller is responsible for ensuring that all records added to
    /// a list share the same owner. The list checks the CLASS.
    pub fn add(&mut self, record: Record) -> Result<(), RrsetListAddError> {
        match self
            .rrsets
            .binary_search_by_key(&record.rr_type, |r| r.rr_type)
        {
            Ok(index) => {
                let rrset = &mut self.rrsets[index];
                if rrset.class != record.class {
                    return Err(RrsetListAddError::ClassMismatch);
                }
                rrset.push_rdata(record.rdata);
            }
            Err(index) => {
                if self.rrsets.first().map_or(false, |r| r.class != record.class) {
                    return Err(RrsetListAddError::ClassMismatch);
                }
                let mut rrset = Rrset::new(record.owner, record.rr_type, record.class, record.ttl);
                rrset.push_rdata(record.rdata);
                self.rrsets.insert(index, rrset);
            }
        }
        Ok(())
    }

    /// Looks up the [`Rrset`] of type `rr_type` in the `RrsetList`.
    pub fn lookup(&self, rr_type: Type) -> Option<&Rrset> {
        self.rrsets
            .binary_search_by_key(&rr_type, |r| r.rr_type)
            .map(|index| &self.rrsets[index])
            .ok()
    }

    /// Builds an RRSIG [`Rrset`] from the signatures in this list that
    /// cover `rr_type`, if there are any.
    pub fn signatures_for(&self, rr_type: Type) -> Option<Rrset> {
        let rrsigs = self.lookup(Type::RRSIG)?;
        let mut covering = Rrset::new(rrsigs.owner.clone(), Type::RRSIG, rrsigs.class, rrsigs.ttl);
        for rdata in rrsigs.rdatas() {
            if matches!(rdata, Rdata::Rrsig(rrsig) if rrsig.type_covered == rr_type) {
                covering.push_rdata(rdata.clone());
            }
        }
        if covering.len() == 0 {
            None
        } else {
            Some(covering)
        }
    }

    /// Returns an iterator over the [`Rrset`]s of the `RrsetList`.
    pub fn iter(&self) -> std::slice::Iter<Rrset> {
        self.rrsets.iter()
    }

    /// Returns the number of [`Rrset`]s in the `RrsetList`.
    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    /// Returns whether the `RrsetList` is empty.
    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

/// An error signaling that a record could not be added to an
/// [`RrsetList`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RrsetListAddError {
    ClassMismatch,
}

impl fmt::Display for RrsetListAddError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ClassMismatch => f.write_str("CLASS mismatch"),
        }
    }
}

impl std::error::Error for RrsetListAddError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn owner() -> Name {
        "cairn.test.".parse().unwrap()
    }

    fn a_record(last_octet: u8, ttl: u32) -> Record {
        Record::new(
            owner(),
            Type::A,
            Class::IN,
            Ttl::from(ttl),
            Rdata::A(Ipv4Addr::new(127, 0, 0, last_octet)),
        )
    }

    #[test]
    fn rrsetlist_works() {
        let mut rrsets = RrsetList::new();
        rrsets.add(a_record(1, 3600)).unwrap();
        rrsets.add(a_record(2, 3600)).unwrap();
        rrsets
            .add(Record::new(
                owner(),
                Type::CNAME,
                Class::IN,
                Ttl::from(7200),
                Rdata::Cname("test.".parse().unwrap()),
            ))
            .unwrap();

        let a_rrset = rrsets.lookup(Type::A).unwrap();
        assert_eq!(
            a_rrset.rdatas().cloned().collect::<Vec<_>>(),
            [
                Rdata::A(Ipv4Addr::new(127, 0, 0, 1)),
                Rdata::A(Ipv4Addr::new(127, 0, 0, 2)),
            ],
        );
        assert_eq!(rrsets.lookup(Type::CNAME).unwrap().len(), 1);
        assert!(rrsets.lookup(Type::AAAA).is_none());
        assert_eq!(rrsets.len(), 2);
    }

    #[test]
    fn rrsetlist_keeps_first_ttl() {
        let mut rrsets = RrsetList::new();
        rrsets.add(a_record(1, 3600)).unwrap();
        rrsets.add(a_record(2, 7200)).unwrap();
        let a_rrset = rrsets.lookup(Type::A).unwrap();
        assert_eq!(a_rrset.ttl, Ttl::from(3600));
        assert_eq!(a_rrset.len(), 2);
    }

    #[test]
    fn rrsetlist_ignores_duplicates() {
        let mut rrsets = RrsetList::new();
        rrsets.add(a_record(1, 3600)).unwrap();
        rrsets.add(a_record(1, 3600)).unwrap();
        assert_eq!(rrsets.lookup(Type::A).unwrap().len(), 1);
    }

    #[test]
    fn rrsetlist_rejects_class_mismatch() {
        let mut rrsets = RrsetList::new();
        rrsets.add(a_record(1, 3600)).unwrap();
        let mut record = a_record(2, 3600);
        record.class = Class::CH;
        assert_eq!(rrsets.add(record), Err(RrsetListAddError::ClassMismatch));
    }

    #[test]
    fn with_owner_rewrites_owner_only() {
        let mut rrset = Rrset::new(owner(), Type::A, Class::IN, Ttl::from(60));
        rrset.push_rdata(Rdata::A(Ipv4Addr::LOCALHOST));
        let synthesized = rrset.with_owner(&"www.cairn.test.".parse().unwrap());
        assert_eq!(synthesized.owner, "www.cairn.test.".parse().unwrap());
        assert_eq!(synthesized.rdatas().count(), 1);
        assert_eq!(synthesized.ttl, rrset.ttl);
    }
}
