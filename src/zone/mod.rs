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

//! Implementation of DNS zone data structures, for keeping DNS zones
//! loaded in memory.

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, Rrset, Type};

mod error;
mod index;
mod loader;
mod node;
mod validation;
pub use error::Error;
pub use index::{DnameMatch, WildcardMatch, ZoneCut};
pub use loader::ZoneLoader;
pub use validation::ValidationIssue;

use node::Node;

/// A DNS zone loaded into memory.
///
/// A `Zone` is the record store of the engine. Its records are
/// organized into RRsets, which are owned by a tree of `Node`s (a
/// private structure that mirrors the conceptual DNS tree). The methods
/// of the `index` module query that tree; [`Zone::validate`] checks it
/// for semantic errors.
///
/// A `Zone` is built with [`Zone::new`] and [`Zone::insert`], and is
/// treated as an immutable snapshot once it has been published to
/// queries. Wholesale changes produce a *new* snapshot through
/// [`Zone::replace_all`] or [`Zone::clear`].
#[derive(Debug)]
pub struct Zone {
    class: Class,
    apex: Node,
    record_count: usize,
}

impl Zone {
    /// Creates a new `Zone` with the specified origin and class. The
    /// zone is initially empty.
    pub fn new(origin: Name, class: Class) -> Self {
        Self {
            class,
            apex: Node::new(origin),
            record_count: 0,
        }
    }

    /// Returns the zone's origin (the name of its apex).
    pub fn origin(&self) -> &Name {
        &self.apex.name
    }

    /// Returns the zone's class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the number of records stored in the zone.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Adds a record to the `Zone`.
    ///
    /// Records are added in a "flat" manner, one by one, and the `Zone`
    /// organizes them into RRsets attached to the proper nodes. Nodes
    /// between the apex and the owner are created as empty
    /// non-terminals.
    ///
    /// This fails if the owner is not within the zone, if the record's
    /// class does not match the zone, or if its RDATA is not of its
    /// type. A failed insertion leaves the zone unchanged, though
    /// intermediate nodes may have been created.
    pub fn insert(&mut self, record: Record) -> Result<(), Error> {
        if !record.owner.eq_or_subdomain_of(self.origin()) {
            return Err(Error::NotInZone);
        }
        if record.class != self.class {
            return Err(Error::ClassMismatch);
        }
        if !record.is_consistent() {
            return Err(Error::InconsistentRdata);
        }
        let level = record.owner.label_count() - self.origin().label_count();
        let node = self.apex.get_or_create_descendant(&record.owner, level);
        let before = node.rrsets.iter().map(Rrset::len).sum::<usize>();
        node.rrsets.add(record)?;
        let after = node.rrsets.iter().map(Rrset::len).sum::<usize>();
        self.record_count += after - before;
        Ok(())
    }

    /// Builds a new snapshot with the same origin and class from
    /// `records`. This is all-or-nothing: the first error aborts and
    /// no snapshot is produced.
    pub fn replace_all(&self, records: impl IntoIterator<Item = Record>) -> Result<Zone, Error> {
        let mut zone = Zone::new(self.origin().clone(), self.class);
        for record in records {
            zone.insert(record)?;
        }
        Ok(zone)
    }

    /// Returns a snapshot with the same origin and class, but no
    /// records.
    pub fn clear(&self) -> Zone {
        Zone::new(self.origin().clone(), self.class)
    }

    /// Looks up the SOA RRset at the zone's apex.
    pub fn soa(&self) -> Option<&Rrset> {
        self.apex.rrsets.lookup(Type::SOA)
    }

    /// Looks up the NS RRset at the zone's apex.
    pub fn ns(&self) -> Option<&Rrset> {
        self.apex.rrsets.lookup(Type::NS)
    }

    /// Returns an iterator over every RRset in the zone, apex first.
    /// Nodes deeper in the tree are visited after their ancestors, but
    /// siblings come in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Rrset> {
        let mut nodes = Vec::new();
        self.apex.visit(&mut |node| nodes.push(node));
        nodes.into_iter().flat_map(|node| node.rrsets.iter())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
