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

//! Implementation of the name index: the queries that the resolution
//! engine makes against a [`Zone`]'s tree.
//!
//! Each query walks the tree from the apex toward a name, matching one
//! label at a time, and stops at the deepest node that exists. That
//! node is the *closest encloser* of the name ([RFC 4592 § 3.3.1]);
//! when it is the name itself, the name exists in the zone (possibly
//! as an empty non-terminal). The nodes passed on the way down are
//! where zone cuts and DNAME records are found.
//!
//! None of these queries perform the complete lookup algorithm of
//! [RFC 1034 § 4.3.2]; that is the job of [`crate::resolve`]. In
//! particular, [`Zone::lookup`] and [`Zone::lookup_any`] match exact
//! owners only, and do not stop at zone cuts, so they also reach glue
//! records below a delegation.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 4592 § 3.3.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-3.3.1

use crate::name::Name;
use crate::rr::{Rrset, RrsetList, Type};

use super::{Node, Zone};

/// A zone cut found above (or at) a name.
#[derive(Debug)]
pub struct ZoneCut<'a> {
    /// The owner of the NS RRset, i.e., the name of the child zone.
    pub owner: &'a Name,

    /// The NS RRset found at the cut.
    pub ns_rrset: &'a Rrset,
}

/// A DNAME RRset found at a strict ancestor of a name.
#[derive(Debug)]
pub struct DnameMatch<'a> {
    pub owner: &'a Name,
    pub rrset: &'a Rrset,
}

/// The wildcard owner below a closest encloser, which is the source of
/// synthesis ([RFC 4592 § 3.3.1]) for names that do not exist.
///
/// [RFC 4592 § 3.3.1]: https://datatracker.ietf.org/doc/html/rfc4592#section-3.3.1
#[derive(Debug)]
pub struct WildcardMatch<'a> {
    pub owner: &'a Name,
    pub rrsets: &'a RrsetList,
}

/// The nodes visited walking from the apex toward a name.
struct Walk<'a> {
    path: Vec<&'a Node>,
    exact: bool,
}

impl<'a> Walk<'a> {
    fn deepest(&self) -> &'a Node {
        self.path[self.path.len() - 1]
    }

    /// The visited nodes that are strict ancestors of the name.
    fn ancestors(&self) -> &[&'a Node] {
        if self.exact {
            &self.path[..self.path.len() - 1]
        } else {
            &self.path
        }
    }
}

impl Zone {
    /// Walks the tree toward `name`. Returns `None` if `name` is not
    /// within the zone.
    fn walk(&self, name: &Name) -> Option<Walk> {
        if !name.eq_or_subdomain_of(self.origin()) {
            return None;
        }
        let mut level = name.label_count() - self.origin().label_count();
        let mut node = &self.apex;
        let mut path = vec![node];
        while level > 0 {
            match name.label(level - 1).and_then(|label| node.child(label)) {
                Some(child) => {
                    node = child;
                    path.push(node);
                    level -= 1;
                }
                None => break,
            }
        }
        Some(Walk {
            path,
            exact: level == 0,
        })
    }

    /// Looks up the RRset of type `rr_type` owned by exactly `name`.
    /// Wildcards and zone cuts are not considered.
    pub fn lookup(&self, name: &Name, rr_type: Type) -> Option<&Rrset> {
        self.lookup_any(name)?.lookup(rr_type)
    }

    /// Looks up all of the RRsets owned by exactly `name`. An empty
    /// non-terminal gives an empty list; a name that does not exist in
    /// the zone gives `None`.
    pub fn lookup_any(&self, name: &Name) -> Option<&RrsetList> {
        let walk = self.walk(name)?;
        if walk.exact {
            Some(&walk.deepest().rrsets)
        } else {
            None
        }
    }

    /// Returns the closest encloser of `name`: the deepest name at or
    /// above `name` that exists in the zone. Returns `None` if `name`
    /// is outside the zone.
    pub fn find_closest_encloser(&self, name: &Name) -> Option<&Name> {
        self.walk(name).map(|walk| &walk.deepest().name)
    }

    /// Finds the highest zone cut at or above `name`. The apex NS RRset
    /// does not make a cut.
    pub fn find_zone_cut(&self, name: &Name) -> Option<ZoneCut> {
        self.walk(name)?.path.into_iter().skip(1).find_map(|node| {
            node.rrsets.lookup(Type::NS).map(|ns_rrset| ZoneCut {
                owner: &node.name,
                ns_rrset,
            })
        })
    }

    /// Finds the highest strict ancestor of `name` (the apex included)
    /// that owns a DNAME RRset.
    pub fn find_dname(&self, name: &Name) -> Option<DnameMatch> {
        let walk = self.walk(name)?;
        walk.ancestors().iter().copied().find_map(|node| {
            node.rrsets.lookup(Type::DNAME).map(|rrset| DnameMatch {
                owner: &node.name,
                rrset,
            })
        })
    }

    /// Finds the wildcard owner `*.<encloser>`, if it exists (possibly
    /// as an empty non-terminal).
    pub fn find_wildcard(&self, encloser: &Name) -> Option<WildcardMatch> {
        let walk = self.walk(encloser)?;
        if !walk.exact {
            return None;
        }
        walk.deepest()
            .wildcard
            .as_deref()
            .map(|node| WildcardMatch {
                owner: &node.name,
                rrsets: &node.rrsets,
            })
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::class::Class;
    use crate::rr::{Rdata, Record, Ttl};

    /// A shorthand to create a Name, panicking on errors.
    fn name(from: &str) -> Name {
        from.parse().unwrap()
    }

    // Data for the zone presented as an example in RFC 4592 § 2.2.1.
    static RFC_4592_ZONE: &[(&str, Type, &str)] = &[
        ("example.", Type::SOA, "ns.example.com. hostmaster.example. 1 7200 3600 1209600 300"),
        ("example.", Type::NS, "ns.example.com."),
        ("example.", Type::NS, "ns.example.net."),
        ("*.example.", Type::TXT, "\"this is a wildcard\""),
        ("*.example.", Type::MX, "10 host1.example."),
        ("sub.*.example.", Type::TXT, "\"this is not a wildcard\""),
        ("host1.example.", Type::A, "192.0.2.1"),
        ("_ssh._tcp.host1.example.", Type::SRV, "0 1 22 host1.example."),
        ("_ssh._tcp.host2.example.", Type::SRV, "0 1 22 host2.example."),
        ("subdel.example.", Type::NS, "ns.example.com."),
        ("subdel.example.", Type::NS, "ns.example.net."),
        ("ns.subdel.example.", Type::A, "192.0.2.53"),
        ("dname.example.", Type::DNAME, "example.net."),
    ];

    lazy_static! {
        static ref ZONE: Zone = {
            let origin = name("example.");
            let mut zone = Zone::new(origin.clone(), Class::IN);
            for &(owner, rr_type, data) in RFC_4592_ZONE {
                zone.insert(Record::new(
                    name(owner),
                    rr_type,
                    Class::IN,
                    Ttl::from(3600),
                    Rdata::parse(rr_type, data, &origin).unwrap(),
                ))
                .unwrap();
            }
            zone
        };
    }

    #[test]
    fn lookup_matches_exact_owners_only() {
        assert_eq!(ZONE.lookup(&name("host1.example."), Type::A).unwrap().len(), 1);
        assert!(ZONE.lookup(&name("host1.example."), Type::MX).is_none());
        assert!(ZONE.lookup(&name("host3.example."), Type::MX).is_none());
        assert!(ZONE.lookup(&name("HOST1.EXAMPLE."), Type::A).is_some());
    }

    #[test]
    fn lookup_reaches_below_zone_cuts() {
        assert!(ZONE.lookup(&name("ns.subdel.example."), Type::A).is_some());
    }

    #[test]
    fn lookup_any_distinguishes_empty_non_terminals() {
        assert!(ZONE.lookup_any(&name("_tcp.host1.example.")).unwrap().is_empty());
        assert!(ZONE.lookup_any(&name("_udp.host1.example.")).is_none());
        assert!(ZONE.lookup_any(&name("other.test.")).is_none());
    }

    #[test]
    fn literal_asterisk_reaches_wildcard_owner() {
        let rrsets = ZONE.lookup_any(&name("*.example.")).unwrap();
        assert_eq!(rrsets.len(), 2);
        assert!(ZONE.lookup(&name("sub.*.example."), Type::TXT).is_some());
    }

    #[test]
    fn find_closest_encloser_works() {
        for (target, expected) in [
            ("host3.example.", "example."),
            ("_telnet._tcp.host1.example.", "_tcp.host1.example."),
            ("ghost.*.example.", "*.example."),
            ("host1.example.", "host1.example."),
        ] {
            assert_eq!(ZONE.find_closest_encloser(&name(target)), Some(&name(expected)));
        }
        assert!(ZONE.find_closest_encloser(&name("other.test.")).is_none());
    }

    #[test]
    fn find_zone_cut_ignores_apex_and_finds_cuts() {
        assert!(ZONE.find_zone_cut(&name("example.")).is_none());
        assert!(ZONE.find_zone_cut(&name("host1.example.")).is_none());
        for target in ["subdel.example.", "ns.subdel.example.", "deep.x.subdel.example."] {
            let cut = ZONE.find_zone_cut(&name(target)).unwrap();
            assert_eq!(cut.owner, &name("subdel.example."));
            assert_eq!(cut.ns_rrset.len(), 2);
        }
    }

    #[test]
    fn find_dname_requires_strict_ancestor() {
        assert!(ZONE.find_dname(&name("dname.example.")).is_none());
        let found = ZONE.find_dname(&name("a.b.dname.example.")).unwrap();
        assert_eq!(found.owner, &name("dname.example."));
        assert_eq!(found.rrset.rr_type, Type::DNAME);
    }

    #[test]
    fn find_wildcard_works() {
        let wildcard = ZONE.find_wildcard(&name("example.")).unwrap();
        assert_eq!(wildcard.owner, &name("*.example."));
        assert!(wildcard.rrsets.lookup(Type::MX).is_some());
        assert!(ZONE.find_wildcard(&name("host1.example.")).is_none());
        assert!(ZONE.find_wildcard(&name("nonexistent.example.")).is_none());
    }
}
