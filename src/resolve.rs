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

//! Implementation of the resolution engine.
//!
//! [`resolve`] carries out step 3 of the nameserver lookup algorithm
//! of [RFC 1034 § 4.3.2], as clarified by [RFC 4592] (wildcards) and
//! extended by [RFC 6672] (DNAME), against a single [`Zone`]. The
//! result is an [`Outcome`], which describes *what* was found; turning
//! it into a response is left to the
//! [`server::assemble`](crate::server) module.
//!
//! For each name visited, the checks are made in this order:
//!
//! 1. If the name is at or below a zone cut, the result is a
//!    delegation, even when records exist at the name.
//! 2. If a strict ancestor of the name owns a DNAME record, a CNAME is
//!    synthesized and the rewritten name is resolved in turn.
//! 3. If the name exists, its RRset of the requested type is the
//!    answer. If it has none, but has a CNAME, the CNAME's target is
//!    resolved in turn. Otherwise, the result is NODATA.
//! 4. If the name does not exist, but there is a wildcard below its
//!    closest encloser, step 3 is performed against the wildcard, with
//!    owners rewritten to the name.
//! 5. Otherwise, the result is NXDOMAIN.
//!
//! Aliases are only followed within the zone, and at most
//! [`MAX_ALIAS_CHAIN_LEN`] times.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592
//! [RFC 6672]: https://datatracker.ietf.org/doc/html/rfc6672

use std::fmt;

use arrayvec::ArrayVec;
use log::debug;

use crate::message::Qtype;
use crate::name::Name;
use crate::rr::{Rdata, Rrset, RrsetList, Type};
use crate::zone::Zone;

/// The maximum number of CNAME and DNAME links followed while
/// resolving a single question.
pub const MAX_ALIAS_CHAIN_LEN: usize = 8;

////////////////////////////////////////////////////////////////////////
// OUTCOMES                                                           //
////////////////////////////////////////////////////////////////////////

/// The result of resolving a question against a zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// An RRset of the requested type was found.
    Answer { found: Found, owner: Name },

    /// The question had QTYPE `*`, and the name owns these RRsets.
    AnyAnswer { found: Vec<Found>, owner: Name },

    /// One or more CNAME or DNAME records were followed.
    Alias {
        chain: Vec<Found>,
        terminal: AliasTerminal,
    },

    /// The name is at or below a zone cut.
    Delegation { ns_rrset: Rrset, cut: Name },

    /// The name exists, but owns no RRset of the requested type.
    NoData {
        owner: Name,
        source_of_synthesis: Option<Name>,
    },

    /// The name does not exist.
    NameError { closest_encloser: Name },
}

/// How an alias chain ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AliasTerminal {
    /// The last target was resolved within the zone. The outcome is
    /// never itself an [`Outcome::Alias`].
    Resolved(Box<Outcome>),

    /// The last target is outside of the zone.
    External(Name),

    /// The chain could not be followed to its end.
    Terminated(ChainEnd),
}

/// Reasons for which an alias chain is cut short.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChainEnd {
    /// The chain revisited a name.
    Loop,

    /// The chain had more than [`MAX_ALIAS_CHAIN_LEN`] links.
    TooLong,

    /// A DNAME substitution produced a name longer than 255 octets.
    NameOverflow,
}

/// An RRset placed in an outcome, along with where it came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Found {
    /// The RRset as it should appear in a response.
    pub rrset: Rrset,
    pub source: Source,
}

/// Where the data of a [`Found`] RRset is stored in the zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// The RRset is stored at its own owner.
    Stored,

    /// The RRset was synthesized from the RRset of the same type at
    /// this wildcard owner.
    Wildcard(Name),

    /// The RRset is a CNAME synthesized from a DNAME, and is not
    /// stored anywhere.
    Dname,
}

impl Found {
    fn stored(rrset: &Rrset) -> Self {
        Self {
            rrset: rrset.clone(),
            source: Source::Stored,
        }
    }

    /// Returns the owner at which the RRset's data (and signatures) are
    /// stored, if it is stored at all.
    pub fn stored_owner(&self) -> Option<&Name> {
        match self.source {
            Source::Stored => Some(&self.rrset.owner),
            Source::Wildcard(ref owner) => Some(owner),
            Source::Dname => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Answer { found, .. } => write!(f, "answer ({} records)", found.rrset.len()),
            Self::AnyAnswer { found, .. } => write!(f, "answer ({} RRsets)", found.len()),
            Self::Alias { chain, terminal } => {
                write!(f, "alias chain of {} RRsets, then ", chain.len())?;
                match terminal {
                    AliasTerminal::Resolved(outcome) => fmt::Display::fmt(outcome.as_ref(), f),
                    AliasTerminal::External(target) => write!(f, "external target {}", target),
                    AliasTerminal::Terminated(end) => write!(f, "termination ({:?})", end),
                }
            }
            Self::Delegation { cut, .. } => write!(f, "delegation to {}", cut),
            Self::NoData { .. } => f.write_str("NODATA"),
            Self::NameError { closest_encloser } => {
                write!(f, "NXDOMAIN (closest encloser {})", closest_encloser)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION ERRORS                                               //
////////////////////////////////////////////////////////////////////////

/// Errors signaling that the server is not in a state to answer
/// authoritatively for a name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConfigurationError {
    NoOrigin,
    MissingSoa,
    NotInZone,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NoOrigin => f.write_str("no zone origin has been set"),
            Self::MissingSoa => f.write_str("the zone has no SOA record at its apex"),
            Self::NotInZone => f.write_str("the name is not within the zone"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

////////////////////////////////////////////////////////////////////////
// RESOLUTION                                                         //
////////////////////////////////////////////////////////////////////////

/// Resolves a question for `qname` and `qtype` against `zone`.
///
/// `zone` is `None` when no origin has been configured. The DNSSEC
/// flag never changes the outcome; it only affects how the outcome is
/// assembled into a response.
pub fn resolve(
    zone: Option<&Zone>,
    qname: &Name,
    qtype: Qtype,
    dnssec_requested: bool,
) -> Result<Outcome, ConfigurationError> {
    let zone = zone.ok_or(ConfigurationError::NoOrigin)?;
    if zone.soa().is_none() {
        return Err(ConfigurationError::MissingSoa);
    }
    if !qname.eq_or_subdomain_of(zone.origin()) {
        return Err(ConfigurationError::NotInZone);
    }

    let outcome = follow_chain(zone, qname, qtype);
    debug!(
        "resolved {} {} (DNSSEC {}): {}",
        qname,
        qtype,
        if dnssec_requested { "on" } else { "off" },
        outcome
    );
    Ok(outcome)
}

/// The result of looking up a single name.
enum Step {
    Done(Outcome),
    Alias { links: Vec<Found>, next: Next },
}

/// Where an alias found by a [`Step`] leads.
enum Next {
    Target(Name),
    Overflow,
}

/// Resolves `qname`, following aliases as needed.
fn follow_chain(zone: &Zone, qname: &Name, qtype: Qtype) -> Outcome {
    let mut chain = Vec::new();
    let mut visited: ArrayVec<Name, MAX_ALIAS_CHAIN_LEN> = ArrayVec::new();
    let mut name = qname.clone();

    let terminal = loop {
        let (links, next) = match lookup_step(zone, &name, qtype) {
            Step::Done(outcome) if chain.is_empty() => return outcome,
            Step::Done(outcome) => break AliasTerminal::Resolved(Box::new(outcome)),
            Step::Alias { links, next } => (links, next),
        };

        if visited.try_push(name).is_err() {
            break AliasTerminal::Terminated(ChainEnd::TooLong);
        }
        chain.extend(links);

        name = match next {
            Next::Overflow => break AliasTerminal::Terminated(ChainEnd::NameOverflow),
            Next::Target(target) if !target.eq_or_subdomain_of(zone.origin()) => {
                break AliasTerminal::External(target);
            }
            Next::Target(target) if visited.contains(&target) => {
                break AliasTerminal::Terminated(ChainEnd::Loop);
            }
            Next::Target(target) => target,
        };
    };

    Outcome::Alias { chain, terminal }
}

/// Looks up a single name that is within the zone.
fn lookup_step(zone: &Zone, name: &Name, qtype: Qtype) -> Step {
    if let Some(cut) = zone.find_zone_cut(name) {
        return Step::Done(Outcome::Delegation {
            ns_rrset: cut.ns_rrset.clone(),
            cut: cut.owner.clone(),
        });
    }

    if let Some(dname) = zone.find_dname(name) {
        if let Some(Rdata::Dname(target)) = dname.rrset.rdatas().next() {
            let mut links = vec![Found::stored(dname.rrset)];
            let next = match name.replace_suffix(dname.owner, target) {
                Ok(rewritten) => {
                    let mut cname = Rrset::new(
                        name.clone(),
                        Type::CNAME,
                        dname.rrset.class,
                        dname.rrset.ttl,
                    );
                    cname.push_rdata(Rdata::Cname(rewritten.clone()));
                    links.push(Found {
                        rrset: cname,
                        source: Source::Dname,
                    });
                    Next::Target(rewritten)
                }
                Err(_) => Next::Overflow,
            };
            return Step::Alias { links, next };
        }
    }

    if let Some(rrsets) = zone.lookup_any(name) {
        return match_rrsets(name, rrsets, qtype, None);
    }

    let closest_encloser = zone.find_closest_encloser(name).unwrap_or(zone.origin());
    match zone.find_wildcard(closest_encloser) {
        Some(wildcard) => match_rrsets(name, wildcard.rrsets, qtype, Some(wildcard.owner)),
        None => Step::Done(Outcome::NameError {
            closest_encloser: closest_encloser.clone(),
        }),
    }
}

/// Searches the RRsets of an existing name (or of the wildcard that
/// stands in for it) for the requested type.
fn match_rrsets(name: &Name, rrsets: &RrsetList, qtype: Qtype, wildcard: Option<&Name>) -> Step {
    let found = |rrset: &Rrset| match wildcard {
        Some(source) => Found {
            rrset: rrset.with_owner(name),
            source: Source::Wildcard(source.clone()),
        },
        None => Found::stored(rrset),
    };
    let no_data = || {
        Step::Done(Outcome::NoData {
            owner: name.clone(),
            source_of_synthesis: wildcard.cloned(),
        })
    };

    if qtype == Qtype::ANY {
        if rrsets.is_empty() {
            return no_data();
        }
        return Step::Done(Outcome::AnyAnswer {
            found: rrsets.iter().map(found).collect(),
            owner: name.clone(),
        });
    }

    // A CNAME owner may also hold the DNSSEC records proving it, which
    // are answered directly.
    let rr_type = Type::from(qtype);
    if rr_type != Type::CNAME && !rr_type.is_dnssec_proof() {
        if let Some(cname_rrset) = rrsets.lookup(Type::CNAME) {
            if let Some(Rdata::Cname(target)) = cname_rrset.rdatas().next() {
                return Step::Alias {
                    links: vec![found(cname_rrset)],
                    next: Next::Target(target.clone()),
                };
            }
        }
    }

    match rrsets.lookup(rr_type) {
        Some(rrset) => Step::Done(Outcome::Answer {
            found: found(rrset),
            owner: name.clone(),
        }),
        None => no_data(),
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
    use crate::rr::{Record, Ttl};

    /// A shorthand to create a Name, panicking on errors.
    fn name(from: &str) -> Name {
        from.parse().unwrap()
    }

    fn build_zone(origin: &str, records: &[(&str, Type, &str)]) -> Zone {
        let origin = name(origin);
        let mut zone = Zone::new(origin.clone(), Class::IN);
        for &(owner, rr_type, data) in records {
            zone.insert(Record::new(
                Name::parse_relative(owner, &origin).unwrap(),
                rr_type,
                Class::IN,
                Ttl::from(3600),
                Rdata::parse(rr_type, data, &origin).unwrap(),
            ))
            .unwrap();
        }
        zone
    }

    static RECORDS: &[(&str, Type, &str)] = &[
        ("@", Type::SOA, "ns hostmaster 1 7200 3600 1209600 300"),
        ("@", Type::NS, "ns"),
        ("ns", Type::A, "192.0.2.53"),
        ("www", Type::A, "192.0.2.1"),
        ("www", Type::A, "192.0.2.2"),
        ("alias", Type::CNAME, "www"),
        ("alias2", Type::CNAME, "alias"),
        ("dangling", Type::CNAME, "nowhere"),
        ("external", Type::CNAME, "www.example.net."),
        ("loop1", Type::CNAME, "loop2"),
        ("loop2", Type::CNAME, "loop1"),
        ("self", Type::CNAME, "self"),
        ("subdel", Type::NS, "ns.subdel"),
        ("ns.subdel", Type::A, "192.0.2.54"),
        ("*.wild", Type::TXT, "\"wildcard\""),
        ("*.wildalias", Type::CNAME, "www"),
        ("a.b.ent", Type::A, "192.0.2.3"),
        ("old", Type::DNAME, "new.cairn.test."),
        ("host.new", Type::A, "192.0.2.4"),
    ];

    lazy_static! {
        static ref ZONE: Zone = build_zone("cairn.test.", RECORDS);
    }

    fn resolve_in_zone(qname: &str, qtype: Type) -> Outcome {
        resolve(Some(&*ZONE), &name(qname), qtype.into(), false).unwrap()
    }

    fn chain_types(chain: &[Found]) -> Vec<Type> {
        chain.iter().map(|found| found.rrset.rr_type).collect()
    }

    #[test]
    fn exact_match_gives_stored_rrset() {
        let stored = ZONE.lookup(&name("www.cairn.test."), Type::A).unwrap();
        match resolve_in_zone("www.cairn.test.", Type::A) {
            Outcome::Answer { found, owner } => {
                assert_eq!(&found.rrset, stored);
                assert_eq!(found.source, Source::Stored);
                assert_eq!(owner, name("www.cairn.test."));
            }
            other => panic!("expected an answer, got {:?}", other),
        }
    }

    #[test]
    fn delegation_beats_everything() {
        for qname in ["subdel.cairn.test.", "ns.subdel.cairn.test.", "x.y.subdel.cairn.test."] {
            match resolve_in_zone(qname, Type::A) {
                Outcome::Delegation { ns_rrset, cut } => {
                    assert_eq!(cut, name("subdel.cairn.test."));
                    assert_eq!(ns_rrset.rr_type, Type::NS);
                }
                other => panic!("expected a delegation, got {:?}", other),
            }
        }
    }

    #[test]
    fn other_types_give_no_data() {
        assert_eq!(
            resolve_in_zone("www.cairn.test.", Type::MX),
            Outcome::NoData {
                owner: name("www.cairn.test."),
                source_of_synthesis: None,
            }
        );
        // Empty non-terminals exist too.
        assert!(matches!(
            resolve_in_zone("b.ent.cairn.test.", Type::A),
            Outcome::NoData { .. }
        ));
    }

    #[test]
    fn missing_names_give_name_error() {
        assert_eq!(
            resolve_in_zone("nothing.cairn.test.", Type::A),
            Outcome::NameError {
                closest_encloser: name("cairn.test."),
            }
        );
        assert_eq!(
            resolve_in_zone("x.a.b.ent.cairn.test.", Type::A),
            Outcome::NameError {
                closest_encloser: name("a.b.ent.cairn.test."),
            }
        );
    }

    #[test]
    fn wildcard_synthesis_rewrites_owner() {
        match resolve_in_zone("anything.wild.cairn.test.", Type::TXT) {
            Outcome::Answer { found, .. } => {
                assert_eq!(found.rrset.owner, name("anything.wild.cairn.test."));
                assert_eq!(found.source, Source::Wildcard(name("*.wild.cairn.test.")));
            }
            other => panic!("expected a synthesized answer, got {:?}", other),
        }
        assert_eq!(
            resolve_in_zone("anything.wild.cairn.test.", Type::A),
            Outcome::NoData {
                owner: name("anything.wild.cairn.test."),
                source_of_synthesis: Some(name("*.wild.cairn.test.")),
            }
        );
    }

    #[test]
    fn exact_match_beats_wildcard() {
        // The literal wildcard owner is matched exactly, not synthesized.
        match resolve_in_zone("*.wild.cairn.test.", Type::TXT) {
            Outcome::Answer { found, .. } => assert_eq!(found.source, Source::Stored),
            other => panic!("expected an answer, got {:?}", other),
        }
    }

    #[test]
    fn cname_takes_precedence_over_other_data() {
        let zone = build_zone(
            "cairn.test.",
            &[
                ("@", Type::SOA, "ns hostmaster 1 7200 3600 1209600 300"),
                ("a", Type::CNAME, "b"),
                ("a", Type::A, "192.0.2.9"),
                ("a", Type::NSEC, "b CNAME RRSIG NSEC"),
                ("b", Type::A, "192.0.2.1"),
            ],
        );
        match resolve(Some(&zone), &name("a.cairn.test."), Type::A.into(), false).unwrap() {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain_types(&chain), [Type::CNAME]);
                match terminal {
                    AliasTerminal::Resolved(outcome) => assert!(matches!(
                        *outcome,
                        Outcome::Answer { ref owner, .. } if *owner == name("b.cairn.test.")
                    )),
                    other => panic!("expected a resolved terminal, got {:?}", other),
                }
            }
            other => panic!("expected an alias, got {:?}", other),
        }
        for rr_type in [Type::CNAME, Type::NSEC] {
            assert!(matches!(
                resolve(Some(&zone), &name("a.cairn.test."), rr_type.into(), false).unwrap(),
                Outcome::Answer { .. }
            ));
        }
    }

    #[test]
    fn cname_is_followed() {
        match resolve_in_zone("alias2.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain_types(&chain), [Type::CNAME, Type::CNAME]);
                assert_eq!(chain[0].rrset.owner, name("alias2.cairn.test."));
                match terminal {
                    AliasTerminal::Resolved(outcome) => assert!(matches!(
                        *outcome,
                        Outcome::Answer { ref owner, .. } if *owner == name("www.cairn.test.")
                    )),
                    other => panic!("expected a resolved terminal, got {:?}", other),
                }
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn cname_query_does_not_follow() {
        assert!(matches!(
            resolve_in_zone("alias.cairn.test.", Type::CNAME),
            Outcome::Answer { .. }
        ));
    }

    #[test]
    fn dangling_cname_ends_in_name_error() {
        match resolve_in_zone("dangling.cairn.test.", Type::A) {
            Outcome::Alias {
                terminal: AliasTerminal::Resolved(outcome),
                ..
            } => assert!(matches!(*outcome, Outcome::NameError { .. })),
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn external_cname_is_not_followed() {
        match resolve_in_zone("external.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain.len(), 1);
                assert_eq!(terminal, AliasTerminal::External(name("www.example.net.")));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn cname_loops_terminate() {
        match resolve_in_zone("loop1.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain.len(), 2);
                assert_eq!(terminal, AliasTerminal::Terminated(ChainEnd::Loop));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
        match resolve_in_zone("self.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain.len(), 1);
                assert_eq!(terminal, AliasTerminal::Terminated(ChainEnd::Loop));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn long_chains_terminate() {
        let owners: Vec<String> = (0..=MAX_ALIAS_CHAIN_LEN + 1).map(|i| format!("c{}", i)).collect();
        let mut records = vec![
            ("@", Type::SOA, "ns hostmaster 1 7200 3600 1209600 300".to_owned()),
            (owners[MAX_ALIAS_CHAIN_LEN + 1].as_str(), Type::A, "192.0.2.1".to_owned()),
        ];
        for pair in owners.windows(2) {
            records.push((pair[0].as_str(), Type::CNAME, pair[1].clone()));
        }
        let records: Vec<_> = records.iter().map(|(o, t, d)| (*o, *t, d.as_str())).collect();
        let zone = build_zone("cairn.test.", &records);

        match resolve(Some(&zone), &name("c0.cairn.test."), Type::A.into(), false).unwrap() {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain.len(), MAX_ALIAS_CHAIN_LEN);
                assert_eq!(terminal, AliasTerminal::Terminated(ChainEnd::TooLong));
            }
            other => panic!("expected an alias, got {:?}", other),
        }

        // A chain of exactly the maximum length resolves.
        match resolve(Some(&zone), &name("c1.cairn.test."), Type::A.into(), false).unwrap() {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain.len(), MAX_ALIAS_CHAIN_LEN);
                assert!(matches!(terminal, AliasTerminal::Resolved(_)));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn wildcard_cname_is_followed() {
        match resolve_in_zone("foo.wildalias.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain[0].rrset.owner, name("foo.wildalias.cairn.test."));
                assert_eq!(
                    chain[0].source,
                    Source::Wildcard(name("*.wildalias.cairn.test."))
                );
                assert!(matches!(terminal, AliasTerminal::Resolved(_)));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn dname_substitution_works() {
        match resolve_in_zone("host.old.cairn.test.", Type::A) {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain_types(&chain), [Type::DNAME, Type::CNAME]);
                assert_eq!(chain[1].source, Source::Dname);
                assert_eq!(chain[1].rrset.owner, name("host.old.cairn.test."));
                assert_eq!(
                    chain[1].rrset.rdatas().next(),
                    Some(&Rdata::Cname(name("host.new.cairn.test.")))
                );
                match terminal {
                    AliasTerminal::Resolved(outcome) => {
                        assert!(matches!(*outcome, Outcome::Answer { .. }))
                    }
                    other => panic!("expected a resolved terminal, got {:?}", other),
                }
            }
            other => panic!("expected an alias, got {:?}", other),
        }

        // The DNAME owner itself is not redirected.
        assert!(matches!(
            resolve_in_zone("old.cairn.test.", Type::A),
            Outcome::NoData { .. }
        ));
    }

    #[test]
    fn dname_overflow_terminates() {
        let long = "a".repeat(63);
        let target = format!("{0}.{0}.{0}.example.net.", long);
        let zone = build_zone(
            "cairn.test.",
            &[
                ("@", Type::SOA, "ns hostmaster 1 7200 3600 1209600 300"),
                ("d", Type::DNAME, target.as_str()),
            ],
        );
        let qname = name(&format!("{0}.{0}.d.cairn.test.", long));
        match resolve(Some(&zone), &qname, Type::A.into(), false).unwrap() {
            Outcome::Alias { chain, terminal } => {
                assert_eq!(chain_types(&chain), [Type::DNAME]);
                assert_eq!(terminal, AliasTerminal::Terminated(ChainEnd::NameOverflow));
            }
            other => panic!("expected an alias, got {:?}", other),
        }
    }

    #[test]
    fn any_returns_all_rrsets() {
        match resolve(Some(&*ZONE), &name("cairn.test."), Qtype::ANY, false).unwrap() {
            Outcome::AnyAnswer { found, owner } => {
                assert_eq!(owner, name("cairn.test."));
                assert_eq!(found.len(), 2);
            }
            other => panic!("expected an answer, got {:?}", other),
        }
        assert!(matches!(
            resolve(Some(&*ZONE), &name("b.ent.cairn.test."), Qtype::ANY, false).unwrap(),
            Outcome::NoData { .. }
        ));
    }

    #[test]
    fn dnssec_flag_does_not_change_outcome() {
        for qname in ["www.cairn.test.", "alias.cairn.test.", "nothing.cairn.test."] {
            assert_eq!(
                resolve(Some(&*ZONE), &name(qname), Type::A.into(), true),
                resolve(Some(&*ZONE), &name(qname), Type::A.into(), false),
            );
        }
    }

    #[test]
    fn configuration_errors_are_reported() {
        let qname = name("www.cairn.test.");
        assert_eq!(
            resolve(None, &qname, Type::A.into(), false),
            Err(ConfigurationError::NoOrigin)
        );
        let empty = Zone::new(name("cairn.test."), Class::IN);
        assert_eq!(
            resolve(Some(&empty), &qname, Type::A.into(), false),
            Err(ConfigurationError::MissingSoa)
        );
        assert_eq!(
            resolve(Some(&*ZONE), &name("www.example.net."), Type::A.into(), false),
            Err(ConfigurationError::NotInZone)
        );
    }
}
