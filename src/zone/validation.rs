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

//! Implementation of zone validation, to detect semantic errors and
//! warnings in a loaded zone.
//!
//! [RFC 1035 § 5.2] (corrected by [Erratum 5626]) indicates that a zone
//! should be checked for semantic errors in addition to syntactic
//! errors. [`Zone::validate`] implements the following checks:
//!
//! 1. Exactly one SOA record should be present at the zone apex.
//! 2. ([Erratum 5626]) At least one NS record must be present at the
//!    zone apex.
//! 3. Glue must be present for nameservers of a delegation that are
//!    inside the delegated zone itself (the "narrow" glue policy of
//!    [RFC 1034 § 4.2.1]).
//! 4. Any in-zone nameservers referenced by NS records must have A or
//!    AAAA records.
//! 5. A name cannot own more than one CNAME record.
//! 6. A name cannot own a CNAME record and records of other types,
//!    except for DNSSEC proof material ([RFC 4035 § 2.5]).
//! 7. A name cannot own more than one DNAME record ([RFC 6672 § 2.4]).
//! 8. Any in-zone mail exchangers referenced by MX records should have
//!    A or AAAA records (warning only).
//! 9. Wildcard names should not own NS records ([RFC 4592 § 4.2])
//!    (warning only).
//!
//! Owners outside the zone and class mismatches are caught earlier, by
//! [`Zone::insert`].
//!
//! [RFC 1034 § 4.2.1]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.2.1
//! [RFC 1035 § 5.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.2
//! [Erratum 5626]: https://www.rfc-editor.org/errata/eid5626
//! [RFC 4035 § 2.5]: https://datatracker.ietf.org/doc/html/rfc4035#section-2.5
//! [RFC 4592 § 4.2]: https://datatracker.ietf.org/doc/html/rfc4592#section-4.2
//! [RFC 6672 § 2.4]: https://datatracker.ietf.org/doc/html/rfc6672#section-2.4

use std::fmt;

use crate::name::Name;
use crate::rr::{Rdata, Rrset, RrsetList, Type};

use super::{Node, Zone};

////////////////////////////////////////////////////////////////////////
// VALIDATION ISSUES                                                  //
////////////////////////////////////////////////////////////////////////

/// Indicates a semantic error or warning found in a loaded zone.
#[derive(Debug, Eq, PartialEq)]
pub enum ValidationIssue<'a> {
    MissingApexSoa,
    TooManyApexSoas,
    MissingApexNs,
    MissingNsAddress(&'a Name),
    MissingMxAddress(&'a Name),
    MissingGlue(&'a Name),
    DuplicateCname(&'a Name),
    DuplicateDname(&'a Name),
    OtherRecordsAtCname(&'a Name),
    NsAtWildcard(&'a Name),
}

impl ValidationIssue<'_> {
    /// Returns whether the `ValidationIssue` represents a (fatal)
    /// error. Otherwise, it is a warning.
    pub fn is_error(&self) -> bool {
        !matches!(*self, Self::MissingMxAddress(_) | Self::NsAtWildcard(_))
    }
}

impl fmt::Display for ValidationIssue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::MissingApexSoa => f.write_str("the zone is missing an SOA record"),
            Self::TooManyApexSoas => {
                f.write_str("the zone has too many SOA records (precisely one is needed)")
            }
            Self::MissingApexNs => f.write_str("the zone is missing an NS record"),
            Self::MissingNsAddress(nsdname) => write!(
                f,
                "the in-zone nameserver {} is missing an address",
                nsdname
            ),
            Self::MissingMxAddress(name) => write!(
                f,
                "the in-zone mail exchanger {} is missing an address",
                name
            ),
            Self::MissingGlue(nsdname) => write!(f, "a glue record for {} is needed", nsdname),
            Self::DuplicateCname(name) => {
                write!(f, "the name {} has duplicate CNAME records", name)
            }
            Self::DuplicateDname(name) => {
                write!(f, "the name {} has duplicate DNAME records", name)
            }
            Self::OtherRecordsAtCname(name) => write!(
                f,
                "the name {}, which has a CNAME record, cannot have other records",
                name
            ),
            Self::NsAtWildcard(name) => {
                write!(f, "the wildcard name {} should not own NS records", name)
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// VALIDATION LOGIC                                                   //
////////////////////////////////////////////////////////////////////////

impl Zone {
    /// Checks a zone for semantic errors and warnings (other than those
    /// that are caught in [`Zone::insert`]). See the `validation`
    /// module for the list of checks.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        // Check 1: there must be exactly one SOA record for the zone.
        if let Some(soa_rrset) = self.soa() {
            if soa_rrset.len() != 1 {
                issues.push(ValidationIssue::TooManyApexSoas);
            }
        } else {
            issues.push(ValidationIssue::MissingApexSoa);
        }

        // Check 2: there must be at least one NS record for the zone.
        if let Some(ns_rrset) = self.ns() {
            for nsdname in rdata_names(ns_rrset) {
                check_ns_address(self, nsdname, None, &mut issues);
            }
        } else {
            issues.push(ValidationIssue::MissingApexNs);
        }

        scan_node(self, &self.apex, true, true, &mut issues);
        issues
    }
}

/// Scans a node, checking for semantic errors and warnings. After
/// checking the current node, all of its children are scanned.
/// `in_authoritative` is false below a zone cut.
fn scan_node<'a>(
    zone: &'a Zone,
    node: &'a Node,
    at_apex: bool,
    in_authoritative: bool,
    issues: &mut Vec<ValidationIssue<'a>>,
) {
    // Checks 5 and 6.
    if let Some(cname_rrset) = node.rrsets.lookup(Type::CNAME) {
        let others = node
            .rrsets
            .iter()
            .filter(|rrset| rrset.rr_type != Type::CNAME && !rrset.rr_type.is_dnssec_proof())
            .count();
        if others > 0 {
            issues.push(ValidationIssue::OtherRecordsAtCname(&node.name));
        }
        if cname_rrset.len() != 1 {
            issues.push(ValidationIssue::DuplicateCname(&node.name));
        }
    }

    // Check 7.
    if let Some(dname_rrset) = node.rrsets.lookup(Type::DNAME) {
        if dname_rrset.len() != 1 {
            issues.push(ValidationIssue::DuplicateDname(&node.name));
        }
    }

    if in_authoritative {
        // Check 8.
        if let Some(mx_rrset) = node.rrsets.lookup(Type::MX) {
            for exchange in rdata_names(mx_rrset) {
                if !has_authoritative_address(zone, exchange) {
                    issues.push(ValidationIssue::MissingMxAddress(exchange));
                }
            }
        }
    }

    // Checks 3, 4, and 9 for delegations.
    let mut children_authoritative = in_authoritative;
    if !at_apex && in_authoritative {
        if let Some(ns_rrset) = node.rrsets.lookup(Type::NS) {
            children_authoritative = false;
            if node.name.is_wildcard() {
                issues.push(ValidationIssue::NsAtWildcard(&node.name));
            }
            for nsdname in rdata_names(ns_rrset) {
                check_ns_address(zone, nsdname, Some(&node.name), issues);
            }
        }
    }

    for child in node.all_children() {
        scan_node(zone, child, false, children_authoritative, issues);
    }
}

/// Ensures that the nameserver `nsdname`, if it is in the zone, has an
/// address (check 4). For the NS records of a delegation to
/// `child_zone`, nameservers inside the child zone must have glue
/// instead (check 3).
fn check_ns_address<'a>(
    zone: &'a Zone,
    nsdname: &'a Name,
    child_zone: Option<&Name>,
    issues: &mut Vec<ValidationIssue<'a>>,
) {
    if !nsdname.eq_or_subdomain_of(zone.origin()) {
        return;
    }
    match zone.find_zone_cut(nsdname) {
        Some(cut) => {
            // The nameserver is inside some child zone. With the
            // narrow glue policy, glue is needed only if that is the
            // child zone being delegated.
            if Some(cut.owner) == child_zone {
                let has_glue = zone.lookup_any(nsdname).map_or(false, has_address);
                if !has_glue {
                    issues.push(ValidationIssue::MissingGlue(nsdname));
                }
            }
        }
        None => {
            if !has_authoritative_address(zone, nsdname) {
                issues.push(ValidationIssue::MissingNsAddress(nsdname));
            }
        }
    }
}

/// Determines whether `name` is outside the zone's authoritative data
/// or has an address there. Names outside the zone or below a cut count
/// as having one, since this zone is not responsible for them.
fn has_authoritative_address(zone: &Zone, name: &Name) -> bool {
    if !name.eq_or_subdomain_of(zone.origin()) || zone.find_zone_cut(name).is_some() {
        return true;
    }
    zone.lookup_any(name).map_or(false, has_address)
}

/// Helper to determine whether an [`RrsetList`] contains an address
/// RRset (i.e., an A or AAAA RRset).
fn has_address(rrsets: &RrsetList) -> bool {
    rrsets
        .iter()
        .any(|rrset| rrset.rr_type == Type::A || rrset.rr_type == Type::AAAA)
}

/// Returns the domain names calling for additional processing in the
/// RDATA of an NS or MX RRset.
fn rdata_names(rrset: &Rrset) -> impl Iterator<Item = &Name> {
    rrset.rdatas().filter_map(Rdata::additional_name)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::super::Zone;
    use super::ValidationIssue;
    use crate::class::Class;
    use crate::name::Name;
    use crate::rr::{Rdata, Record, Ttl, Type};

    lazy_static! {
        static ref APEX: Name = "cairn.test.".parse().unwrap();
        static ref NS: Name = "ns.cairn.test.".parse().unwrap();
        static ref MX: Name = "mx.cairn.test.".parse().unwrap();
        static ref HOST1: Name = "HOST1.cairn.test.".parse().unwrap();
        static ref SUBDEL: Name = "subdel.cairn.test.".parse().unwrap();
        static ref NS_SUBDEL: Name = "ns.subdel.cairn.test.".parse().unwrap();
        static ref SUBDEL2: Name = "subdel2.cairn.test.".parse().unwrap();
        static ref WILDCARD: Name = "*.cairn.test.".parse().unwrap();
    }

    fn add_rr(zone: &mut Zone, owner: &Name, rr_type: Type, data: &str) {
        let rdata = Rdata::parse(rr_type, data, &APEX).unwrap();
        zone.insert(Record::new(
            owner.clone(),
            rr_type,
            Class::IN,
            Ttl::from(3600),
            rdata,
        ))
        .unwrap();
    }

    fn basic_zone() -> Zone {
        let mut zone = Zone::new(APEX.clone(), Class::IN);
        add_rr(&mut zone, &APEX, Type::SOA, "ns hostmaster 1 7200 3600 1209600 300");
        add_rr(&mut zone, &APEX, Type::NS, "ns");
        add_rr(&mut zone, &NS, Type::A, "127.0.0.1");
        zone
    }

    #[test]
    fn validate_accepts_basic_zone() {
        assert_eq!(basic_zone().validate(), []);
    }

    #[test]
    fn validate_detects_missing_apex_soa() {
        let mut zone = Zone::new(APEX.clone(), Class::IN);
        add_rr(&mut zone, &APEX, Type::NS, "ns");
        add_rr(&mut zone, &NS, Type::A, "127.0.0.1");
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingApexSoa]);
    }

    #[test]
    fn validate_detects_too_many_soas() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &APEX, Type::SOA, "ns hostmaster 2 7200 3600 1209600 300");
        assert_eq!(zone.validate(), vec![ValidationIssue::TooManyApexSoas]);
    }

    #[test]
    fn validate_detects_missing_apex_ns() {
        let mut zone = Zone::new(APEX.clone(), Class::IN);
        add_rr(&mut zone, &APEX, Type::SOA, "ns hostmaster 1 7200 3600 1209600 300");
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingApexNs]);
    }

    #[test]
    fn validate_detects_missing_glue() {
        // The nameserver is within the child zone: there should be an
        // error.
        let mut zone = basic_zone();
        add_rr(&mut zone, &SUBDEL, Type::NS, "ns.subdel");
        assert_eq!(zone.validate(), [ValidationIssue::MissingGlue(&NS_SUBDEL)]);

        // Adding the glue fixes it.
        add_rr(&mut zone, &NS_SUBDEL, Type::A, "127.0.0.2");
        assert_eq!(zone.validate(), []);

        // The nameserver is within a different child zone: there
        // should not be an error.
        let mut zone = basic_zone();
        add_rr(&mut zone, &SUBDEL, Type::NS, "ns");
        add_rr(&mut zone, &SUBDEL2, Type::NS, "ns.subdel");
        assert_eq!(zone.validate(), []);
    }

    #[test]
    fn validate_detects_multiple_cname() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &HOST1, Type::CNAME, "host2");
        add_rr(&mut zone, &HOST1, Type::CNAME, "host3");
        assert_eq!(zone.validate(), vec![ValidationIssue::DuplicateCname(&HOST1)]);
    }

    #[test]
    fn validate_detects_other_records_at_cname() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &HOST1, Type::CNAME, "host2");
        add_rr(&mut zone, &HOST1, Type::A, "127.0.0.1");
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::OtherRecordsAtCname(&HOST1)]
        );
    }

    #[test]
    fn validate_allows_nsec_at_cname() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &HOST1, Type::CNAME, "host2");
        add_rr(&mut zone, &HOST1, Type::NSEC, "ns CNAME RRSIG NSEC");
        assert_eq!(zone.validate(), []);
    }

    #[test]
    fn validate_detects_multiple_dname() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &HOST1, Type::DNAME, "example.com.");
        add_rr(&mut zone, &HOST1, Type::DNAME, "example.net.");
        assert_eq!(zone.validate(), vec![ValidationIssue::DuplicateDname(&HOST1)]);
    }

    #[test]
    fn validate_detects_missing_ns_address() {
        // First case: the apex NS record is missing an address.
        let mut zone = Zone::new(APEX.clone(), Class::IN);
        add_rr(&mut zone, &APEX, Type::SOA, "ns hostmaster 1 7200 3600 1209600 300");
        add_rr(&mut zone, &APEX, Type::NS, "ns");
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingNsAddress(&NS)]);

        // Second case: a delegation NS record which points to a name
        // within the zone is missing an address.
        let mut zone = basic_zone();
        add_rr(&mut zone, &SUBDEL2, Type::NS, "ns2");
        let ns2: Name = "ns2.cairn.test.".parse().unwrap();
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingNsAddress(&ns2)]);
    }

    #[test]
    fn validate_warns_about_missing_mx_address() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &APEX, Type::MX, "10 mx");
        let issues = zone.validate();
        assert_eq!(issues, vec![ValidationIssue::MissingMxAddress(&MX)]);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn validate_warns_about_ns_at_wildcard() {
        let mut zone = basic_zone();
        add_rr(&mut zone, &WILDCARD, Type::NS, "ns");
        let issues = zone.validate();
        assert_eq!(issues, vec![ValidationIssue::NsAtWildcard(&WILDCARD)]);
        assert!(!issues[0].is_error());
    }
}
