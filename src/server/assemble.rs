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

//! Assembly of responses from resolution [`Outcome`]s.

use crate::message::{Rcode, Response};
use crate::name::Name;
use crate::resolve::{AliasTerminal, ChainEnd, Found, Outcome};
use crate::rr::{Rdata, Rrset, Ttl, Type};
use crate::zone::Zone;

/// Fills in `response` from an `outcome` produced against `zone`.
///
/// The response's DO bit decides whether DNSSEC material stored in the
/// zone is attached: each RRset placed in the response is followed by
/// the RRSIGs covering it, negative answers carry the NSEC RRset of
/// the name that matched (or of the closest encloser), and referrals
/// carry the DS RRset of the cut. Missing material is left out.
///
/// The NSEC attached to a name error is the one stored at the closest
/// encloser. That proves the encloser exists but is not the NSEC
/// covering the query name, nor the one covering the wildcard, so it
/// falls short of the full denial of RFC 4035 § 3.1.3.2.
pub fn assemble(zone: &Zone, outcome: Outcome, response: &mut Response) {
    let mut assembler = Assembler {
        zone,
        dnssec: response.dnssec_ok,
        response,
        additional_names: Vec::new(),
    };
    assembler.place(outcome);
    assembler.do_additional_section_processing();
}

struct Assembler<'a> {
    zone: &'a Zone,
    dnssec: bool,
    response: &'a mut Response,

    /// Names whose addresses go in the additional section, and whether
    /// the lookup may search below zone cuts (for glue).
    additional_names: Vec<(Name, bool)>,
}

#[derive(Clone, Copy)]
enum Section {
    Answer,
    Authority,
}

impl Assembler<'_> {
    /// Places an outcome in the response. AA is set for everything but
    /// a bare referral.
    fn place(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Answer { found, .. } => {
                self.response.aa = true;
                self.add_found(&found);
            }
            Outcome::AnyAnswer { found, .. } => {
                self.response.aa = true;
                for found in found.iter() {
                    // Signatures follow the RRsets they cover, and NSEC
                    // RRsets only go to DNSSEC-aware clients.
                    let rr_type = found.rrset.rr_type;
                    if rr_type == Type::RRSIG || (rr_type.is_dnssec_proof() && !self.dnssec) {
                        continue;
                    }
                    self.add_found(found);
                }
            }
            Outcome::Alias { chain, terminal } => {
                self.response.aa = true;
                for link in chain.iter() {
                    self.add_found(link);
                }
                match terminal {
                    AliasTerminal::Resolved(outcome) => self.place(*outcome),
                    AliasTerminal::External(_) => (),
                    AliasTerminal::Terminated(ChainEnd::Loop | ChainEnd::TooLong) => (),
                    AliasTerminal::Terminated(ChainEnd::NameOverflow) => {
                        self.response.rcode = Rcode::YxDomain;
                    }
                }
            }
            Outcome::Delegation { ns_rrset, cut } => self.do_referral(ns_rrset, &cut),
            Outcome::NoData {
                owner,
                source_of_synthesis,
            } => {
                self.response.aa = true;
                self.add_negative_caching_soa();
                self.add_nsec(source_of_synthesis.as_ref().unwrap_or(&owner));
            }
            Outcome::NameError { closest_encloser } => {
                self.response.aa = true;
                self.response.rcode = Rcode::NxDomain;
                self.add_negative_caching_soa();
                // Not the covering NSEC; see the note on `assemble`.
                self.add_nsec(&closest_encloser);
            }
        }
    }

    /// Adds an RRset from an outcome to the answer section, followed by
    /// its signatures, and notes any names calling for additional
    /// section processing.
    fn add_found(&mut self, found: &Found) {
        self.note_additional_names(&found.rrset, false);
        self.add(Section::Answer, found.rrset.clone());
        if let Some(stored_owner) = found.stored_owner() {
            self.add_signatures(Section::Answer, stored_owner, &found.rrset, None);
        }
    }

    /// Adds an RRset stored in the zone to a section, followed by its
    /// signatures.
    fn add_stored(&mut self, section: Section, rrset: &Rrset) {
        self.add(section, rrset.clone());
        self.add_signatures(section, &rrset.owner, rrset, None);
    }

    fn add(&mut self, section: Section, rrset: Rrset) -> bool {
        match section {
            Section::Answer => self.response.add_answer_rrset(rrset),
            Section::Authority => self.response.add_authority_rrset(rrset),
        }
    }

    /// When DNSSEC is requested, adds the RRSIGs stored at
    /// `stored_owner` covering `rrset`'s type. Their owner is rewritten
    /// to that of `rrset` (which differs for wildcard synthesis) and,
    /// if given, their TTL is replaced.
    fn add_signatures(
        &mut self,
        section: Section,
        stored_owner: &Name,
        rrset: &Rrset,
        ttl: Option<Ttl>,
    ) {
        if !self.dnssec {
            return;
        }
        let signatures = self
            .zone
            .lookup_any(stored_owner)
            .and_then(|rrsets| rrsets.signatures_for(rrset.rr_type));
        if let Some(signatures) = signatures {
            let mut signatures = signatures.with_owner(&rrset.owner);
            if let Some(ttl) = ttl {
                signatures = signatures.with_ttl(ttl);
            }
            self.add(section, signatures);
        }
    }

    /// Performs a referral to the zone delegated at `cut`. The NS RRset
    /// goes in the authority section, along with the DS RRset of the
    /// cut for DNSSEC-aware clients. Addresses for the name servers are
    /// looked up below the cut, so glue is included.
    fn do_referral(&mut self, ns_rrset: Rrset, cut: &Name) {
        self.note_additional_names(&ns_rrset, true);
        self.add(Section::Authority, ns_rrset);
        if self.dnssec {
            if let Some(ds_rrset) = self.zone.lookup(cut, Type::DS) {
                self.add_stored(Section::Authority, ds_rrset);
            }
        }
    }

    /// Adds the apex SOA RRset to the authority section for negative
    /// caching ([RFC 2308 § 3]). Its TTL is the lesser of the SOA TTL
    /// and the SOA MINIMUM field.
    ///
    /// [RFC 2308 § 3]: https://datatracker.ietf.org/doc/html/rfc2308#section-3
    fn add_negative_caching_soa(&mut self) {
        let soa_rrset = match self.zone.soa() {
            Some(soa_rrset) => soa_rrset,
            None => return,
        };
        let minimum = soa_rrset.rdatas().find_map(|rdata| match rdata {
            Rdata::Soa(soa) => Some(Ttl::from(soa.minimum)),
            _ => None,
        });
        let ttl = minimum.map_or(soa_rrset.ttl, |minimum| soa_rrset.ttl.min(minimum));
        self.add(Section::Authority, soa_rrset.with_ttl(ttl));
        self.add_signatures(Section::Authority, &soa_rrset.owner, soa_rrset, Some(ttl));
    }

    /// Adds the NSEC RRset stored at `owner` to the authority section
    /// for DNSSEC-aware clients.
    fn add_nsec(&mut self, owner: &Name) {
        if !self.dnssec {
            return;
        }
        if let Some(nsec_rrset) = self.zone.lookup(owner, Type::NSEC) {
            self.add_stored(Section::Authority, nsec_rrset);
        }
    }

    ////////////////////////////////////////////////////////////////////
    // ADDITIONAL SECTION PROCESSING                                  //
    ////////////////////////////////////////////////////////////////////

    fn note_additional_names(&mut self, rrset: &Rrset, search_below_cuts: bool) {
        for rdata in rrset.rdatas() {
            if let Some(name) = rdata.additional_name() {
                self.additional_names.push((name.clone(), search_below_cuts));
            }
        }
    }

    /// Adds the A and AAAA RRsets of every noted name to the additional
    /// section, with one RRSIG RRset covering both for DNSSEC-aware
    /// clients. This runs once everything else is placed, so that no
    /// RRset is repeated from another section.
    fn do_additional_section_processing(&mut self) {
        let names = std::mem::take(&mut self.additional_names);
        for (name, search_below_cuts) in names.iter() {
            if !search_below_cuts && self.zone.find_zone_cut(name).is_some() {
                continue;
            }
            let rrsets = match self.zone.lookup_any(name) {
                Some(rrsets) => rrsets,
                None => continue,
            };
            let mut signatures: Option<Rrset> = None;
            for rr_type in [Type::A, Type::AAAA] {
                let rrset = match rrsets.lookup(rr_type) {
                    Some(rrset) => rrset,
                    None => continue,
                };
                if !self.response.add_additional_rrset(rrset.clone()) || !self.dnssec {
                    continue;
                }
                if let Some(covering) = rrsets.signatures_for(rr_type) {
                    match signatures {
                        Some(ref mut signatures) => {
                            for rdata in covering.rdatas() {
                                signatures.push_rdata(rdata.clone());
                            }
                        }
                        None => signatures = Some(covering),
                    }
                }
            }
            if let Some(signatures) = signatures {
                self.response.add_additional_rrset(signatures);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
