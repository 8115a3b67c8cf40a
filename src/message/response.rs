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

//! Implementation of the [`Response`] structure.

use std::fmt;

use super::{Query, Question, Rcode};
use crate::name::Name;
use crate::rr::{Rrset, Type};

/// A DNS response, ready to be encoded by a transport.
///
/// The header bits that are always the same for an authoritative
/// engine are not stored: QR is always set, and TC and RA are always
/// clear. Sections hold whole RRsets, in the order they were added.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub id: u16,
    pub aa: bool,
    pub rd: bool,
    pub dnssec_ok: bool,
    pub rcode: Rcode,
    pub question: Option<Question>,
    answer: Vec<Rrset>,
    authority: Vec<Rrset>,
    additional: Vec<Rrset>,
}

impl Response {
    /// Starts a response to `query`: the ID, RD bit, DO bit, and first
    /// question are copied. The response is initially an empty
    /// NOERROR without AA set.
    pub fn new(query: &Query) -> Self {
        Self {
            id: query.id,
            aa: false,
            rd: query.rd,
            dnssec_ok: query.dnssec_ok,
            rcode: Rcode::NoError,
            question: query.question().cloned(),
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn answer(&self) -> &[Rrset] {
        &self.answer
    }

    pub fn authority(&self) -> &[Rrset] {
        &self.authority
    }

    pub fn additional(&self) -> &[Rrset] {
        &self.additional
    }

    /// Returns whether an RRset with this owner and type is already in
    /// any section of the response.
    pub fn contains_rrset(&self, owner: &Name, rr_type: Type) -> bool {
        self.answer
            .iter()
            .chain(self.authority.iter())
            .chain(self.additional.iter())
            .any(|rrset| rrset.rr_type == rr_type && rrset.owner == *owner)
    }

    /// Adds an RRset to the answer section, unless the same RRset is
    /// already there. Returns whether it was added.
    pub fn add_answer_rrset(&mut self, rrset: Rrset) -> bool {
        add_unique(&mut self.answer, rrset)
    }

    /// Adds an RRset to the authority section, unless the same RRset is
    /// already there. Returns whether it was added.
    pub fn add_authority_rrset(&mut self, rrset: Rrset) -> bool {
        add_unique(&mut self.authority, rrset)
    }

    /// Adds an RRset to the additional section, unless an RRset with
    /// the same owner and type is already in *any* section. Returns
    /// whether it was added.
    pub fn add_additional_rrset(&mut self, rrset: Rrset) -> bool {
        if self.contains_rrset(&rrset.owner, rrset.rr_type) {
            false
        } else {
            self.additional.push(rrset);
            true
        }
    }

    /// Returns the number of records in the answer, authority, and
    /// additional sections.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            count_records(&self.answer),
            count_records(&self.authority),
            count_records(&self.additional),
        )
    }
}

fn add_unique(section: &mut Vec<Rrset>, rrset: Rrset) -> bool {
    if section.iter().any(|existing| {
        existing.rr_type == rrset.rr_type
            && existing.owner == rrset.owner
            && existing.rdatas().eq(rrset.rdatas())
    }) {
        false
    } else {
        section.push(rrset);
        true
    }
}

fn count_records(section: &[Rrset]) -> usize {
    section.iter().map(Rrset::len).sum()
}

/// Writes the response in the style of `dig` output.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (ancount, nscount, arcount) = self.counts();
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: QUERY, status: {}, id: {}",
            self.rcode, self.id
        )?;
        f.write_str(";; flags: qr")?;
        if self.aa {
            f.write_str(" aa")?;
        }
        if self.rd {
            f.write_str(" rd")?;
        }
        writeln!(
            f,
            "; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            usize::from(self.question.is_some()),
            ancount,
            nscount,
            arcount
        )?;
        if self.dnssec_ok {
            f.write_str("\n;; OPT PSEUDOSECTION:\n; EDNS: version: 0, flags: do\n")?;
        }
        if let Some(ref question) = self.question {
            write!(f, "\n;; QUESTION SECTION:\n{}\n", question)?;
        }
        for (title, section) in [
            ("ANSWER", &self.answer),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if !section.is_empty() {
                write!(f, "\n;; {} SECTION:\n", title)?;
                for rrset in section.iter() {
                    writeln!(f, "{}", rrset)?;
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
