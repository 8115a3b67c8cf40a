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

//! Implementation of the [`Query`] structure.

use super::Question;

/// A parsed DNS query, as handed to a
/// [`QueryHandler`](crate::server::QueryHandler) by a transport.
///
/// Only the parts of a query message that matter to an authoritative
/// answer are kept: the ID, the questions, the RD bit, and the DO bit
/// of the EDNS OPT record ([RFC 3225]).
///
/// [RFC 3225]: https://datatracker.ietf.org/doc/html/rfc3225
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    pub id: u16,
    pub questions: Vec<Question>,
    pub rd: bool,
    pub dnssec_ok: bool,
}

impl Query {
    /// Creates a query with a single question, with RD and DO unset.
    pub fn new(id: u16, question: Question) -> Self {
        Self {
            id,
            questions: vec![question],
            rd: false,
            dnssec_ok: false,
        }
    }

    /// Returns whether the client asked for DNSSEC processing.
    pub fn is_dnssec(&self) -> bool {
        self.dnssec_ok
    }

    /// Returns the question the query is answered for. Queries with
    /// more than one question are answered for the first.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }
}
