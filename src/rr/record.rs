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

//! Implementation of the [`Record`] structure.

use std::fmt;

use super::{Rdata, Ttl, Type};
use crate::class::Class;
use crate::name::Name;

/// A single resource record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: Ttl,
    pub rdata: Rdata,
}

impl Record {
    /// Creates a new `Record`.
    pub fn new(owner: Name, rr_type: Type, class: Class, ttl: Ttl, rdata: Rdata) -> Self {
        Self {
            owner,
            rr_type,
            class,
            ttl,
            rdata,
        }
    }

    /// Returns whether the TYPE of the record agrees with its RDATA.
    /// This is always true for [`Rdata::Unknown`].
    pub fn is_consistent(&self) -> bool {
        self.rdata
            .rr_type()
            .map_or(true, |rdata_type| rdata_type == self.rr_type)
    }
}

/// Writes the record in zone-file form: owner, TTL, class, type, and
/// RDATA, separated by tabs.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.owner, self.ttl, self.class, self.rr_type, self.rdata,
        )
    }
}
