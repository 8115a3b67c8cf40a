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

//! Definition of the [`ZoneLoader`] trait.

use crate::class::Class;
use crate::name::Name;
use crate::rr::Record;

/// A source of zone data.
///
/// Parsing zone data is left to implementors of this trait; the
/// [`Server`](crate::server::Server) only needs the records. A loader
/// is asked for the records of a particular origin and class, and
/// should return every record of the zone. Records outside the origin
/// cause the load to fail when the snapshot is built.
pub trait ZoneLoader {
    type Error;

    fn load(&self, origin: &Name, class: Class) -> Result<Vec<Record>, Self::Error>;
}

/// A `Vec` of records is a loader that always provides a copy of
/// itself.
impl ZoneLoader for Vec<Record> {
    type Error = std::convert::Infallible;

    fn load(&self, _origin: &Name, _class: Class) -> Result<Vec<Record>, Self::Error> {
        Ok(self.clone())
    }
}
