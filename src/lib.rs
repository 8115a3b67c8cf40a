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

//! An authoritative DNS zone resolution engine.
//!
//! A [`Zone`](zone::Zone) holds the records of one zone. The
//! [`resolve`](resolve::resolve) function answers a question against a
//! zone following [RFC 1034 § 4.3.2] (with wildcards per [RFC 4592] and
//! DNAME per [RFC 6672]), and the [`Server`](server::Server) turns the
//! result into a complete response. Transports are not part of this
//! crate: they hand queries to a [`QueryHandler`](server::QueryHandler)
//! and send back what it returns.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592
//! [RFC 6672]: https://datatracker.ietf.org/doc/html/rfc6672

#[macro_use]
mod util;

pub mod class;
pub mod message;
pub mod name;
pub mod resolve;
pub mod rr;
pub mod server;
pub mod zone;
