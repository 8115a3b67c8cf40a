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

//! The query-handling logic of an authoritative DNS server.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use log::{debug, info, warn};

use crate::class::Class;
use crate::message::{Qclass, Query, Rcode, Response};
use crate::name::Name;
use crate::resolve::{resolve, ConfigurationError};
use crate::rr::Record;
use crate::zone::{self, Zone, ZoneLoader};

mod assemble;

pub use assemble::assemble;

////////////////////////////////////////////////////////////////////////
// QUERY HANDLER TRAIT                                                //
////////////////////////////////////////////////////////////////////////

/// A trait for things that answer DNS queries on behalf of a transport.
///
/// A transport (UDP, TCP, or anything else) decodes a [`Query`], hands
/// it to a `QueryHandler` along with whatever context it has about the
/// client, and encodes the [`Response`] it gets back. Implementations
/// must produce a response for every query; failures are reported
/// through the response's RCODE.
pub trait QueryHandler<C: ?Sized> {
    fn handle_query(&self, query: &Query, client: &C) -> Response;
}

////////////////////////////////////////////////////////////////////////
// SERVER                                                             //
////////////////////////////////////////////////////////////////////////

/// An authoritative DNS server for a single zone, abstracted from any
/// underlying transport.
///
/// The zone is held as an immutable snapshot. Queries take a reference
/// to the current snapshot without locking and answer from it alone.
/// Every mutation builds a complete new snapshot and swaps it in, so a
/// query in flight during a reload sees either the whole old zone or
/// the whole new one. Mutations are serialized among themselves.
///
/// A `Server` starts out with no zone at all. Queries receive SERVFAIL
/// until an origin is set with [`Server::set_origin`], and until the
/// zone has an SOA record at its apex.
#[derive(Default)]
pub struct Server {
    zone: ArcSwapOption<Zone>,
    writer: Mutex<()>,
}

impl Server {
    /// Creates a new `Server` with no zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current zone snapshot, if an origin has been set.
    pub fn zone(&self) -> Option<Arc<Zone>> {
        self.zone.load_full()
    }

    /// Sets the origin and class of the zone. This discards any records
    /// loaded previously, since they belong to the old origin.
    pub fn set_origin(&self, origin: Name, class: Class) {
        let _guard = self.lock_writer();
        info!("Zone origin set to {} ({}).", origin, class);
        self.zone.store(Some(Arc::new(Zone::new(origin, class))));
    }

    /// Removes all records from the zone, keeping its origin.
    pub fn clear_records(&self) -> Result<(), zone::Error> {
        let _guard = self.lock_writer();
        let current = self.zone.load_full().ok_or(zone::Error::NoOrigin)?;
        self.publish(current.clear());
        Ok(())
    }

    /// Replaces the records of the zone with `records`. Nothing is
    /// changed if any record cannot be added.
    pub fn replace_all(&self, records: impl IntoIterator<Item = Record>) -> Result<(), zone::Error> {
        let _guard = self.lock_writer();
        let current = self.zone.load_full().ok_or(zone::Error::NoOrigin)?;
        self.publish(current.replace_all(records)?);
        Ok(())
    }

    /// Replaces the records of the zone with those produced by
    /// `loader`.
    ///
    /// The new zone is validated before it is swapped in. Every issue
    /// found is logged; if any of them is an error (rather than a
    /// warning), the old zone stays in place.
    pub fn load<L: ZoneLoader>(&self, loader: &L) -> Result<(), LoadError<L::Error>> {
        let _guard = self.lock_writer();
        let current = self.zone.load_full().ok_or(zone::Error::NoOrigin)?;
        let records = loader
            .load(current.origin(), current.class())
            .map_err(LoadError::Loader)?;
        let zone = current.replace_all(records)?;

        let mut errors = Vec::new();
        for issue in zone.validate() {
            warn!("Zone {}: {}", zone.origin(), issue);
            if issue.is_error() {
                errors.push(issue.to_string());
            }
        }
        if !errors.is_empty() {
            return Err(LoadError::Invalid(errors));
        }

        self.publish(zone);
        Ok(())
    }

    fn publish(&self, zone: Zone) {
        info!(
            "Zone {} updated: {} records.",
            zone.origin(),
            zone.record_count()
        );
        self.zone.store(Some(Arc::new(zone)));
    }

    fn lock_writer(&self) -> MutexGuard<()> {
        // The guarded data is (), so a poisoned lock is still usable.
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: ?Sized> QueryHandler<C> for Server {
    fn handle_query(&self, query: &Query, _client: &C) -> Response {
        let mut response = Response::new(query);

        let question = match query.question() {
            Some(question) => question,
            None => {
                response.rcode = Rcode::FormErr;
                return response;
            }
        };
        if question.qtype.is_unsupported_meta() || question.qclass == Qclass::ANY {
            response.rcode = Rcode::NotImp;
            return response;
        }

        let zone = match self.zone.load_full() {
            Some(zone) => zone,
            None => {
                warn!("Cannot answer {}: {}.", question.qname, ConfigurationError::NoOrigin);
                response.rcode = Rcode::ServFail;
                return response;
            }
        };
        if question.qclass != Qclass::from(zone.class()) {
            response.rcode = Rcode::Refused;
            return response;
        }

        match resolve(
            Some(&*zone),
            &question.qname,
            question.qtype,
            query.is_dnssec(),
        ) {
            Ok(outcome) => assemble(&zone, outcome, &mut response),
            Err(ConfigurationError::NotInZone) => response.rcode = Rcode::Refused,
            Err(error) => {
                warn!("Cannot answer {}: {}.", question.qname, error);
                response.rcode = Rcode::ServFail;
            }
        }
        debug!(
            "{} {} answered with {}.",
            question.qname, question.qtype, response.rcode
        );
        response
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that [`Server::load`] did not replace the zone.
#[derive(Debug)]
pub enum LoadError<E> {
    /// The zone could not be built from the loaded records.
    Zone(zone::Error),

    /// The loader failed.
    Loader(E),

    /// The zone was built, but has errors. The descriptions of the
    /// errors are included.
    Invalid(Vec<String>),
}

impl<E> From<zone::Error> for LoadError<E> {
    fn from(error: zone::Error) -> Self {
        Self::Zone(error)
    }
}

impl<E: fmt::Display> fmt::Display for LoadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Zone(error) => write!(f, "failed to build zone: {}", error),
            Self::Loader(error) => write!(f, "failed to load records: {}", error),
            Self::Invalid(errors) => write!(f, "zone is invalid: {}", errors.join("; ")),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for LoadError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Zone(error) => Some(error),
            Self::Loader(error) => Some(error),
            Self::Invalid(_) => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::message::{Qtype, Question};
    use crate::rr::{Rdata, Ttl, Type};

    fn name(from: &str) -> Name {
        from.parse().unwrap()
    }

    fn records(origin: &str, texts: &[(&str, Type, &str)]) -> Vec<Record> {
        let origin = name(origin);
        texts
            .iter()
            .map(|&(owner, rr_type, data)| {
                Record::new(
                    Name::parse_relative(owner, &origin).unwrap(),
                    rr_type,
                    Class::IN,
                    Ttl::from(3600),
                    Rdata::parse(rr_type, data, &origin).unwrap(),
                )
            })
            .collect()
    }

    static BASE: &[(&str, Type, &str)] = &[
        ("@", Type::SOA, "ns hostmaster 1 7200 3600 1209600 300"),
        ("@", Type::NS, "ns"),
        ("ns", Type::A, "192.0.2.53"),
    ];

    fn serving_server() -> Server {
        let server = Server::new();
        server.set_origin(name("cairn.test."), Class::IN);
        let mut zone = records("cairn.test.", BASE);
        zone.extend(records("cairn.test.", &[("www", Type::A, "192.0.2.1")]));
        server.replace_all(zone).unwrap();
        server
    }

    fn ask(server: &Server, qname: &str, qtype: impl Into<Qtype>) -> Response {
        server.handle_query(&Query::new(7, Question::new(name(qname), qtype)), &())
    }

    #[test]
    fn server_without_origin_fails() {
        let server = Server::new();
        let response = ask(&server, "www.cairn.test.", Type::A);
        assert_eq!(response.rcode, Rcode::ServFail);
        assert!(!response.aa);
        assert_eq!(server.clear_records(), Err(zone::Error::NoOrigin));
    }

    #[test]
    fn server_without_soa_fails() {
        let server = Server::new();
        server.set_origin(name("cairn.test."), Class::IN);
        let response = ask(&server, "www.cairn.test.", Type::A);
        assert_eq!(response.rcode, Rcode::ServFail);
        assert!(response.answer().is_empty());
    }

    #[test]
    fn server_answers() {
        let server = serving_server();
        let response = ask(&server, "www.cairn.test.", Type::A);
        assert_eq!(response.id, 7);
        assert_eq!(response.rcode, Rcode::NoError);
        assert!(response.aa);
        assert_eq!(response.counts(), (1, 0, 0));
    }

    #[test]
    fn empty_question_is_formerr() {
        let server = serving_server();
        let mut query = Query::new(7, Question::new(name("cairn.test."), Type::SOA));
        query.questions.clear();
        let response = server.handle_query(&query, &());
        assert_eq!(response.rcode, Rcode::FormErr);
        assert!(response.question.is_none());
    }

    #[test]
    fn meta_queries_are_notimp() {
        let server = serving_server();
        for qtype in [Qtype::AXFR, Qtype::IXFR, Qtype::MAILA, Qtype::MAILB] {
            assert_eq!(ask(&server, "cairn.test.", qtype).rcode, Rcode::NotImp);
        }
        let mut question = Question::new(name("cairn.test."), Type::SOA);
        question.qclass = Qclass::ANY;
        let response = server.handle_query(&Query::new(7, question), &());
        assert_eq!(response.rcode, Rcode::NotImp);
    }

    #[test]
    fn foreign_questions_are_refused() {
        let server = serving_server();
        assert_eq!(ask(&server, "www.example.net.", Type::A).rcode, Rcode::Refused);
        let mut question = Question::new(name("www.cairn.test."), Type::A);
        question.qclass = Class::CH.into();
        let response = server.handle_query(&Query::new(7, question), &());
        assert_eq!(response.rcode, Rcode::Refused);
        assert!(!response.aa);
    }

    #[test]
    fn clear_records_keeps_origin() {
        let server = serving_server();
        server.clear_records().unwrap();
        let zone = server.zone().unwrap();
        assert_eq!(zone.origin(), &name("cairn.test."));
        assert_eq!(zone.record_count(), 0);
        assert_eq!(ask(&server, "www.cairn.test.", Type::A).rcode, Rcode::ServFail);
    }

    #[test]
    fn set_origin_discards_records() {
        let server = serving_server();
        server.set_origin(name("other.test."), Class::IN);
        let zone = server.zone().unwrap();
        assert_eq!(zone.origin(), &name("other.test."));
        assert_eq!(zone.record_count(), 0);
    }

    #[test]
    fn failed_replace_keeps_old_zone() {
        let server = serving_server();
        let mut bad = records("cairn.test.", BASE);
        bad.extend(records("example.net.", &[("www", Type::A, "192.0.2.9")]));
        assert_eq!(server.replace_all(bad), Err(zone::Error::NotInZone));
        assert_eq!(ask(&server, "www.cairn.test.", Type::A).counts(), (1, 0, 0));
    }

    #[test]
    fn load_uses_loader() {
        let server = serving_server();
        let mut new_records = records("cairn.test.", BASE);
        new_records.extend(records("cairn.test.", &[("mail", Type::A, "192.0.2.25")]));
        server.load(&new_records).unwrap();
        assert_eq!(ask(&server, "www.cairn.test.", Type::A).rcode, Rcode::NxDomain);
        assert_eq!(ask(&server, "mail.cairn.test.", Type::A).rcode, Rcode::NoError);
    }

    #[test]
    fn load_refuses_invalid_zone() {
        let server = serving_server();
        let no_ns = records(
            "cairn.test.",
            &[("@", Type::SOA, "ns hostmaster 2 7200 3600 1209600 300")],
        );
        match server.load(&no_ns) {
            Err(LoadError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected an invalid zone, got {:?}", other),
        }
        assert_eq!(ask(&server, "www.cairn.test.", Type::A).rcode, Rcode::NoError);
    }

    #[test]
    fn load_reports_loader_errors() {
        struct FailingLoader;

        impl ZoneLoader for FailingLoader {
            type Error = &'static str;

            fn load(&self, _: &Name, _: Class) -> Result<Vec<Record>, Self::Error> {
                Err("no records today")
            }
        }

        let server = serving_server();
        assert!(matches!(
            server.load(&FailingLoader),
            Err(LoadError::Loader("no records today"))
        ));
        let error: LoadError<Infallible> = zone::Error::NoOrigin.into();
        assert!(matches!(error, LoadError::Zone(zone::Error::NoOrigin)));
    }

    #[test]
    fn queries_during_reloads_see_whole_snapshots() {
        // Each generation points an alias at its own target; a response
        // mixing two generations would fail to resolve the alias.
        fn generation(n: u8) -> Vec<Record> {
            let target = format!("target{}", n);
            let address = format!("192.0.2.{}", n);
            let mut zone = records("cairn.test.", BASE);
            zone.extend(records(
                "cairn.test.",
                &[
                    ("alias", Type::CNAME, target.as_str()),
                    (target.as_str(), Type::A, address.as_str()),
                ],
            ));
            zone
        }

        let server = serving_server();
        server.replace_all(generation(0)).unwrap();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for n in 1..=100 {
                    server.replace_all(generation(n % 2)).unwrap();
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let response = ask(&server, "alias.cairn.test.", Type::A);
                        assert_eq!(response.rcode, Rcode::NoError);
                        let answer = response.answer();
                        assert_eq!(answer.len(), 2);
                        let target = match answer[0].rdatas().next() {
                            Some(Rdata::Cname(target)) => target.clone(),
                            other => panic!("expected a CNAME, got {:?}", other),
                        };
                        assert_eq!(answer[1].owner, target);
                        let last_octet = match answer[1].rdatas().next() {
                            Some(Rdata::A(address)) => address.octets()[3],
                            other => panic!("expected an A record, got {:?}", other),
                        };
                        assert_eq!(target, name(&format!("target{}.cairn.test.", last_octet)));
                    }
                });
            }
        });
    }
}
