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

//! Implements zone loading from TOML record files.

use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::{debug, error};
use serde::Deserialize;

use cairn::class::Class;
use cairn::message::{Query, Rcode, Response};
use cairn::name::Name;
use cairn::rr::{Rdata, Record, Ttl};
use cairn::server::{LoadError, QueryHandler, Server};
use cairn::zone::ZoneLoader;

use crate::config::{ConfigClass, ConfigType, ZoneConfig};

////////////////////////////////////////////////////////////////////////
// RECORD FILES                                                       //
////////////////////////////////////////////////////////////////////////

/// A record file, as deserialized.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordFile {
    #[serde(default = "default_ttl")]
    default_ttl: u32,
    #[serde(default)]
    records: Vec<RecordEntry>,
}

fn default_ttl() -> u32 {
    3600
}

/// A single `[[records]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordEntry {
    owner: String,
    #[serde(rename = "type")]
    rr_type: ConfigType,
    ttl: Option<u32>,
    class: Option<ConfigClass>,
    data: String,
}

/// Parses the text of a record file for the zone at `origin`. Records
/// without an explicit class take `class`.
pub fn parse_records(text: &str, origin: &Name, class: Class) -> Result<Vec<Record>> {
    let file: RecordFile = toml::from_str(text).context("failed to parse the record file")?;
    file.records
        .into_iter()
        .enumerate()
        .map(|(i, entry)| -> Result<Record> {
            let owner = Name::parse_relative(&entry.owner, origin)
                .with_context(|| format!("record {} has an invalid owner", i + 1))?;
            let rr_type = entry.rr_type.0;
            let rdata = Rdata::parse(rr_type, &entry.data, origin)
                .with_context(|| format!("record {} has invalid {} data", i + 1, rr_type))?;
            Ok(Record::new(
                owner,
                rr_type,
                entry.class.map_or(class, |c| c.0),
                Ttl::from(entry.ttl.unwrap_or(file.default_ttl)),
                rdata,
            ))
        })
        .collect()
}

/// A [`ZoneLoader`] that reads a TOML record file.
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ZoneLoader for FileLoader {
    type Error = anyhow::Error;

    fn load(&self, origin: &Name, class: Class) -> Result<Vec<Record>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_records(&text, origin, class)
            .with_context(|| format!("failed to load {}", self.path.display()))
    }
}

////////////////////////////////////////////////////////////////////////
// ZONE SETS                                                          //
////////////////////////////////////////////////////////////////////////

/// The configured zones, each served by its own [`Server`].
pub struct Zones {
    entries: Vec<(ZoneConfig, Server)>,
}

impl Zones {
    /// Sets up a server for each configured zone and loads it. Zones
    /// that fail to load are logged and keep answering SERVFAIL.
    pub fn load(zone_configs: Vec<ZoneConfig>) -> Self {
        let entries: Vec<_> = zone_configs
            .into_iter()
            .map(|zone_config| {
                let server = Server::new();
                server.set_origin(zone_config.name.0.clone(), zone_config.class.0);
                (zone_config, server)
            })
            .collect();
        let zones = Self { entries };
        zones.reload();
        zones
    }

    /// Reloads every zone from its record file. A zone that fails to
    /// reload keeps its old records. Returns the number of failures.
    pub fn reload(&self) -> usize {
        let mut zones_failed = 0;
        for (zone_config, server) in self.entries.iter() {
            debug!(
                "Loading {}/{} from {}.",
                zone_config.name.0,
                zone_config.class.0,
                zone_config.path.display(),
            );
            if let Err(e) = load_zone(zone_config, server) {
                let mut message = format!(
                    "Failed to load {}/{}:",
                    zone_config.name.0, zone_config.class.0
                );
                for (i, cause) in e.chain().enumerate() {
                    let _ = write!(message, "\n[{}] {}", i + 1, cause);
                }
                error!("{}", message);
                zones_failed += 1;
            }
        }
        if zones_failed == 1 {
            error!("1 zone failed to load.");
        } else if zones_failed > 1 {
            error!("{} zones failed to load.", zones_failed);
        }
        zones_failed
    }

    /// Returns the server for the zone closest enclosing `name`.
    pub fn find(&self, name: &Name, class: Class) -> Option<&Server> {
        self.entries
            .iter()
            .filter(|(zone_config, _)| {
                zone_config.class.0 == class && name.eq_or_subdomain_of(&zone_config.name.0)
            })
            .max_by_key(|(zone_config, _)| zone_config.name.0.label_count())
            .map(|(_, server)| server)
    }
}

/// Answers queries with the server of the zone the question belongs
/// to, or REFUSED if there is none.
impl<C: ?Sized> QueryHandler<C> for Zones {
    fn handle_query(&self, query: &Query, client: &C) -> Response {
        let server = query
            .question()
            .and_then(|question| self.find(&question.qname, Class::from(u16::from(question.qclass))));
        match server {
            Some(server) => server.handle_query(query, client),
            None if query.question().is_none() => {
                let mut response = Response::new(query);
                response.rcode = Rcode::FormErr;
                response
            }
            None => {
                let mut response = Response::new(query);
                response.rcode = Rcode::Refused;
                response
            }
        }
    }
}

fn load_zone(zone_config: &ZoneConfig, server: &Server) -> Result<()> {
    match server.load(&FileLoader::new(zone_config.path.clone())) {
        Ok(()) => Ok(()),
        Err(LoadError::Loader(e)) => Err(e),
        Err(e) => Err(anyhow!("{}", e)),
    }
}
