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

//! Implements the `query`, `check`, and `shell` commands.

use std::fmt::Write;
use std::io::{self, BufRead};
use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use log::{error, info};
use signal_hook::consts::signal::SIGHUP;
use signal_hook::iterator::Signals;

use cairn::message::{Qtype, Query, Question};
use cairn::name::Name;
use cairn::rr::Type;
use cairn::server::QueryHandler;
use cairn::zone::{Zone, ZoneLoader};

use crate::args::{CheckArgs, QueryArgs, ShellArgs};
use crate::config::{self, ZoneConfig};
use crate::zones::{FileLoader, Zones};

/// Installs the logger. Messages go to standard error, so they never
/// mix with the responses printed on standard output.
pub fn init_logging() {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
}

/// Exits with failure after logging `e` and its causes, if there is an
/// error.
fn exit_on_error(result: Result<()>, what: &str) {
    if let Err(e) = result {
        let mut message = format!("{}:", what);
        for (i, cause) in e.chain().enumerate() {
            let _ = write!(message, "\n[{}] {}", i + 1, cause);
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}

////////////////////////////////////////////////////////////////////////
// QUERY                                                              //
////////////////////////////////////////////////////////////////////////

pub fn query(args: QueryArgs) {
    exit_on_error(try_query(args), "Failed to answer the query");
}

fn try_query(args: QueryArgs) -> Result<()> {
    let config = config::load_from_path(&args.config).context("failed to load the configuration")?;
    let zones = Zones::load(config.zones);
    let mut query = Query::new(1, Question::new(args.name, args.qtype));
    query.dnssec_ok = args.dnssec;
    println!("{}", zones.handle_query(&query, &()));
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// CHECK                                                              //
////////////////////////////////////////////////////////////////////////

pub fn check(args: CheckArgs) {
    let mut failed = false;
    exit_on_error(
        try_checking(args, &mut failed),
        "Failed to check the zones",
    );
    if failed {
        process::exit(1);
    }
}

fn try_checking(args: CheckArgs, failed: &mut bool) -> Result<()> {
    let config = config::load_from_path(&args.config).context("failed to load the configuration")?;
    for zone_config in config.zones.iter() {
        match check_zone(zone_config) {
            Ok(true) => println!("{}/{}: OK", zone_config.name.0, zone_config.class.0),
            Ok(false) => *failed = true,
            Err(e) => {
                println!("{}/{}: failed to load", zone_config.name.0, zone_config.class.0);
                for (i, cause) in e.chain().enumerate() {
                    println!("[{}] {}", i + 1, cause);
                }
                *failed = true;
            }
        }
    }
    Ok(())
}

/// Loads and validates a single zone, printing any issues. Returns
/// whether the zone is free of errors (but not warnings).
fn check_zone(zone_config: &ZoneConfig) -> Result<bool> {
    let origin = &zone_config.name.0;
    let class = zone_config.class.0;
    let records = FileLoader::new(zone_config.path.clone()).load(origin, class)?;
    let zone = Zone::new(origin.clone(), class)
        .replace_all(records)
        .context("failed to build the zone")?;

    let issues = zone.validate();
    let have_errors = issues.iter().any(|issue| issue.is_error());
    if issues.is_empty() {
        println!("{}/{}: {} records", origin, class, zone.record_count());
        return Ok(true);
    }
    println!("{}/{}: {} records, {} issues", origin, class, zone.record_count(), issues.len());
    for (i, issue) in issues.iter().enumerate() {
        let kind = if issue.is_error() { "error" } else { "warning" };
        println!("[{}] ({}) {}", i + 1, kind, issue);
    }
    Ok(!have_errors)
}

////////////////////////////////////////////////////////////////////////
// SHELL                                                              //
////////////////////////////////////////////////////////////////////////

pub fn shell(args: ShellArgs) {
    exit_on_error(try_running_shell(args), "Failed to run the shell");
    info!("Exiting with success.");
}

fn try_running_shell(args: ShellArgs) -> Result<()> {
    let config = config::load_from_path(&args.config).context("failed to load the configuration")?;
    let zones = Arc::new(Zones::load(config.zones));

    let mut signals = Signals::new([SIGHUP]).context("failed to set up signal handling")?;
    let reload_zones = zones.clone();
    thread::Builder::new()
        .name("reload".to_owned())
        .spawn(move || {
            for _ in signals.forever() {
                info!("Received SIGHUP; reloading zones.");
                reload_zones.reload();
            }
        })
        .context("failed to start the reload thread")?;

    let mut id: u16 = 0;
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read standard input")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_question(&line) {
            Ok(question) => {
                id = id.wrapping_add(1);
                let mut query = Query::new(id, question);
                query.dnssec_ok = args.dnssec;
                println!("{}\n", zones.handle_query(&query, &()));
            }
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

/// Parses a question of the form `NAME [TYPE]` from a shell line.
fn parse_question(line: &str) -> Result<Question> {
    let mut fields = line.split_whitespace();
    let qname: Name = fields
        .next()
        .ok_or_else(|| anyhow!("expected a domain name"))?
        .parse()
        .context("invalid domain name")?;
    let qtype = match fields.next() {
        Some(text) => text.parse().map_err(|e| anyhow!("invalid QTYPE: {}", e))?,
        None => Qtype::from(Type::A),
    };
    if fields.next().is_some() {
        return Err(anyhow!("expected at most a domain name and a QTYPE"));
    }
    Ok(Question::new(qname, qtype))
}
