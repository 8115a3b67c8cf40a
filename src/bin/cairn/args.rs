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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cairn::message::Qtype;
use cairn::name::Name;
use cairn::rr::Type;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The Cairn authoritative DNS engine
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a single question and print the response
    Query(QueryArgs),

    /// Load and validate the configured zones
    Check(CheckArgs),

    /// Answer questions read from standard input, reloading the zones
    /// on SIGHUP
    Shell(ShellArgs),
}

#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// Set the configuration file to use
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Set the DO bit, asking for DNSSEC records
    #[arg(long)]
    pub dnssec: bool,

    /// The domain name to ask about
    pub name: Name,

    /// The QTYPE to ask for
    #[arg(default_value_t = Qtype::from(Type::A))]
    pub qtype: Qtype,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Set the configuration file to use
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,
}

#[derive(Debug, Parser)]
pub struct ShellArgs {
    /// Set the configuration file to use
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Set the DO bit on every question
    #[arg(long)]
    pub dnssec: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_args_parse() {
        let args = Args::try_parse_from([
            "cairn",
            "query",
            "--config",
            "cairn.toml",
            "www.cairn.test.",
            "MX",
            "--dnssec",
        ])
        .unwrap();
        match args.command {
            Command::Query(query_args) => {
                assert_eq!(query_args.name, "www.cairn.test.".parse().unwrap());
                assert_eq!(query_args.qtype, Qtype::from(Type::MX));
                assert!(query_args.dnssec);
            }
            other => panic!("expected a query command, got {:?}", other),
        }
    }

    #[test]
    fn query_type_defaults_to_a() {
        let args =
            Args::try_parse_from(["cairn", "query", "--config", "c.toml", "cairn.test."]).unwrap();
        match args.command {
            Command::Query(query_args) => assert_eq!(query_args.qtype, Qtype::from(Type::A)),
            other => panic!("expected a query command, got {:?}", other),
        }
    }
}
