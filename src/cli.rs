// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

pub fn build_cli() -> Command {
    Command::new("spendtrace")
        .version(clap::crate_version!())
        .about("Inspect the locally cached transaction snapshot")
        .subcommand_required(false)
        .subcommand(
            Command::new("summary")
                .about("Totals, balance and expense extremes")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("series")
                .about("Cumulative day-of-month series per type")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("list")
                .about("Cached transactions, newest first")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(["income", "expense", "savings"]),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("export")
                .about("Write cached transactions to a file")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .value_parser(["csv", "json"]),
                )
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(
            Command::new("cache")
                .about("Manage the local cache")
                .subcommand_required(true)
                .subcommand(Command::new("path").about("Print the cache database path"))
                .subcommand(Command::new("clear").about("Forget the cached snapshot and identity")),
        )
}
