// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::Result;

use crate::cache::SnapshotCache;

pub fn handle(cache: &SnapshotCache, cache_path: &Path, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("path", _)) => println!("{}", cache_path.display()),
        Some(("clear", _)) => {
            cache.clear();
            println!("Cleared cached snapshot and identity");
        }
        _ => {}
    }
    Ok(())
}
