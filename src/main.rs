// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use spendtrace::{cache::SqliteBlobStore, cli, commands, config, logging, SnapshotCache};

fn main() -> Result<()> {
    let cfg = config::load_config()?;
    logging::init_tracing(&cfg);

    let matches = cli::build_cli().get_matches();

    let cache_path = cfg.cache_path()?;
    let cache = SnapshotCache::new(SqliteBlobStore::open(&cache_path)?, cfg.namespace.clone());
    let window = cfg.window();

    match matches.subcommand() {
        Some(("summary", sub)) => commands::summary::handle(&cache, window, sub)?,
        Some(("series", sub)) => commands::series::handle(&cache, window, sub)?,
        Some(("list", sub)) => commands::transactions::handle(&cache, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&cache, sub)?,
        Some(("cache", sub)) => commands::cache::handle(&cache, &cache_path, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
