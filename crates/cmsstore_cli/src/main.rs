//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cmsstore_core` linkage.
//! - Print per-kind live row counts of a database, and optionally resolve
//!   one request path for a site.
//!
//! Usage: `cmsstore_cli [DB_PATH [SITE_ID PATH]]`
//!
//! Setting `CMSSTORE_LOG_DIR` to an absolute directory enables file logging.

use cmsstore_core::{
    core_version, default_log_level, init_logging, open_db, Entity, EntityKind, ListQuery,
    LoggingConfig, RouteService, SqliteEntityStore, StoreConfig,
};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("cmsstore_core version={}", core_version());

    if let Some(log_dir) = std::env::var_os("CMSSTORE_LOG_DIR") {
        if let Err(err) = init_logging(&LoggingConfig::new(default_log_level(), log_dir)) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let Some(db_path) = args.first() else {
        return Ok(());
    };

    let config = StoreConfig::default();
    let conn = open_db(db_path, &config)?;
    let store = SqliteEntityStore::try_new(&conn, config)?;
    info!("event=cli_run module=cli status=start");

    for kind in EntityKind::ALL {
        let total = store.count_kind(kind, &ListQuery::new())?;
        println!("{kind} count={total}");
    }

    if let [_, site_id, path, ..] = args {
        let routes = RouteService::new(store);
        match routes.find_page_by_path(site_id, path)? {
            Some(page) => println!("route {path} -> page id={} title={}", page.id(), page.title()),
            None => println!("route {path} -> not found"),
        }
    }

    info!("event=cli_run module=cli status=ok");
    Ok(())
}
