//! # CLI - RiptideKV Interactive Shell
//!
//! A REPL-style command-line interface for the RiptideKV storage engine.
//! Reads commands from stdin, executes them against an [`engine::Engine`],
//! and prints results to stdout. Designed for both interactive use and
//! scripted testing (pipe commands via stdin).
//!
//! Every data command is tenant/table-scoped — there is no implicit default
//! table, matching the engine's multi-tenant ingest/query surface (§6.1).
//!
//! ## Commands
//!
//! ```text
//! CREATE tenant table          Register a table (no typed columns)
//! SET tenant table key value   Insert or update a record
//! GET tenant table key         Look up a record (prints value or "(nil)")
//! DEL tenant table key         Delete a record (writes a tombstone)
//! SCAN tenant table [start] [end]  Range scan (inclusive start, exclusive end)
//! FLUSH tenant table           Force a checkpoint flush of the active memtable
//! COMPACT                      Trigger one compaction pass immediately
//! STATS                        Print per-table engine stats
//! DROP tenant table            Drop a table and its on-disk data
//! EXIT / QUIT                  Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! ```text
//! $ cargo run -p cli -- --config riptide.toml
//! ```
//!
//! With no `--config` flag, the engine starts from [`config::Config::default`].

use anyhow::{Context, Result};
use catalog::ColumnSchema;
use config::Config;
use engine::{Engine, QueryRequest, Record, TableId, TenantId};
use std::io::{self, BufRead, Write};

fn parse_args() -> Result<Config> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config requires a path argument")?;
            return Ok(Config::load(&path).with_context(|| format!("loading config from {path}"))?);
        }
    }
    Ok(Config::default())
}

fn main() -> Result<()> {
    let config = parse_args()?;
    let data_dir = config.storage.data_dir.clone();
    let wal_dir = config.wal.dir.clone();
    let engine = Engine::open(config).context("failed to open engine")?;

    println!("RiptideKV started (wal={wal_dir}, data_dir={data_dir})");
    println!("Commands: CREATE tenant table | SET tenant table key value | GET tenant table key");
    println!("          DEL tenant table key | SCAN tenant table [start] [end] | DROP tenant table");
    println!("          FLUSH tenant table | COMPACT | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    let cancel = engine.cancellation_token();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "CREATE" => match (parts.next(), parts.next()) {
                    (Some(t), Some(tbl)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        match engine.create_table(&tenant, &table, Vec::<ColumnSchema>::new()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR create failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: CREATE tenant table"),
                },
                "SET" => match (parts.next(), parts.next(), parts.next()) {
                    (Some(t), Some(tbl), Some(k)) => {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET tenant table key value");
                        } else {
                            let tenant = TenantId::new(t);
                            let table = TableId::new(tbl);
                            let record = Record::insert(k, v.into_bytes());
                            match engine.ingest_record(&tenant, &table, record, &cancel) {
                                Ok(_) => println!("OK"),
                                Err(e) => println!("ERR set failed: {e}"),
                            }
                        }
                    }
                    _ => println!("ERR usage: SET tenant table key value"),
                },
                "GET" => match (parts.next(), parts.next(), parts.next()) {
                    (Some(t), Some(tbl), Some(k)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        let entity = k.into();
                        match engine.get_record(&tenant, &table, &entity, None, &cancel) {
                            Ok(Some(record)) => println!("{}", String::from_utf8_lossy(&record.payload)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR get failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: GET tenant table key"),
                },
                "DEL" => match (parts.next(), parts.next(), parts.next()) {
                    (Some(t), Some(tbl), Some(k)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        match engine.ingest_record(&tenant, &table, Record::delete(k), &cancel) {
                            Ok(_) => println!("OK"),
                            Err(e) => println!("ERR del failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: DEL tenant table key"),
                },
                "SCAN" => match (parts.next(), parts.next()) {
                    (Some(t), Some(tbl)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        let start = parts.next().map(|s| s.into());
                        let end = parts.next().map(|s| s.into());
                        let request = QueryRequest { start_entity: start, end_entity: end, ..Default::default() };
                        match engine.query(&tenant, &table, &request, &cancel) {
                            Ok(results) => {
                                if results.is_empty() {
                                    println!("(empty)");
                                } else {
                                    for record in &results {
                                        println!(
                                            "{} -> {}",
                                            String::from_utf8_lossy(&record.entity_id.0),
                                            String::from_utf8_lossy(&record.payload)
                                        );
                                    }
                                    println!("({} entries)", results.len());
                                }
                            }
                            Err(e) => println!("ERR scan failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: SCAN tenant table [start] [end]"),
                },
                "DROP" => match (parts.next(), parts.next()) {
                    (Some(t), Some(tbl)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        match engine.drop_table(&tenant, &table) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR drop failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: DROP tenant table"),
                },
                "FLUSH" => match (parts.next(), parts.next()) {
                    (Some(t), Some(tbl)) => {
                        let tenant = TenantId::new(t);
                        let table = TableId::new(tbl);
                        match engine.checkpoint(&tenant, &table) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR flush failed: {e}"),
                        }
                    }
                    _ => println!("ERR usage: FLUSH tenant table"),
                },
                "COMPACT" => match engine.compact_now() {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR compact failed: {e}"),
                },
                "STATS" => {
                    let stats = engine.stats();
                    println!(
                        "Engine {{ sequence: {}, version: {}, tables: {} }}",
                        stats.current_sequence,
                        stats.current_version,
                        stats.tables.len()
                    );
                    for t in &stats.tables {
                        println!(
                            "  {}::{} rows={} files={} immutable_memtables={} checkpoint_seq={}",
                            t.tenant, t.table, t.row_count, t.file_count, t.immutable_memtables, t.checkpoint_sequence
                        );
                    }
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {other}");
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    engine.shutdown().context("engine shutdown failed")?;
    Ok(())
}
