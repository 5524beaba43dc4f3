//! # CLI - UndertowKV Interactive Shell
//!
//! A REPL-style command-line interface for the UndertowKV store. Reads
//! commands from stdin, executes them against the store, and prints results
//! to stdout. Designed for both interactive use and scripted testing (pipe
//! commands via stdin; EOF ends the session).
//!
//! ## Commands
//!
//! ```text
//! PUT key value      Insert or update a key-value pair
//! GET key            Look up a key (prints the value or "NULL")
//! DELETE key         Delete a key (no-op when absent)
//! KEYS               List all live keys (or "NO KEYS")
//! MERGE              Compact the sealed segments
//! ```
//!
//! Commands take a fixed number of space-separated arguments; anything else
//! prints an `INVALID COMMAND: ...` line and keeps the session alive.
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli -- data/db
//! > PUT name alice
//! PUT name SUCCESSFULLY
//! > GET name
//! alice
//! > DELETE name
//! DELETE name SUCCESSFULLY
//! > GET name
//! NULL
//! > KEYS
//! NO KEYS
//! ```

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use store::Store;

/// A Bitcask-style append-only key-value store.
#[derive(Parser)]
#[command(name = "undertow")]
struct Cli {
    /// Directory holding the store's segment files (created if missing).
    path: PathBuf,

    /// Rotate the active segment once it grows past this many bytes.
    #[arg(long, default_value_t = store::DEFAULT_MAX_SEGMENT_SIZE)]
    max_segment_size: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut store = Store::open_with(&cli.path, cli.max_segment_size)?;

    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        handle_line(&mut store, &line)?;
        print!("> ");
        io::stdout().flush()?;
    }

    Ok(())
}

/// Dispatches one input line against the store.
///
/// Malformed input (unknown verb, wrong arity) is reported on stdout and is
/// not an error; store failures propagate and end the session.
fn handle_line(store: &mut Store, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        Some(c) => c,
        None => return Ok(()),
    };
    let args: Vec<&str> = parts.collect();

    match command {
        "GET" => {
            if args.len() != 1 {
                println!("INVALID COMMAND: GET REQUIRES 1 ARGUMENT");
                return Ok(());
            }
            match store.get(args[0].as_bytes())? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("NULL"),
            }
        }
        "PUT" => {
            if args.len() != 2 {
                println!("INVALID COMMAND: PUT REQUIRES 2 ARGUMENTS");
                return Ok(());
            }
            store.put(args[0].as_bytes().to_vec(), args[1].as_bytes().to_vec())?;
            println!("PUT {} SUCCESSFULLY", args[0]);
        }
        "DELETE" => {
            if args.len() != 1 {
                println!("INVALID COMMAND: DELETE REQUIRES 1 ARGUMENT");
                return Ok(());
            }
            store.delete(args[0].as_bytes().to_vec())?;
            println!("DELETE {} SUCCESSFULLY", args[0]);
        }
        "KEYS" => {
            if !args.is_empty() {
                println!("INVALID COMMAND: KEYS REQUIRES NO ARGUMENTS");
                return Ok(());
            }
            let mut keys: Vec<String> = store
                .keys()
                .iter()
                .map(|k| String::from_utf8_lossy(k).into_owned())
                .collect();
            if keys.is_empty() {
                println!("NO KEYS");
            } else {
                keys.sort();
                println!("{}", keys.join(", "));
            }
        }
        "MERGE" => {
            if !args.is_empty() {
                println!("INVALID COMMAND: MERGE REQUIRES NO ARGUMENTS");
                return Ok(());
            }
            store.merge()?;
            println!("MERGE SUCCESSFULLY");
        }
        other => {
            println!("INVALID COMMAND: {} IS NOT A COMMAND", other);
        }
    }

    Ok(())
}
