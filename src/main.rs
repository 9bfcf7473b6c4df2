//! tbledger CLI - verify ledger proofs from the command line
//!
//! Proof rows and records are read from JSON files, e.g. as exported from
//! `ledger_audit_proof` / `ledger_consistency_proof` query results.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tbledger::{
    AuditClaim, ConsistencyClaim, Digest, LedgerConfig, MemoryProofSource, MemoryRecord, Verifier,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tbledger")]
#[command(about = "Verify tamper-evident Transbase ledger tables")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Config file (defaults to <config dir>/tbledger/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file to --config or the default location
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Hash two child nodes into their parent
    HashNodes {
        /// Left child (hex)
        left: String,
        /// Right child (hex)
        right: String,
        /// Treat both inputs as UTF-8 text instead of hex
        #[arg(long)]
        text: bool,
    },

    /// Compute the leaf digest of a record stored as JSON
    HashRecord {
        /// Record file: {"columns": [{"name", "type", "value"}, ...]}
        record: PathBuf,
    },

    /// Verify that a record is included in a ledger tree
    VerifyAudit {
        /// Proof rows (JSON array of {"hash", "first"})
        #[arg(short, long)]
        proof: PathBuf,
        /// Claimed root of the tree (hex)
        #[arg(long)]
        root: Digest,
        /// Tree size/index the root belongs to
        #[arg(long)]
        index: u64,
        /// Identity of the record on the server
        #[arg(long)]
        record_id: i64,
        /// Leaf digest of the record (hex)
        #[arg(long, conflicts_with = "record", required_unless_present = "record")]
        record_hash: Option<Digest>,
        /// Record file to hash instead of passing --record-hash
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Verify that a newer tree state extends an older one
    VerifyConsistency {
        /// Proof rows (JSON array of {"hash", "first", "old", "new"})
        #[arg(short, long)]
        proof: PathBuf,
        /// Claimed root of the old tree (hex)
        #[arg(long)]
        old_root: Digest,
        /// Size/index of the old tree
        #[arg(long)]
        old_index: u64,
        /// Claimed root of the new tree (hex)
        #[arg(long)]
        new_root: Digest,
        /// Size/index of the new tree
        #[arg(long)]
        new_index: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Exit 0 when verified, 1 when a proof does not verify
fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            let path = init_config(config_path, force)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "path": path.display().to_string()
                }),
            );
        }

        Commands::HashNodes { left, right, text } => {
            // no config is needed, but a broken one is still reported
            load_verifier(config_path)?;
            let (left, right) = if text {
                (left.into_bytes(), right.into_bytes())
            } else {
                (decode_hex(&left)?, decode_hex(&right)?)
            };
            let digest = tbledger::hash_nodes(&left, &right);
            output(&cli.format, &serde_json::json!({ "hash": digest.to_hex() }));
        }

        Commands::HashRecord { record } => {
            let verifier = load_verifier(config_path)?;
            let digest = hash_record_file(&verifier, &record)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "record": record.display().to_string(),
                    "hash": digest.to_hex()
                }),
            );
        }

        Commands::VerifyAudit {
            proof,
            root,
            index,
            record_id,
            record_hash,
            record,
        } => {
            let verifier = load_verifier(config_path)?;
            // clap guarantees exactly one of the two
            let record_hash = match record_hash {
                Some(hash) => hash,
                None => {
                    let path = record.context("--record-hash or --record is required")?;
                    hash_record_file(&verifier, &path)?
                }
            };
            let source = MemoryProofSource::from_json_file(&proof)?;
            let claim = AuditClaim {
                root,
                tree_index: index,
                record_id,
                record_hash,
            };
            let verified = verifier.verify_audit_proof(&source, &claim)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "verified": verified,
                    "root": root.to_hex(),
                    "index": index,
                    "record_id": record_id,
                    "record_hash": record_hash.to_hex(),
                    "nodes": source.rows().len()
                }),
            );
            return Ok(exit_code(verified));
        }

        Commands::VerifyConsistency {
            proof,
            old_root,
            old_index,
            new_root,
            new_index,
        } => {
            let verifier = load_verifier(config_path)?;
            let source = MemoryProofSource::from_json_file(&proof)?;
            let claim = ConsistencyClaim {
                old_root,
                old_index,
                new_root,
                new_index,
            };
            let verified = verifier.verify_consistency_proof(&source, &claim)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "verified": verified,
                    "old_root": old_root.to_hex(),
                    "old_index": old_index,
                    "new_root": new_root.to_hex(),
                    "new_index": new_index,
                    "nodes": source.rows().len()
                }),
            );
            return Ok(exit_code(verified));
        }
    }

    Ok(ExitCode::SUCCESS)
}

// Logs go to stderr so stdout stays parseable
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_verifier(config: Option<&Path>) -> anyhow::Result<Verifier> {
    Ok(Verifier::new(LedgerConfig::load_or_default(config)?))
}

/// Write the default config, refusing to clobber an existing file
fn init_config(config: Option<&Path>, force: bool) -> anyhow::Result<PathBuf> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => LedgerConfig::default_path()?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    LedgerConfig::default().save(&path)?;
    Ok(path)
}

fn hash_record_file(verifier: &Verifier, path: &Path) -> anyhow::Result<Digest> {
    let mut record = MemoryRecord::from_json_file(path)?;
    Ok(verifier.hash_record(&mut record)?)
}

fn decode_hex(input: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(input.trim()).map_err(|e| anyhow::anyhow!("Invalid hex {:?}: {}", input, e))
}

fn exit_code(verified: bool) -> ExitCode {
    if verified {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", value);
        }
        OutputFormat::Text => match value.as_object() {
            Some(map) => {
                for (key, value) in map {
                    match value {
                        serde_json::Value::String(s) => println!("{key}: {s}"),
                        other => println!("{key}: {other}"),
                    }
                }
            }
            None => println!("{}", value),
        },
    }
}
