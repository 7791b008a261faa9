//! zkonacci CLI - Command line interface for the Fibonacci accumulator
//!
//! Every command prints one JSON document on stdout. Logs go to stderr and
//! are filtered by `ZKONACCI_LOG`.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use zkonacci::{
    pad_siblings, Accumulator, Address, Blake3Hasher, Config, FileStore, Hash, Key, ProverKind,
    SparseMerkleTree, Submission, Value,
};

#[derive(Parser)]
#[command(name = "zkonacci")]
#[command(about = "A sparse Merkle accumulator for the Fibonacci sequence")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/zkonacci/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the node store file
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,

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
    /// Create a store and insert the two seeds
    Init {
        /// Tree depth (overrides the config)
        #[arg(short, long)]
        levels: Option<usize>,
        /// Replace an existing store
        #[arg(long)]
        force: bool,
    },

    /// Insert an arbitrary key-value pair
    Insert {
        /// The key
        key: Key,
        /// The value, decimal or 0x-prefixed hex
        value: String,
    },

    /// Prove presence or absence of a key
    Prove {
        /// The key
        key: Key,
        /// Historical root to prove against (hex, defaults to the latest)
        #[arg(short, long)]
        root: Option<Hash>,
    },

    /// Append the next terms of the sequence, proving each
    Advance {
        /// Number of terms to append
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
        /// Sender address bound into the proofs
        #[arg(long)]
        sender: Option<Address>,
        /// Proving backend (mock or snarkjs)
        #[arg(long)]
        prover: Option<ProverKind>,
        /// Also write the last circuit inputs to this file
        #[arg(long)]
        inputs_out: Option<PathBuf>,
    },

    /// Append terms without proofs until the given index is next
    CatchUp {
        /// Index of the next term after catching up
        n: Key,
    },

    /// Show store status
    Status,

    /// List committed roots, oldest first
    Roots {
        /// Show only the most recent roots
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    zkonacci::logging::init(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_explicit(path)?,
        None => Config::load_default()?,
    };
    if let Some(store) = &cli.store {
        config.store = store.clone();
    }

    match cli.command {
        Commands::Init { levels, force } => {
            if let Some(levels) = levels {
                config.levels = levels;
            }
            config.validate()?;
            if config.store.exists() && !force {
                bail!(
                    "Store already exists at {} (use --force to replace it)",
                    config.store.display()
                );
            }

            let store = Arc::new(FileStore::create(&config.store, config.levels)?);
            let tree = SparseMerkleTree::new(config.levels, Arc::clone(&store))?;
            let acc = Accumulator::genesis(tree, config.seeds())?;
            store.push_root(acc.root());
            store.sync()?;

            output(
                cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Created store at {}", config.store.display()),
                    "levels": config.levels,
                    "root": acc.root().to_hex(),
                    "next": acc.next_index()
                }),
            )?;
        }

        Commands::Insert { key, value } => {
            let value = parse_value(&value)?;
            let mut tree = open_tree(&config)?;
            tree.insert(key, value)?;
            tree.store().push_root(tree.root());
            tree.store().sync()?;

            output(
                cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "key": key,
                    "value": value.to_string(),
                    "root": tree.root().to_hex()
                }),
            )?;
        }

        Commands::Prove { key, root } => {
            let tree = open_tree(&config)?;
            let snapshot = match root {
                Some(root) => tree.snapshot_at(root)?,
                None => tree.snapshot(),
            };
            let proof = snapshot.generate_proof(key)?;
            proof.verify::<Blake3Hasher>(&snapshot.root())?;

            let siblings: Vec<String> = pad_siblings(&proof.siblings, tree.levels())?
                .iter()
                .map(|sibling| sibling.to_field().to_string())
                .collect();
            output(
                cli.format,
                &serde_json::json!({
                    "key": key,
                    "root": snapshot.root().to_hex(),
                    "existence": proof.existence,
                    "value": proof.value().map(|value| value.to_string()),
                    "oldKey": proof.old_key,
                    "oldValue": proof.old_value.to_string(),
                    "isOld0": proof.is_old0,
                    "depth": proof.depth(),
                    "siblings": siblings
                }),
            )?;
        }

        Commands::Advance {
            count,
            sender,
            prover,
            inputs_out,
        } => {
            if let Some(prover) = prover {
                config.prover = prover;
            }
            let sender = sender.unwrap_or_else(|| config.sender());
            let prover = config.prover();

            let tree = open_tree(&config)?;
            let levels = tree.levels();
            let mut acc = Accumulator::resume(tree, config.seeds())?;

            let mut steps = Vec::with_capacity(count);
            let mut last_inputs = None;
            let outcome = (0..count).try_for_each(|_| -> anyhow::Result<()> {
                let step = acc.step(sender)?;
                step.inputs.verify::<Blake3Hasher>(&step.new_root, levels)?;
                let proof = prover
                    .prove(&step.inputs)
                    .with_context(|| format!("Proving term {} with {}", step.n(), prover.name()))?;
                // Only proven roots enter the log
                acc.tree().store().push_root(step.new_root);

                steps.push(serde_json::json!({
                    "n": step.n(),
                    "Fn": step.inputs.f_n.to_string(),
                    "oldRoot": step.old_root().to_hex(),
                    "newRoot": step.new_root.to_hex(),
                    "inputs": serde_json::to_value(&step.inputs)?,
                    "submission": serde_json::to_value(Submission::new(proof, step.new_root))?
                }));
                last_inputs = Some(step.inputs);
                Ok(())
            });
            acc.tree().store().sync()?;
            outcome?;

            if let (Some(path), Some(inputs)) = (inputs_out, &last_inputs) {
                std::fs::write(&path, serde_json::to_vec_pretty(inputs)?)
                    .with_context(|| format!("Writing {}", path.display()))?;
            }

            output(
                cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "prover": prover.name(),
                    "sender": sender.to_hex(),
                    "next": acc.next_index(),
                    "steps": steps
                }),
            )?;
        }

        Commands::CatchUp { n } => {
            let tree = open_tree(&config)?;
            let mut acc = Accumulator::resume(tree, config.seeds())?;
            let outcome = acc.catch_up(n);
            acc.tree().store().push_root(acc.root());
            acc.tree().store().sync()?;
            outcome?;

            output(
                cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "next": acc.next_index(),
                    "root": acc.root().to_hex()
                }),
            )?;
        }

        Commands::Status => {
            if !config.store.exists() {
                output(
                    cli.format,
                    &serde_json::json!({
                        "store": config.store.display().to_string(),
                        "exists": false
                    }),
                )?;
                return Ok(());
            }

            let tree = open_tree(&config)?;
            let store = Arc::clone(tree.store());
            let root = tree.root();
            let next = if root.is_zero() {
                None
            } else {
                Some(Accumulator::resume(tree, config.seeds())?.next_index())
            };

            output(
                cli.format,
                &serde_json::json!({
                    "store": config.store.display().to_string(),
                    "exists": true,
                    "levels": store.levels(),
                    "root": root.to_hex(),
                    "next": next,
                    "nodes": store.node_count(),
                    "roots": store.roots().len()
                }),
            )?;
        }

        Commands::Roots { limit } => {
            let store = open_store(&config)?;
            let roots = store.roots();
            let skip = limit.map_or(0, |limit| roots.len().saturating_sub(limit));
            let roots: Vec<String> = roots.iter().skip(skip).map(Hash::to_hex).collect();

            output(
                cli.format,
                &serde_json::json!({
                    "count": roots.len(),
                    "roots": roots
                }),
            )?;
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Arc<FileStore>> {
    if !config.store.exists() {
        bail!(
            "No store at {} (run `zkonacci init` first)",
            config.store.display()
        );
    }
    let store = FileStore::open(&config.store)
        .with_context(|| format!("Opening {}", config.store.display()))?;
    if store.levels() != config.levels {
        warn!(
            store = store.levels(),
            config = config.levels,
            "store level count differs from config, using the store's"
        );
    }
    Ok(Arc::new(store))
}

fn open_tree(config: &Config) -> anyhow::Result<SparseMerkleTree<FileStore>> {
    let store = open_store(config)?;
    let root = store.latest_root();
    Ok(SparseMerkleTree::from_root(store.levels(), store, root)?)
}

fn parse_value(value: &str) -> anyhow::Result<Value> {
    value
        .parse::<Value>()
        .map_err(|e| anyhow!("Invalid value {}: {}", value, e))
}

fn output(format: OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Text => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
