//! iou-party CLI
//!
//! Run party detection over an IOU ledger from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Would carol owing alice close a party?
//! iou-party detect --input ious.json --giver carol --receiver alice
//!
//! # Output as JSON
//! iou-party detect --input ious.json --giver carol --receiver alice --format json
//!
//! # Report every party reachable from a current giver
//! iou-party parties --input ious.json
//!
//! # Generate a random ledger for testing
//! iou-party generate --users 10 --ious 30
//! ```
//!
//! Set `RUST_LOG=debug` to see graph construction and traversal details.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use iou_party::config::DetectorConfig;
use iou_party::core::iou::Iou;
use iou_party::core::user::UserId;
use iou_party::detection::PartyDetector;
use iou_party::graph::cycle_detection::{find_party_with, Party, Traversal};
use iou_party::simulation::generator::{generate_random_network, NetworkConfig};
use iou_party::store::memory::InMemoryIouStore;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "iou-party")]
#[command(about = "Detect closed debt cycles (parties) among unsettled IOUs")]
struct Cli {
    /// Path to a JSON detector config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// DFS implementation (overrides the config file)
    #[arg(long, global = true, value_enum)]
    traversal: Option<TraversalArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a proposed IOU closes a party
    Detect {
        /// Path to JSON IOU ledger
        #[arg(long)]
        input: PathBuf,
        /// User who would owe the favor
        #[arg(long)]
        giver: String,
        /// User who would be owed the favor
        #[arg(long)]
        receiver: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Search for parties from every giver of an unsettled IOU
    Parties {
        /// Path to JSON IOU ledger
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Generate a random IOU ledger (for testing)
    Generate {
        #[arg(long, default_value_t = 10)]
        users: usize,
        /// Exact number of IOUs to write
        #[arg(long, default_value_t = 30)]
        ious: usize,
        /// Fraction of IOUs marked as already claimed
        #[arg(long, default_value_t = 0.0)]
        claimed_ratio: f64,
        /// Write to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TraversalArg {
    Recursive,
    Iterative,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Recursive => Traversal::Recursive,
            TraversalArg::Iterative => Traversal::Iterative,
        }
    }
}

/// JSON schema for one input IOU. Only `giver`/`receiver` matter to
/// detection; a record without `giver` is loaded but never graphed.
#[derive(serde::Serialize, serde::Deserialize)]
struct IouInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(default)]
    giver: Option<String>,
    #[serde(default)]
    receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item: Option<Uuid>,
    #[serde(default)]
    is_claimed: bool,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct LedgerFile {
    ious: Vec<IouInput>,
}

/// JSON output schema for a detection result.
#[derive(serde::Serialize)]
struct PartyOutput {
    seed: String,
    party: Option<Vec<String>>,
    cycle: Option<Vec<String>>,
}

#[derive(serde::Serialize)]
struct PartiesReport {
    acyclic: bool,
    users: usize,
    edges: usize,
    parties: Vec<PartyOutput>,
}

impl PartyOutput {
    fn new(seed: &UserId, party: Option<&Party>) -> Self {
        let names = |users: &[UserId]| -> Vec<String> {
            users.iter().map(|u| u.to_string()).collect()
        };
        Self {
            seed: seed.to_string(),
            party: party.map(|p| names(p.members())),
            cycle: party.map(|p| names(p.minimal_cycle())),
        }
    }
}

fn load_config(cli: &Cli) -> Result<DetectorConfig> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(traversal) = cli.traversal {
        config = config.with_traversal(traversal.into());
    }
    Ok(config)
}

fn load_ledger(path: &Path) -> Result<InMemoryIouStore> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ledger '{}'", path.display()))?;
    let file: LedgerFile = serde_json::from_str(&content).with_context(|| {
        format!(
            "parsing ledger '{}'; expected {{\"ious\": [{{\"giver\": \"alice\", \"receiver\": \"bob\"}}]}}",
            path.display()
        )
    })?;

    let mut ious = Vec::with_capacity(file.ious.len());
    for input in file.ious {
        let mut iou = Iou::owe(
            UserId::new(input.giver.unwrap_or_default()),
            input.receiver.map(UserId::new),
            input.item.unwrap_or_else(Uuid::new_v4),
        );
        if let Some(id) = input.id {
            iou = iou.with_id(id);
        }
        if input.is_claimed {
            iou.claim(None)?;
        }
        ious.push(iou);
    }
    log::debug!("loaded {} IOUs from {}", ious.len(), path.display());
    InMemoryIouStore::from_ious(ious)
        .with_context(|| format!("loading ledger '{}' into the store", path.display()))
}

fn print_party(seed: &UserId, party: Option<&Party>) {
    match party {
        Some(p) => {
            let members: Vec<String> = p.members().iter().map(|u| u.to_string()).collect();
            let cycle: Vec<String> = p.minimal_cycle().iter().map(|u| u.to_string()).collect();
            println!("Party from {}: {}", seed, members.join(" → "));
            println!("  Cycle: {} → (back to {})", cycle.join(" → "), p.closing());
        }
        None => println!("No party detected from {}.", seed),
    }
}

fn cmd_detect(
    config: DetectorConfig,
    input: &Path,
    giver: String,
    receiver: Option<String>,
    format: Format,
) -> Result<()> {
    if giver.trim().is_empty() {
        bail!("--giver must not be empty");
    }
    if receiver.as_deref() == Some(giver.as_str()) {
        bail!("{} cannot owe themselves", giver);
    }

    let detector = PartyDetector::with_config(load_ledger(input)?, config);
    let proposed = Iou::owe(
        UserId::new(giver),
        receiver.map(UserId::new),
        Uuid::new_v4(),
    );
    let party = detector.detect(&proposed)?;

    if format == Format::Json {
        let output = PartyOutput::new(proposed.giver(), party.as_ref());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_party(proposed.giver(), party.as_ref());
    }
    Ok(())
}

fn cmd_parties(config: DetectorConfig, input: &Path, format: Format) -> Result<()> {
    let detector = PartyDetector::with_config(load_ledger(input)?, config);
    let graph = detector.snapshot()?;

    let traversal = detector.config().traversal;
    let mut results = Vec::new();
    for user in graph.users() {
        if graph.owing(user).is_empty() {
            continue;
        }
        let party = find_party_with(&graph, user, traversal);
        results.push((user.clone(), party));
    }

    if format == Format::Json {
        let report = PartiesReport {
            acyclic: graph.is_acyclic(),
            users: graph.user_count(),
            edges: graph.edge_count(),
            parties: results
                .iter()
                .map(|(seed, party)| PartyOutput::new(seed, party.as_ref()))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Debt graph: {} users, {} edges, {}",
            graph.user_count(),
            graph.edge_count(),
            if graph.is_acyclic() { "acyclic" } else { "contains cycles" }
        );
        let found = results.iter().filter(|(_, p)| p.is_some()).count();
        for (seed, party) in &results {
            if party.is_some() {
                print_party(seed, party.as_ref());
            }
        }
        if found == 0 {
            println!("No parties detected.");
        } else {
            println!("\nGivers in a party: {}", found);
        }
    }
    Ok(())
}

fn cmd_generate(
    users: usize,
    ious: usize,
    claimed_ratio: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    if users < 2 && ious > 0 {
        bail!("--users must be at least 2 to generate IOUs between distinct users");
    }
    let config = NetworkConfig {
        user_count: users,
        iou_count: ious,
        claimed_ratio,
    };
    let generated = generate_random_network(&config);

    let file = LedgerFile {
        ious: generated
            .iter()
            .map(|iou| IouInput {
                id: Some(iou.id()),
                giver: Some(iou.giver().to_string()),
                receiver: iou.receiver().map(|r| r.to_string()),
                item: Some(iou.item()),
                is_claimed: iou.is_claimed(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    match output {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("writing '{}'", path.display()))?;
            eprintln!(
                "Generated {} IOUs across {} users → {}",
                generated.len(),
                users,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Detect {
            input,
            giver,
            receiver,
            format,
        } => cmd_detect(config, &input, giver, receiver, format),
        Command::Parties { input, format } => cmd_parties(config, &input, format),
        Command::Generate {
            users,
            ious,
            claimed_ratio,
            output,
        } => cmd_generate(users, ious, claimed_ratio, output),
    }
}
