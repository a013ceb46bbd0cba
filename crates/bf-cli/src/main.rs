//! bracketforge: create, validate and script tournament brackets
//!
//! Brackets are read and written as snapshot JSON files; command scripts are
//! JSON arrays of editor commands replayed through a normal edit session.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use bf_core::{GraphStore, NodeId, NodeKind, Outcome, structure::KindCounts};
use bf_state::{EditorPreferences, Session, export_json, import_json, parse_script, starter_bracket};

#[derive(Parser)]
#[command(name = "bracketforge", version, about = "Tournament bracket graph editor")]
struct Cli {
    /// Preferences file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a minimal valid bracket
    New {
        #[arg(long)]
        tournament: String,
        #[arg(long)]
        phase: String,
        /// Output snapshot path
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Check a snapshot against every bracket invariant
    Validate { snapshot: PathBuf },
    /// Run a JSON command script against a snapshot
    Replay {
        snapshot: PathBuf,
        /// JSON array of commands
        #[arg(long)]
        script: PathBuf,
        /// Where to write the result (prints to stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip rejected commands instead of stopping at the first one
        #[arg(long)]
        keep_going: bool,
    },
    /// Show which edge an entrant with the given result leaves a node through
    Route {
        snapshot: PathBuf,
        #[arg(long)]
        node: String,
        #[arg(long, default_value_t = 0.0)]
        score: f64,
        #[arg(long, default_value_t = 1)]
        position: u32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let preferences = match &cli.config {
        Some(path) => EditorPreferences::load_from(path),
        None => EditorPreferences::load(),
    };

    match cli.command {
        Command::New {
            tournament,
            phase,
            out,
            author,
            description,
        } => run_new(&tournament, &phase, &out, author, description, &preferences),
        Command::Validate { snapshot } => run_validate(&snapshot),
        Command::Replay {
            snapshot,
            script,
            out,
            keep_going,
        } => run_replay(&snapshot, &script, out.as_deref(), keep_going, preferences),
        Command::Route {
            snapshot,
            node,
            score,
            position,
        } => run_route(&snapshot, &node, Outcome { score, position }),
    }
}

fn read_store(path: &Path) -> Result<GraphStore> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    import_json(&text).with_context(|| format!("Invalid bracket in {}", path.display()))
}

fn write_output(store: &GraphStore, out: Option<&Path>) -> Result<()> {
    let json = export_json(&store.snapshot())?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_new(
    tournament: &str,
    phase: &str,
    out: &Path,
    author: Option<String>,
    description: Option<String>,
    preferences: &EditorPreferences,
) -> Result<()> {
    let store = starter_bracket(tournament, phase, preferences);
    let mut metadata = store.metadata().clone();
    metadata.author = author;
    metadata.description = description;
    let store = store.with_metadata(metadata);

    write_output(&store, Some(out))?;
    println!("Created bracket {tournament}/{phase} at {}", out.display());
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let store = read_store(path)?;
    let counts = KindCounts::tally(store.nodes());

    println!("✅ {} is a valid bracket", path.display());
    println!("  tournament: {}", store.tournament_id());
    println!("  phase:      {}", store.phase_id());
    for kind in NodeKind::REQUIRED {
        println!("  {:<17} {}", format!("{kind} nodes:"), counts.get(kind));
    }
    println!("  edges:            {}", store.edge_count());
    println!("  podium positions: {:?}", store.podium_positions());
    Ok(())
}

fn run_replay(
    snapshot: &Path,
    script: &Path,
    out: Option<&Path>,
    keep_going: bool,
    preferences: EditorPreferences,
) -> Result<()> {
    let store = read_store(snapshot)?;
    let text = fs::read_to_string(script).with_context(|| format!("Failed to read {}", script.display()))?;
    let commands = parse_script(&text).with_context(|| format!("Invalid command script {}", script.display()))?;

    let mut session = Session::open(store, preferences)?;
    let mut rejected = 0;
    for (index, command) in commands.into_iter().enumerate() {
        let name = command.name();
        if let Err(e) = session.execute(command) {
            if !keep_going {
                bail!("Command #{} ({}) rejected: {}", index + 1, name, e);
            }
            eprintln!("⚠️  Command #{} ({}) rejected: {}", index + 1, name, e);
            rejected += 1;
        }
    }

    log::info!(
        "Replay finished: {} actions in history, {} rejected",
        session.history().len(),
        rejected
    );
    write_output(session.store(), out)
}

fn run_route(path: &Path, node: &str, outcome: Outcome) -> Result<()> {
    let store = read_store(path)?;
    let node = NodeId::from(node);
    if !store.contains_node(&node) {
        bail!("No node {} in {}", node, path.display());
    }

    match store.route(&node, &outcome) {
        Some(edge) => {
            let target = edge.target.as_ref().map_or("(unconnected)", NodeId::as_str);
            println!("{} -> {} via {} [{}]", node, target, edge.id, edge.condition);
        }
        None => println!("{node} has no outgoing edges"),
    }
    Ok(())
}
