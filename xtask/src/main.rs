//! BracketForge Build Tasks
//!
//! Usage:
//!   cargo xtask test            - Run all tests
//!   cargo xtask bench           - Run benchmarks
//!   cargo xtask docs            - Generate documentation
//!   cargo xtask check           - Clippy and formatting
//!   cargo xtask release         - Release build of the CLI
//!   cargo xtask smoke           - Create and validate a bracket with the CLI

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "BracketForge build tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tests
    Test {
        /// Run only the graph engine tests
        #[arg(long)]
        core: bool,
    },
    /// Run benchmarks
    Bench,
    /// Generate documentation
    Docs {
        /// Open in browser
        #[arg(short, long)]
        open: bool,
    },
    /// Check code quality
    Check,
    /// Release build of the bracketforge binary
    Release {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Create a starter bracket and validate it through the CLI
    Smoke,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_root = project_root()?;

    match cli.command {
        Commands::Test { core } => run_tests(&project_root, core),
        Commands::Bench => run_benchmarks(&project_root),
        Commands::Docs { open } => generate_docs(&project_root, open),
        Commands::Check => check_quality(&project_root),
        Commands::Release { target } => build_release(&project_root, target),
        Commands::Smoke => smoke_test(&project_root),
    }
}

fn project_root() -> Result<PathBuf> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR not set")?;

    Ok(Path::new(&manifest_dir)
        .parent()
        .context("Failed to get parent directory")?
        .to_path_buf())
}

fn cargo(root: &Path, args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo")
        .current_dir(root)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if !status.success() {
        bail!("{} failed", what);
    }
    Ok(())
}

fn run_tests(root: &Path, core: bool) -> Result<()> {
    println!("🧪 Running tests...\n");

    let mut args = vec!["test"];
    if core {
        args.extend(["--package", "bf-core"]);
    } else {
        args.push("--workspace");
    }
    cargo(root, &args, "Tests")?;

    println!("\n✅ All tests passed!");
    Ok(())
}

fn run_benchmarks(root: &Path) -> Result<()> {
    println!("⏱️  Running benchmarks...\n");
    cargo(root, &["bench", "--package", "bf-core"], "Benchmarks")
}

fn generate_docs(root: &Path, open: bool) -> Result<()> {
    println!("📚 Generating documentation...\n");

    let mut args = vec!["doc", "--workspace", "--no-deps"];
    if open {
        args.push("--open");
    }
    cargo(root, &args, "Documentation build")?;

    println!("\n✅ Documentation generated!");
    Ok(())
}

fn check_quality(root: &Path) -> Result<()> {
    println!("🔍 Checking code quality...\n");

    println!("Running clippy...");
    cargo(root, &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"], "Clippy")?;

    println!("\nChecking formatting...");
    let fmt_status = Command::new("cargo")
        .current_dir(root)
        .args(["fmt", "--all", "--check"])
        .status()
        .context("Failed to run cargo fmt")?;

    if !fmt_status.success() {
        println!("⚠️  Formatting issues found. Run 'cargo fmt' to fix.");
    }

    println!("\n✅ Code quality check complete!");
    Ok(())
}

fn build_release(root: &Path, target: Option<String>) -> Result<()> {
    println!("🚀 Building release...\n");

    let mut args = vec!["build", "--release", "--package", "bf-cli"];
    if let Some(ref t) = target {
        args.extend(["--target", t.as_str()]);
    }
    cargo(root, &args, "Release build")?;

    println!("\n✅ Release build complete!");
    Ok(())
}

fn smoke_test(root: &Path) -> Result<()> {
    println!("💨 Smoke testing bracketforge...\n");

    let out_dir = root.join("target").join("smoke");
    std::fs::create_dir_all(&out_dir).context("Failed to create smoke output directory")?;
    let snapshot = out_dir.join("starter.json");
    let snapshot = snapshot.to_str().context("Non UTF-8 smoke path")?;

    cargo(
        root,
        &[
            "run", "--quiet", "--package", "bf-cli", "--", "new", "--tournament", "smoke",
            "--phase", "main", "--out", snapshot,
        ],
        "bracketforge new",
    )?;
    cargo(
        root,
        &["run", "--quiet", "--package", "bf-cli", "--", "validate", snapshot],
        "bracketforge validate",
    )?;

    println!("\n✅ Smoke test passed!");
    Ok(())
}
