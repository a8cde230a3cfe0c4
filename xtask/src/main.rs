//! Developer automation for the pgwire-chunked workspace.
//!
//! Invoke through the cargo alias: `cargo xtask <command>`.
//!
//! - `ci`: formatting check, clippy with warnings denied, full test run
//! - `fmt`, `clippy`, `test`, `doc`: the individual CI steps
//! - `bench`: criterion benchmarks of the protocol and transfer crates
//! - `fuzz`: a cargo-fuzz target (needs nightly)
//! - `coverage`: cargo-llvm-cov report

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use xshell::{Shell, cmd};

/// Crates that carry criterion benches.
const BENCH_CRATES: [&str; 2] = ["pgwire-protocol", "pgwire-types"];

/// Fuzz target used when none is named.
const DEFAULT_FUZZ_TARGET: &str = "chunked_round_trip";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for pgwire-chunked")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Formatting check, clippy and tests
    Ci,
    /// Check formatting, or rewrite files with --fix
    Fmt {
        #[arg(long)]
        fix: bool,
    },
    /// Lint every target with warnings denied
    Clippy,
    /// Run the test suites
    Test {
        /// Restrict to one package
        #[arg(short, long)]
        package: Option<String>,
        /// Cases per proptest property
        #[arg(long)]
        proptest_cases: Option<u32>,
    },
    /// Build rustdoc for the workspace crates
    Doc {
        #[arg(long)]
        open: bool,
    },
    /// Run criterion benchmarks
    Bench {
        /// Only run benchmarks matching this filter
        filter: Option<String>,
    },
    /// Run a fuzz target
    Fuzz {
        target: Option<String>,
        /// Seconds before libFuzzer stops
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        /// Print the target names and exit
        #[arg(long)]
        list: bool,
    },
    /// Produce a coverage report
    Coverage {
        #[arg(long, value_enum, default_value_t = Report::Html)]
        report: Report,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Html,
    Lcov,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(locate_workspace()?);

    match cli.command {
        Task::Ci => {
            fmt(&sh, false)?;
            cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
            test(&sh, None, None)?;
            println!("ci: ok");
        }
        Task::Fmt { fix } => fmt(&sh, fix)?,
        Task::Clippy => cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?,
        Task::Test {
            package,
            proptest_cases,
        } => test(&sh, package.as_deref(), proptest_cases)?,
        Task::Doc { open } => {
            let open = open.then_some("--open");
            cmd!(sh, "cargo doc --workspace --no-deps {open...}").run()?;
        }
        Task::Bench { filter } => {
            for krate in BENCH_CRATES {
                let filter = filter.iter();
                cmd!(sh, "cargo bench -p {krate} -- {filter...}").run()?;
            }
        }
        Task::Fuzz {
            target,
            seconds,
            list,
        } => fuzz(&sh, target.as_deref(), seconds, list)?,
        Task::Coverage { report } => match report {
            Report::Html => cmd!(sh, "cargo llvm-cov --workspace --html").run()?,
            Report::Lcov => cmd!(
                sh,
                "cargo llvm-cov --workspace --lcov --output-path target/lcov.info"
            )
            .run()?,
        },
    }

    Ok(())
}

fn locate_workspace() -> Result<PathBuf> {
    let output = std::process::Command::new(env!("CARGO"))
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("cargo locate-project failed")?;
    let manifest = String::from_utf8(output.stdout).context("manifest path is not UTF-8")?;

    Path::new(manifest.trim())
        .parent()
        .map(Path::to_path_buf)
        .context("manifest path has no parent directory")
}

fn fmt(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
    } else {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    }
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>, proptest_cases: Option<u32>) -> Result<()> {
    let scope = match package {
        Some(pkg) => vec!["-p", pkg],
        None => vec!["--workspace"],
    };

    // Read by proptest at runner start-up.
    let _cases = proptest_cases.map(|n| sh.push_env("PROPTEST_CASES", n.to_string()));

    cmd!(sh, "cargo test {scope...}").run()?;
    Ok(())
}

fn fuzz_targets(sh: &Shell) -> Result<Vec<String>> {
    let dir = sh.current_dir().join("fuzz").join("fuzz_targets");
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "rs") {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn fuzz(sh: &Shell, target: Option<&str>, seconds: u64, list: bool) -> Result<()> {
    let targets = fuzz_targets(sh)?;
    if list {
        for name in &targets {
            println!("{name}");
        }
        return Ok(());
    }

    let target = target.unwrap_or(DEFAULT_FUZZ_TARGET);
    if !targets.iter().any(|name| name == target) {
        bail!("no fuzz target named `{target}` (known: {})", targets.join(", "));
    }

    let limit = format!("-max_total_time={seconds}");
    cmd!(sh, "cargo +nightly fuzz run {target} -- {limit}").run()?;
    Ok(())
}
