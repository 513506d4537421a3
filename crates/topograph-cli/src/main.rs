//! topograph CLI.
//!
//! Provides the `topograph` binary with three subcommands:
//!
//! - `build`: read Nmap XML reports into one deduplicated topology graph
//! - `fscan`: convert an fscan text report into per-IP host records
//! - `merge`: enrich per-IP host records with the nodes of a built graph
//!
//! Logs go to stderr (`RUST_LOG` or `-v` to adjust); a JSON summary of each
//! run goes to stdout.

mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use topograph_core::{merge_fragment, GraphAccumulator, Topology};
use topograph_ingest::{
    build_graph, read_fscan_file, read_graph, read_merged_hosts, write_json, IngestError,
    SourceSpec,
};

use crate::config::{RunConfig, VantageConfig};

/// Exit code: a configuration problem prevented the run.
const EXIT_CONFIG: i32 = 1;
/// Exit code: no usable input.
const EXIT_INPUT: i32 = 2;
/// Exit code: the result could not be written.
const EXIT_OUTPUT: i32 = 3;

/// Network topology graph builder.
#[derive(Parser)]
#[command(name = "topograph", about = "Build network topology graphs from scan reports")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a topology graph from one or more Nmap XML reports.
    Build {
        /// TOML run file listing inputs and their vantage nodes.
        #[arg(short, long, conflicts_with_all = ["input", "source"])]
        config: Option<PathBuf>,

        /// Single Nmap XML report (instead of a run file).
        #[arg(short, long, requires = "source")]
        input: Option<PathBuf>,

        /// Address of the scanning host for `--input`.
        #[arg(short, long, requires = "input")]
        source: Option<String>,

        /// Output JSON path (overrides the run file).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert an fscan text report into per-IP host records.
    Fscan {
        /// fscan report file.
        #[arg(short, long, default_value = "result.txt")]
        input: PathBuf,

        /// Output JSON path.
        #[arg(short, long, default_value = "fscan_results.json")]
        output: PathBuf,
    },

    /// Enrich per-IP host records with the nodes of a built graph.
    Merge {
        /// Existing per-IP host records (e.g. `fscan` output).
        #[arg(short, long, default_value = "fscan_results.json")]
        primary: PathBuf,

        /// Graph document produced by `build`.
        #[arg(short, long, default_value = "output.json")]
        graph: PathBuf,

        /// Output JSON path.
        #[arg(short, long, default_value = "merged_results.json")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Build {
            config,
            input,
            source,
            output,
        } => run_build(config, input, source, output),
        Commands::Fscan { input, output } => run_fscan(&input, &output),
        Commands::Merge {
            primary,
            graph,
            output,
        } => run_merge(&primary, &graph, &output),
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints a run summary as JSON to stdout.
fn print_summary(summary: &serde_json::Value) {
    let json = serde_json::to_string_pretty(summary)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize summary: {}\"}}", e));
    println!("{}", json);
}

/// Maps an error from reading an input to an exit code.
fn input_failure(err: &IngestError) -> i32 {
    tracing::error!(error = %err, "cannot read input");
    EXIT_INPUT
}

/// Maps an error from writing the result to an exit code.
fn output_failure(err: &IngestError) -> i32 {
    tracing::error!(error = %err, "cannot write output");
    EXIT_OUTPUT
}

/// Execute the build subcommand.
///
/// Returns exit code: 0 = success, 1 = configuration error,
/// 2 = no source could be read, 3 = output error.
fn run_build(
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    source: Option<String>,
    output: Option<PathBuf>,
) -> i32 {
    let (sources, configured_output): (Vec<SourceSpec>, Option<PathBuf>) =
        match (config, input, source) {
            (Some(path), _, _) => match RunConfig::load(&path) {
                Ok(run) => (run.sources(), run.output),
                Err(e) => {
                    tracing::error!(error = %e, "cannot load run file");
                    return EXIT_CONFIG;
                }
            },
            (None, Some(input), Some(source)) => (
                vec![SourceSpec::new(input, VantageConfig::from_id(source).to_node())],
                None,
            ),
            _ => {
                tracing::error!("build needs either --config or --input with --source");
                return EXIT_CONFIG;
            }
        };
    let output = output
        .or(configured_output)
        .unwrap_or_else(|| PathBuf::from("output.json"));

    let mut acc = GraphAccumulator::new();
    let report = build_graph(&mut acc, &sources);
    let doc = acc.finalize();

    let topology = Topology::from_document(&doc);
    tracing::info!(
        sources = report.ingested(),
        skipped = report.skipped(),
        nodes = doc.nodes.len(),
        edges = doc.edges.len(),
        placeholders = topology.placeholder_count(),
        "build finished"
    );

    if let Err(e) = write_json(&output, &doc) {
        return output_failure(&e);
    }

    print_summary(&serde_json::json!({
        "output": output,
        "nodes": doc.nodes.len(),
        "edges": doc.edges.len(),
        "vertices": topology.node_count(),
        "placeholders": topology.placeholder_count(),
        "sources": report.sources,
    }));

    if report.ingested() == 0 {
        tracing::error!("no input source could be read");
        return EXIT_INPUT;
    }
    0
}

/// Execute the fscan subcommand.
fn run_fscan(input: &Path, output: &Path) -> i32 {
    let hosts = match read_fscan_file(input) {
        Ok(hosts) => hosts,
        Err(e) => return input_failure(&e),
    };
    tracing::info!(hosts = hosts.len(), path = %input.display(), "parsed fscan report");

    if let Err(e) = write_json(output, &hosts) {
        return output_failure(&e);
    }
    print_summary(&serde_json::json!({
        "output": output,
        "hosts": hosts.len(),
    }));
    0
}

/// Execute the merge subcommand.
fn run_merge(primary: &Path, graph: &Path, output: &Path) -> i32 {
    let mut hosts = match read_merged_hosts(primary) {
        Ok(hosts) => hosts,
        Err(e) => return input_failure(&e),
    };
    let doc = match read_graph(graph) {
        Ok(doc) => doc,
        Err(e) => return input_failure(&e),
    };

    let summary = merge_fragment(&mut hosts, &doc);
    if !doc.edges.is_empty() {
        tracing::debug!(edges = doc.edges.len(), "graph edges are not carried into merged records");
    }

    if let Err(e) = write_json(output, &hosts) {
        return output_failure(&e);
    }
    print_summary(&serde_json::json!({
        "output": output,
        "hosts": hosts.len(),
        "enriched": summary.enriched,
        "appended": summary.appended,
    }));
    0
}
