//! Binary entry point for the Arbor command-stream CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use arbor::{
    cli::{
        config::{default_config_path, ArborConfig, ConfigUpdate},
        replay::{replay_path, ReplayOptions, ReplaySummary},
    },
    logging::init_logging,
    tree::{NodeRepository, SnapshotNode, TreeSnapshot, VisibilitySummary},
    OrphanSweep,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "arbor",
    version,
    about = "Replay and inspect node hierarchy command streams",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "ARBOR_CONFIG",
        value_name = "FILE",
        help = "Config file (defaults to <config dir>/arbor/config.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter (overrides the config file; RUST_LOG wins over both)"
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StreamArgs {
    #[arg(value_name = "FILE", help = "JSON-lines command stream, or - for stdin")]
    input: PathBuf,

    #[arg(long, value_enum, help = "Orphan sweep depth override")]
    orphan_sweep: Option<SweepArg>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Apply a command stream and report per-command outcomes")]
    Replay {
        #[command(flatten)]
        stream: StreamArgs,

        #[arg(long, help = "Abort on the first malformed line")]
        strict: bool,

        #[arg(long, help = "Print the resulting tree")]
        show_tree: bool,
    },

    #[command(about = "Apply a command stream and check tree invariants")]
    Verify {
        #[command(flatten)]
        stream: StreamArgs,
    },

    #[command(about = "Apply a command stream and print node counts")]
    Stats {
        #[command(flatten)]
        stream: StreamArgs,
    },

    #[command(subcommand, about = "Inspect or edit the config file")]
    Config(ConfigCmd),
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    #[command(about = "Print the config path and effective settings")]
    Show,

    #[command(about = "Write settings to the config file")]
    Set {
        #[arg(long, value_enum)]
        orphan_sweep: Option<SweepArg>,

        #[arg(long = "log", value_name = "FILTER")]
        log: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SweepArg {
    SingleLevel,
    Transitive,
}

impl From<SweepArg> for OrphanSweep {
    fn from(arg: SweepArg) -> Self {
        match arg {
            SweepArg::SingleLevel => OrphanSweep::SingleLevel,
            SweepArg::Transitive => OrphanSweep::Transitive,
        }
    }
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    summary: &'a ReplaySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<TreeSnapshot>,
}

#[derive(Serialize)]
struct StatsOutput {
    live_nodes: usize,
    orphans: usize,
    roots: usize,
    max_depth: usize,
    visibility: VisibilitySummary,
}

#[derive(Serialize)]
struct ConfigOutput {
    path: Option<String>,
    orphan_sweep: OrphanSweep,
    log_level: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = ArborConfig::load(cli.config.clone())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level().to_string());
    init_logging(&level)?;

    match cli.command {
        Command::Replay {
            stream,
            strict,
            show_tree,
        } => {
            let opts = ReplayOptions { strict };
            let (repo, summary) = replay_stream(&config, &stream, &opts)?;
            let output = ReplayOutput {
                summary: &summary,
                tree: show_tree.then(|| repo.snapshot()),
            };
            emit(cli.format, &output, || print_replay_text(&output))?;
        }
        Command::Verify { stream } => {
            let (repo, _) = replay_stream(&config, &stream, &ReplayOptions::default())?;
            let report = repo.verify();
            emit(cli.format, &report, || {
                println!(
                    "Verify => success={} live_nodes={} orphans={} roots={} reachable={} max_depth={}",
                    report.success,
                    report.counts.live_nodes,
                    report.counts.orphans,
                    report.counts.roots,
                    report.counts.reachable,
                    report.counts.max_depth,
                );
                for finding in &report.findings {
                    match finding.node {
                        Some(node) => println!("- node {node}: {}", finding.message),
                        None => println!("- {}", finding.message),
                    }
                }
            })?;
            if !report.success {
                std::process::exit(2);
            }
        }
        Command::Stats { stream } => {
            let (repo, _) = replay_stream(&config, &stream, &ReplayOptions::default())?;
            let stats = collect_stats(&repo);
            emit(cli.format, &stats, || print_stats_text(&stats))?;
        }
        Command::Config(ConfigCmd::Show) => {
            let output = config_output(&config);
            emit(cli.format, &output, || {
                println!(
                    "path={} orphan_sweep={:?} log_level={}",
                    output.path.as_deref().unwrap_or("<none>"),
                    output.orphan_sweep,
                    output.log_level
                );
            })?;
        }
        Command::Config(ConfigCmd::Set { orphan_sweep, log }) => {
            config.apply(ConfigUpdate {
                orphan_sweep: orphan_sweep.map(Into::into),
                log_level: log,
            });
            let path = config.persist()?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn replay_stream(
    config: &ArborConfig,
    stream: &StreamArgs,
    opts: &ReplayOptions,
) -> Result<(NodeRepository, ReplaySummary), Box<dyn Error>> {
    let mut repo_opts = config.repository_options();
    if let Some(sweep) = stream.orphan_sweep {
        repo_opts = repo_opts.orphan_sweep(sweep.into());
    }
    Ok(replay_path(&stream.input, repo_opts, opts)?)
}

fn collect_stats(repo: &NodeRepository) -> StatsOutput {
    StatsOutput {
        live_nodes: repo.len(),
        orphans: repo.orphan_count(),
        roots: repo.roots().len(),
        max_depth: repo.nodes().map(|node| node.depth()).max().unwrap_or(0),
        visibility: repo.visibility().summary(),
    }
}

fn config_output(config: &ArborConfig) -> ConfigOutput {
    ConfigOutput {
        path: config
            .path()
            .map(|p| p.display().to_string())
            .or_else(|| default_config_path().map(|p| p.display().to_string())),
        orphan_sweep: config.orphan_sweep(),
        log_level: config.log_level().to_string(),
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_replay_text(output: &ReplayOutput<'_>) {
    let summary = output.summary;
    println!(
        "Replayed {} commands: applied={} partial={} rejected={} malformed={}",
        summary.total(),
        summary.applied,
        summary.partial,
        summary.rejected,
        summary.malformed
    );
    for entry in &summary.entries {
        if let Some(message) = &entry.malformed {
            println!("  line {}: malformed: {message}", entry.line);
            continue;
        }
        let Some(outcome) = &entry.outcome else {
            continue;
        };
        if let Some(err) = outcome.error() {
            println!("  line {}: rejected: {err}", entry.line);
        } else if !outcome.is_applied() {
            println!("  line {}: {}", entry.line, outcome.status());
        }
    }
    if let Some(tree) = &output.tree {
        println!();
        print_tree(&tree.roots);
        if !tree.orphans.is_empty() {
            let ids: Vec<String> = tree.orphans.iter().map(|id| id.to_string()).collect();
            println!("orphans: {}", ids.join(", "));
        }
    }
}

fn print_tree(roots: &[SnapshotNode]) {
    let mut stack: Vec<(&SnapshotNode, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let marker = if node.visible { "" } else { " (hidden)" };
        println!("{:indent$}{}{marker}", "", node.id, indent = depth * 2);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}

fn print_stats_text(stats: &StatsOutput) {
    println!(
        "Nodes: live={} orphans={} roots={} max_depth={}",
        stats.live_nodes, stats.orphans, stats.roots, stats.max_depth
    );
    println!(
        "Visibility: shown={} unshown={} all_shown={} none_shown={}",
        stats.visibility.shown,
        stats.visibility.unshown,
        stats.visibility.all_shown,
        stats.visibility.none_shown
    );
}
