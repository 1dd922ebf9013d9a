use clap::{Parser, Subcommand};
use rubric_cli::cmd::{
    self, catalog::CatalogSubcommand, init::InitOptions, run::RunSubcommand,
    verdict::VerdictSubcommand,
};
use rubric_cli::root;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rubric",
    about = "Deterministic rule compliance scoring: collect verdicts, score, rank findings, report",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .rubric/ or .git/)
    #[arg(long, global = true, env = "RUBRIC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize rubric in the current project
    Init {
        /// Catalog file relative to the project root (default: built-in)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Default strictness for new runs
        #[arg(long)]
        strictness: Option<String>,
        /// Default platform hint for new runs
        #[arg(long)]
        platform: Option<String>,
        /// Default evidence mode for new runs
        #[arg(long)]
        evidence_mode: Option<String>,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Inspect, validate, and export rule catalogs
    Catalog {
        #[command(subcommand)]
        subcommand: CatalogSubcommand,
    },

    /// Manage audit runs
    Run {
        #[command(subcommand)]
        subcommand: RunSubcommand,
    },

    /// Record verdicts on a run
    Verdict {
        #[command(subcommand)]
        subcommand: VerdictSubcommand,
    },

    /// Finalize a run's verdicts and compute scores
    Score { run: String },

    /// Render the report for a scored run
    Report {
        run: String,
        /// markdown, json, or yaml (default: markdown, or json with --json)
        #[arg(long)]
        format: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            catalog,
            strictness,
            platform,
            evidence_mode,
            force,
        } => cmd::init::run(
            &root,
            InitOptions {
                catalog,
                strictness,
                platform,
                evidence_mode,
                force,
            },
            cli.json,
        ),
        Commands::Catalog { subcommand } => cmd::catalog::run(&root, subcommand, cli.json),
        Commands::Run { subcommand } => cmd::run::run(&root, subcommand, cli.json),
        Commands::Verdict { subcommand } => cmd::verdict::run(&root, subcommand, cli.json),
        Commands::Score { run } => cmd::score::run(&root, &run, cli.json),
        Commands::Report { run, format, out } => {
            cmd::report::run(&root, &run, format.as_deref(), out.as_deref(), cli.json)
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
