use super::Project;
use crate::output::{print_json, Table};
use anyhow::Context;
use clap::Subcommand;
use rubric_core::audit::{AuditRun, RunParams};
use rubric_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum RunSubcommand {
    /// Open a new audit run against the active catalog
    Start {
        /// What is being audited (repo, build, branch)
        #[arg(long)]
        target: String,
        /// Run id (default: generated)
        #[arg(long)]
        id: Option<String>,
        /// ios, unity, or generic
        #[arg(long)]
        platform: Option<String>,
        /// code_only or code_and_runtime
        #[arg(long)]
        evidence_mode: Option<String>,
        /// strict or balanced
        #[arg(long)]
        strictness: Option<String>,
    },
    /// List audit runs
    List,
    /// Show a run's parameters, progress, and scores
    Show { id: String },
    /// Start a new run with the same parameters, superseding an old one
    Reaudit {
        id: String,
        /// Id for the new run (default: generated)
        #[arg(long = "id")]
        new_id: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: RunSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RunSubcommand::Start {
            target,
            id,
            platform,
            evidence_mode,
            strictness,
        } => start(
            root,
            target,
            id,
            platform.as_deref(),
            evidence_mode.as_deref(),
            strictness.as_deref(),
            json,
        ),
        RunSubcommand::List => list(root, json),
        RunSubcommand::Show { id } => show(root, &id, json),
        RunSubcommand::Reaudit { id, new_id } => reaudit(root, &id, new_id, json),
    }
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

fn start(
    root: &Path,
    target: String,
    id: Option<String>,
    platform: Option<&str>,
    evidence_mode: Option<&str>,
    strictness: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let defaults = &project.config.defaults;

    let mut params = RunParams::new(target);
    params.platform = match platform {
        Some(p) => p.parse().with_context(|| format!("unknown platform: {p}"))?,
        None => defaults.platform,
    };
    params.evidence_mode = match evidence_mode {
        Some(m) => m.parse().with_context(|| format!("unknown evidence mode: {m}"))?,
        None => defaults.evidence_mode,
    };
    params.strictness = match strictness {
        Some(s) => s.parse().with_context(|| format!("unknown strictness: {s}"))?,
        None => defaults.strictness,
    };

    let id = id.unwrap_or_else(paths::generate_run_id);
    let run = AuditRun::create(root, id, params, &project.catalog)
        .context("failed to create run")?;
    tracing::info!(run = %run.id, catalog = %run.catalog_version, "run started");

    if json {
        print_json(&run)?;
    } else {
        println!(
            "Started run {} for '{}' (catalog {}, {}, {}, {}): {} rules to verdict",
            run.id,
            run.target,
            run.catalog_version,
            run.platform,
            run.evidence_mode,
            run.strictness,
            project.catalog.rules().len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let runs = AuditRun::list(root).context("failed to list runs")?;

    if json {
        let items: Vec<_> = runs
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "target": r.target,
                    "phase": r.phase,
                    "catalog_version": r.catalog_version,
                    "verdicts": r.verdicts.len(),
                    "overall": r.scorecard.as_ref().map(|c| c.overall),
                    "created_at": r.created_at,
                })
            })
            .collect();
        return print_json(&items);
    }

    if runs.is_empty() {
        println!("No audit runs.");
        return Ok(());
    }
    let mut table = Table::new(&["ID", "TARGET", "PHASE", "VERDICTS", "OVERALL"]);
    for r in &runs {
        table.row(vec![
            r.id.clone(),
            r.target.clone(),
            r.phase.to_string(),
            r.verdicts.len().to_string(),
            r.scorecard
                .as_ref()
                .map(|c| format!("{:.1}", c.overall))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.print();
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let run = AuditRun::load(root, id).with_context(|| format!("run '{id}' not found"))?;
    if json {
        return print_json(&run);
    }

    println!("Run:        {}", run.id);
    println!("Target:     {}", run.target);
    println!("Catalog:    {}", run.catalog_version);
    println!("Phase:      {}", run.phase);
    println!(
        "Params:     platform={} evidence_mode={} strictness={}",
        run.platform, run.evidence_mode, run.strictness
    );
    if let Some(prev) = &run.supersedes {
        println!("Supersedes: {prev}");
    }
    println!("Verdicts:   {}", run.verdicts.len());

    // the project catalog may have moved on; progress is only shown when it matches
    if let Ok(project) = Project::open_or_default(root) {
        if let Ok(missing) = run.missing(&project.catalog) {
            println!("Missing:    {}", missing.len());
        }
    }

    if let Some(card) = &run.scorecard {
        println!();
        let mut table = Table::new(&["CATEGORY", "SCORE", "EARNED", "WEIGHT"]);
        for c in &card.categories {
            table.row(vec![
                c.category.to_string(),
                format!("{:.1}", c.weighted_score),
                c.raw_score.to_string(),
                c.weight_sum.to_string(),
            ]);
        }
        table.print();
        println!("Overall: {:.1} / 100 ({})", card.overall, card.strictness);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// reaudit
// ---------------------------------------------------------------------------

fn reaudit(root: &Path, id: &str, new_id: Option<String>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let old = AuditRun::load(root, id).with_context(|| format!("run '{id}' not found"))?;
    let new_id = new_id.unwrap_or_else(paths::generate_run_id);
    let run = old
        .reaudit(new_id, &project.catalog)
        .context("failed to start re-audit")?;
    run.create_file(root).context("failed to save run")?;
    tracing::info!(run = %run.id, supersedes = %old.id, "re-audit started");

    if json {
        print_json(&run)?;
    } else {
        println!("Started run {} superseding {}", run.id, old.id);
    }
    Ok(())
}
