use super::Project;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use rubric_core::audit::AuditRun;
use rubric_core::types::VerdictStatus;
use rubric_core::verdict::{Verdict, VerdictFile};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Subcommand)]
pub enum VerdictSubcommand {
    /// Record the verdict for one rule
    Submit {
        run: String,
        rule: String,
        /// pass, fail, or unknown
        status: String,
        #[arg(long)]
        evidence: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Submit every verdict in a YAML or JSON file; bad entries are reported and skipped
    Import { run: String, file: PathBuf },
    /// List rules that still lack a verdict
    Missing { run: String },
    /// Mark every rule still lacking a verdict as UNKNOWN
    FillUnknown {
        run: String,
        #[arg(long, default_value = "evidence gathering deadline reached")]
        note: String,
    },
}

pub fn run(root: &Path, subcmd: VerdictSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        VerdictSubcommand::Submit {
            run,
            rule,
            status,
            evidence,
            notes,
        } => submit(root, &run, rule, &status, evidence, notes, json),
        VerdictSubcommand::Import { run, file } => import(root, &run, &file, json),
        VerdictSubcommand::Missing { run } => missing(root, &run, json),
        VerdictSubcommand::FillUnknown { run, note } => fill_unknown(root, &run, &note, json),
    }
}

fn load(root: &Path, id: &str) -> anyhow::Result<(Project, AuditRun)> {
    let project = Project::open(root)?;
    let run = AuditRun::load(root, id).with_context(|| format!("run '{id}' not found"))?;
    Ok((project, run))
}

// ---------------------------------------------------------------------------
// submit
// ---------------------------------------------------------------------------

fn submit(
    root: &Path,
    id: &str,
    rule: String,
    status_str: &str,
    evidence: Option<String>,
    notes: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let status = VerdictStatus::from_str(status_str)
        .with_context(|| format!("unknown verdict status: {status_str}"))?;
    let (project, mut run) = load(root, id)?;

    let verdict = Verdict {
        rule_id: rule.clone(),
        status,
        evidence,
        notes,
    };
    run.submit(&project.catalog, verdict)
        .with_context(|| format!("verdict for '{rule}' rejected"))?;
    run.save(root).context("failed to save run")?;
    let remaining = run.missing(&project.catalog)?.len();

    if json {
        print_json(&serde_json::json!({
            "run": id,
            "rule": rule,
            "status": status,
            "remaining": remaining,
        }))?;
    } else {
        println!("Recorded: {id}/{rule} = {status} ({remaining} remaining)");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

fn import(root: &Path, id: &str, file: &Path, json: bool) -> anyhow::Result<()> {
    let (project, mut run) = load(root, id)?;
    let mut source = VerdictFile::new(file);
    let summary = run
        .ingest(&project.catalog, &mut source)
        .with_context(|| format!("failed to import verdicts from {}", file.display()))?;
    run.save(root).context("failed to save run")?;
    let remaining = run.missing(&project.catalog)?.len();

    if json {
        print_json(&serde_json::json!({
            "run": id,
            "summary": summary,
            "remaining": remaining,
        }))?;
    } else {
        println!(
            "Imported {} verdict(s) from {}, rejected {}, {} remaining",
            summary.accepted.len(),
            summary.source,
            summary.rejected.len(),
            remaining
        );
        for r in &summary.rejected {
            println!("  rejected {}: {}", r.rule_id, r.reason);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// missing
// ---------------------------------------------------------------------------

fn missing(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let (project, run) = load(root, id)?;
    let missing = run
        .missing(&project.catalog)
        .with_context(|| format!("cannot check run '{id}'"))?;

    if json {
        print_json(&serde_json::json!({ "run": id, "missing": missing }))?;
    } else if missing.is_empty() {
        println!("All rules have a verdict.");
    } else {
        for rule_id in &missing {
            let rule = project.catalog.lookup(rule_id)?;
            println!("{:<10} {}", rule_id, rule.description);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// fill-unknown
// ---------------------------------------------------------------------------

fn fill_unknown(root: &Path, id: &str, note: &str, json: bool) -> anyhow::Result<()> {
    let (project, mut run) = load(root, id)?;
    let filled = run
        .fill_unknown(&project.catalog, note)
        .with_context(|| format!("cannot fill run '{id}'"))?;
    run.save(root).context("failed to save run")?;
    tracing::info!(run = %id, filled = filled.len(), "filled missing verdicts with UNKNOWN");

    if json {
        print_json(&serde_json::json!({ "run": id, "filled": filled }))?;
    } else {
        println!("Marked {} rule(s) UNKNOWN in {id}", filled.len());
    }
    Ok(())
}
