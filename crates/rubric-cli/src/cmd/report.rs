use super::Project;
use anyhow::Context;
use rubric_core::audit::AuditRun;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
    Yaml,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            _ => anyhow::bail!("unknown report format '{s}' (expected markdown, json, or yaml)"),
        }
    }
}

/// Render a scored run's report and mark the run reported.
pub fn run(
    root: &Path,
    id: &str,
    format: Option<&str>,
    out: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let format = match format {
        Some(f) => f.parse()?,
        None if json => ReportFormat::Json,
        None => ReportFormat::Markdown,
    };

    let project = Project::open(root)?;
    let mut run = AuditRun::load(root, id).with_context(|| format!("run '{id}' not found"))?;
    let report = run
        .report(&project.catalog)
        .with_context(|| format!("cannot report run '{id}'"))?;
    run.save(root).context("failed to save run")?;

    let body = match format {
        ReportFormat::Markdown => report.to_markdown(),
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Yaml => report.to_yaml()?,
    };

    match out {
        Some(path) => {
            rubric_core::io::atomic_write(path, body.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote report for {id} to {}", path.display());
        }
        None => {
            print!("{body}");
            if !body.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
