use super::Project;
use crate::output::{print_json, Table};
use anyhow::Context;
use rubric_core::audit::AuditRun;
use std::path::Path;

/// Finalize a run's verdicts and score it.
pub fn run(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut run = AuditRun::load(root, id).with_context(|| format!("run '{id}' not found"))?;
    let card = run
        .score(&project.catalog)
        .with_context(|| format!("cannot score run '{id}'"))?
        .clone();
    run.save(root).context("failed to save run")?;

    if json {
        return print_json(&serde_json::json!({ "run": id, "scorecard": card }));
    }

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
    for c in &card.skipped_categories {
        println!("{c}: skipped (no weight)");
    }
    println!("Overall: {:.1} / 100 ({})", card.overall, card.strictness);
    Ok(())
}
