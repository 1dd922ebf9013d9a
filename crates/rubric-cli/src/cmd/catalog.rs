use super::Project;
use crate::output::{print_json, Table};
use anyhow::Context;
use clap::Subcommand;
use rubric_core::catalog::Catalog;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List the rules of the active catalog
    Show,
    /// Check a catalog file for duplicate ids, bad weights, and tiers outside 1-4
    Validate { file: PathBuf },
    /// Write the active catalog as YAML
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run(root: &Path, subcmd: CatalogSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CatalogSubcommand::Show => show(root, json),
        CatalogSubcommand::Validate { file } => validate(&file, json),
        CatalogSubcommand::Export { out } => export(root, out.as_deref()),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let project = Project::open_or_default(root)?;
    let catalog = &project.catalog;

    if json {
        return print_json(&serde_json::json!({
            "version": catalog.version(),
            "rules": catalog.rules(),
            "deferred": catalog.deferred(),
        }));
    }

    println!("Catalog {} ({} rules)", catalog.version(), catalog.rules().len());
    let mut table = Table::new(&["ID", "CATEGORY", "TIER", "WEIGHT", "DESCRIPTION"]);
    for r in catalog.rules() {
        table.row(vec![
            r.id.clone(),
            r.category.to_string(),
            r.severity_tier.to_string(),
            r.weight.to_string(),
            r.description.clone(),
        ]);
    }
    table.print();
    if !catalog.deferred().is_empty() {
        println!();
        println!("Deferred:");
        for d in catalog.deferred() {
            println!("  {} ({}): {}", d.id, d.reason, d.description);
        }
    }
    Ok(())
}

fn validate(file: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = Catalog::from_file(file)
        .with_context(|| format!("catalog '{}' is not valid", file.display()))?;
    if json {
        print_json(&serde_json::json!({
            "file": file.display().to_string(),
            "version": catalog.version(),
            "rules": catalog.rules().len(),
            "deferred": catalog.deferred().len(),
            "valid": true,
        }))?;
    } else {
        println!(
            "Catalog {} is valid: {} rules, {} deferred",
            catalog.version(),
            catalog.rules().len(),
            catalog.deferred().len()
        );
    }
    Ok(())
}

fn export(root: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let project = Project::open_or_default(root)?;
    let yaml = project.catalog.to_yaml()?;
    match out {
        Some(path) => {
            rubric_core::io::atomic_write(path, yaml.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported catalog {} to {}", project.catalog.version(), path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
