use crate::output::print_json;
use anyhow::Context;
use rubric_core::catalog::Catalog;
use rubric_core::config::{Config, WarnLevel};
use rubric_core::paths;
use std::path::{Path, PathBuf};

pub struct InitOptions {
    pub catalog: Option<PathBuf>,
    pub strictness: Option<String>,
    pub platform: Option<String>,
    pub evidence_mode: Option<String>,
    pub force: bool,
}

pub fn run(root: &Path, opts: InitOptions, json: bool) -> anyhow::Result<()> {
    let config_path = paths::config_path(root);
    let existed = config_path.exists();

    if !existed || opts.force {
        let mut cfg = Config::new();
        if let Some(catalog) = &opts.catalog {
            Catalog::from_file(&root.join(catalog))
                .with_context(|| format!("catalog '{}' is not valid", catalog.display()))?;
            cfg.catalog = Some(catalog.clone());
        }
        if let Some(s) = &opts.strictness {
            cfg.defaults.strictness = s
                .parse()
                .with_context(|| format!("unknown strictness: {s}"))?;
        }
        if let Some(p) = &opts.platform {
            cfg.defaults.platform = p.parse().with_context(|| format!("unknown platform: {p}"))?;
        }
        if let Some(m) = &opts.evidence_mode {
            cfg.defaults.evidence_mode = m
                .parse()
                .with_context(|| format!("unknown evidence mode: {m}"))?;
        }
        cfg.save(root).context("failed to write config")?;
    }
    std::fs::create_dir_all(paths::runs_dir(root)).context("failed to create runs directory")?;

    let written = !existed || opts.force;
    let warnings = Config::load(root)
        .context("failed to load config")?
        .validate(root);
    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config": config_path.display().to_string(),
            "written": written,
            "warnings": warnings,
        }))?;
        return Ok(());
    }

    if written {
        println!("Initialized rubric in {}", root.display());
    } else {
        println!("Already initialized: {}", config_path.display());
    }
    for w in &warnings {
        let level = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        eprintln!("{level}: {}", w.message);
    }
    Ok(())
}
