use crate::error::{Result, RubricError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RUBRIC_DIR: &str = ".rubric";
pub const RUNS_DIR: &str = ".rubric/runs";
pub const CONFIG_FILE: &str = ".rubric/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rubric_dir(root: &Path) -> PathBuf {
    root.join(RUBRIC_DIR)
}

pub fn runs_dir(root: &Path) -> PathBuf {
    root.join(RUNS_DIR)
}

pub fn run_manifest(root: &Path, id: &str) -> PathBuf {
    runs_dir(root).join(format!("{id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Run id validation
// ---------------------------------------------------------------------------

static RUN_ID_RE: OnceLock<Regex> = OnceLock::new();

fn run_id_re() -> &'static Regex {
    RUN_ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_run_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !run_id_re().is_match(id) {
        return Err(RubricError::InvalidRunId(id.to_string()));
    }
    Ok(())
}

/// A fresh id of the form `run-1a2b3c4d`.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..8])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_run_ids() {
        for id in ["ios-build-42", "a", "run-1a2b3c4d", "x1"] {
            validate_run_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_run_ids() {
        for id in ["", "-lead", "trail-", "has space", "Upper", "a_b", "../etc"] {
            assert!(validate_run_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn generated_ids_validate() {
        let id = generate_run_id();
        assert!(id.starts_with("run-"));
        assert_eq!(id.len(), 12);
        validate_run_id(&id).unwrap();
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.rubric/config.yaml")
        );
        assert_eq!(
            run_manifest(root, "run-1"),
            PathBuf::from("/tmp/proj/.rubric/runs/run-1.yaml")
        );
    }
}
