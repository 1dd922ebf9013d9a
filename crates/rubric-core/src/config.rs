use crate::catalog::{self, Catalog};
use crate::error::{Result, RubricError};
use crate::paths;
use crate::types::{EvidenceMode, PlatformHint, Strictness};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RunDefaults
// ---------------------------------------------------------------------------

/// Parameters applied to `run start` when the caller does not pass them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunDefaults {
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub platform: PlatformHint,
    #[serde(default)]
    pub evidence_mode: EvidenceMode,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Catalog file, relative to the project root. `None` selects the
    /// built-in catalog.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub defaults: RunDefaults,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            catalog: None,
            defaults: RunDefaults::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RubricError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized project gets defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(RubricError::NotInitialized) => Ok(Self::new()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn catalog_path(&self, root: &Path) -> Option<PathBuf> {
        self.catalog.as_ref().map(|p| root.join(p))
    }

    /// Load the configured catalog, falling back to the built-in one.
    pub fn load_catalog(&self, root: &Path) -> Result<Catalog> {
        match self.catalog_path(root) {
            Some(path) => Catalog::from_file(&path),
            None => Ok(catalog::builtin().clone()),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("unknown config version {}", self.version),
            });
        }

        if let Some(path) = self.catalog_path(root) {
            if !path.exists() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("catalog file '{}' does not exist", path.display()),
                });
            } else if let Err(e) = Catalog::from_file(&path) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: e.to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.version, 1);
        assert!(parsed.catalog.is_none());
        assert_eq!(parsed.defaults, RunDefaults::default());
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("defaults:\n  strictness: strict\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.defaults.strictness, Strictness::Strict);
        assert_eq!(cfg.defaults.platform, PlatformHint::Generic);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_yaml::from_str::<Config>("strictnes: strict\n").is_err());
    }

    #[test]
    fn default_matches_new_and_is_clean() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::default();
        assert_eq!(cfg.version, Config::new().version);
        assert_eq!(cfg.defaults, Config::new().defaults);
        assert!(cfg.validate(dir.path()).is_empty());
    }

    #[test]
    fn validate_flags_unknown_version() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            version: 3,
            ..Config::default()
        };
        let warnings = cfg.validate(dir.path());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(warnings[0].message.contains("version 3"));
    }

    #[test]
    fn not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RubricError::NotInitialized)
        ));
        assert_eq!(Config::load_or_default(dir.path()).unwrap().version, 1);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new();
        cfg.defaults.platform = PlatformHint::Unity;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.defaults.platform, PlatformHint::Unity);
    }

    #[test]
    fn builtin_catalog_without_path() {
        let dir = TempDir::new().unwrap();
        let cat = Config::new().load_catalog(dir.path()).unwrap();
        assert_eq!(cat.version(), catalog::BUILTIN_VERSION);
    }

    #[test]
    fn validate_flags_missing_catalog_file() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new();
        cfg.catalog = Some(PathBuf::from("rules/tetris.yaml"));
        let warnings = cfg.validate(dir.path());
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("does not exist")));
    }

    #[test]
    fn validate_accepts_exported_catalog() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("catalog.yaml"),
            catalog::builtin().to_yaml().unwrap(),
        )
        .unwrap();
        let mut cfg = Config::new();
        cfg.catalog = Some(PathBuf::from("catalog.yaml"));
        assert!(cfg.validate(dir.path()).is_empty());
    }
}
