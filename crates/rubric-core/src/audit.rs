use crate::catalog::Catalog;
use crate::error::{Result, RubricError};
use crate::paths;
use crate::rank::rank;
use crate::report::{render, Report};
use crate::score::{score, Scorecard};
use crate::types::{EvidenceMode, PlatformHint, RunPhase, Strictness};
use crate::verdict::{IngestSummary, Verdict, VerdictCollector, VerdictSet, VerdictSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// RunParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    pub target: String,
    #[serde(default)]
    pub platform: PlatformHint,
    #[serde(default)]
    pub evidence_mode: EvidenceMode,
    #[serde(default)]
    pub strictness: Strictness,
}

impl RunParams {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            platform: PlatformHint::default(),
            evidence_mode: EvidenceMode::default(),
            strictness: Strictness::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditRun
// ---------------------------------------------------------------------------

/// One evaluation of a target against a catalog version.
///
/// Moves forward only: `collecting -> scored -> reported`. Verdicts can only
/// change while collecting; a correction after scoring needs a new run (see
/// [`AuditRun::reaudit`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRun {
    pub id: String,
    pub target: String,
    pub platform: PlatformHint,
    pub evidence_mode: EvidenceMode,
    pub strictness: Strictness,
    pub catalog_version: String,
    pub phase: RunPhase,
    #[serde(default)]
    pub verdicts: Vec<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorecard: Option<Scorecard>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
}

impl AuditRun {
    pub fn new(id: impl Into<String>, params: RunParams, catalog: &Catalog) -> Result<Self> {
        let id = id.into();
        paths::validate_run_id(&id)?;
        Ok(Self {
            id,
            target: params.target,
            platform: params.platform,
            evidence_mode: params.evidence_mode,
            strictness: params.strictness,
            catalog_version: catalog.version().to_string(),
            phase: RunPhase::Collecting,
            verdicts: Vec::new(),
            scorecard: None,
            created_at: Utc::now(),
            scored_at: None,
            reported_at: None,
            supersedes: None,
        })
    }

    pub fn params(&self) -> RunParams {
        RunParams {
            target: self.target.clone(),
            platform: self.platform,
            evidence_mode: self.evidence_mode,
            strictness: self.strictness,
        }
    }

    /// A fresh collecting run with the same parameters, superseding this one.
    /// This run is left untouched.
    pub fn reaudit(&self, new_id: impl Into<String>, catalog: &Catalog) -> Result<Self> {
        let mut run = Self::new(new_id, self.params(), catalog)?;
        run.supersedes = Some(self.id.clone());
        Ok(run)
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn create(root: &Path, id: impl Into<String>, params: RunParams, catalog: &Catalog) -> Result<Self> {
        let run = Self::new(id, params, catalog)?;
        run.create_file(root)?;
        Ok(run)
    }

    /// Save a run that must not exist yet.
    pub fn create_file(&self, root: &Path) -> Result<()> {
        if paths::run_manifest(root, &self.id).exists() {
            return Err(RubricError::RunExists(self.id.clone()));
        }
        self.save(root)
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        paths::validate_run_id(id)?;
        let manifest = paths::run_manifest(root, id);
        if !manifest.exists() {
            return Err(RubricError::RunNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&manifest)?;
        let run: AuditRun = serde_yaml::from_str(&data)?;
        Ok(run)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::run_manifest(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// All stored runs, oldest first.
    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = paths::runs_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            runs.push(Self::load(root, id)?);
        }
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(runs)
    }

    // ---------------------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------------------

    fn ensure_catalog(&self, catalog: &Catalog) -> Result<()> {
        if self.catalog_version != catalog.version() {
            return Err(RubricError::CatalogMismatch {
                expected: self.catalog_version.clone(),
                found: catalog.version().to_string(),
            });
        }
        Ok(())
    }

    fn ensure_collecting(&self, to: RunPhase) -> Result<()> {
        if self.phase != RunPhase::Collecting {
            return Err(RubricError::InvalidTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
                reason: format!("run '{}' is closed to new verdicts; start a re-audit", self.id),
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Collecting
    // ---------------------------------------------------------------------------

    pub fn collector<'c>(&self, catalog: &'c Catalog) -> Result<VerdictCollector<'c>> {
        self.ensure_catalog(catalog)?;
        VerdictCollector::resume(catalog, self.verdicts.iter().cloned())
    }

    fn with_collector<T>(
        &mut self,
        catalog: &Catalog,
        f: impl FnOnce(&mut VerdictCollector<'_>) -> Result<T>,
    ) -> Result<T> {
        self.ensure_collecting(RunPhase::Collecting)?;
        let mut collector = self.collector(catalog)?;
        let out = f(&mut collector)?;
        self.verdicts = collector.into_verdicts();
        Ok(out)
    }

    pub fn submit(&mut self, catalog: &Catalog, verdict: Verdict) -> Result<()> {
        let rule_id = verdict.rule_id.clone();
        self.with_collector(catalog, |c| c.submit(verdict))?;
        tracing::debug!(run = %self.id, rule = %rule_id, "verdict accepted");
        Ok(())
    }

    pub fn ingest(&mut self, catalog: &Catalog, source: &mut dyn VerdictSource) -> Result<IngestSummary> {
        self.with_collector(catalog, |c| c.ingest(source))
    }

    pub fn fill_unknown(&mut self, catalog: &Catalog, note: &str) -> Result<Vec<String>> {
        self.with_collector(catalog, |c| Ok(c.fill_unknown(note)))
    }

    pub fn missing(&self, catalog: &Catalog) -> Result<Vec<String>> {
        Ok(self.collector(catalog)?.missing())
    }

    pub fn verdict_set(&self, catalog: &Catalog) -> Result<VerdictSet> {
        self.collector(catalog)?.finalize()
    }

    // ---------------------------------------------------------------------------
    // Scoring and reporting
    // ---------------------------------------------------------------------------

    /// Finalize the verdicts and score them: `collecting -> scored`.
    pub fn score(&mut self, catalog: &Catalog) -> Result<&Scorecard> {
        self.ensure_collecting(RunPhase::Scored)?;
        let set = self.verdict_set(catalog)?;
        let card = score(catalog, &set, self.strictness)?;
        tracing::debug!(run = %self.id, overall = card.overall, "run scored");
        self.phase = RunPhase::Scored;
        self.scored_at = Some(Utc::now());
        Ok(self.scorecard.insert(card))
    }

    /// Render the report: `scored -> reported`. A reported run renders the
    /// same report again without changing state.
    pub fn report(&mut self, catalog: &Catalog) -> Result<Report> {
        if self.phase == RunPhase::Collecting {
            return Err(RubricError::InvalidTransition {
                from: self.phase.to_string(),
                to: RunPhase::Reported.to_string(),
                reason: format!("run '{}' has not been scored", self.id),
            });
        }
        let report = {
            let card = self.scorecard.as_ref().ok_or_else(|| {
                RubricError::Render(format!("run '{}' is {} but has no scorecard", self.id, self.phase))
            })?;
            let set = self.verdict_set(catalog)?;
            let findings = rank(catalog, &set)?;
            render(catalog, self, &card.categories, card.overall, &findings)?
        };
        if self.phase == RunPhase::Scored {
            self.phase = RunPhase::Reported;
            self.reported_at = Some(Utc::now());
            tracing::debug!(run = %self.id, "run reported");
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
