use crate::catalog::Catalog;
use crate::error::{Result, RubricError};
use crate::types::VerdictStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Verdict {
    pub rule_id: String,
    pub status: VerdictStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Verdict {
    pub fn new(rule_id: impl Into<String>, status: VerdictStatus) -> Self {
        Self {
            rule_id: rule_id.into(),
            status,
            evidence: None,
            notes: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// ---------------------------------------------------------------------------
// VerdictSet
// ---------------------------------------------------------------------------

/// A complete verdict set: exactly one verdict per catalog rule, in catalog
/// order. Only [`VerdictCollector::finalize`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictSet {
    catalog_version: String,
    verdicts: Vec<Verdict>,
}

impl VerdictSet {
    pub fn catalog_version(&self) -> &str {
        &self.catalog_version
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Verdict> {
        self.verdicts.iter()
    }

    pub fn as_slice(&self) -> &[Verdict] {
        &self.verdicts
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn get(&self, rule_id: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.rule_id == rule_id)
    }

    pub fn count(&self, status: VerdictStatus) -> usize {
        self.verdicts.iter().filter(|v| v.status == status).count()
    }

    /// Fails with `CatalogMismatch` unless verdict `i` is for rule `i` of
    /// `catalog`, for every position.
    pub(crate) fn check_catalog(&self, catalog: &Catalog) -> Result<()> {
        let aligned = self.catalog_version == catalog.version()
            && self.verdicts.len() == catalog.rules().len()
            && self
                .verdicts
                .iter()
                .zip(catalog.rules())
                .all(|(v, r)| v.rule_id == r.id);
        if !aligned {
            return Err(RubricError::CatalogMismatch {
                expected: self.catalog_version.clone(),
                found: catalog.version().to_string(),
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a VerdictSet {
    type Item = &'a Verdict;
    type IntoIter = std::slice::Iter<'a, Verdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.verdicts.iter()
    }
}

// ---------------------------------------------------------------------------
// VerdictSource
// ---------------------------------------------------------------------------

/// Anything that can produce verdicts: an AI reviewer's output file, a human
/// auditor's checklist, a static analyzer. The collector never judges rules
/// itself, it only validates and records what a source yields.
pub trait VerdictSource {
    fn name(&self) -> String;
    fn verdicts(&mut self) -> Result<Vec<Verdict>>;
}

impl VerdictSource for Vec<Verdict> {
    fn name(&self) -> String {
        "inline".to_string()
    }

    fn verdicts(&mut self) -> Result<Vec<Verdict>> {
        Ok(std::mem::take(self))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VerdictDoc {
    List(Vec<Verdict>),
    Wrapped { verdicts: Vec<Verdict> },
}

/// A YAML or JSON file holding either a bare list of verdicts or a mapping
/// with a `verdicts` key.
pub struct VerdictFile {
    path: PathBuf,
}

impl VerdictFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl VerdictSource for VerdictFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn verdicts(&mut self) -> Result<Vec<Verdict>> {
        let doc: VerdictDoc = crate::io::read_document(&self.path)?;
        Ok(match doc {
            VerdictDoc::List(v) | VerdictDoc::Wrapped { verdicts: v } => v,
        })
    }
}

// ---------------------------------------------------------------------------
// IngestSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub rule_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub source: String,
    pub accepted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

// ---------------------------------------------------------------------------
// VerdictCollector
// ---------------------------------------------------------------------------

/// Accumulates one verdict per rule for a single run. Single writer: callers
/// submit sequentially and never finalize concurrently with a submit.
#[derive(Debug, Clone)]
pub struct VerdictCollector<'c> {
    catalog: &'c Catalog,
    // keyed by catalog position so iteration is catalog order
    verdicts: BTreeMap<usize, Verdict>,
}

impl<'c> VerdictCollector<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            verdicts: BTreeMap::new(),
        }
    }

    /// Rebuild a collector from previously accepted verdicts.
    pub fn resume(catalog: &'c Catalog, verdicts: impl IntoIterator<Item = Verdict>) -> Result<Self> {
        let mut collector = Self::new(catalog);
        for v in verdicts {
            collector.submit(v)?;
        }
        Ok(collector)
    }

    /// Record one verdict. A rejected submission leaves the collector as it was.
    pub fn submit(&mut self, verdict: Verdict) -> Result<()> {
        let pos = self
            .catalog
            .position(&verdict.rule_id)
            .ok_or_else(|| RubricError::UnknownRule(verdict.rule_id.clone()))?;
        if self.verdicts.contains_key(&pos) {
            return Err(RubricError::DuplicateVerdict(verdict.rule_id));
        }
        self.verdicts.insert(pos, verdict);
        Ok(())
    }

    /// Submit everything `source` yields. Unknown-rule and duplicate
    /// rejections are recorded in the summary and collection continues; a
    /// failure to read the source itself is returned.
    pub fn ingest(&mut self, source: &mut dyn VerdictSource) -> Result<IngestSummary> {
        let name = source.name();
        let mut summary = IngestSummary {
            source: name.clone(),
            accepted: Vec::new(),
            rejected: Vec::new(),
        };
        for verdict in source.verdicts()? {
            let rule_id = verdict.rule_id.clone();
            match self.submit(verdict) {
                Ok(()) => summary.accepted.push(rule_id),
                Err(e @ (RubricError::UnknownRule(_) | RubricError::DuplicateVerdict(_))) => {
                    tracing::warn!(source = %name, rule = %rule_id, "rejected verdict: {e}");
                    summary.rejected.push(Rejection {
                        rule_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Rule ids still lacking a verdict, in catalog order.
    pub fn missing(&self) -> Vec<String> {
        self.catalog
            .rules()
            .iter()
            .enumerate()
            .filter(|(pos, _)| !self.verdicts.contains_key(pos))
            .map(|(_, r)| r.id.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.verdicts.len() == self.catalog.rules().len()
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Give every missing rule an explicit `UNKNOWN` verdict annotated with
    /// `note`. Used when an evidence-gathering deadline expires.
    pub fn fill_unknown(&mut self, note: &str) -> Vec<String> {
        let missing = self.missing();
        for id in &missing {
            if let Some(pos) = self.catalog.position(id) {
                self.verdicts
                    .insert(pos, Verdict::new(id.clone(), VerdictStatus::Unknown).with_notes(note));
            }
        }
        missing
    }

    pub fn finalize(&self) -> Result<VerdictSet> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(RubricError::IncompleteAudit { missing });
        }
        Ok(VerdictSet {
            catalog_version: self.catalog.version().to_string(),
            verdicts: self.verdicts.values().cloned().collect(),
        })
    }

    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.values()
    }

    pub fn into_verdicts(self) -> Vec<Verdict> {
        self.verdicts.into_values().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
