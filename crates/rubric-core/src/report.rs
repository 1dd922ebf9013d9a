use crate::audit::AuditRun;
use crate::catalog::{Catalog, DeferredRule};
use crate::error::{Result, RubricError};
use crate::rank::Finding;
use crate::score::CategoryScore;
use crate::types::{Category, EvidenceMode, PlatformHint, SeverityTier, Strictness, VerdictStatus};
use crate::verdict::VerdictCollector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Shown in place of evidence for an UNKNOWN verdict that carries none.
pub const NO_EVIDENCE_NOTE: &str = "no evidence recorded";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: String,
    pub target: String,
    pub platform: PlatformHint,
    pub evidence_mode: EvidenceMode,
    pub strictness: Strictness,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub category: Category,
    pub severity_tier: SeverityTier,
    pub status: VerdictStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absence_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub catalog_version: String,
    pub run: RunSummary,
    pub rules: Vec<RuleOutcome>,
    pub categories: Vec<CategoryScore>,
    pub overall: f64,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub deferred: Vec<DeferredRule>,
    #[serde(default)]
    pub skipped_categories: Vec<Category>,
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

fn render_err(msg: impl Into<String>) -> RubricError {
    RubricError::Render(msg.into())
}

/// Compose a report. Pure: reads no clock and touches no files. Any input
/// that would force dropping or inventing data is a `Render` error.
pub fn render(
    catalog: &Catalog,
    run: &AuditRun,
    category_scores: &[CategoryScore],
    overall: f64,
    findings: &[Finding],
) -> Result<Report> {
    if run.catalog_version != catalog.version() {
        return Err(render_err(format!(
            "run '{}' was opened against catalog '{}', not '{}'",
            run.id,
            run.catalog_version,
            catalog.version()
        )));
    }

    let set = VerdictCollector::resume(catalog, run.verdicts.iter().cloned())
        .and_then(|c| c.finalize())
        .map_err(|e| render_err(format!("verdicts do not cover the catalog: {e}")))?;

    // category scores: exactly the catalog's categories, once each
    let present = catalog.categories();
    let mut seen = HashSet::new();
    for cs in category_scores {
        if !present.contains(&cs.category) {
            return Err(render_err(format!(
                "score given for category '{}' which has no rules",
                cs.category
            )));
        }
        if !seen.insert(cs.category) {
            return Err(render_err(format!("category '{}' scored twice", cs.category)));
        }
    }
    if let Some(missing) = present.iter().find(|c| !seen.contains(*c)) {
        return Err(render_err(format!("category scores missing '{missing}'")));
    }
    let mut categories = category_scores.to_vec();
    categories.sort_by_key(|cs| cs.category);

    if !overall.is_finite() || !(0.0..=100.0).contains(&overall) {
        return Err(render_err(format!("overall score {overall} outside 0..=100")));
    }

    // findings: exactly the FAIL verdicts
    let failed: HashSet<&str> = set
        .iter()
        .filter(|v| v.status == VerdictStatus::Fail)
        .map(|v| v.rule_id.as_str())
        .collect();
    let mut listed = HashSet::new();
    for f in findings {
        if !failed.contains(f.rule_id.as_str()) {
            return Err(render_err(format!("finding '{}' is not a FAIL verdict", f.rule_id)));
        }
        if !listed.insert(f.rule_id.as_str()) {
            return Err(render_err(format!("finding '{}' listed twice", f.rule_id)));
        }
    }
    if listed.len() != failed.len() {
        return Err(render_err(format!(
            "{} FAIL verdict(s) but {} finding(s)",
            failed.len(),
            listed.len()
        )));
    }
    // ranked: tier ascending, then rule id, with tiers as the catalog defines them
    let mut keys = Vec::with_capacity(findings.len());
    for f in findings {
        let tier = catalog.lookup(&f.rule_id)?.severity_tier;
        if f.severity_tier != tier {
            return Err(render_err(format!(
                "finding '{}' has tier {} but the catalog says {}",
                f.rule_id, f.severity_tier, tier
            )));
        }
        keys.push((tier, f.rule_id.as_str()));
    }
    if let Some(pair) = keys.windows(2).find(|w| w[0] > w[1]) {
        return Err(render_err(format!(
            "findings out of rank order: '{}' listed before '{}'",
            pair[0].1, pair[1].1
        )));
    }

    let rules = catalog
        .rules()
        .iter()
        .zip(set.iter())
        .map(|(rule, v)| RuleOutcome {
            rule_id: rule.id.clone(),
            category: rule.category,
            severity_tier: rule.severity_tier,
            status: v.status,
            evidence: v.evidence.clone(),
            absence_note: (v.status == VerdictStatus::Unknown && v.evidence.is_none())
                .then(|| NO_EVIDENCE_NOTE.to_string()),
            notes: v.notes.clone(),
        })
        .collect();

    let skipped_categories = Category::all()
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();

    Ok(Report {
        schema_version: REPORT_SCHEMA_VERSION,
        catalog_version: catalog.version().to_string(),
        run: RunSummary {
            id: run.id.clone(),
            target: run.target.clone(),
            platform: run.platform,
            evidence_mode: run.evidence_mode,
            strictness: run.strictness,
            created_at: run.created_at,
            scored_at: run.scored_at,
            supersedes: run.supersedes.clone(),
        },
        rules,
        categories,
        overall,
        findings: findings.to_vec(),
        deferred: catalog.deferred().to_vec(),
        skipped_categories,
    })
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Report {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let run = &self.run;
        // writeln! into a String cannot fail
        let _ = writeln!(out, "# Compliance report: {}", run.target);
        let _ = writeln!(out);
        let _ = writeln!(out, "- Run: `{}`", run.id);
        let _ = writeln!(out, "- Catalog: `{}`", self.catalog_version);
        let _ = writeln!(out, "- Platform: {}", run.platform);
        let _ = writeln!(out, "- Evidence mode: {}", run.evidence_mode);
        let _ = writeln!(out, "- Strictness: {}", run.strictness);
        if let Some(prev) = &run.supersedes {
            let _ = writeln!(out, "- Supersedes: `{prev}`");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "## Overall score: {:.1} / 100", self.overall);
        let _ = writeln!(out);
        let _ = writeln!(out, "| Category | Score | Earned | Weight |");
        let _ = writeln!(out, "|---|---|---|---|");
        for c in &self.categories {
            let _ = writeln!(
                out,
                "| {} | {:.1} | {} | {} |",
                c.category, c.weighted_score, c.raw_score, c.weight_sum
            );
        }
        for c in &self.skipped_categories {
            let _ = writeln!(out, "| {c} | n/a (no rules) | 0 | 0 |");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Findings");
        let _ = writeln!(out);
        if self.findings.is_empty() {
            let _ = writeln!(out, "No failing rules.");
        }
        for (i, f) in self.findings.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **{}** [{} {}] {}",
                i + 1,
                f.rule_id,
                f.severity_tier,
                f.severity_tier.label(),
                f.description
            );
            if let Some(ev) = &f.evidence {
                let _ = writeln!(out, "   - Evidence: {ev}");
            }
            if let Some(fix) = &f.remediation {
                let _ = writeln!(out, "   - Remediation: {fix}");
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Rules");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Rule | Category | Tier | Status | Evidence |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for r in &self.rules {
            let evidence = r
                .evidence
                .as_deref()
                .or(r.absence_note.as_deref())
                .unwrap_or("");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                r.rule_id, r.category, r.severity_tier, r.status, evidence
            );
        }

        if !self.deferred.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Deferred");
            let _ = writeln!(out);
            for d in &self.deferred {
                let _ = writeln!(out, "- {} ({}): {}", d.id, d.reason, d.description);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
