use crate::catalog::{Catalog, Rule};
use crate::error::{Result, RubricError};
use crate::types::{Category, Strictness, VerdictStatus};
use crate::verdict::VerdictSet;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CategoryScore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    /// Sum of contributions, in weight units.
    pub raw_score: f64,
    pub weight_sum: f64,
    /// `raw_score / weight_sum * 100`, one decimal.
    pub weighted_score: f64,
}

// ---------------------------------------------------------------------------
// Scorecard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub strictness: Strictness,
    pub categories: Vec<CategoryScore>,
    /// Sum of all contributions, unrounded.
    pub raw_total: f64,
    pub weight_total: f64,
    /// 0 to 100, one decimal.
    pub overall: f64,
    /// Categories with zero total weight, left out of `categories`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_categories: Vec<Category>,
}

impl Scorecard {
    pub fn category(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn contribution(rule: &Rule, status: VerdictStatus, strictness: Strictness) -> f64 {
    rule.weight * status.credit(strictness)
}

fn percent(raw: f64, weight: f64) -> f64 {
    round1(raw / weight * 100.0).clamp(0.0, 100.0)
}

/// Score a single category. Fails with `EmptyCategory` when the category has
/// no weight in this catalog.
pub fn category_score(
    catalog: &Catalog,
    verdicts: &VerdictSet,
    category: Category,
    strictness: Strictness,
) -> Result<CategoryScore> {
    verdicts.check_catalog(catalog)?;

    let mut raw_score = 0.0;
    let mut weight_sum = 0.0;
    for (rule, verdict) in catalog.rules().iter().zip(verdicts) {
        if rule.category == category {
            raw_score += contribution(rule, verdict.status, strictness);
            weight_sum += rule.weight;
        }
    }
    if weight_sum <= 0.0 {
        return Err(RubricError::EmptyCategory(category.to_string()));
    }

    Ok(CategoryScore {
        category,
        raw_score,
        weight_sum,
        weighted_score: percent(raw_score, weight_sum),
    })
}

/// Score a finalized verdict set. Pure: the same inputs always produce the
/// same scorecard, because every sum runs in catalog order.
pub fn score(catalog: &Catalog, verdicts: &VerdictSet, strictness: Strictness) -> Result<Scorecard> {
    verdicts.check_catalog(catalog)?;

    let mut categories = Vec::new();
    let mut skipped_categories = Vec::new();
    for &category in Category::all() {
        match category_score(catalog, verdicts, category, strictness) {
            Ok(cs) => categories.push(cs),
            Err(RubricError::EmptyCategory(_)) => {
                tracing::warn!(%category, catalog = catalog.version(), "skipping category with zero weight");
                skipped_categories.push(category);
            }
            Err(e) => return Err(e),
        }
    }

    let mut raw_total = 0.0;
    let mut weight_total = 0.0;
    for (rule, verdict) in catalog.rules().iter().zip(verdicts) {
        raw_total += contribution(rule, verdict.status, strictness);
        weight_total += rule.weight;
    }

    Ok(Scorecard {
        strictness,
        categories,
        raw_total,
        weight_total,
        overall: percent(raw_total, weight_total),
        skipped_categories,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
