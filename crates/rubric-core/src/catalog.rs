use crate::error::{Result, RubricError};
use crate::types::{Category, SeverityTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A single checkable requirement. Only obtainable from a validated
/// [`Catalog`], so `weight` is always finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub weight: f64,
    pub severity_tier: SeverityTier,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// A rule the catalog names but excludes from scoring (for example the
/// multiplayer appendix). Reports list these so nothing is silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeferredRule {
    pub id: String,
    pub description: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// On-disk definition
// ---------------------------------------------------------------------------

/// Unvalidated rule as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub id: String,
    pub category: Category,
    pub weight: f64,
    pub severity_tier: u8,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDef {
    pub version: String,
    pub rules: Vec<RuleDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<DeferredRule>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable, versioned rule table. Rule order is the order of the
/// definition and is the summation order used by scoring.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    rules: Vec<Rule>,
    deferred: Vec<DeferredRule>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn load(def: CatalogDef) -> Result<Self> {
        if def.version.trim().is_empty() {
            return Err(RubricError::Catalog("version must not be empty".to_string()));
        }
        if def.rules.is_empty() {
            return Err(RubricError::Catalog(format!(
                "catalog '{}' defines no rules",
                def.version
            )));
        }

        let mut index = HashMap::with_capacity(def.rules.len());
        let mut rules = Vec::with_capacity(def.rules.len());
        for (pos, r) in def.rules.into_iter().enumerate() {
            if r.id.trim().is_empty() {
                return Err(RubricError::Catalog(format!("rule #{} has an empty id", pos + 1)));
            }
            if !r.weight.is_finite() || r.weight <= 0.0 {
                return Err(RubricError::Catalog(format!(
                    "rule '{}' has non-positive weight {}",
                    r.id, r.weight
                )));
            }
            let severity_tier = SeverityTier::new(r.severity_tier).ok_or_else(|| {
                RubricError::Catalog(format!(
                    "rule '{}' has severity tier {} outside {}..={}",
                    r.id,
                    r.severity_tier,
                    SeverityTier::MIN,
                    SeverityTier::MAX
                ))
            })?;
            if index.insert(r.id.clone(), pos).is_some() {
                return Err(RubricError::Catalog(format!("duplicate rule id '{}'", r.id)));
            }
            rules.push(Rule {
                id: r.id,
                category: r.category,
                weight: r.weight,
                severity_tier,
                description: r.description,
                remediation: r.remediation,
            });
        }

        let mut deferred_ids = std::collections::HashSet::new();
        for (pos, d) in def.deferred.iter().enumerate() {
            if d.id.trim().is_empty() {
                return Err(RubricError::Catalog(format!(
                    "deferred rule #{} has an empty id",
                    pos + 1
                )));
            }
            if d.description.trim().is_empty() {
                return Err(RubricError::Catalog(format!(
                    "deferred rule '{}' has an empty description",
                    d.id
                )));
            }
            if index.contains_key(&d.id) || !deferred_ids.insert(d.id.as_str()) {
                return Err(RubricError::Catalog(format!("duplicate rule id '{}'", d.id)));
            }
        }

        Ok(Self {
            version: def.version,
            rules,
            deferred: def.deferred,
            index,
        })
    }

    /// Load a YAML or JSON catalog file. Parse failures are reported as
    /// catalog errors, the same as validation failures.
    pub fn from_file(path: &Path) -> Result<Self> {
        let def: CatalogDef = crate::io::read_document(path).map_err(|e| match e {
            RubricError::Io(_) => e,
            other => RubricError::Catalog(format!("{}: {other}", path.display())),
        })?;
        let catalog = Self::load(def)?;
        tracing::debug!(
            path = %path.display(),
            version = %catalog.version,
            rules = catalog.rules.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn deferred(&self) -> &[DeferredRule] {
        &self.deferred
    }

    pub fn lookup(&self, rule_id: &str) -> Result<&Rule> {
        self.index
            .get(rule_id)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| RubricError::UnknownRule(rule_id.to_string()))
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.index.contains_key(rule_id)
    }

    /// Catalog position of a rule, used to keep verdicts in catalog order.
    pub fn position(&self, rule_id: &str) -> Option<usize> {
        self.index.get(rule_id).copied()
    }

    pub fn rules_in(&self, category: Category) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    /// Categories that have at least one rule, in [`Category::all`] order.
    pub fn categories(&self) -> Vec<Category> {
        Category::all()
            .iter()
            .copied()
            .filter(|&c| self.rules_in(c).next().is_some())
            .collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).sum()
    }

    pub fn to_def(&self) -> CatalogDef {
        CatalogDef {
            version: self.version.clone(),
            rules: self
                .rules
                .iter()
                .map(|r| RuleDef {
                    id: r.id.clone(),
                    category: r.category,
                    weight: r.weight,
                    severity_tier: r.severity_tier.get(),
                    description: r.description.clone(),
                    remediation: r.remediation.clone(),
                })
                .collect(),
            deferred: self.deferred.clone(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_def())?)
    }
}

// ---------------------------------------------------------------------------
// Built-in Tetris single-player catalog
// ---------------------------------------------------------------------------

pub const BUILTIN_VERSION: &str = "tetris-sp-1";

macro_rules! rule {
    (
        id: $id:expr,
        category: $cat:expr,
        weight: $weight:expr,
        tier: $tier:expr,
        description: $desc:expr
        $(, remediation: $rem:expr)?
    ) => {
        RuleDef {
            id: $id.to_string(),
            category: $cat,
            weight: $weight,
            severity_tier: $tier,
            description: $desc.to_string(),
            remediation: {
                #[allow(unused_assignments, unused_mut)]
                let mut v: Option<String> = None;
                $(v = Some($rem.to_string());)?
                v
            },
        }
    };
}

pub fn builtin_def() -> CatalogDef {
    use Category::*;

    CatalogDef {
        version: BUILTIN_VERSION.to_string(),
        rules: vec![
            // Tier 1: core gameplay integrity
            rule! {
                id: "CORE-01",
                category: Core,
                weight: 3.0,
                tier: 1,
                description: "Playfield is 10 columns by 20 visible rows with a hidden spawn buffer above",
                remediation: "Size the matrix 10x40 and render only the bottom 20 rows"
            },
            rule! {
                id: "CORE-02",
                category: Core,
                weight: 2.0,
                tier: 1,
                description: "All seven tetrominoes (I, O, T, S, Z, J, L) exist with correct shapes and spawn orientation",
                remediation: "Spawn pieces flat-side down, centered, I and O in the middle columns"
            },
            rule! {
                id: "CORE-03",
                category: Core,
                weight: 3.0,
                tier: 1,
                description: "Randomizer deals pieces from shuffled 7-piece bags",
                remediation: "Refill and shuffle a bag of all seven pieces whenever it empties"
            },
            rule! {
                id: "CORE-04",
                category: Core,
                weight: 3.0,
                tier: 1,
                description: "Rotation follows the Super Rotation System including wall kicks",
                remediation: "Apply the SRS kick tables (separate table for I) before rejecting a rotation"
            },
            rule! {
                id: "CORE-05",
                category: Core,
                weight: 3.0,
                tier: 1,
                description: "Completed rows are cleared and rows above collapse by the cleared count",
                remediation: "Clear all full rows in one step after lock, then shift remaining rows down"
            },
            rule! {
                id: "CORE-06",
                category: Core,
                weight: 2.0,
                tier: 1,
                description: "Lock delay of 0.5s resets on move or rotate, capped at 15 resets",
                remediation: "Track a per-piece reset counter and force lock when it reaches 15"
            },
            rule! {
                id: "CORE-07",
                category: Core,
                weight: 2.0,
                tier: 1,
                description: "Game ends on block out or lock out",
                remediation: "Check spawn overlap and lock-above-skyline before continuing"
            },
            rule! {
                id: "CORE-08",
                category: Core,
                weight: 2.0,
                tier: 1,
                description: "Line clears score 100/300/500/800 times level, with T-spin and back-to-back bonuses",
                remediation: "Award points from the guideline scoring table and apply the 1.5x back-to-back multiplier"
            },
            rule! {
                id: "CORE-09",
                category: Core,
                weight: 2.0,
                tier: 1,
                description: "Level advances every 10 lines and gravity speeds up with level",
                remediation: "Derive fall interval from level using the guideline gravity curve"
            },
            // Tier 2: control fidelity
            rule! {
                id: "CTRL-01",
                category: Controls,
                weight: 2.0,
                tier: 2,
                description: "Rotate clockwise and counter-clockwise on separate inputs",
                remediation: "Bind both rotation directions and route both through the kick resolver"
            },
            rule! {
                id: "CTRL-02",
                category: Controls,
                weight: 2.0,
                tier: 2,
                description: "Hard drop locks instantly and soft drop accelerates the fall",
                remediation: "Hard drop must bypass lock delay; soft drop scales gravity by 20x"
            },
            rule! {
                id: "CTRL-03",
                category: Controls,
                weight: 2.0,
                tier: 2,
                description: "Hold swaps the active piece at most once per piece",
                remediation: "Disable hold until the next piece locks"
            },
            rule! {
                id: "CTRL-04",
                category: Controls,
                weight: 1.0,
                tier: 2,
                description: "Horizontal movement uses delayed auto shift with auto repeat",
                remediation: "Start repeating after the DAS delay and repeat every ARR interval"
            },
            // Tier 3: UI and options
            rule! {
                id: "UI-01",
                category: Ui,
                weight: 1.0,
                tier: 3,
                description: "Ghost piece shows the landing position",
                remediation: "Project the active piece down to its hard-drop position each frame"
            },
            rule! {
                id: "UI-02",
                category: Ui,
                weight: 1.0,
                tier: 3,
                description: "Next queue previews at least one upcoming piece",
                remediation: "Render the head of the bag queue beside the playfield"
            },
            rule! {
                id: "UI-03",
                category: Ui,
                weight: 1.0,
                tier: 3,
                description: "Score, level, and cleared lines are displayed during play"
            },
            rule! {
                id: "UI-04",
                category: Ui,
                weight: 1.0,
                tier: 3,
                description: "Pause suspends gravity and timers and hides the playfield",
                remediation: "Stop the game clock on pause and resume without a lock-delay refund"
            },
            // Tier 4: audio and polish
            rule! {
                id: "AUD-01",
                category: Audio,
                weight: 1.0,
                tier: 4,
                description: "Distinct sound effects for move, rotate, lock, and line clear"
            },
            rule! {
                id: "AUD-02",
                category: Audio,
                weight: 1.0,
                tier: 4,
                description: "Music and effects volumes can be adjusted or muted",
                remediation: "Expose separate music and effects sliders in options"
            },
        ],
        deferred: vec![
            DeferredRule {
                id: "MP-01".to_string(),
                description: "Line clears send garbage rows to opponents".to_string(),
                reason: "multiplayer appendix".to_string(),
            },
            DeferredRule {
                id: "MP-02".to_string(),
                description: "Opponents share a seeded piece sequence".to_string(),
                reason: "multiplayer appendix".to_string(),
            },
        ],
    }
}

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

/// The process-wide built-in catalog, validated on first use.
pub fn builtin() -> &'static Catalog {
    BUILTIN.get_or_init(|| Catalog::load(builtin_def()).expect("built-in catalog is valid"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
