use crate::error::RubricError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Core,
    Controls,
    Ui,
    Audio,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Core,
            Category::Controls,
            Category::Ui,
            Category::Audio,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Core => "core",
            Category::Controls => "controls",
            Category::Ui => "ui",
            Category::Audio => "audio",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = RubricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(Category::Core),
            "controls" => Ok(Category::Controls),
            "ui" => Ok(Category::Ui),
            "audio" => Ok(Category::Audio),
            _ => Err(RubricError::InvalidValue {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// SeverityTier
// ---------------------------------------------------------------------------

/// Impact class of a rule, `1` (highest) through `4`. Findings are ranked by
/// tier first, so the ordering here is the ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SeverityTier(u8);

impl SeverityTier {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(tier: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&tier).then_some(Self(tier))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "core gameplay integrity",
            2 => "control fidelity",
            3 => "ui/options",
            _ => "audio/polish",
        }
    }
}

impl TryFrom<u8> for SeverityTier {
    type Error = String;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        SeverityTier::new(tier).ok_or_else(|| {
            format!(
                "severity tier {tier} out of range {}..={}",
                SeverityTier::MIN,
                SeverityTier::MAX
            )
        })
    }
}

impl From<SeverityTier> for u8 {
    fn from(tier: SeverityTier) -> u8 {
        tier.0
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// VerdictStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Unknown,
}

impl VerdictStatus {
    /// Fraction of a rule's weight this status earns under `strictness`.
    pub fn credit(self, strictness: Strictness) -> f64 {
        match self {
            VerdictStatus::Pass => 1.0,
            VerdictStatus::Fail => 0.0,
            VerdictStatus::Unknown => strictness.unknown_credit(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VerdictStatus::Pass => "pass",
            VerdictStatus::Fail => "fail",
            VerdictStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl std::str::FromStr for VerdictStatus {
    type Err = RubricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pass" => Ok(VerdictStatus::Pass),
            "fail" => Ok(VerdictStatus::Fail),
            "unknown" => Ok(VerdictStatus::Unknown),
            _ => Err(RubricError::InvalidValue {
                kind: "verdict status",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Strictness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    Strict,
    #[default]
    Balanced,
}

impl Strictness {
    pub fn unknown_credit(self) -> f64 {
        match self {
            Strictness::Strict => 0.0,
            Strictness::Balanced => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strictness::Strict => "strict",
            Strictness::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strictness {
    type Err = RubricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Strictness::Strict),
            "balanced" => Ok(Strictness::Balanced),
            _ => Err(RubricError::InvalidValue {
                kind: "strictness",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// PlatformHint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformHint {
    Ios,
    Unity,
    #[default]
    Generic,
}

impl PlatformHint {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformHint::Ios => "ios",
            PlatformHint::Unity => "unity",
            PlatformHint::Generic => "generic",
        }
    }
}

impl fmt::Display for PlatformHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlatformHint {
    type Err = RubricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(PlatformHint::Ios),
            "unity" => Ok(PlatformHint::Unity),
            "generic" => Ok(PlatformHint::Generic),
            _ => Err(RubricError::InvalidValue {
                kind: "platform",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// EvidenceMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMode {
    #[default]
    CodeOnly,
    CodeAndRuntime,
}

impl EvidenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceMode::CodeOnly => "code_only",
            EvidenceMode::CodeAndRuntime => "code_and_runtime",
        }
    }
}

impl fmt::Display for EvidenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EvidenceMode {
    type Err = RubricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code_only" | "code-only" => Ok(EvidenceMode::CodeOnly),
            "code_and_runtime" | "code-and-runtime" => Ok(EvidenceMode::CodeAndRuntime),
            _ => Err(RubricError::InvalidValue {
                kind: "evidence mode",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RunPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Collecting,
    Scored,
    Reported,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Collecting => "collecting",
            RunPhase::Scored => "scored",
            RunPhase::Reported => "reported",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
