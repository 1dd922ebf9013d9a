use crate::catalog::Catalog;
use crate::error::Result;
use crate::types::{Category, SeverityTier, VerdictStatus};
use crate::verdict::VerdictSet;
use serde::{Deserialize, Serialize};

/// A FAIL verdict joined with the rule it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub category: Category,
    pub severity_tier: SeverityTier,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// FAIL findings, most severe tier first, rule id ascending within a tier.
pub fn rank(catalog: &Catalog, verdicts: &VerdictSet) -> Result<Vec<Finding>> {
    verdicts.check_catalog(catalog)?;

    let mut findings = verdicts
        .iter()
        .filter(|v| v.status == VerdictStatus::Fail)
        .map(|v| {
            let rule = catalog.lookup(&v.rule_id)?;
            Ok(Finding {
                rule_id: rule.id.clone(),
                category: rule.category,
                severity_tier: rule.severity_tier,
                description: rule.description.clone(),
                evidence: v.evidence.clone(),
                remediation: rule.remediation.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    findings.sort_by(|a, b| {
        a.severity_tier
            .cmp(&b.severity_tier)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin, tests::sample};
    use crate::verdict::tests::finalized;
    use crate::verdict::{Verdict, VerdictCollector};
    use crate::types::VerdictStatus::*;

    #[test]
    fn worked_example_has_single_finding() {
        let cat = sample();
        let set = finalized(&cat, &[("R1", Pass), ("R2", Fail), ("R3", Unknown), ("R4", Pass)]);
        let findings = rank(&cat, &set).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "R2");
        assert_eq!(findings[0].remediation.as_deref(), Some("fix r2"));
    }

    #[test]
    fn no_failures_means_no_findings() {
        let cat = sample();
        let set = finalized(&cat, &[("R1", Pass), ("R2", Unknown), ("R3", Unknown), ("R4", Pass)]);
        assert!(rank(&cat, &set).unwrap().is_empty());
    }

    #[test]
    fn sorted_by_tier_then_id() {
        let cat = builtin();
        let failing = ["AUD-02", "UI-03", "CTRL-04", "CORE-09", "CORE-01", "UI-01", "CTRL-01"];
        let mut c = VerdictCollector::new(cat);
        for rule in cat.rules() {
            let status = if failing.contains(&rule.id.as_str()) { Fail } else { Pass };
            c.submit(Verdict::new(rule.id.clone(), status).with_evidence("seen"))
                .unwrap();
        }
        let set = c.finalize().unwrap();
        let ids: Vec<String> = rank(cat, &set).unwrap().into_iter().map(|f| f.rule_id).collect();
        assert_eq!(
            ids,
            vec!["CORE-01", "CORE-09", "CTRL-01", "CTRL-04", "UI-01", "UI-03", "AUD-02"]
        );

        let again: Vec<String> = rank(cat, &set).unwrap().into_iter().map(|f| f.rule_id).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn tier_outranks_id() {
        // ids that sort opposite to their tiers
        let def = crate::catalog::CatalogDef {
            version: "tiers".to_string(),
            rules: vec![
                crate::catalog::RuleDef {
                    id: "A".to_string(),
                    category: Category::Audio,
                    weight: 1.0,
                    severity_tier: 4,
                    description: "a".to_string(),
                    remediation: None,
                },
                crate::catalog::RuleDef {
                    id: "Z".to_string(),
                    category: Category::Core,
                    weight: 1.0,
                    severity_tier: 1,
                    description: "z".to_string(),
                    remediation: None,
                },
            ],
            deferred: vec![],
        };
        let cat = Catalog::load(def).unwrap();
        let set = finalized(&cat, &[("A", Fail), ("Z", Fail)]);
        let findings = rank(&cat, &set).unwrap();
        assert_eq!(findings[0].rule_id, "Z");
        assert_eq!(findings[1].rule_id, "A");
    }
}
