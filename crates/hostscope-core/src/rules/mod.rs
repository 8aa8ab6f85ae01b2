//! Rule evaluation over the aggregate
//!
//! Rules are pure predicates over a finished [`AnalyzerResult`]. Each one
//! yields at most one [`Finding`]; rules cannot see each other's output.

mod builtin;

use std::panic::{self, AssertUnwindSafe};

use hostscope_api::{AnalyzerResult, Finding};
use tracing::{debug, warn};

pub use builtin::{CanceledAreasRule, FailedAreasRule};

/// Stateless check over the aggregate
///
/// A rule that cannot find the data it expects (missing area, missing key,
/// wrong type) returns `None`. The [`hostscope_api::Details`] accessors
/// return `Result`, so `.ok()?` is the usual way to abstain.
pub trait Rule: Send + Sync {
    /// Stable identifier used in diagnostics
    fn id(&self) -> &str;

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding>;
}

/// Evaluate `rules` in order and collect their findings
///
/// A panicking rule is treated as abstaining.
#[must_use]
pub fn evaluate(rules: &[Box<dyn Rule>], result: &AnalyzerResult) -> Vec<Finding> {
    rules
        .iter()
        .filter_map(|rule| {
            match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(result))) {
                Ok(finding) => {
                    if finding.is_some() {
                        debug!(rule = rule.id(), "rule produced a finding");
                    }
                    finding
                }
                Err(_) => {
                    warn!(rule = rule.id(), "rule panicked, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Ordered set of rules
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    #[must_use]
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Engine with the rules that only look at area outcomes
    #[must_use]
    pub fn with_outcome_rules() -> Self {
        Self::new(vec![Box::new(FailedAreasRule), Box::new(CanceledAreasRule)])
    }

    /// Append a rule after the existing ones
    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Findings of every rule, in registration order
    #[must_use]
    pub fn evaluate(&self, result: &AnalyzerResult) -> Vec<Finding> {
        evaluate(&self.rules, result)
    }

    /// Return `result` with the rule findings appended to its global findings
    #[must_use]
    pub fn apply(&self, result: AnalyzerResult) -> AnalyzerResult {
        let findings = self.evaluate(&result);
        result.with_global_findings(findings)
    }
}
