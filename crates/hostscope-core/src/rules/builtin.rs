//! Rules that only look at area outcomes

use hostscope_api::{AnalyzerResult, AreaOutcome, Finding};

use super::Rule;

fn areas_with(result: &AnalyzerResult, outcome: AreaOutcome) -> Vec<&str> {
    result
        .areas
        .iter()
        .filter(|a| a.outcome == outcome)
        .map(|a| a.area.as_str())
        .collect()
}

/// Warns when one or more areas failed to collect
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedAreasRule;

impl Rule for FailedAreasRule {
    fn id(&self) -> &str {
        "failed-areas"
    }

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding> {
        let failed = areas_with(result, AreaOutcome::Failed);
        if failed.is_empty() {
            return None;
        }
        Some(
            Finding::warning(format!(
                "{} area(s) could not be collected; the report is incomplete",
                failed.len()
            ))
            .with_context(failed.join(", ")),
        )
    }
}

/// Notes areas that were canceled before completing
#[derive(Debug, Clone, Copy, Default)]
pub struct CanceledAreasRule;

impl Rule for CanceledAreasRule {
    fn id(&self) -> &str {
        "canceled-areas"
    }

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding> {
        let canceled = areas_with(result, AreaOutcome::Canceled);
        if canceled.is_empty() {
            return None;
        }
        Some(
            Finding::info(format!("{} area(s) were canceled", canceled.len()))
                .with_context(canceled.join(", ")),
        )
    }
}
