pub mod diagnostics;
pub mod policy;
pub mod reports;
pub mod simulation;

use serde::Serialize;

pub use diagnostics::{CheckResult, run_field_manual};
pub use simulation::{CampaignRun, SimulationPlan, run_campaigns};

/// Suites selectable from the command line.
pub const SUITES: &[(&str, &str)] = &[
    (
        "field-manual",
        "Rules compliance checks against the diagnostics interface",
    ),
    (
        "campaign",
        "Seeded full-campaign auto-play for both factions",
    ),
];

/// Everything one tester invocation produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub checks: Vec<CheckResult>,
    pub campaigns: Vec<CampaignRun>,
}

impl SuiteReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty() && self.campaigns.is_empty()
    }

    #[must_use]
    pub fn failed_checks(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    #[must_use]
    pub fn failed_campaigns(&self) -> usize {
        self.campaigns.iter().filter(|c| !c.passed).count()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed_checks() == 0 && self.failed_campaigns() == 0
    }
}
