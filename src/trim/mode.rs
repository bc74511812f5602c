//! Trimming modes and the keep/trim decision.

use std::fmt;
use std::str::FromStr;

use super::site::{round4, SiteClassification};
use super::TrimError;

/// Column selection policy.
///
/// The `gappy` family compares gappyness inclusively against a user-given
/// threshold. The `smart-gap` family compares the gappyness rounded to four
/// decimals strictly against a threshold derived from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimmingMode {
    Gappy,
    SmartGap,
    Kpi,
    KpiGappy,
    KpiSmartGap,
    Kpic,
    KpicGappy,
    KpicSmartGap,
}

impl TrimmingMode {
    pub const ALL: [TrimmingMode; 8] = [
        TrimmingMode::Gappy,
        TrimmingMode::SmartGap,
        TrimmingMode::Kpi,
        TrimmingMode::KpiGappy,
        TrimmingMode::KpiSmartGap,
        TrimmingMode::Kpic,
        TrimmingMode::KpicGappy,
        TrimmingMode::KpicSmartGap,
    ];

    /// Command-line name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            TrimmingMode::Gappy => "gappy",
            TrimmingMode::SmartGap => "smart-gap",
            TrimmingMode::Kpi => "kpi",
            TrimmingMode::KpiGappy => "kpi-gappy",
            TrimmingMode::KpiSmartGap => "kpi-smart-gap",
            TrimmingMode::Kpic => "kpic",
            TrimmingMode::KpicGappy => "kpic-gappy",
            TrimmingMode::KpicSmartGap => "kpic-smart-gap",
        }
    }

    /// True for modes whose threshold comes from the gappyness distribution.
    pub fn is_smart_gap(&self) -> bool {
        matches!(
            self,
            TrimmingMode::SmartGap | TrimmingMode::KpiSmartGap | TrimmingMode::KpicSmartGap
        )
    }
}

impl fmt::Display for TrimmingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrimmingMode {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        TrimmingMode::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| TrimError::UnknownMode(s.to_string()))
    }
}

/// Decides whether a column is kept (`true`) or trimmed (`false`).
pub fn decide(
    mode: TrimmingMode,
    classification: &SiteClassification,
    gappyness: f64,
    threshold: f64,
) -> bool {
    let within_gappy = || gappyness <= threshold;
    let within_smart_gap = || round4(gappyness) < threshold;
    let pi = classification.parsimony_informative;
    let pi_or_constant = classification.is_informative_or_constant();

    match mode {
        TrimmingMode::Gappy => within_gappy(),
        TrimmingMode::SmartGap => within_smart_gap(),
        TrimmingMode::Kpi => pi,
        TrimmingMode::KpiGappy => within_gappy() && pi,
        TrimmingMode::KpiSmartGap => within_smart_gap() && pi,
        TrimmingMode::Kpic => pi_or_constant,
        TrimmingMode::KpicGappy => within_gappy() && pi_or_constant,
        TrimmingMode::KpicSmartGap => within_smart_gap() && pi_or_constant,
    }
}
