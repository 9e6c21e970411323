//! Province-wide race commands.
//!
//! The argument surface accepts these races, but the source has never
//! published their entry URLs. Running one fails with a descriptive
//! error instead of silently producing nothing.

use crate::commands::Race;
use anyhow::Result;

/// Placeholder handler for the province-wide races.
pub struct ProvinceCommand {
    race: Race,
}

impl ProvinceCommand {
    pub fn new(race: Race) -> Self {
        Self { race }
    }

    pub fn execute(&self) -> Result<()> {
        anyhow::bail!(
            "the '{}' race has no published entry URL yet; use 'municipality --url <URL>' instead",
            self.race
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_province_races_fail_with_descriptive_error() {
        for race in [Race::Senators, Race::Deputies, Race::Councilors] {
            let err = ProvinceCommand::new(race).execute().unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains(race.as_str()));
            assert!(msg.contains("municipality --url"));
        }
    }
}
