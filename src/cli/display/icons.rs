//! Status icons for CLI output

use crate::domain::deploy::Upsert;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Unit created, updated or rendered
    pub const SUCCESS: &'static str = "✓";

    /// Some units of a batch failed
    pub const WARNING: &'static str = "⚠";

    /// Unit failed
    pub const ERROR: &'static str = "✗";

    /// Rendered only, nothing submitted
    pub const DRY_RUN: &'static str = "○";

    pub fn for_upsert<K>(outcome: &Upsert<K>) -> &'static str {
        if outcome.is_dry_run() {
            Self::DRY_RUN
        } else {
            Self::SUCCESS
        }
    }

    /// Icon summarising a batch
    pub fn for_summary(failed: usize, total: usize) -> &'static str {
        if failed == 0 {
            Self::SUCCESS
        } else if failed < total {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_summary() {
        assert_eq!(StatusIcon::for_summary(0, 3), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::for_summary(2, 3), StatusIcon::WARNING);
        assert_eq!(StatusIcon::for_summary(3, 3), StatusIcon::ERROR);
    }

    #[test]
    fn test_for_upsert() {
        assert_eq!(StatusIcon::for_upsert(&Upsert::Created(())), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::for_upsert(&Upsert::DryRun(())), StatusIcon::DRY_RUN);
    }
}
