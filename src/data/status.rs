//! Threshold-based status classification.

use serde::{Deserialize, Serialize};

/// Warning/critical thresholds for a single metric.
///
/// Either bound may be absent. Both comparisons are inclusive: a value equal
/// to a threshold is at that level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self {
            warning: Some(warning),
            critical: Some(critical),
        }
    }

    /// Whether the pair is internally consistent (`warning <= critical`).
    pub fn is_consistent(&self) -> bool {
        match (self.warning, self.critical) {
            (Some(w), Some(c)) => w <= c,
            _ => true,
        }
    }
}

/// Status level of a metric card.
///
/// Ordered from least to most severe so that `max()` yields the worst status
/// across a set of cards. `Unknown` ranks above `Ok`: missing data deserves
/// more attention than a healthy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Ok,
    Unknown,
    Warning,
    Critical,
}

impl Status {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Unknown => "N/A",
            Status::Warning => "WARN",
            Status::Critical => "CRIT",
        }
    }

    /// Lowercase name for log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Unknown => "unknown",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

/// Classify a value against optional thresholds.
pub fn classify(value: Option<f64>, thresholds: Option<&Thresholds>) -> Status {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return Status::Unknown;
    };
    let Some(thresholds) = thresholds else {
        return Status::Ok;
    };

    if thresholds.critical.is_some_and(|c| value >= c) {
        Status::Critical
    } else if thresholds.warning.is_some_and(|w| value >= w) {
        Status::Warning
    } else {
        Status::Ok
    }
}

/// Classify `numerator / denominator` against ratio thresholds.
///
/// An absent or zero denominator yields `Unknown` rather than a division by
/// zero, so the card is left uncolored.
pub fn classify_ratio(
    numerator: Option<f64>,
    denominator: Option<f64>,
    thresholds: Option<&Thresholds>,
) -> Status {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => classify(Some(n / d), thresholds),
        _ => Status::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> Thresholds {
        Thresholds::new(0.85, 0.95)
    }

    #[test]
    fn absent_or_nan_is_unknown() {
        assert_eq!(classify(None, Some(&cpu())), Status::Unknown);
        assert_eq!(classify(Some(f64::NAN), Some(&cpu())), Status::Unknown);
    }

    #[test]
    fn no_thresholds_is_ok() {
        assert_eq!(classify(Some(1e9), None), Status::Ok);
        assert_eq!(classify(Some(1e9), Some(&Thresholds::default())), Status::Ok);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = Thresholds::new(10.0, 50.0);
        assert_eq!(classify(Some(9.999), Some(&t)), Status::Ok);
        assert_eq!(classify(Some(10.0), Some(&t)), Status::Warning);
        assert_eq!(classify(Some(49.0), Some(&t)), Status::Warning);
        assert_eq!(classify(Some(50.0), Some(&t)), Status::Critical);
        assert_eq!(classify(Some(51.0), Some(&t)), Status::Critical);
    }

    #[test]
    fn warning_from_zero_threshold() {
        let t = Thresholds::new(0.0, 5.0);
        assert_eq!(classify(Some(4.0), Some(&t)), Status::Warning);
        assert_eq!(classify(Some(-1.0), Some(&t)), Status::Ok);
    }

    #[test]
    fn only_one_bound_defined() {
        let warn_only = Thresholds {
            warning: Some(1.0),
            critical: None,
        };
        assert_eq!(classify(Some(100.0), Some(&warn_only)), Status::Warning);

        let crit_only = Thresholds {
            warning: None,
            critical: Some(3.0),
        };
        assert_eq!(classify(Some(2.0), Some(&crit_only)), Status::Ok);
        assert_eq!(classify(Some(3.0), Some(&crit_only)), Status::Critical);
    }

    #[test]
    fn cpu_at_ninety_percent_is_warning() {
        assert_eq!(classify(Some(0.90), Some(&cpu())), Status::Warning);
    }

    #[test]
    fn ratio_uses_quotient() {
        let heap = Thresholds::new(0.75, 0.9);
        assert_eq!(classify_ratio(Some(800.0), Some(1000.0), Some(&heap)), Status::Warning);
        assert_eq!(classify_ratio(Some(950.0), Some(1000.0), Some(&heap)), Status::Critical);
        assert_eq!(classify_ratio(Some(100.0), Some(1000.0), Some(&heap)), Status::Ok);
    }

    #[test]
    fn ratio_without_denominator_is_unknown() {
        let heap = Thresholds::new(0.75, 0.9);
        assert_eq!(classify_ratio(Some(800.0), None, Some(&heap)), Status::Unknown);
        assert_eq!(classify_ratio(Some(800.0), Some(0.0), Some(&heap)), Status::Unknown);
        assert_eq!(classify_ratio(None, Some(1000.0), Some(&heap)), Status::Unknown);
    }

    #[test]
    fn worst_status_ordering() {
        let worst = [Status::Ok, Status::Warning, Status::Unknown].into_iter().max();
        assert_eq!(worst, Some(Status::Warning));
        assert!(Status::Critical > Status::Warning);
        assert!(Status::Unknown > Status::Ok);
    }

    #[test]
    fn consistency_check() {
        assert!(Thresholds::new(1.0, 2.0).is_consistent());
        assert!(!Thresholds::new(3.0, 2.0).is_consistent());
        assert!(Thresholds::default().is_consistent());
    }

    #[test]
    fn class_names_for_logs() {
        let classes: Vec<&str> = [Status::Ok, Status::Unknown, Status::Warning, Status::Critical]
            .iter()
            .map(Status::class)
            .collect();
        assert_eq!(classes, ["ok", "unknown", "warning", "critical"]);
    }
}
