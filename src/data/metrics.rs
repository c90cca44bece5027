use std::fmt;

use super::model::columns;

// ---------------------------------------------------------------------------
// Derived metrics computed at load time
// ---------------------------------------------------------------------------

/// A normalized rate computed from two raw stat columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivedMetric {
    GoalsPerMatch,
    AssistsPerMatch,
    GoalsPer90,
    AssistsPer90,
    MinutesPerMatch,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 5] = [
        DerivedMetric::GoalsPerMatch,
        DerivedMetric::AssistsPerMatch,
        DerivedMetric::GoalsPer90,
        DerivedMetric::AssistsPer90,
        DerivedMetric::MinutesPerMatch,
    ];

    /// Name of the column the metric is stored under.
    pub fn column(self) -> &'static str {
        match self {
            DerivedMetric::GoalsPerMatch => "goals_per_match",
            DerivedMetric::AssistsPerMatch => "assists_per_match",
            DerivedMetric::GoalsPer90 => "goals_per_90",
            DerivedMetric::AssistsPer90 => "assists_per_90",
            DerivedMetric::MinutesPerMatch => "minutes_per_match",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DerivedMetric::GoalsPerMatch => "Goals / match",
            DerivedMetric::AssistsPerMatch => "Assists / match",
            DerivedMetric::GoalsPer90 => "Goals / 90",
            DerivedMetric::AssistsPer90 => "Assists / 90",
            DerivedMetric::MinutesPerMatch => "Minutes / match",
        }
    }

    pub fn numerator(self) -> &'static str {
        match self {
            DerivedMetric::GoalsPerMatch | DerivedMetric::GoalsPer90 => columns::GLS,
            DerivedMetric::AssistsPerMatch | DerivedMetric::AssistsPer90 => columns::AST,
            DerivedMetric::MinutesPerMatch => columns::MIN,
        }
    }

    pub fn denominator(self) -> &'static str {
        match self {
            DerivedMetric::GoalsPer90 | DerivedMetric::AssistsPer90 => columns::MIN,
            _ => columns::MP,
        }
    }

    /// Source columns, all of which must exist for the metric to be computed.
    pub fn sources(self) -> [&'static str; 2] {
        [self.numerator(), self.denominator()]
    }

    fn scale(self) -> f64 {
        match self {
            DerivedMetric::GoalsPer90 | DerivedMetric::AssistsPer90 => 90.0,
            _ => 1.0,
        }
    }

    /// Compute the metric for one row. Never returns NaN or infinity.
    pub fn compute(self, numerator: Option<f64>, denominator: Option<f64>) -> f64 {
        safe_ratio(numerator, denominator) * self.scale()
    }
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// `numerator / denominator`, with every degenerate case mapped to 0:
/// a missing operand, a zero denominator, or a non-finite result.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    let (Some(n), Some(d)) = (numerator, denominator) else {
        return 0.0;
    };
    if d == 0.0 {
        return 0.0;
    }
    let ratio = n / d;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_zero() {
        for metric in DerivedMetric::ALL {
            assert_eq!(metric.compute(Some(5.0), Some(0.0)), 0.0, "{metric}");
            assert_eq!(metric.compute(Some(0.0), Some(0.0)), 0.0, "{metric}");
        }
    }

    #[test]
    fn missing_operands_are_zero() {
        assert_eq!(safe_ratio(None, Some(3.0)), 0.0);
        assert_eq!(safe_ratio(Some(3.0), None), 0.0);
        assert_eq!(safe_ratio(Some(f64::NAN), Some(3.0)), 0.0);
        assert_eq!(safe_ratio(Some(f64::INFINITY), Some(3.0)), 0.0);
    }

    #[test]
    fn per_90_scales_by_minutes() {
        let v = DerivedMetric::GoalsPer90.compute(Some(5.0), Some(900.0));
        assert!((v - 0.5).abs() < 1e-12);
        let v = DerivedMetric::GoalsPerMatch.compute(Some(3.0), Some(8.0));
        assert!((v - 0.375).abs() < 1e-12);
    }

    #[test]
    fn sources_name_raw_columns() {
        assert_eq!(DerivedMetric::AssistsPer90.sources(), ["Ast", "Min"]);
        assert_eq!(DerivedMetric::MinutesPerMatch.sources(), ["Min", "MP"]);
    }
}
