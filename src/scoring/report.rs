use serde::{Deserialize, Serialize};
use std::fmt;

use super::raw::RawScore;
use crate::error::ScoreError;

/// Qualitative band for an overall percentage. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    NeedsMajorRevisions,
    GoodButImprovable,
    InvestorReady,
}

impl Interpretation {
    /// `< 50` needs major revisions, `[50, 80)` good but improvable, `>= 80` investor ready.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 50.0 {
            Interpretation::NeedsMajorRevisions
        } else if percentage < 80.0 {
            Interpretation::GoodButImprovable
        } else {
            Interpretation::InvestorReady
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interpretation::NeedsMajorRevisions => "Needs major revisions",
            Interpretation::GoodButImprovable => "Good, but improvable",
            Interpretation::InvestorReady => "Investor ready",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of evaluating one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeightedResult {
    /// Weighted points in [0, weight], rounded to 2 decimals.
    Scored { points: f64 },
    /// The category's skip subfactor carried the sentinel.
    Skipped,
    /// Evaluation failed and the caller chose to leave the category out.
    Excluded { reason: String },
}

impl WeightedResult {
    pub fn points(&self) -> Option<f64> {
        match self {
            WeightedResult::Scored { points } => Some(*points),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, WeightedResult::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubfactorScore {
    pub name: String,
    pub score: RawScore,
}

/// Per-category detail of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub weight: f64,
    /// Raw scores in rubric order; subfactors the provider left out are absent.
    pub subfactor_scores: Vec<SubfactorScore>,
    pub result: WeightedResult,
}

/// Result of scoring one input against a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub categories: Vec<CategoryScore>,
    /// Sum of weighted points over evaluated categories.
    pub total_points: f64,
    /// Sum of weights over evaluated categories.
    pub effective_weight: f64,
    /// 0-100, 2 decimals.
    pub overall_percentage: f64,
    pub interpretation: Interpretation,
}

impl ScoreReport {
    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &CategoryScore> {
        self.categories.iter().filter(|c| c.result.is_skipped())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total_points: f64,
    pub effective_weight: f64,
    pub overall_percentage: f64,
    pub interpretation: Interpretation,
}

/// Combine weighted results into an overall percentage.
///
/// Skipped and excluded categories drop out of the denominator as well as the
/// numerator, so an inapplicable category is treated as absent rather than as
/// a zero.
pub fn aggregate(categories: &[CategoryScore]) -> Result<Aggregate, ScoreError> {
    let (total_points, effective_weight) = categories
        .iter()
        .filter_map(|c| c.result.points().map(|points| (points, c.weight)))
        .fold((0.0, 0.0), |(points, weight), (p, w)| (points + p, weight + w));

    if effective_weight <= 0.0 {
        return Err(ScoreError::NoApplicableCategories);
    }

    let overall_percentage = round2(total_points / effective_weight * 100.0);

    Ok(Aggregate {
        total_points: round2(total_points),
        effective_weight,
        overall_percentage,
        interpretation: Interpretation::from_percentage(overall_percentage),
    })
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(name: &str, weight: f64, points: f64) -> CategoryScore {
        CategoryScore {
            name: name.to_string(),
            weight,
            subfactor_scores: vec![],
            result: WeightedResult::Scored { points },
        }
    }

    fn skipped(name: &str, weight: f64) -> CategoryScore {
        CategoryScore {
            name: name.to_string(),
            weight,
            subfactor_scores: vec![],
            result: WeightedResult::Skipped,
        }
    }

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(Interpretation::from_percentage(0.0), Interpretation::NeedsMajorRevisions);
        assert_eq!(Interpretation::from_percentage(49.99), Interpretation::NeedsMajorRevisions);
        assert_eq!(Interpretation::from_percentage(50.0), Interpretation::GoodButImprovable);
        assert_eq!(Interpretation::from_percentage(79.99), Interpretation::GoodButImprovable);
        assert_eq!(Interpretation::from_percentage(80.0), Interpretation::InvestorReady);
        assert_eq!(Interpretation::from_percentage(100.0), Interpretation::InvestorReady);
    }

    #[test]
    fn test_interpretation_ordering() {
        assert!(Interpretation::NeedsMajorRevisions < Interpretation::GoodButImprovable);
        assert!(Interpretation::GoodButImprovable < Interpretation::InvestorReady);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1600.0 / 3.0), 533.33);
        assert_eq!(round2(160.0 / 3.0), 53.33);
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }

    #[test]
    fn test_aggregate_renormalizes_over_evaluated() {
        let categories = vec![
            scored("A", 20.0, 20.0),
            scored("B", 10.0, 10.0),
            skipped("IP", 5.0),
        ];
        let result = aggregate(&categories).unwrap();
        assert_eq!(result.effective_weight, 30.0);
        assert_eq!(result.overall_percentage, 100.0);
        assert_eq!(result.interpretation, Interpretation::InvestorReady);
    }

    #[test]
    fn test_aggregate_partial_scores() {
        let categories = vec![scored("A", 20.0, 15.0), scored("B", 10.0, 3.0)];
        let result = aggregate(&categories).unwrap();
        assert_eq!(result.total_points, 18.0);
        assert_eq!(result.overall_percentage, 60.0);
        assert_eq!(result.interpretation, Interpretation::GoodButImprovable);
    }

    #[test]
    fn test_aggregate_excluded_left_out() {
        let categories = vec![
            scored("A", 20.0, 10.0),
            CategoryScore {
                name: "B".to_string(),
                weight: 10.0,
                subfactor_scores: vec![],
                result: WeightedResult::Excluded {
                    reason: "bad input".to_string(),
                },
            },
        ];
        let result = aggregate(&categories).unwrap();
        assert_eq!(result.effective_weight, 20.0);
        assert_eq!(result.overall_percentage, 50.0);
    }

    #[test]
    fn test_aggregate_all_skipped() {
        let categories = vec![skipped("IP", 5.0), skipped("Patents", 5.0)];
        assert_eq!(aggregate(&categories), Err(ScoreError::NoApplicableCategories));
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(&[]), Err(ScoreError::NoApplicableCategories));
    }

    #[test]
    fn test_weighted_result_serialization() {
        let json = serde_json::to_value(WeightedResult::Scored { points: 15.0 }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "scored", "points": 15.0 }));

        let json = serde_json::to_value(WeightedResult::Skipped).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "skipped" }));
    }
}
