use super::raw::{RawScore, RawScores, SubfactorScores};
use super::report::{aggregate, round2, CategoryScore, ScoreReport, SubfactorScore, WeightedResult};
use crate::error::{EvaluationError, ScoreError};
use crate::rubric::{CompiledCategory, CompiledRubric};

const BOUND_TOLERANCE: f64 = 1e-9;

/// What to do when a single category fails to evaluate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryErrorPolicy {
    /// Abort the whole request with the category's error.
    #[default]
    Fail,
    /// Record the category as excluded and leave it out of the aggregate.
    Exclude,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    pub on_category_error: CategoryErrorPolicy,
}

/// Map a raw subfactor score to [0, 1]. The skip sentinel counts as 0.
pub fn normalize(subfactor: &str, raw: &RawScore) -> Result<f64, EvaluationError> {
    match raw {
        RawScore::Value(v) if v.is_finite() && (0.0..=100.0).contains(v) => Ok(v / 100.0),
        RawScore::Value(v) => Err(EvaluationError::ScoreRange {
            subfactor: subfactor.to_string(),
            value: *v,
        }),
        RawScore::Skip => Ok(0.0),
        RawScore::Invalid(value) => Err(EvaluationError::InvalidValue {
            subfactor: subfactor.to_string(),
            value: value.clone(),
        }),
    }
}

/// Evaluate one category's formula against its raw subfactor scores.
///
/// A skippable category whose skip subfactor carries the sentinel returns
/// `Skipped` before anything else is looked at.
pub fn evaluate_category(
    category: &CompiledCategory,
    scores: Option<&SubfactorScores>,
) -> Result<WeightedResult, EvaluationError> {
    if let Some(skip) = category.skip_subfactor() {
        if let Some(RawScore::Skip) = scores.and_then(|s| s.get(skip)) {
            return Ok(WeightedResult::Skipped);
        }
    }

    let mut normalized = Vec::with_capacity(category.subfactors().len());
    for subfactor in category.subfactors() {
        let raw = scores
            .and_then(|s| s.get(subfactor))
            .ok_or_else(|| EvaluationError::MissingSubfactor {
                subfactor: subfactor.clone(),
            })?;
        normalized.push(normalize(subfactor, raw)?);
    }

    let value = category.formula().eval(&category.bind(&normalized))?;
    let weight = category.weight();
    if value < -BOUND_TOLERANCE || value > weight + BOUND_TOLERANCE {
        return Err(EvaluationError::OutOfBounds { value, weight });
    }

    Ok(WeightedResult::Scored {
        points: round2(value),
    })
}

/// Score raw subfactor scores against a compiled rubric, failing on the first
/// category that cannot be evaluated.
pub fn score(raw: &RawScores, rubric: &CompiledRubric) -> Result<ScoreReport, ScoreError> {
    score_with(raw, rubric, ScoreOptions::default())
}

pub fn score_with(
    raw: &RawScores,
    rubric: &CompiledRubric,
    options: ScoreOptions,
) -> Result<ScoreReport, ScoreError> {
    for name in raw.keys() {
        if rubric.category(name).is_none() {
            tracing::warn!(category = %name, "ignoring scores for a category not in the rubric");
        }
    }

    let mut categories = Vec::with_capacity(rubric.categories().len());

    for category in rubric.categories() {
        let scores = raw.get(category.name());
        let result = match evaluate_category(category, scores) {
            Ok(result) => result,
            Err(source) => match options.on_category_error {
                CategoryErrorPolicy::Fail => {
                    return Err(ScoreError::Category {
                        category: category.name().to_string(),
                        source,
                    })
                }
                CategoryErrorPolicy::Exclude => {
                    tracing::warn!(
                        category = category.name(),
                        error = %source,
                        "excluding category from aggregate"
                    );
                    WeightedResult::Excluded {
                        reason: source.to_string(),
                    }
                }
            },
        };

        tracing::debug!(category = category.name(), ?result, "category evaluated");

        categories.push(CategoryScore {
            name: category.name().to_string(),
            weight: category.weight(),
            subfactor_scores: collect_subfactors(category, scores),
            result,
        });
    }

    let summary = aggregate(&categories)?;

    Ok(ScoreReport {
        categories,
        total_points: summary.total_points,
        effective_weight: summary.effective_weight,
        overall_percentage: summary.overall_percentage,
        interpretation: summary.interpretation,
    })
}

fn collect_subfactors(
    category: &CompiledCategory,
    scores: Option<&SubfactorScores>,
) -> Vec<SubfactorScore> {
    let Some(scores) = scores else {
        return Vec::new();
    };
    category
        .subfactors()
        .iter()
        .filter_map(|name| {
            scores.get(name).map(|score| SubfactorScore {
                name: name.clone(),
                score: score.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use crate::rubric::{CategoryDefinition, Rubric};
    use crate::scoring::Interpretation;

    fn compile(categories: Vec<CategoryDefinition>) -> CompiledRubric {
        CompiledRubric::compile(Rubric { categories }).unwrap()
    }

    fn category(name: &str, weight: f64, subfactors: &[&str], formula: &str) -> CategoryDefinition {
        CategoryDefinition {
            name: name.to_string(),
            weight,
            subfactors: subfactors.iter().map(|s| s.to_string()).collect(),
            formula: formula.to_string(),
            skip_subfactor: None,
        }
    }

    fn scores(pairs: &[(&str, RawScore)]) -> SubfactorScores {
        pairs
            .iter()
            .map(|(name, score)| (name.to_string(), score.clone()))
            .collect()
    }

    /// Every subfactor of every category set to `value`.
    fn uniform(rubric: &CompiledRubric, value: RawScore) -> RawScores {
        rubric
            .categories()
            .iter()
            .map(|c| {
                let subs: SubfactorScores = c
                    .subfactors()
                    .iter()
                    .map(|s| (s.clone(), value.clone()))
                    .collect();
                (c.name().to_string(), subs)
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_single_category() {
        let rubric = compile(vec![category("Solo", 20.0, &["A", "B"], "({A}+{B})/2*20")]);
        let mut raw = RawScores::new();
        raw.insert(
            "Solo".to_string(),
            scores(&[("A", RawScore::Value(50.0)), ("B", RawScore::Value(100.0))]),
        );

        let report = score(&raw, &rubric).unwrap();
        assert_eq!(
            report.categories[0].result,
            WeightedResult::Scored { points: 15.0 }
        );
        assert_eq!(report.overall_percentage, 75.0);
        assert_eq!(report.interpretation, Interpretation::GoodButImprovable);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // 2/3 * 80 = 53.333...
        let rubric = compile(vec![category(
            "Thirds",
            80.0,
            &["A", "B", "C"],
            "({A}+{B}+{C})/3*80",
        )]);
        let s = scores(&[
            ("A", RawScore::Value(100.0)),
            ("B", RawScore::Value(100.0)),
            ("C", RawScore::Value(0.0)),
        ]);
        let result = evaluate_category(&rubric.categories()[0], Some(&s)).unwrap();
        assert_eq!(result, WeightedResult::Scored { points: 53.33 });
    }

    #[test]
    fn test_rounding_of_overall_percentage() {
        // (70+80+90)/3 on weight 20 gives 16 points; with a zeroed weight-10
        // category the overall is 1600/30 = 53.333...
        let rubric = compile(vec![
            category("Thirds", 20.0, &["A", "B", "C"], "({A}+{B}+{C})/3*20"),
            category("Zero", 10.0, &["D"], "{D}*10"),
        ]);
        let mut raw = RawScores::new();
        raw.insert(
            "Thirds".to_string(),
            scores(&[
                ("A", RawScore::Value(70.0)),
                ("B", RawScore::Value(80.0)),
                ("C", RawScore::Value(90.0)),
            ]),
        );
        raw.insert("Zero".to_string(), scores(&[("D", RawScore::Value(0.0))]));

        let report = score(&raw, &rubric).unwrap();
        assert_eq!(
            report.categories[0].result,
            WeightedResult::Scored { points: 16.0 }
        );
        assert_eq!(report.overall_percentage, 53.33);
        assert_eq!(report.interpretation, Interpretation::GoodButImprovable);
    }

    #[test]
    fn test_default_rubric_full_marks() {
        let rubric = CompiledRubric::compile(Rubric::default()).unwrap();
        let raw = uniform(&rubric, RawScore::Value(100.0));

        let report = score(&raw, &rubric).unwrap();
        for category in &report.categories {
            assert_eq!(
                category.result,
                WeightedResult::Scored {
                    points: category.weight
                },
                "{} should reach its full weight",
                category.name
            );
        }
        assert_eq!(report.overall_percentage, 100.0);
        assert_eq!(report.interpretation, Interpretation::InvestorReady);
    }

    #[test]
    fn test_default_rubric_all_zero() {
        let rubric = CompiledRubric::compile(Rubric::default()).unwrap();
        let raw = uniform(&rubric, RawScore::Value(0.0));

        let report = score(&raw, &rubric).unwrap();
        assert_eq!(report.overall_percentage, 0.0);
        assert_eq!(report.interpretation, Interpretation::NeedsMajorRevisions);
        assert_eq!(report.skipped().count(), 0);
    }

    #[test]
    fn test_skipped_category_renormalizes() {
        let rubric = CompiledRubric::compile(Rubric::default()).unwrap();
        let mut raw = uniform(&rubric, RawScore::Value(100.0));
        raw.get_mut("IP / Defensibility")
            .unwrap()
            .insert("IP Evidence".to_string(), RawScore::Skip);

        let report = score(&raw, &rubric).unwrap();
        assert!(report.category("IP / Defensibility").unwrap().result.is_skipped());
        assert_eq!(report.effective_weight, 160.0);
        assert_eq!(report.overall_percentage, 100.0);
    }

    #[test]
    fn test_skip_alongside_two_scored_categories() {
        let rubric = compile(vec![
            category("Market", 20.0, &["A"], "{A}*20"),
            category("Team", 10.0, &["B"], "{B}*10"),
            category("IP", 5.0, &["IP Evidence"], "{IP Evidence}*5").skippable_by("IP Evidence"),
        ]);
        let mut raw = RawScores::new();
        raw.insert("Market".to_string(), scores(&[("A", RawScore::Value(100.0))]));
        raw.insert("Team".to_string(), scores(&[("B", RawScore::Value(100.0))]));
        raw.insert("IP".to_string(), scores(&[("IP Evidence", RawScore::Skip)]));

        let report = score(&raw, &rubric).unwrap();
        assert_eq!(report.overall_percentage, 100.0);
        assert_eq!(report.effective_weight, 30.0);
    }

    #[test]
    fn test_skip_ignores_malformed_siblings() {
        let rubric = compile(vec![
            category("Market", 20.0, &["A"], "{A}*20"),
            category("IP", 10.0, &["Evidence", "Filings"], "({Evidence}+{Filings})/2*10")
                .skippable_by("Evidence"),
        ]);
        let mut raw = RawScores::new();
        raw.insert("Market".to_string(), scores(&[("A", RawScore::Value(40.0))]));
        raw.insert(
            "IP".to_string(),
            scores(&[
                ("Evidence", RawScore::Skip),
                ("Filings", RawScore::Value(900.0)),
            ]),
        );

        let report = score(&raw, &rubric).unwrap();
        assert!(report.category("IP").unwrap().result.is_skipped());
        assert_eq!(report.overall_percentage, 40.0);
    }

    #[test]
    fn test_sentinel_on_non_controlling_subfactor_counts_as_zero() {
        let rubric = compile(vec![category("Market", 10.0, &["A", "B"], "({A}+{B})/2*10")]);
        let s = scores(&[("A", RawScore::Skip), ("B", RawScore::Value(100.0))]);
        let result = evaluate_category(&rubric.categories()[0], Some(&s)).unwrap();
        assert_eq!(result, WeightedResult::Scored { points: 5.0 });
    }

    #[test]
    fn test_all_categories_skipped() {
        let rubric = compile(vec![
            category("IP", 5.0, &["E"], "{E}*5").skippable_by("E"),
            category("Patents", 5.0, &["P"], "{P}*5").skippable_by("P"),
        ]);
        let mut raw = RawScores::new();
        raw.insert("IP".to_string(), scores(&[("E", RawScore::Skip)]));
        raw.insert("Patents".to_string(), scores(&[("P", RawScore::Skip)]));

        assert_eq!(score(&raw, &rubric), Err(ScoreError::NoApplicableCategories));
    }

    #[test]
    fn test_out_of_range_score() {
        let rubric = compile(vec![category("Solo", 20.0, &["A", "B"], "({A}+{B})/2*20")]);
        let mut raw = RawScores::new();
        raw.insert(
            "Solo".to_string(),
            scores(&[("A", RawScore::Value(150.0)), ("B", RawScore::Value(100.0))]),
        );

        let err = score(&raw, &rubric).unwrap_err();
        assert_eq!(
            err,
            ScoreError::Category {
                category: "Solo".to_string(),
                source: EvaluationError::ScoreRange {
                    subfactor: "A".to_string(),
                    value: 150.0
                },
            }
        );
    }

    #[test]
    fn test_negative_score_rejected() {
        assert!(matches!(
            normalize("A", &RawScore::Value(-1.0)),
            Err(EvaluationError::ScoreRange { .. })
        ));
    }

    #[test]
    fn test_missing_subfactor() {
        let rubric = compile(vec![category("Solo", 20.0, &["A", "B"], "({A}+{B})/2*20")]);
        let s = scores(&[("A", RawScore::Value(50.0))]);
        assert_eq!(
            evaluate_category(&rubric.categories()[0], Some(&s)),
            Err(EvaluationError::MissingSubfactor {
                subfactor: "B".to_string()
            })
        );
    }

    #[test]
    fn test_missing_category_fails() {
        let rubric = compile(vec![category("Solo", 20.0, &["A"], "{A}*20")]);
        let err = score(&RawScores::new(), &rubric).unwrap_err();
        assert!(matches!(
            err,
            ScoreError::Category {
                source: EvaluationError::MissingSubfactor { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_value() {
        let rubric = compile(vec![category("Solo", 20.0, &["A"], "{A}*20")]);
        let s = scores(&[("A", RawScore::Invalid("high".to_string()))]);
        assert!(matches!(
            evaluate_category(&rubric.categories()[0], Some(&s)),
            Err(EvaluationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_division_by_computed_zero() {
        let rubric = compile(vec![category("Ratio", 10.0, &["A", "B"], "{A}/{B}*10")]);
        let s = scores(&[("A", RawScore::Value(50.0)), ("B", RawScore::Value(0.0))]);
        assert_eq!(
            evaluate_category(&rubric.categories()[0], Some(&s)),
            Err(EvaluationError::Formula(FormulaError::DivisionByZero))
        );
    }

    #[test]
    fn test_result_above_weight_is_not_clamped() {
        let rubric = compile(vec![category("Ratio", 10.0, &["A", "B"], "{A}/{B}*10")]);
        let s = scores(&[("A", RawScore::Value(50.0)), ("B", RawScore::Value(25.0))]);
        assert_eq!(
            evaluate_category(&rubric.categories()[0], Some(&s)),
            Err(EvaluationError::OutOfBounds {
                value: 20.0,
                weight: 10.0
            })
        );
    }

    #[test]
    fn test_exclude_policy() {
        let rubric = compile(vec![
            category("Market", 20.0, &["A"], "{A}*20"),
            category("Team", 10.0, &["B"], "{B}*10"),
        ]);
        let mut raw = RawScores::new();
        raw.insert("Market".to_string(), scores(&[("A", RawScore::Value(50.0))]));
        raw.insert("Team".to_string(), scores(&[("B", RawScore::Value(101.0))]));

        assert!(score(&raw, &rubric).is_err());

        let options = ScoreOptions {
            on_category_error: CategoryErrorPolicy::Exclude,
        };
        let report = score_with(&raw, &rubric, options).unwrap();
        assert!(matches!(
            report.category("Team").unwrap().result,
            WeightedResult::Excluded { .. }
        ));
        assert_eq!(report.effective_weight, 20.0);
        assert_eq!(report.overall_percentage, 50.0);
    }

    #[test]
    fn test_substring_subfactor_names() {
        let rubric = compile(vec![category(
            "Fit",
            10.0,
            &["Fit", "Problem Fit"],
            "({Fit}+{Problem Fit})/2*10",
        )]);
        let s = scores(&[
            ("Fit", RawScore::Value(100.0)),
            ("Problem Fit", RawScore::Value(0.0)),
        ]);
        let result = evaluate_category(&rubric.categories()[0], Some(&s)).unwrap();
        assert_eq!(result, WeightedResult::Scored { points: 5.0 });

        let s = scores(&[
            ("Fit", RawScore::Value(0.0)),
            ("Problem Fit", RawScore::Value(100.0)),
        ]);
        let result = evaluate_category(&rubric.categories()[0], Some(&s)).unwrap();
        assert_eq!(result, WeightedResult::Scored { points: 5.0 });
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        let formula = "({A}*3+{B}*2+{C})/6*12";
        let forward = compile(vec![category("Mix", 12.0, &["A", "B", "C"], formula)]);
        let reversed = compile(vec![category("Mix", 12.0, &["C", "B", "A"], formula)]);
        let s = scores(&[
            ("A", RawScore::Value(90.0)),
            ("B", RawScore::Value(30.0)),
            ("C", RawScore::Value(60.0)),
        ]);

        let a = evaluate_category(&forward.categories()[0], Some(&s)).unwrap();
        let b = evaluate_category(&reversed.categories()[0], Some(&s)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, WeightedResult::Scored { points: 7.8 });
    }

    #[test]
    fn test_unknown_categories_are_ignored() {
        let rubric = compile(vec![category("Solo", 20.0, &["A"], "{A}*20")]);
        let mut raw = RawScores::new();
        raw.insert("Solo".to_string(), scores(&[("A", RawScore::Value(80.0))]));
        raw.insert("Extra".to_string(), scores(&[("Z", RawScore::Value(10.0))]));

        let report = score(&raw, &rubric).unwrap();
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.overall_percentage, 80.0);
    }

    #[test]
    fn test_subfactor_detail_in_rubric_order() {
        let rubric = compile(vec![category("Solo", 20.0, &["B", "A"], "({A}+{B})/2*20")]);
        let mut raw = RawScores::new();
        raw.insert(
            "Solo".to_string(),
            scores(&[("A", RawScore::Value(10.0)), ("B", RawScore::Value(20.0))]),
        );
        let report = score(&raw, &rubric).unwrap();
        let names: Vec<_> = report.categories[0]
            .subfactor_scores
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_parallel_scoring_is_deterministic() {
        let rubric = CompiledRubric::compile(Rubric::default()).unwrap();
        let raw = uniform(&rubric, RawScore::Value(73.0));
        let expected = score(&raw, &rubric).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| score(&raw, &rubric).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
