use std::collections::HashSet;

use super::config::{CategoryDefinition, Rubric};
use super::formula::Formula;
use crate::error::{SchemaError, SchemaIssue, SchemaProblem};

/// Bound checks enumerate every 0/1 corner of the input space up to this many
/// subfactors; wider categories only check the all-zero and all-one corners.
const MAX_VERTEX_SUBFACTORS: usize = 12;

const BOUND_TOLERANCE: f64 = 1e-9;

/// A category whose formula has been parsed and checked against its subfactors.
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    definition: CategoryDefinition,
    formula: Formula,
    /// `bindings[i]` is the subfactor index feeding placeholder slot `i`.
    bindings: Vec<usize>,
}

impl CompiledCategory {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn weight(&self) -> f64 {
        self.definition.weight
    }

    pub fn subfactors(&self) -> &[String] {
        &self.definition.subfactors
    }

    pub fn skip_subfactor(&self) -> Option<&str> {
        self.definition.skip_subfactor.as_deref()
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Reorder per-subfactor values (subfactor order) into placeholder slot order.
    pub fn bind(&self, subfactor_values: &[f64]) -> Vec<f64> {
        self.bindings.iter().map(|&i| subfactor_values[i]).collect()
    }
}

/// A rubric that passed validation. Only compiled rubrics can be scored.
#[derive(Debug, Clone)]
pub struct CompiledRubric {
    categories: Vec<CompiledCategory>,
}

impl CompiledRubric {
    /// Validate every category and parse its formula.
    /// Returns all validation issues at once (not just the first).
    pub fn compile(rubric: Rubric) -> Result<Self, SchemaError> {
        let mut issues = Vec::new();
        let mut categories = Vec::new();
        let mut seen_names = HashSet::new();

        for definition in rubric.categories {
            if !definition.name.trim().is_empty() && !seen_names.insert(definition.name.clone()) {
                issues.push(SchemaIssue {
                    category: definition.name.clone(),
                    problem: SchemaProblem::DuplicateCategory,
                });
            }
            if let Some(category) = compile_category(definition, &mut issues) {
                categories.push(category);
            }
        }

        if issues.is_empty() {
            Ok(Self { categories })
        } else {
            Err(SchemaError { issues })
        }
    }

    pub fn categories(&self) -> &[CompiledCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CompiledCategory> {
        self.categories.iter().find(|c| c.name() == name)
    }

    pub fn total_weight(&self) -> f64 {
        self.categories.iter().map(|c| c.weight()).sum()
    }

    pub fn to_rubric(&self) -> Rubric {
        Rubric {
            categories: self
                .categories
                .iter()
                .map(|c| c.definition.clone())
                .collect(),
        }
    }
}

fn compile_category(
    definition: CategoryDefinition,
    issues: &mut Vec<SchemaIssue>,
) -> Option<CompiledCategory> {
    let before = issues.len();
    let mut report = |problem: SchemaProblem| {
        issues.push(SchemaIssue {
            category: definition.name.clone(),
            problem,
        })
    };

    if definition.name.trim().is_empty() {
        report(SchemaProblem::EmptyName);
    }

    if !(definition.weight.is_finite() && definition.weight > 0.0) {
        report(SchemaProblem::InvalidWeight(definition.weight));
    }

    if definition.subfactors.is_empty() {
        report(SchemaProblem::NoSubfactors);
    }

    let mut seen = HashSet::new();
    for subfactor in &definition.subfactors {
        if !seen.insert(subfactor.as_str()) {
            report(SchemaProblem::DuplicateSubfactor(subfactor.clone()));
        }
    }

    if let Some(skip) = &definition.skip_subfactor {
        if !definition.subfactors.contains(skip) {
            report(SchemaProblem::UnknownSkipSubfactor(skip.clone()));
        }
    }

    let formula = match Formula::parse(&definition.formula) {
        Ok(formula) => formula,
        Err(e) => {
            report(SchemaProblem::InvalidFormula(e));
            return None;
        }
    };

    let missing: Vec<String> = definition
        .subfactors
        .iter()
        .filter(|s| !formula.placeholders().contains(*s))
        .cloned()
        .collect();
    if !missing.is_empty() {
        report(SchemaProblem::MissingPlaceholders(missing));
    }

    let unknown: Vec<String> = formula
        .placeholders()
        .iter()
        .filter(|p| !definition.subfactors.contains(*p))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        report(SchemaProblem::UnknownPlaceholders(unknown));
    }

    let repeated: Vec<String> = formula
        .placeholders()
        .iter()
        .filter(|p| formula.occurrences().iter().filter(|o| o == p).count() > 1)
        .cloned()
        .collect();
    if !repeated.is_empty() {
        report(SchemaProblem::RepeatedPlaceholders(repeated));
    }

    if formula.divides_by_constant_zero() {
        report(SchemaProblem::DivisionByConstantZero);
    }

    // Bound checks only make sense once placeholders and subfactors agree.
    if issues.len() != before {
        return None;
    }

    let bindings: Vec<usize> = formula
        .placeholders()
        .iter()
        .filter_map(|p| definition.subfactors.iter().position(|s| s == p))
        .collect();

    let category = CompiledCategory {
        definition,
        formula,
        bindings,
    };

    if let Some(problem) = check_bounds(&category) {
        issues.push(SchemaIssue {
            category: category.definition.name.clone(),
            problem,
        });
        return None;
    }

    Some(category)
}

/// Evaluate the formula at the corners of the normalized input space and make
/// sure every result stays within [0, weight].
fn check_bounds(category: &CompiledCategory) -> Option<SchemaProblem> {
    let weight = category.weight();
    let slots = category.formula.placeholders().len();

    let corners: Vec<Vec<f64>> = if slots <= MAX_VERTEX_SUBFACTORS {
        (0u32..(1u32 << slots))
            .map(|mask| {
                (0..slots)
                    .map(|i| if (mask >> i) & 1 == 1 { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect()
    } else {
        vec![vec![0.0; slots], vec![1.0; slots]]
    };

    for corner in &corners {
        match category.formula.eval(corner) {
            Ok(value) => {
                if value < -BOUND_TOLERANCE || value > weight + BOUND_TOLERANCE {
                    return Some(SchemaProblem::OutOfBounds { value, weight });
                }
            }
            // A placeholder divisor hits zero at some corner; that is a
            // per-request failure, not a schema one.
            Err(e) => {
                tracing::debug!(category = category.name(), error = %e, "bound check skipped a corner");
            }
        }
    }

    if let Ok(full_marks) = category.formula.eval(&vec![1.0; slots]) {
        if full_marks < weight - 0.005 {
            tracing::warn!(
                category = category.name(),
                full_marks,
                weight,
                "category cannot reach its full weight"
            );
        }
    }

    None
}
