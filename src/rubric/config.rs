use serde::{Deserialize, Serialize};

/// Rubric: the weighted categories a pitch deck is scored against.
///
/// Weights need not sum to 100; the overall percentage is renormalized over
/// the categories that were actually evaluated.
///
/// Example YAML:
/// ```yaml
/// categories:
///   - name: Market Opportunity
///     weight: 20
///     subfactors: [TAM Clarity, SAM Definition]
///     formula: "({TAM Clarity}+{SAM Definition})/2*20"
///   - name: IP / Defensibility
///     weight: 5
///     subfactors: [IP Evidence]
///     formula: "{IP Evidence}*5"
///     skip_subfactor: IP Evidence
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rubric {
    pub categories: Vec<CategoryDefinition>,
}

/// One weighted rubric axis.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CategoryDefinition {
    pub name: String,

    /// Maximum points this category contributes.
    pub weight: f64,

    /// Subfactor names; each must appear exactly once in `formula` as `{name}`.
    pub subfactors: Vec<String>,

    /// Arithmetic over `{subfactor}` placeholders, each bound to a score in [0, 1].
    pub formula: String,

    /// When set, the category is skipped if this subfactor carries the skip sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_subfactor: Option<String>,
}

impl CategoryDefinition {
    /// Category whose formula is the plain mean of its subfactors scaled to `weight`.
    pub fn averaged(name: &str, weight: f64, subfactors: &[&str]) -> Self {
        let sum = subfactors
            .iter()
            .map(|s| format!("{{{}}}", s))
            .collect::<Vec<_>>()
            .join("+");
        let formula = if subfactors.len() == 1 {
            format!("{}*{}", sum, weight)
        } else {
            format!("({})/{}*{}", sum, subfactors.len(), weight)
        };
        Self {
            name: name.to_string(),
            weight,
            subfactors: subfactors.iter().map(|s| s.to_string()).collect(),
            formula,
            skip_subfactor: None,
        }
    }

    pub fn skippable_by(mut self, subfactor: &str) -> Self {
        self.skip_subfactor = Some(subfactor.to_string());
        self
    }

    pub fn is_skippable(&self) -> bool {
        self.skip_subfactor.is_some()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryDefinition::averaged(
                    "Market Opportunity",
                    20.0,
                    &[
                        "TAM Clarity",
                        "SAM Definition",
                        "SOM Attainability",
                        "Market Growth Evidence",
                        "Timing & Tailwinds",
                        "Macro & Regulatory Fit",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Problem–Solution Fit",
                    20.0,
                    &[
                        "Pain Point Severity",
                        "Problem Clarity",
                        "Solution–Problem Fit",
                        "Use Case Strength",
                        "Value Realization Evidence",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Product & Technology",
                    20.0,
                    &[
                        "Product Clarity",
                        "Innovation Level",
                        "Tech Architecture Depth",
                        "Regulatory/Technical Moat",
                        "Scalability",
                        "UX Quality",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Competition & Differentiation",
                    10.0,
                    &[
                        "Competitor Awareness",
                        "Competitive Positioning",
                        "Differentiation Clarity",
                        "Switching Barrier Evidence",
                        "MOAT",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Business Model & Unit Economics",
                    15.0,
                    &[
                        "Revenue Logic Clarity",
                        "Cost Structure Understanding",
                        "Scalable Economics",
                        "CAC Logic",
                        "LTV Logic",
                        "Profitability Outlook",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Financials Quality",
                    10.0,
                    &[
                        "Financial Transparency",
                        "Assumption Logic",
                        "Forecast Realism",
                        "Revenue Model Validation",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Traction & GTM",
                    10.0,
                    &[
                        "Traction Evidence",
                        "Growth Strategy Clarity",
                        "Distribution Channels",
                        "Retention/Engagement Signals",
                        "GTM Maturity",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Team Strength",
                    10.0,
                    &[
                        "Founder Domain Expertise",
                        "Execution Track Record",
                        "Team Completeness",
                        "Technical Capability",
                        "Founder–Market Fit",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Risk & Compliance",
                    5.0,
                    &[
                        "Regulatory Readiness",
                        "Compliance Adequacy",
                        "Risk Awareness",
                        "Risk Mitigation Evidence",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Ask & Utilization",
                    10.0,
                    &[
                        "Ask Clarity",
                        "Utilization Breakdown",
                        "Milestone Fit",
                        "Fundraising Strategy Maturity",
                    ],
                ),
                CategoryDefinition::averaged(
                    "Design & Narrative",
                    20.0,
                    &[
                        "Visual Clarity",
                        "Narrative Consistency",
                        "Slide Flow",
                        "Signal-to-Noise Ratio",
                    ],
                ),
                CategoryDefinition::averaged(
                    "UVP & USP",
                    5.0,
                    &[
                        "UVP Strength",
                        "USP Clarity",
                        "Customer Benefit Sharpness",
                        "Our Big Idea",
                    ],
                ),
                CategoryDefinition::averaged("IP / Defensibility", 5.0, &["IP Evidence"])
                    .skippable_by("IP Evidence"),
                CategoryDefinition::averaged(
                    "Roadmap",
                    5.0,
                    &[
                        "Roadmap Clarity",
                        "Execution Milestones",
                        "Timeline Realism",
                    ],
                ),
            ],
        }
    }
}
