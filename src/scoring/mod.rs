pub mod engine;
pub mod raw;
pub mod report;

pub use engine::{
    evaluate_category, normalize, score, score_with, CategoryErrorPolicy, ScoreOptions,
};
pub use raw::{is_skip_sentinel, RawScore, RawScores, SubfactorScores, SKIP_SENTINEL};
pub use report::{
    aggregate, round2, Aggregate, CategoryScore, Interpretation, ScoreReport, SubfactorScore,
    WeightedResult,
};
