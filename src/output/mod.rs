pub mod formatter;

pub use formatter::{
    format_history, format_interpretation, format_points, format_scorecard,
    format_scorecard_detail, format_tsv, should_use_colors,
};
