use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::scoring::{CategoryScore, Interpretation, ScoreReport, WeightedResult};
use crate::store::StoredReport;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Weighted points against the category weight, e.g. "15.00 / 20"
pub fn format_points(category: &CategoryScore) -> String {
    match &category.result {
        WeightedResult::Scored { points } => format!("{:.2} / {}", points, category.weight),
        WeightedResult::Skipped => "SKIPPED".to_string(),
        WeightedResult::Excluded { .. } => "EXCLUDED".to_string(),
    }
}

/// Interpretation label, colored green / yellow / red by band
pub fn format_interpretation(interpretation: Interpretation, use_colors: bool) -> String {
    let label = interpretation.label();
    if !use_colors {
        return label.to_string();
    }
    match interpretation {
        Interpretation::InvestorReady => label.green().bold().to_string(),
        Interpretation::GoodButImprovable => label.yellow().bold().to_string(),
        Interpretation::NeedsMajorRevisions => label.red().bold().to_string(),
    }
}

/// Format a report as a scorecard table followed by the overall result
/// Index column: 3 chars (fits "99."), right-aligned
/// Points column is right-aligned, 14 chars wide (fits "100.00 / 100")
pub fn format_scorecard(report: &ScoreReport, use_colors: bool) -> String {
    let term_width = get_terminal_width();

    let index_width = 3;
    let points_width = 14;
    let separator = "  ";
    let fixed_width = index_width + separator.len() + points_width;

    let mut lines: Vec<String> = report
        .categories
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let index_str = format!("{:>2}.", idx + 1);
            let points_padded = format!("{:>width$}", format_points(category), width = points_width);

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&category.name, width - fixed_width - separator.len())
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_name(&category.name, 20),
                // No terminal (pipe), don't truncate
                None => category.name.clone(),
            };

            if use_colors {
                let points = match category.result {
                    WeightedResult::Scored { .. } => points_padded.bold().to_string(),
                    _ => points_padded.dimmed().to_string(),
                };
                format!("{} {}{}{}", index_str.dimmed(), points, separator, name)
            } else {
                format!("{} {}{}{}", index_str, points_padded, separator, name)
            }
        })
        .collect();

    lines.push(String::new());
    lines.push(format!(
        "Overall: {:.2}% ({:.2} / {} points)",
        report.overall_percentage, report.total_points, report.effective_weight
    ));
    lines.push(format!(
        "Interpretation: {}",
        format_interpretation(report.interpretation, use_colors)
    ));

    let skipped: Vec<&str> = report.skipped().map(|c| c.name.as_str()).collect();
    if !skipped.is_empty() {
        lines.push(format!("Skipped: {}", skipped.join(", ")));
    }

    lines.join("\n")
}

/// Per-category breakdown with subfactor scores (for verbose mode)
pub fn format_scorecard_detail(report: &ScoreReport, use_colors: bool) -> String {
    report
        .categories
        .iter()
        .map(|category| {
            let header = if use_colors {
                format!("{}  {}", category.name.bold(), format_points(category))
            } else {
                format!("{}  {}", category.name, format_points(category))
            };
            let mut lines = vec![header];
            for sub in &category.subfactor_scores {
                lines.push(format!("  {}: {}", sub.name, sub.score));
            }
            if let WeightedResult::Excluded { reason } = &category.result {
                lines.push(format!("  Reason: {}", reason));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format a report as tab-separated values for scripting
/// Columns: category, status, points, weight (no headers, no colors);
/// the last line is "overall", percentage and interpretation
pub fn format_tsv(report: &ScoreReport) -> String {
    let mut lines: Vec<String> = report
        .categories
        .iter()
        .map(|category| {
            let (status, points) = match &category.result {
                WeightedResult::Scored { points } => ("scored", format!("{:.2}", points)),
                WeightedResult::Skipped => ("skipped", String::new()),
                WeightedResult::Excluded { .. } => ("excluded", String::new()),
            };
            format!("{}\t{}\t{}\t{}", category.name, status, points, category.weight)
        })
        .collect();

    lines.push(format!(
        "overall\t{:.2}\t{}",
        report.overall_percentage,
        report.interpretation.label()
    ));
    lines.join("\n")
}

/// Format stored reports as one line per report, oldest first
pub fn format_history(reports: &[StoredReport], use_colors: bool) -> String {
    if reports.is_empty() {
        return "No stored reports found.".to_string();
    }

    reports
        .iter()
        .map(|report| {
            let percentage = format!("{:>7.2}%", report.overall_percentage);
            let interpretation = format_interpretation(report.interpretation, use_colors);
            if use_colors {
                format!(
                    "{}  {}  {}  {}",
                    report.timestamp.dimmed(),
                    percentage.bold(),
                    report.filename,
                    interpretation
                )
            } else {
                format!(
                    "{}  {}  {}  {}",
                    report.timestamp, percentage, report.filename, interpretation
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{RawScore, SubfactorScore};

    fn category(name: &str, weight: f64, result: WeightedResult) -> CategoryScore {
        CategoryScore {
            name: name.to_string(),
            weight,
            subfactor_scores: vec![
                SubfactorScore {
                    name: "Clarity".to_string(),
                    score: RawScore::Value(80.0),
                },
                SubfactorScore {
                    name: "Depth".to_string(),
                    score: RawScore::Value(70.0),
                },
            ],
            result,
        }
    }

    fn sample_report() -> ScoreReport {
        ScoreReport {
            categories: vec![
                category("Market", 20.0, WeightedResult::Scored { points: 15.0 }),
                category("IP / Defensibility", 5.0, WeightedResult::Skipped),
                category(
                    "Team",
                    10.0,
                    WeightedResult::Excluded {
                        reason: "subfactor 'Depth' score 150 is outside [0, 100]".to_string(),
                    },
                ),
            ],
            total_points: 15.0,
            effective_weight: 20.0,
            overall_percentage: 75.0,
            interpretation: Interpretation::GoodButImprovable,
        }
    }

    #[test]
    fn test_format_points() {
        let report = sample_report();
        assert_eq!(format_points(&report.categories[0]), "15.00 / 20");
        assert_eq!(format_points(&report.categories[1]), "SKIPPED");
        assert_eq!(format_points(&report.categories[2]), "EXCLUDED");
    }

    #[test]
    fn test_format_interpretation_plain() {
        assert_eq!(
            format_interpretation(Interpretation::InvestorReady, false),
            "Investor ready"
        );
        assert_eq!(
            format_interpretation(Interpretation::NeedsMajorRevisions, false),
            "Needs major revisions"
        );
    }

    #[test]
    fn test_format_interpretation_colored_keeps_label() {
        let colored = format_interpretation(Interpretation::GoodButImprovable, true);
        assert!(colored.contains("Good, but improvable"));
        assert_ne!(colored, "Good, but improvable");
    }

    #[test]
    fn test_format_scorecard() {
        let result = format_scorecard(&sample_report(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert!(lines[0].starts_with(" 1."));
        assert!(lines[0].contains("15.00 / 20"));
        assert!(lines[0].contains("Market"));
        assert!(lines[1].contains("SKIPPED"));
        assert!(lines[2].contains("EXCLUDED"));
        assert!(result.contains("Overall: 75.00% (15.00 / 20 points)"));
        assert!(result.contains("Interpretation: Good, but improvable"));
        assert!(result.contains("Skipped: IP / Defensibility"));
    }

    #[test]
    fn test_format_scorecard_detail() {
        let result = format_scorecard_detail(&sample_report(), false);
        assert!(result.contains("Market  15.00 / 20\n  Clarity: 80\n  Depth: 70"));
        assert!(result.contains("Reason: subfactor 'Depth' score 150"));
    }

    #[test]
    fn test_format_tsv() {
        let result = format_tsv(&sample_report());
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "Market\tscored\t15.00\t20");
        assert_eq!(lines[1], "IP / Defensibility\tskipped\t\t5");
        assert_eq!(lines[2], "Team\texcluded\t\t10");
        assert_eq!(lines[3], "overall\t75.00\tGood, but improvable");
    }

    #[test]
    fn test_format_tsv_no_ansi() {
        let result = format_tsv(&sample_report());
        assert!(!result.contains('\x1b'));
    }

    #[test]
    fn test_format_history_empty() {
        assert_eq!(format_history(&[], false), "No stored reports found.");
    }

    #[test]
    fn test_format_history() {
        let report = sample_report();
        let stored = StoredReport::new(
            "deck_20260314_090000.json".to_string(),
            "20260314_090000".to_string(),
            &report,
            None,
        );
        let result = format_history(&[stored], false);
        assert_eq!(
            result,
            "20260314_090000    75.00%  deck_20260314_090000.json  Good, but improvable"
        );
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Market", 20), "Market");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(
            truncate_name("Business Model & Unit Economics", 15),
            "Business Mod..."
        );
    }

    #[test]
    fn test_truncate_name_unicode() {
        assert_eq!(truncate_name("Go–to–Market Plan", 8), "Go–to...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Traction", 3), "Tra");
    }
}
