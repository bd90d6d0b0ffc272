use clap::{Parser, Subcommand, ValueEnum};
use pitch_score::provider::ScoreSource;
use pitch_score::rubric::{CompiledRubric, Rubric};
use pitch_score::scoring::{CategoryErrorPolicy, ScoreOptions, ScoreReport};
use pitch_score::store::Uploader;
use serde::Serialize;
use std::path::PathBuf;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_SCORING: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Tsv,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a provider response against the rubric
    Score {
        /// Provider response JSON file, or "-" for stdin
        response: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Leave categories that fail to evaluate out of the result instead of aborting
        #[arg(long)]
        exclude_failed: bool,

        /// Store the report in the reports directory
        #[arg(long, requires = "deck")]
        save: bool,

        /// Deck name used for the stored report file
        #[arg(long)]
        deck: Option<String>,

        #[arg(long, value_enum, default_value_t = Uploader::Admin)]
        uploader: Uploader,
    },
    /// Print the language model prompt for a deck's extracted text
    Prompt {
        /// Text file, or "-" for stdin
        input: PathBuf,
    },
    /// Inspect the effective rubric
    Rubric {
        #[command(subcommand)]
        command: RubricCommand,
    },
    /// List stored reports, oldest first
    History {
        #[arg(long, value_enum, default_value_t = Uploader::Admin)]
        uploader: Uploader,
    },
}

#[derive(Subcommand, Debug)]
enum RubricCommand {
    /// Print the rubric as YAML
    Show,
    /// Validate the rubric and list every issue
    Check,
}

#[derive(Parser, Debug)]
#[command(name = "pitch-score")]
#[command(about = "Weighted pitch deck scoring CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/pitch-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to a rubric YAML file (overrides the config file)
    #[arg(short, long, global = true)]
    rubric: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a ScoreReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    overall_improvement: Option<&'a str>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = pitch_score::telemetry::init(cli.verbose) {
        eprintln!("Logging error: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    let config = match pitch_score::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Load and validate the rubric once at startup
    let rubric_path = cli.rubric.clone().or_else(|| config.rubric.clone());
    let rubric = match &rubric_path {
        Some(path) => match pitch_score::rubric::load_rubric(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Rubric error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
        None => Rubric::default(),
    };

    let compiled = match CompiledRubric::compile(rubric) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    tracing::debug!(
        categories = compiled.categories().len(),
        total_weight = compiled.total_weight(),
        custom = rubric_path.is_some(),
        "rubric loaded"
    );

    let use_colors = pitch_score::output::should_use_colors();

    match cli.command {
        Commands::Score {
            response,
            format,
            exclude_failed,
            save,
            deck,
            uploader,
        } => {
            let reply = match pitch_score::provider::ResponseFile::new(response).fetch() {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Provider error: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };

            let options = ScoreOptions {
                on_category_error: if exclude_failed {
                    CategoryErrorPolicy::Exclude
                } else {
                    CategoryErrorPolicy::Fail
                },
            };

            let report = match pitch_score::scoring::score_with(&reply.scores, &compiled, options)
            {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Scoring error: {}", e);
                    std::process::exit(EXIT_SCORING);
                }
            };

            match format {
                OutputFormat::Table => {
                    if cli.verbose {
                        println!(
                            "{}",
                            pitch_score::output::format_scorecard_detail(&report, use_colors)
                        );
                        println!();
                    }
                    println!(
                        "{}",
                        pitch_score::output::format_scorecard(&report, use_colors)
                    );
                    if let Some(improvement) = &reply.overall_improvement {
                        println!();
                        println!("{}", improvement);
                    }
                }
                OutputFormat::Json => {
                    let output = JsonOutput {
                        report: &report,
                        overall_improvement: reply.overall_improvement.as_deref(),
                    };
                    match serde_json::to_string_pretty(&output) {
                        Ok(json) => println!("{}", json),
                        Err(e) => {
                            eprintln!("Failed to serialize report: {}", e);
                            std::process::exit(EXIT_SCORING);
                        }
                    }
                }
                OutputFormat::Tsv => {
                    println!("{}", pitch_score::output::format_tsv(&report));
                }
            }

            if save {
                let deck_name = deck.unwrap_or_default();
                let saved = config.reports_dir().and_then(|dir| {
                    pitch_score::store::save_report(
                        &dir,
                        uploader,
                        &deck_name,
                        &report,
                        reply.overall_improvement.clone(),
                        chrono::Local::now().naive_local(),
                    )
                });
                match saved {
                    Ok(path) => eprintln!("Saved report to {}", path.display()),
                    Err(e) => {
                        eprintln!("Failed to save report: {:#}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                }
            }
        }
        Commands::Prompt { input } => {
            let text = match pitch_score::provider::read_input(&input) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Input error: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };
            let prompt =
                pitch_score::provider::build_prompt(&compiled.to_rubric(), &text, &config.prompt);
            println!("{}", prompt);
        }
        Commands::Rubric { command } => match command {
            RubricCommand::Show => match serde_saphyr::to_string(&compiled.to_rubric()) {
                Ok(yaml) => print!("{}", yaml),
                Err(e) => {
                    eprintln!("Failed to serialize rubric: {}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            },
            RubricCommand::Check => {
                println!(
                    "Rubric OK: {} categories, total weight {}",
                    compiled.categories().len(),
                    compiled.total_weight()
                );
            }
        },
        Commands::History { uploader } => {
            let reports = config
                .reports_dir()
                .and_then(|dir| pitch_score::store::list_reports(&dir, uploader));
            match reports {
                Ok(reports) => {
                    println!(
                        "{}",
                        pitch_score::output::format_history(&reports, use_colors)
                    );
                }
                Err(e) => {
                    eprintln!("Failed to list reports: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
