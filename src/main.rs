use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use chronalign_dtw::{FastDtw, align};
use chronalign_io::{ExampleReader, SeriesReader, write_alignment};
use chronalign_knn::{ModelSet, SeriesClassifier};

#[derive(Parser)]
#[command(name = "chronalign")]
#[command(about = "Dynamic time warping alignment and nearest-neighbour classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Align two series and report the warp path and its cost
    Align {
        /// CSV file holding the first series (one frame per row)
        #[arg(long)]
        x: PathBuf,

        /// CSV file holding the second series (one frame per row)
        #[arg(long)]
        y: PathBuf,

        /// Search radius around the projected coarse path
        #[arg(long, default_value_t = 1)]
        radius: usize,

        /// Fill the full cost table instead of the multi-resolution search
        #[arg(long, default_value_t = false)]
        exact: bool,

        /// Write the full alignment (with path) to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Train a k-nearest-neighbour model set from labelled examples
    Train {
        /// CSV file with leading class columns followed by features
        #[arg(long)]
        examples: PathBuf,

        /// Number of neighbours consulted per vote
        #[arg(long, default_value_t = 1)]
        k: usize,

        /// Number of leading class columns, one model per column
        #[arg(long, default_value_t = 1)]
        label_columns: usize,

        /// Path to write the trained model JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Classify feature vectors with a trained model set
    Classify {
        /// Path to the trained model JSON
        #[arg(long)]
        model: PathBuf,

        /// CSV file with one feature vector per row
        #[arg(long)]
        input: PathBuf,
    },

    /// Label a series with its closest template under DTW
    Match {
        /// CSV file holding the query series
        #[arg(long)]
        query: PathBuf,

        /// Labelled template as LABEL:PATH (repeatable)
        #[arg(long = "template", value_parser = parse_template, required = true)]
        templates: Vec<(usize, PathBuf)>,

        /// Search radius around the projected coarse path
        #[arg(long, default_value_t = 1)]
        radius: usize,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AlignOutput {
    method: &'static str,
    radius: Option<usize>,
    len_x: usize,
    len_y: usize,
    cost: f64,
    path_len: usize,
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct TrainOutput {
    n_examples: usize,
    num_inputs: usize,
    num_outputs: usize,
    k: usize,
    model: PathBuf,
}

#[derive(Serialize)]
struct ClassifyOutput {
    n_rows: usize,
    num_outputs: usize,
    predictions: Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct MatchOutput {
    label: usize,
    cost: f64,
    template: PathBuf,
    costs: Vec<f64>,
}

fn parse_template(s: &str) -> Result<(usize, PathBuf), String> {
    let (label, path) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LABEL:PATH, got {s}"))?;
    let label = label
        .parse()
        .map_err(|_| format!("template label must be a non-negative integer, got {label}"))?;
    Ok((label, PathBuf::from(path)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Align {
            x,
            y,
            radius,
            exact,
            output,
        } => {
            let series_x = SeriesReader::new(&x)
                .read()
                .with_context(|| format!("failed to read series {}", x.display()))?;
            let series_y = SeriesReader::new(&y)
                .read()
                .with_context(|| format!("failed to read series {}", y.display()))?;

            let aligned = if exact {
                align(series_x.as_view(), series_y.as_view())
            } else {
                FastDtw::new(radius).align(series_x.as_view(), series_y.as_view())
            };
            let result = aligned.context("alignment failed")?;
            info!(cost = result.cost(), path_len = result.path().len(), "aligned");

            if let Some(path) = &output {
                write_alignment(path, &result).context("failed to write alignment")?;
            }

            let summary = AlignOutput {
                method: if exact { "exact" } else { "fastdtw" },
                radius: (!exact).then_some(radius),
                len_x: series_x.len(),
                len_y: series_y.len(),
                cost: result.cost(),
                path_len: result.path().len(),
                output,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Train {
            examples,
            k,
            label_columns,
            output,
        } => {
            let set = ExampleReader::new(&examples)
                .with_label_columns(label_columns)
                .read()
                .context("failed to read training examples")?;
            info!(n_examples = set.examples.len(), "examples loaded");

            let models = ModelSet::train(&set.examples, k)
                .context("training failed")?
                .with_input_names(set.input_names)?;
            models.save(&output).context("failed to save model")?;

            let summary = TrainOutput {
                n_examples: set.examples.len(),
                num_inputs: models.num_inputs(),
                num_outputs: models.num_outputs(),
                k,
                model: output,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Classify { model, input } => {
            let models = ModelSet::load(&model).context("failed to load model")?;
            let rows = SeriesReader::new(&input)
                .read()
                .context("failed to read input CSV")?;

            let predictions = rows
                .as_view()
                .frames()
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    models
                        .process(row)
                        .with_context(|| format!("failed to classify row {i}"))
                })
                .collect::<Result<Vec<_>>>()?;
            info!(n_rows = predictions.len(), "classified");

            let summary = ClassifyOutput {
                n_rows: predictions.len(),
                num_outputs: models.num_outputs(),
                predictions,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Match {
            query,
            templates,
            radius,
        } => {
            let query_series = SeriesReader::new(&query)
                .read()
                .context("failed to read query series")?;

            let mut classifier = SeriesClassifier::new(radius);
            for (label, path) in &templates {
                let template = SeriesReader::new(path)
                    .read()
                    .with_context(|| format!("failed to read template {}", path.display()))?;
                classifier
                    .add_template(*label, template)
                    .with_context(|| format!("template {} rejected", path.display()))?;
            }
            info!(n_templates = classifier.len(), "templates loaded");

            let found = classifier
                .classify(query_series.as_view())
                .context("template matching failed")?;

            let summary = MatchOutput {
                label: found.label,
                cost: found.cost,
                template: templates[found.template_index].1.clone(),
                costs: found.costs,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
