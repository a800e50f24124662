//! Tabula CLI binary.
//!
//! Provides command-line training and prediction for the Tabula predictors.

mod artifacts;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tabula::model::{ForestConfig, Outcome};
use tabula::{
    ArtifactBundle, InferencePipeline, PredictorKind, PredictorSpec, TrainingConfig,
    TrainingPipeline,
};
use tabula_data::{read_csv, write_csv};
use tabula_features::{RawRecord, UnseenCategoryPolicy};
use tabula_output::{ExportFormat, Exporter, PredictionExport};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula: schema-stable tabular predictions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log pipeline stages (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List predictors and their input fields
    Predictors,

    /// Write a synthetic training table as CSV
    Generate {
        /// Predictor name
        predictor: PredictorKind,

        /// Output CSV file
        #[arg(long)]
        out: PathBuf,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Train a predictor and save its artifact
    Train {
        /// Predictor name
        predictor: PredictorKind,

        /// Training CSV (synthetic data when omitted)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Random seed for the split and the forest
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Number of trees
        #[arg(long, default_value = "100")]
        trees: usize,

        /// Maximum tree depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Artifact path (defaults to the cache directory)
        #[arg(long)]
        artifact: Option<PathBuf>,
    },

    /// Predict a single record
    Predict {
        /// Predictor name
        predictor: PredictorKind,

        /// Input field, repeated for every field
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,

        /// Artifact path (defaults to the cache directory)
        #[arg(long)]
        artifact: Option<PathBuf>,

        /// Fail on categorical levels not seen during training
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the prediction to a file (.csv or .json)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print the frozen feature schema of a trained artifact
    Schema {
        /// Predictor name
        predictor: PredictorKind,

        /// Artifact path (defaults to the cache directory)
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Predictors => list_predictors(),
        Commands::Generate {
            predictor,
            out,
            seed,
        } => generate(predictor, &out, seed)?,
        Commands::Train {
            predictor,
            data,
            seed,
            test_fraction,
            trees,
            max_depth,
            artifact,
        } => {
            let config = TrainingConfig {
                seed,
                test_fraction,
                forest: ForestConfig {
                    n_estimators: trees,
                    max_depth,
                    ..ForestConfig::default()
                },
                ..TrainingConfig::default()
            };
            let path = artifacts::resolve(predictor, artifact.as_deref());
            let bundle = train(predictor, config, data.as_deref())?;
            bundle.save(&path)?;
            println!("Saved artifact to {}", path.display());
        }
        Commands::Predict {
            predictor,
            fields,
            artifact,
            strict,
            format,
            export,
        } => {
            let path = artifacts::resolve(predictor, artifact.as_deref());
            predict(predictor, &fields, &path, strict, format, export.as_deref())?;
        }
        Commands::Schema {
            predictor,
            artifact,
        } => {
            let path = artifacts::resolve(predictor, artifact.as_deref());
            print_schema(predictor, &path)?;
        }
    }

    Ok(())
}

fn list_predictors() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", "TABULA PREDICTORS");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for kind in PredictorKind::all() {
        let spec = kind.spec();
        println!("{} ({:?}, target: {})", kind, spec.task, spec.target);
        for column in spec.layout.columns() {
            println!("  {:<14} {}", column.name, column.kind);
        }
        println!();
    }
}

fn generate(kind: PredictorKind, out: &Path, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let spec = kind.spec();
    let table = kind.synthetic(seed);
    write_csv(&table, out, &spec.target_encoding)?;
    println!("Wrote {} {} rows to {}", table.len(), kind, out.display());
    Ok(())
}

fn train(
    kind: PredictorKind,
    config: TrainingConfig,
    data: Option<&Path>,
) -> Result<ArtifactBundle, Box<dyn std::error::Error>> {
    let spec = kind.spec();
    let table = match data {
        Some(path) => read_csv(path, &spec.layout, &spec.target, &spec.target_encoding)?,
        None => kind.synthetic(config.seed),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Training {} on {} rows...", kind, table.len()));

    let (bundle, summary) = match TrainingPipeline::new(spec, config).train(&table) {
        Ok(trained) => {
            pb.finish_with_message("Training complete");
            trained
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    println!("\n{}", summary);
    Ok(bundle)
}

/// Load the artifact at `path`, training on synthetic data when none exists.
fn load_or_train(kind: PredictorKind, path: &Path) -> Result<ArtifactBundle, Box<dyn std::error::Error>> {
    if path.exists() {
        let bundle: ArtifactBundle = ArtifactBundle::load(path)?;
        bundle.ensure_predictor(kind.name())?;
        return Ok(bundle);
    }

    tracing::info!(path = %path.display(), "no artifact found, training on synthetic data");
    let bundle = train(kind, TrainingConfig::default(), None)?;
    bundle.save(path)?;
    Ok(bundle)
}

fn predict(
    kind: PredictorKind,
    fields: &[(String, String)],
    path: &Path,
    strict: bool,
    format: OutputFormat,
    export: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = load_or_train(kind, path)?;
    let record = build_record(bundle.predictor(), fields)?;

    let display = bundle.predictor().display.clone();
    let mut pipeline = InferencePipeline::new(Arc::new(bundle));
    if strict {
        pipeline = pipeline.with_unseen_policy(UnseenCategoryPolicy::Reject);
    }
    let outcome = pipeline.predict(&record)?;

    match format {
        OutputFormat::Text => println!("{}", display.render(&outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    if let Some(out) = export {
        export_prediction(kind, fields, &outcome, out)?;
        println!("Exported prediction to {}", out.display());
    }
    Ok(())
}

fn export_prediction(
    kind: PredictorKind,
    fields: &[(String, String)],
    outcome: &Outcome,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs: BTreeMap<String, String> = fields.iter().cloned().collect();
    let row = PredictionExport::new(kind.name(), inputs, outcome);
    row.export_to_file(out, ExportFormat::from_path(out)?)?;
    Ok(())
}

fn print_schema(kind: PredictorKind, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!(
            "No artifact at {}; run `tabula train {}` first",
            path.display(),
            kind
        )
        .into());
    }
    let bundle: ArtifactBundle = ArtifactBundle::load(path)?;
    bundle.ensure_predictor(kind.name())?;

    println!("Predictor: {}", kind);
    println!("Trained:   {}", bundle.trained_at().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Seed:      {}", bundle.seed());
    println!("Features:  {}\n", bundle.schema().len());

    for (position, column) in bundle.schema().iter().enumerate() {
        match bundle.scaler().column(column) {
            Some(stats) => println!(
                "  {:>3}  {:<28} mean {:>12.4}  std {:>12.4}",
                position, column, stats.mean, stats.std_dev
            ),
            None => println!("  {:>3}  {}", position, column),
        }
    }

    let spec = bundle.predictor();
    let references: Vec<_> = spec
        .layout
        .categorical()
        .filter_map(|c| bundle.schema().reference_level(c).map(|l| (c, l)))
        .collect();
    if !references.is_empty() {
        println!("\nReference levels (encoded as all zeros):");
        for (column, level) in references {
            println!("  {:<14} {}", column, level);
        }
    }
    Ok(())
}

/// Build a raw record from `FIELD=VALUE` pairs, rejecting unknown fields.
fn build_record(
    spec: &PredictorSpec,
    fields: &[(String, String)],
) -> Result<RawRecord, Box<dyn std::error::Error>> {
    let mut record = RawRecord::new();
    for (field, value) in fields {
        if !spec.fields().any(|f| f == field) {
            let known: Vec<_> = spec.fields().collect();
            return Err(format!(
                "Unknown field {} for predictor {} (expected one of: {})",
                field,
                spec.name,
                known.join(", ")
            )
            .into());
        }
        record.insert(field.as_str(), value.as_str());
    }
    Ok(record)
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {:?}", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in {:?}", s));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Year=1999", "Year", "1999")]
    #[case("Director = Nolan", "Director", "Nolan")]
    #[case("Platform=Social Media", "Platform", "Social Media")]
    #[case("Genre=", "Genre", "")]
    fn test_parse_assignment(#[case] input: &str, #[case] field: &str, #[case] value: &str) {
        assert_eq!(
            parse_assignment(input),
            Ok((field.to_string(), value.to_string()))
        );
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(parse_assignment("Year").is_err());
        assert!(parse_assignment("=1999").is_err());
    }

    #[test]
    fn test_build_record_rejects_unknown_field() {
        let spec = PredictorKind::Iris.spec();
        let fields = vec![("petal_length".to_string(), "1.4".to_string())];
        let record = build_record(&spec, &fields).unwrap();
        assert_eq!(record.number("petal_length").unwrap(), 1.4);

        let fields = vec![("colour".to_string(), "blue".to_string())];
        let err = build_record(&spec, &fields).unwrap_err();
        assert!(err.to_string().starts_with("Unknown field colour"));
    }

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::try_parse_from([
            "tabula",
            "predict",
            "movie",
            "--set",
            "Year=1999",
            "--set",
            "Director=Nolan",
            "--strict",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Predict {
            predictor,
            fields,
            strict,
            format,
            ..
        } = cli.command
        else {
            panic!("expected predict");
        };
        assert_eq!(predictor, PredictorKind::Movie);
        assert_eq!(fields.len(), 2);
        assert!(strict);
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_rejects_unknown_predictor() {
        assert!(Cli::try_parse_from(["tabula", "train", "titanic"]).is_err());
    }
}
