use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use count_harmonizer::app::{HarmonizeOptions, Harmonizer, ProgressSink};
use count_harmonizer::config::{ConfigLoader, ConfigOverrides};
use count_harmonizer::detect::{DEFAULT_PROBE_ROWS, FormatDetector};
use count_harmonizer::domain::FormatVariant;
use count_harmonizer::error::HarmonizeError;
use count_harmonizer::output::{DetectResult, JsonOutput, LogSink, OutputMode, SheetResult};
use count_harmonizer::sheet::{IdentityMap, SampleSheet};
use count_harmonizer::sink::TsvDirectorySink;

#[derive(Parser)]
#[command(name = "count-harmonizer")]
#[command(about = "Merge STAR / HTSeq gene count files into one (sample, gene, raw count) table")]
#[command(version, author)]
struct Cli {
    /// Print machine-readable JSON instead of a summary line.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Harmonize every count file under a root directory")]
    Run(RunArgs),
    #[command(about = "Classify a single count file")]
    Detect(DetectArgs),
    #[command(about = "Show which sample sheet columns were recognized")]
    Sheet(SheetArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    sheet: Option<String>,

    #[arg(long)]
    root: Option<String>,

    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    table: Option<String>,

    /// Parse every file as this variant instead of detecting it.
    #[arg(long, value_enum)]
    variant: Option<FormatVariant>,
}

#[derive(Args)]
struct DetectArgs {
    path: Utf8PathBuf,

    #[arg(long, default_value_t = DEFAULT_PROBE_ROWS)]
    probe_rows: usize,
}

#[derive(Args)]
struct SheetArgs {
    path: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarmonizeError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarmonizeError) -> u8 {
    match error {
        HarmonizeError::ConfigRead(_)
        | HarmonizeError::ConfigParse(_)
        | HarmonizeError::MissingSetting(_)
        | HarmonizeError::InvalidSetting { .. }
        | HarmonizeError::SampleSheetRead { .. }
        | HarmonizeError::RootNotFound(_) => 2,
        HarmonizeError::NoDataCollected => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    match cli.command {
        Commands::Run(args) => run_harmonize(args, output_mode),
        Commands::Detect(args) => run_detect(args, output_mode),
        Commands::Sheet(args) => run_sheet(args, output_mode),
    }
}

fn run_harmonize(args: RunArgs, output_mode: OutputMode) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        sample_sheet: args.sheet,
        root: args.root,
        output_dir: args.output_dir,
        table: args.table,
        variant: args.variant,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides)?;

    let sheet = SampleSheet::load(&config.sample_sheet)?;
    let identity = IdentityMap::from_sheet(&sheet);
    tracing::info!(
        rows = sheet.len(),
        columns = ?identity.columns(),
        "loaded sample sheet"
    );

    let harmonizer = Harmonizer::new(&identity, HarmonizeOptions::from(&config));
    let target = TsvDirectorySink::new(config.output_dir.clone());
    let progress: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Text => &LogSink,
    };
    let outcome = harmonizer.load_into(&config.root, &target, &config.table, progress)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_report(&outcome.report).into_diagnostic()?,
        OutputMode::Text => {
            let report = &outcome.report;
            println!(
                "Loaded {} rows from {} samples into {}",
                report.rows, report.samples, config.table
            );
            println!(
                "files: {} discovered, {} loaded, {} unmapped, {} failed",
                report.files_discovered,
                report.files_loaded,
                report.files_unmapped,
                report.files_failed
            );
            if let Some(location) = report.sink.as_ref().and_then(|sink| sink.location.as_ref()) {
                println!("written to {location}");
            }
        }
    }
    Ok(())
}

fn run_detect(args: DetectArgs, output_mode: OutputMode) -> miette::Result<()> {
    if args.probe_rows < 4 {
        return Err(HarmonizeError::InvalidSetting {
            name: "probe_rows",
            message: format!("{} is below the minimum of 4", args.probe_rows),
        }
        .into());
    }
    let detector = FormatDetector {
        probe_rows: args.probe_rows,
        ..FormatDetector::default()
    };
    let variant = detector.detect_path(&args.path)?;
    let result = DetectResult {
        path: args.path.to_string(),
        variant,
    };
    match output_mode {
        OutputMode::Json => JsonOutput::print_detect(&result).into_diagnostic()?,
        OutputMode::Text => println!("{}\t{}", result.path, result.variant),
    }
    Ok(())
}

fn run_sheet(args: SheetArgs, output_mode: OutputMode) -> miette::Result<()> {
    let sheet = SampleSheet::load(&args.path)?;
    let identity = IdentityMap::from_sheet(&sheet);
    let result = SheetResult::new(
        args.path.as_str(),
        sheet.len(),
        sheet.headers().to_vec(),
        &identity,
    );
    match output_mode {
        OutputMode::Json => JsonOutput::print_sheet(&result).into_diagnostic()?,
        OutputMode::Text => {
            let show = |column: &Option<String>| column.clone().unwrap_or_else(|| "-".to_string());
            println!("rows: {}", result.rows);
            println!("file id column: {}", show(&result.columns.file_id));
            println!("file name column: {}", show(&result.columns.file_name));
            println!("sample id column: {}", show(&result.columns.sample_id));
            for candidate in &result.candidates {
                println!("candidate {:?}: {} keys", candidate.role, candidate.keys);
            }
        }
    }
    Ok(())
}
