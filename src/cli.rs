//! The command line interface.
use crate::filter::FilterCriteria;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_aggregates};
use crate::session::Session;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the aggregation pipeline.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Input files shared by several commands
#[derive(Args)]
pub struct InputOpts {
    /// Path to the charging point CSV file.
    pub data_file: PathBuf,
    /// Path to a CSV file of district codes (AGS) and names (GEN)
    #[arg(long)]
    pub districts: Option<PathBuf>,
}

/// Options for the report command
#[derive(Args)]
pub struct ReportOpts {
    /// TOML file containing filter criteria (defaults to no filtering)
    #[arg(short, long)]
    pub filter: Option<PathBuf>,
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Compute KPIs, series and map values and write them to CSV files.
    Report {
        /// Input files
        #[command(flatten)]
        input: InputOpts,
        /// Other report options
        #[command(flatten)]
        opts: ReportOpts,
    },
    /// Check that the input files can be loaded.
    Validate {
        /// Input files
        #[command(flatten)]
        input: InputOpts,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Report { input, opts } => handle_report_command(&input, &opts, None),
            Self::Validate { input } => handle_validate_command(&input, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ chargemap --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Initialise the program logger, unless this has already been done
fn init_logger(settings: &Settings, log_file_path: Option<&Path>) -> Result<()> {
    if log::is_logger_initialised() {
        return Ok(());
    }

    log::init(Some(&settings.log_level), log_file_path).context("Failed to initialise logging.")
}

/// Handle the `report` command.
pub fn handle_report_command(
    input: &InputOpts,
    opts: &ReportOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(&input.data_file)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    init_logger(&settings, Some(output_path))?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let criteria = match &opts.filter {
        Some(path) => FilterCriteria::from_path(path).context("Failed to load filter criteria.")?,
        None => FilterCriteria::default(),
    };

    let mut session = Session::open(
        input.data_file.clone(),
        input.districts.clone(),
        settings.aggregate_options(),
    )?;
    let aggregates = session.aggregates(&criteria)?;
    if aggregates.kpis.point_count == 0 {
        warn!("No charging points match the filter criteria");
    }

    write_aggregates(output_path, &aggregates).context("Failed to write output files.")?;
    info!("Output written to {}", output_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(input: &InputOpts, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // We don't save log files when running the validate command
    init_logger(&settings, None)?;

    let mut session = Session::open(
        input.data_file.clone(),
        input.districts.clone(),
        settings.aggregate_options(),
    )?;
    let options = session.filter_options()?;
    if let Some((min, max)) = options.year_bounds {
        info!(
            "Data cover {min} to {max} across {} regions",
            options.regions.len()
        );
    }
    info!("Validation successful!");

    Ok(())
}
