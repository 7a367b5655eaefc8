//! SagaBridge CLI - run SAGA GIS tools from declaration files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sagabridge::{
    load_algorithms, Feedback, LocalContext, Parameters, SagaAlgorithm, SagaCmdRunner,
    SagaSession, SagaSettings,
};
use sagabridge_core::io::{read_prj, read_raster_info};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sagabridge")]
#[command(author, version, about = "Run SAGA GIS tools through saga_cmd", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SAGA installation folder (overrides the settings file)
    #[arg(long, global = true)]
    saga_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header information SAGA validation uses for a raster
    Info {
        /// Input raster (.sgrd, .sdat, .tif)
        input: PathBuf,
    },
    /// List the algorithms declared in a folder
    List {
        /// Folder of declaration files (*.txt)
        #[arg(short, long)]
        descriptions: PathBuf,
    },
    /// Show the parameters of one algorithm
    Describe {
        /// Declaration file
        file: PathBuf,
    },
    /// Run one algorithm
    Run {
        /// Declaration file
        file: PathBuf,
        /// Parameter value, NAME=VALUE (repeatable)
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
        /// Print the commands without running saga_cmd
        #[arg(long)]
        dry_run: bool,
        /// Folder for exported layers and temporary outputs
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },
}

// ─── Feedback ───────────────────────────────────────────────────────────

/// Progress bar for saga_cmd output; console lines go to the log.
struct ProgressFeedback {
    bar: ProgressBar,
}

impl ProgressFeedback {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .context("Invalid progress template")?,
        );
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Feedback for ProgressFeedback {
    fn push_info(&mut self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn push_command_info(&mut self, command: &str) {
        self.bar.suspend(|| info!("{}", command));
    }

    fn push_console_info(&mut self, line: &str) {
        self.bar.suspend(|| info!(target: "saga_cmd", "{}", line));
    }

    fn set_progress(&mut self, percent: f64) {
        self.bar.set_position(percent.round() as u64);
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")?;
    Ok(())
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn load_settings(config: Option<&Path>, saga_folder: Option<PathBuf>) -> Result<SagaSettings> {
    let mut settings = match config {
        Some(path) => SagaSettings::from_json_file(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => SagaSettings::default(),
    };
    if saga_folder.is_some() {
        settings.saga_folder = saga_folder;
    }
    Ok(settings)
}

fn load_algorithm(file: &Path) -> Result<SagaAlgorithm> {
    SagaAlgorithm::from_file(file)
        .with_context(|| format!("Failed to load algorithm from {}", file.display()))
}

fn parse_params(alg: &SagaAlgorithm, raw: &[String]) -> Result<Parameters> {
    let mut params = Parameters::new();
    for pair in raw {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Parameter must be NAME=VALUE, got: {}", pair))?;
        let name = name.trim();
        let param = alg.descriptor().parameter(name).with_context(|| {
            format!("Unknown parameter {} for {}", name, alg.display_name())
        })?;
        let value = param
            .parse_value(value)
            .with_context(|| format!("Invalid value for {}", name))?;
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

fn describe(alg: &SagaAlgorithm) {
    let d = alg.descriptor();
    println!("{} ({})", d.display_name, d.id);
    println!("Group: {}", d.group);
    println!("SAGA: {} \"{}\"", d.library, d.command_name);
    if !d.hardcoded.is_empty() {
        println!("Fixed arguments: {}", d.hardcoded.join(" "));
    }
    if d.allow_nonmatching_grid_extents {
        println!("Inputs may use different grid extents");
    }
    println!("\nParameters:");
    for p in &d.parameters {
        let mut notes = Vec::new();
        if p.optional {
            notes.push("optional".to_string());
        }
        if let Some(default) = &p.default {
            notes.push(format!("default {}", default));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join(", "))
        };
        println!("  {:<16} {:<16} {}{}", p.name, p.kind.type_name(), p.description, notes);
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let raster = read_raster_info(&input)
                .context("Failed to read raster header")?
                .with_context(|| format!("Not a supported raster: {}", input.display()))?;
            let extent = raster.extent();

            println!("File: {}", input.display());
            println!("Name: {}", raster.name);
            println!("Dimensions: {} x {}", raster.width, raster.height);
            println!("Bands: {}", raster.band_count);
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                extent.xmin, extent.ymin, extent.xmax, extent.ymax
            );
            if let Some(crs) = read_prj(&input).context("Failed to read projection file")? {
                println!("CRS: {}", crs);
            }
        }

        Commands::List { descriptions } => {
            let algorithms = load_algorithms(&descriptions).with_context(|| {
                format!("Failed to read declarations in {}", descriptions.display())
            })?;
            for alg in &algorithms {
                println!("{:<40} {:<40} {}", alg.id(), alg.display_name(), alg.group());
            }
            println!("\n{} algorithms", algorithms.len());
        }

        Commands::Describe { file } => {
            let alg = load_algorithm(&file)?;
            describe(&alg);
        }

        Commands::Run {
            file,
            params,
            dry_run,
            temp_dir,
        } => {
            let settings = load_settings(cli.config.as_deref(), cli.saga_folder)?;
            let alg = load_algorithm(&file)?;
            let params = parse_params(&alg, &params)?;
            let context = match temp_dir {
                Some(dir) => LocalContext::new(dir),
                None => LocalContext::in_system_temp(),
            };
            let mut session = SagaSession::new(settings.clone());

            if dry_run {
                let pb = spinner("Preparing commands...")?;
                alg.check_parameter_values(&params, &context)
                    .context("Invalid parameters")?;
                let mut feedback = sagabridge::LogFeedback::new();
                let plan = alg
                    .prepare(&mut session, &params, &context, &mut feedback)
                    .context("Failed to prepare commands")?;
                pb.finish_and_clear();
                for command in &plan.commands {
                    println!("saga_cmd {}", command);
                }
                return Ok(());
            }

            let mut runner = SagaCmdRunner::new(settings);
            let mut feedback = ProgressFeedback::new()?;
            let start = Instant::now();
            let outputs = alg
                .process(&mut session, &params, &context, &mut runner, &mut feedback)
                .with_context(|| format!("Failed to run {}", alg.display_name()));
            feedback.finish();
            let outputs = outputs?;

            println!("{} finished", alg.display_name());
            for (name, path) in &outputs {
                println!("  {}: {}", name, path);
            }
            println!("  Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
