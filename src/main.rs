// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use rentrans::app_config::{self, Config};
use rentrans::app_controller::Controller;
use rentrans::protection::placeholder::PlaceholderGenerator;
use rentrans::validation::coherence::{CoherenceReport, Severity};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Protect a script (or every script in a folder) and write its translation units
    Extract {
        /// Script file or directory to process
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Directory receiving the extraction artifacts
        #[arg(short, long, default_value = "rentrans_work")]
        work_dir: PathBuf,

        /// Split unit files after this many lines (0 keeps one file)
        #[arg(long)]
        max_lines_per_file: Option<usize>,

        /// Keep repeated lines in the standard pool
        #[arg(long)]
        no_duplicates: bool,
    },

    /// Rebuild a script from its artifacts and translated units
    Reconstruct {
        /// Original script the artifacts were extracted from
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Directory holding the extraction artifacts
        #[arg(short, long, default_value = "rentrans_work")]
        work_dir: PathBuf,

        /// Output file (defaults to <name>.translated.<ext> next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The artifacts were extracted without duplicate detection
        #[arg(long)]
        no_duplicates: bool,
    },

    /// Check translated lines against their originals
    Check {
        /// Translation file, or original script when --against is given
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Translated script aligned line by line with FILE
        #[arg(short, long)]
        against: Option<PathBuf>,
    },

    /// Show how a placeholder pattern is read and what it generates
    Pattern {
        /// Placeholder pattern, e.g. RENPY_CODE_001 or (B1)
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Number of placeholders to preview
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },

    /// Generate shell completions for rentrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// rentrans - protect, extract and rebuild Ren'Py dialogue for translation
#[derive(Parser, Debug)]
#[command(name = "rentrans")]
#[command(version)]
#[command(about = "Ren'Py dialogue extraction and reconstruction for translation")]
#[command(long_about = "rentrans replaces markup in Ren'Py dialogue with placeholders, writes plain
translation units, and rebuilds the script from the translated units.

EXAMPLES:
    rentrans extract game/script.rpy              # Write units to ./rentrans_work
    rentrans extract game/ -w work                # Process every .rpy under game/
    rentrans reconstruct game/script.rpy          # Rebuild game/script.translated.rpy
    rentrans check game/tl/french/script.rpy      # Check a translation file
    rentrans check script.rpy -a script.translated.rpy
    rentrans pattern '(B1)' -n 3                  # Preview a placeholder pattern
    rentrans completions bash > rentrans.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Trace is the logger's own ceiling; the effective level is set once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "rentrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Pattern { pattern, count } => run_pattern(&pattern, count),
        command => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_command(command, config)
        }
    }
}

fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    if let Some(level) = &log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(config_path)?;
    if let Some(level) = log_level {
        config.log_level = level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Extract {
            input_path,
            work_dir,
            max_lines_per_file,
            no_duplicates,
        } => {
            if let Some(max_lines) = max_lines_per_file {
                config.extraction.max_lines_per_file = max_lines;
            }
            if no_duplicates {
                config.extraction.detect_duplicates = false;
            }
            let controller = Controller::with_config(config)?;

            if input_path.is_dir() {
                let report = controller.extract_folder(&input_path, &work_dir)?;
                if !report.failed.is_empty() {
                    return Err(anyhow!("{} file(s) could not be extracted", report.failed.len()));
                }
            } else {
                let report = controller.extract_file(&input_path, &work_dir)?;
                for artifact in &report.artifacts {
                    println!("{}", artifact.display());
                }
            }
            Ok(())
        }
        Commands::Reconstruct {
            source,
            work_dir,
            output,
            no_duplicates,
        } => {
            if no_duplicates {
                config.reconstruction.detect_duplicates = false;
            }
            let controller = Controller::with_config(config)?;
            let report = controller.reconstruct_file(&source, &work_dir, output.as_deref())?;
            for diagnostic in &report.diagnostics {
                warn!("{}", diagnostic);
            }
            print_report(&report.coherence);
            println!("{}", report.output_path.display());
            Ok(())
        }
        Commands::Check { file, against } => {
            let controller = Controller::with_config(config)?;
            let report = match against {
                Some(new_file) => controller.check_aligned_files(&file, &new_file)?,
                None => controller.check_translation_file(&file)?,
            };
            print_report(&report);
            if report.passed() {
                Ok(())
            } else {
                Err(anyhow!("{} blocking coherence issue(s)", report.error_count()))
            }
        }
        Commands::Pattern { .. } | Commands::Completions { .. } => Ok(()),
    }
}

fn run_pattern(pattern: &str, count: usize) -> Result<()> {
    let generator = PlaceholderGenerator::new(pattern)?;
    let info = generator.pattern_info();
    println!("shape:  {}", info.shape);
    println!("prefix: {}", info.prefix);
    println!("width:  {}", info.width);
    println!("regex:  {}", generator.detection_regex());
    for placeholder in generator.preview(count) {
        println!("  {}", placeholder);
    }
    Ok(())
}

fn print_report(report: &CoherenceReport) {
    for issue in &report.issues {
        let tag = match issue.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("[{}] {}", tag, issue);
        println!("    old: {}", issue.old_content);
        println!("    new: {}", issue.new_content);
    }
    info!(
        "{} lines checked: {} errors, {} warnings",
        report.lines_checked,
        report.error_count(),
        report.warning_count()
    );
}
