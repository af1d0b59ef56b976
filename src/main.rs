//! pom-guardian CLI - Command-line interface for version policy enforcement
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to checker runs over build descriptors
//! - Handles external concerns like config discovery, process exit codes, and terminal output
//! - Policy failures exit with 1, internal and IO failures with 2

use clap::{Parser, Subcommand, ValueEnum};
use pom_guardian::{
    GuardianConfig, GuardianResult, OutputFormat, PomValidator, ReportFormatter, ReportOptions,
    ValidationOptions, RELEASE_CHECKER, VERSIONS_CHECKER,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// pom-guardian - Version policy enforcement for Maven POM files
#[derive(Parser)]
#[command(name = "pom-guardian")]
#[command(version)]
#[command(about = "Rejects snapshot versions and hard-coded dependency versions in POM files")]
#[command(long_about = "pom-guardian checks Maven build descriptors for unreleased (snapshot) versions in properties and for versions declared outside property placeholders or management sections. Every violation is reported with its source line.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check POM files for version policy violations
    Check {
        /// Files or directories to check (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Which checker to run
        #[arg(long, value_enum, default_value = "all")]
        checker: CheckerArg,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Maximum number of records to print per report
        #[arg(long)]
        max_records: Option<usize>,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Stop at the first failing file
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// List checkers and their locations
    Rules {
        /// Show only this checker
        #[arg(long)]
        checker: Option<String>,
    },

    /// Explain what a specific location checks
    Explain {
        /// Location ID to explain
        location_id: String,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum CheckerArg {
    All,
    Release,
    Versions,
}

impl CheckerArg {
    fn ids(self) -> Vec<String> {
        match self {
            CheckerArg::All => Vec::new(),
            CheckerArg::Release => vec![RELEASE_CHECKER.to_string()],
            CheckerArg::Versions => vec![VERSIONS_CHECKER.to_string()],
        }
    }
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}

fn run_command(cli: Cli) -> GuardianResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            checker,
            format,
            max_records,
            exclude,
            no_parallel,
            fail_fast,
        } => run_check(
            cli.config,
            CheckArgs {
                paths,
                checker,
                format,
                max_records,
                exclude,
                parallel: !no_parallel,
                fail_fast,
                use_colors: !cli.no_color,
            },
        ),
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Rules { checker } => run_list_rules(cli.config, checker),
        Commands::Explain { location_id } => run_explain(cli.config, &location_id),
    }
}

struct CheckArgs {
    paths: Vec<PathBuf>,
    checker: CheckerArg,
    format: OutputFormatArg,
    max_records: Option<usize>,
    exclude: Vec<String>,
    parallel: bool,
    fail_fast: bool,
    use_colors: bool,
}

fn load_config(config_path: Option<PathBuf>) -> GuardianResult<GuardianConfig> {
    match config_path {
        Some(path) => GuardianConfig::load_from_file(path),
        None => GuardianConfig::discover("."),
    }
}

fn run_check(config_path: Option<PathBuf>, args: CheckArgs) -> GuardianResult<i32> {
    let config = load_config(config_path)?;

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors: args.use_colors && args.format == OutputFormatArg::Human,
        max_records: args.max_records,
    });
    let validator = PomValidator::new_with_config(config)?.with_report_formatter(formatter);

    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths
    };

    let options = ValidationOptions {
        parallel: args.parallel,
        fail_fast: args.fail_fast,
        only_checkers: args.checker.ids(),
        exclude_patterns: args.exclude,
    };

    let run = validator.validate_paths(&paths, &options)?;
    validator.write_run(&run, args.format.into(), std::io::stdout().lock())?;

    Ok(run.exit_code())
}

fn run_validate_config(config_path: Option<PathBuf>) -> GuardianResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("pom_guardian.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match GuardianConfig::load_from_file(&config_path) {
        Ok(config) => {
            let locations: usize = config.checkers.iter().map(|c| c.locations.len()).sum();
            println!("Configuration is valid");
            println!(
                "  Checkers: {} total, {} enabled",
                config.checkers.len(),
                config.enabled_checkers().count()
            );
            println!("  Locations: {locations}");
            println!("  Descriptor names: {}", config.paths.file_names.join(", "));
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            Ok(e.exit_code())
        }
    }
}

fn run_list_rules(config_path: Option<PathBuf>, checker_filter: Option<String>) -> GuardianResult<i32> {
    let config = load_config(config_path)?;

    for checker in &config.checkers {
        if checker_filter.as_deref().is_some_and(|id| id != checker.id) {
            continue;
        }

        let status = if checker.enabled { "enabled" } else { "disabled" };
        println!("{} ({})", checker.id, status);
        for location in &checker.locations {
            println!(
                "  {} [{}] {}",
                location.id,
                location.policy.as_str(),
                location.path
            );
        }
        println!();
    }

    Ok(0)
}

fn run_explain(config_path: Option<PathBuf>, location_id: &str) -> GuardianResult<i32> {
    let config = load_config(config_path)?;

    let Some((checker, location)) = config.location(location_id) else {
        eprintln!("Location '{location_id}' not found");
        println!();
        println!("Available locations:");
        for checker in &config.checkers {
            println!("  {}:", checker.id);
            for location in &checker.locations {
                println!("    - {}", location.id);
            }
        }
        return Ok(1);
    };

    println!("Location: {}", location.id);
    println!("Checker:  {}", checker.id);
    println!("Path:     {}", location.path);
    println!("Policy:   {}", location.policy.as_str());
    if let Some(pattern) = location.effective_pattern() {
        println!("Pattern:  {pattern}");
    }
    println!();
    println!("Report description:");
    println!("   {}", location.message);

    Ok(0)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn check_args(paths: Vec<PathBuf>, checker: CheckerArg) -> CheckArgs {
        CheckArgs {
            paths,
            checker,
            format: OutputFormatArg::Json,
            max_records: None,
            exclude: Vec::new(),
            parallel: false,
            fail_fast: false,
            use_colors: false,
        }
    }

    #[test]
    fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        let pom = temp_dir.path().join("pom.xml");
        fs::write(
            &pom,
            "<project>\n<properties>\n<a.version>1.0-SNAPSHOT</a.version>\n</properties>\n</project>",
        )
        .unwrap();

        let config = temp_dir.path().join("config.yaml");
        fs::write(&config, GuardianConfig::default().to_yaml().unwrap()).unwrap();

        let result = run_check(Some(config.clone()), check_args(vec![pom.clone()], CheckerArg::All));
        assert_eq!(result.unwrap(), 1);

        let result = run_check(Some(config), check_args(vec![pom], CheckerArg::Versions));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("test_config.yaml");

        let yaml = serde_yaml::to_string(&GuardianConfig::default()).unwrap();
        fs::write(&config_file, yaml).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "version: \"9\"\ncheckers: []\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 2);
    }

    #[test]
    fn test_explain_location() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.yaml");
        fs::write(&config_file, GuardianConfig::default().to_yaml().unwrap()).unwrap();

        assert_eq!(run_explain(Some(config_file.clone()), "plugins").unwrap(), 0);
        assert_eq!(run_explain(Some(config_file), "nonexistent").unwrap(), 1);
    }

    #[test]
    fn test_list_rules() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.yaml");
        fs::write(&config_file, GuardianConfig::default().to_yaml().unwrap()).unwrap();

        assert_eq!(run_list_rules(Some(config_file.clone()), None).unwrap(), 0);
        assert_eq!(
            run_list_rules(Some(config_file), Some("release".to_string())).unwrap(),
            0
        );
    }

    #[test]
    fn test_checker_arg_ids() {
        assert!(CheckerArg::All.ids().is_empty());
        assert_eq!(CheckerArg::Release.ids(), vec!["release".to_string()]);
    }
}
