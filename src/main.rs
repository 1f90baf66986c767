//! cwlforge CLI - validate, inspect, hash and convert CWL documents

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use cwlforge::config::CwlForgeConfig;
use cwlforge::error::{CwlError, FixSuggestion};
use cwlforge::io::{self, Format};
use cwlforge::process::{Process, ProcessLike};
use cwlforge::workflow::{StepRun, Workflow};

#[derive(Parser)]
#[command(name = "cwlforge")]
#[command(about = "cwlforge - build, validate and convert CWL workflow documents")]
#[command(version)]
struct Cli {
    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document and its workflow wiring
    Validate {
        /// Path to a .cwl, .yaml or .json document
        file: PathBuf,
    },

    /// Print ports, requirements and steps
    Inspect {
        /// Path to a .cwl, .yaml or .json document
        file: PathBuf,
    },

    /// Print the content hash used for revision detection
    Hash {
        /// Path to a .cwl, .yaml or .json document
        file: PathBuf,
    },

    /// Rewrite a document as YAML or JSON
    Convert {
        /// Path to a .cwl, .yaml or .json document
        file: PathBuf,

        /// Output format (defaults to the config, then the output extension)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Json => Format::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match CwlForgeConfig::load() {
        Ok(config) => config.with_env(),
        Err(e) => {
            eprintln!("{} {}", "Warning:".yellow().bold(), e);
            CwlForgeConfig::default().with_env()
        }
    };

    // RUST_LOG wins over the configured filter; -v raises to debug
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("cwlforge=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate { file } => validate_document(&file, &config),
        Commands::Inspect { file } => inspect_document(&file),
        Commands::Hash { file } => hash_document(&file),
        Commands::Convert { file, format, output } => {
            convert_document(&file, format.map(Format::from), output.as_deref(), &config)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            std::process::exit(1);
        }
    }
}

/// Returns false when the workflow has validation errors.
fn validate_document(file: &Path, config: &CwlForgeConfig) -> Result<bool, CwlError> {
    let process = io::load(file)?;
    let display_name = process.id().unwrap_or("<anonymous>").to_string();

    if process.base().cwl_version != config.cwl_version() {
        println!(
            "  {} cwlVersion {} differs from the configured {}",
            "⚠".yellow(),
            process.base().cwl_version,
            config.cwl_version()
        );
    }

    let Some(workflow) = process.as_workflow() else {
        println!("{} {} '{}' is valid", "✓".green(), process.class(), display_name);
        return Ok(true);
    };

    let report = workflow.validate();
    for error in &report.errors {
        println!("  {} {}", "✗".red(), error);
        if let Some(suggestion) = error.suggestion() {
            println!("    {} {}", "Fix:".yellow(), suggestion);
        }
    }
    for warning in &report.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    if report.is_valid() {
        println!(
            "{} Workflow '{}' is valid ({} steps)",
            "✓".green(),
            display_name,
            workflow.steps.len()
        );
        Ok(true)
    } else {
        println!(
            "{} Workflow '{}' has {} error(s)",
            "✗".red().bold(),
            display_name,
            report.errors.len()
        );
        Ok(false)
    }
}

fn inspect_document(file: &Path) -> Result<bool, CwlError> {
    let process = io::load(file)?;
    let base = process.base();

    println!("{} {}", process.class().cyan().bold(), process.id().unwrap_or("<anonymous>"));
    if let Some(label) = process.label() {
        println!("  Label: {}", label);
    }
    println!("  cwlVersion: {}", base.cwl_version);

    println!("{}", "Inputs:".cyan());
    for port in &base.inputs {
        println!("  {}: {}", port.id, port.port_type);
    }
    println!("{}", "Outputs:".cyan());
    for port in &base.outputs {
        println!("  {}: {}", port.id, port.port_type);
    }
    if !base.requirements.is_empty() {
        println!("{}", "Requirements:".cyan());
        for kind in base.requirements.kinds() {
            println!("  {}", kind);
        }
    }

    if let Process::Workflow(workflow) = &process {
        print_steps(workflow);
    }
    Ok(true)
}

fn print_steps(workflow: &Workflow) {
    println!("{}", "Steps:".cyan());
    let order = workflow
        .topological_order()
        .unwrap_or_else(|| workflow.step_ids().map(str::to_string).collect());
    for id in order {
        let Some(step) = workflow.get_step(&id) else {
            continue;
        };
        let run = match &step.run {
            StepRun::Inline(process) => process.class().to_string(),
            StepRun::Reference(path) => path.clone(),
        };
        let scatter = if step.scattered_ports().is_empty() {
            String::new()
        } else {
            format!(" (scatter: {})", step.scattered_ports().join(", "))
        };
        println!("  {} → {}{}", step.id, run, scatter);
    }
}

fn hash_document(file: &Path) -> Result<bool, CwlError> {
    let process = io::load(file)?;
    println!("{}", io::content_hash(&process)?);
    Ok(true)
}

fn convert_document(
    file: &Path,
    format: Option<Format>,
    output: Option<&Path>,
    config: &CwlForgeConfig,
) -> Result<bool, CwlError> {
    let process = io::load(file)?;
    let format = match format {
        Some(format) => Some(format),
        None => config.defaults.format.as_deref().map(str::parse::<Format>).transpose()?,
    };

    match output {
        Some(path) => {
            io::dump(&process, path, format)?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }
        None => {
            let text = match format.unwrap_or_default() {
                Format::Json => io::to_json_string(&process)?,
                Format::Yaml => io::to_yaml_string(&process)?,
            };
            println!("{}", text);
        }
    }
    Ok(true)
}
