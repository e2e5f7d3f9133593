//! wrapname: name resolution for binding generators.
//!
//! This CLI provides access to wrapname functionality for:
//! - Resolving the target names of every declaration in interface files
//! - Mangling identifiers into safe target symbols
//! - Showing naming-format builder results

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use wrapname::interface::SymbolStatus;
use wrapname::mangle::mangle_with_flag;
use wrapname::{Config, Interface, InterfaceReport, NamingContext, NamingFormats, Role};

/// Exit codes for the CLI
///
/// - 0: Success
/// - 1: Name errors reported (valid input, rules rejected a name)
/// - 2: Error (invalid input, missing file, etc.)
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const NAME_ERRORS: u8 = 1;
    pub const ERROR: u8 = 2;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Text,
}

/// Resolve wrapped declaration names for foreign-language bindings
#[derive(Parser)]
#[command(name = "wrapname")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Suppress diagnostics output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding .wrapname.toml (defaults to current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every declaration in one or more interface files
    Resolve {
        /// Interface description files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Mangle a name into a safe target identifier
    Mangle {
        /// Name to mangle (may contain scopes and operator symbols)
        name: String,
    },

    /// Show the symbol a naming-format role builds
    Names {
        /// Role: wrapper, member, get, set, construct, destroy, disown
        role: String,

        /// Function, class or variable name
        name: String,

        /// Member name (member role only)
        member: Option<String>,

        /// Build the copy-constructor name (construct role only)
        #[arg(long)]
        copy: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;

    // Initialize logging
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(cli.command, &cli.root, format, cli.quiet) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if format == OutputFormat::Json {
                let error_json = serde_json::json!({
                    "error": "CommandFailed",
                    "message": e.to_string(),
                });
                eprintln!("{}", error_json);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn run(command: Commands, root: &Path, format: OutputFormat, quiet: bool) -> Result<u8> {
    match command {
        Commands::Resolve { files } => cmd_resolve(&files, root, format, quiet),
        Commands::Mangle { name } => cmd_mangle(&name, format),
        Commands::Names {
            role,
            name,
            member,
            copy,
        } => cmd_names(&role, &name, member.as_deref(), copy, root, format),
        Commands::Config => cmd_config(root),
    }
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let text = if format == OutputFormat::Pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

#[derive(Serialize)]
struct FileReport {
    file: PathBuf,
    #[serde(flatten)]
    report: InterfaceReport,
}

fn resolve_file(file: &Path, config: &Config) -> Result<InterfaceReport> {
    let interface = Interface::load(file)
        .with_context(|| format!("Failed to load interface {}", file.display()))?;
    let mut ctx = NamingContext::from_config(config);
    let mut report = interface
        .run(&mut ctx)
        .with_context(|| format!("Failed to register directives from {}", file.display()))?;
    if report.module.is_none() {
        report.module = config.module.clone();
    }
    Ok(report)
}

/// Resolve interface files in parallel, each with its own context
fn cmd_resolve(files: &[PathBuf], root: &Path, format: OutputFormat, quiet: bool) -> Result<u8> {
    let config = Config::load(root);

    let results: Vec<Result<InterfaceReport>> = files
        .par_iter()
        .map(|file| resolve_file(file, &config))
        .collect();

    let mut reports = Vec::with_capacity(files.len());
    for (file, result) in files.iter().zip(results) {
        reports.push(FileReport {
            file: file.clone(),
            report: result?,
        });
    }

    let errors: usize = reports.iter().map(|r| r.report.error_count()).sum();

    match format {
        OutputFormat::Json | OutputFormat::Pretty => print_json(&reports, format)?,
        OutputFormat::Text => {
            for FileReport { file, report } in &reports {
                if !quiet {
                    for diag in &report.diagnostics {
                        eprintln!("{}", diag);
                    }
                }
                println!("# {}", file.display());
                for sym in &report.symbols {
                    let source = if sym.scope.is_empty() {
                        sym.name.clone()
                    } else {
                        format!("{}::{}", sym.scope, sym.name)
                    };
                    match sym.status {
                        SymbolStatus::Wrapped => println!(
                            "{:<40} {:<24} {}",
                            source,
                            sym.target,
                            sym.wrapper.as_deref().unwrap_or("-")
                        ),
                        SymbolStatus::Ignored => println!("{:<40} (ignored)", source),
                        SymbolStatus::Redefined => {
                            println!("{:<40} {:<24} (redefined)", source, sym.target)
                        }
                    }
                }
            }
        }
    }

    if errors > 0 {
        if !quiet {
            eprintln!("{} name error(s) reported", errors);
        }
        return Ok(exit_codes::NAME_ERRORS);
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_mangle(name: &str, format: OutputFormat) -> Result<u8> {
    let (mangled, substituted) = mangle_with_flag(name);
    if format == OutputFormat::Text {
        println!("{}", mangled);
    } else {
        print_json(
            &serde_json::json!({
                "name": name,
                "mangled": mangled,
                "substituted": substituted,
            }),
            format,
        )?;
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_names(
    role: &str,
    name: &str,
    member: Option<&str>,
    copy: bool,
    root: &Path,
    format: OutputFormat,
) -> Result<u8> {
    let role = Role::from_str(role)?;
    let config = Config::load(root);

    let mut formats = NamingFormats::new();
    for (r, template) in &config.naming {
        formats.register(*r, template)?;
    }

    let symbol = match role {
        Role::Wrapper => formats.wrapper_name(name),
        Role::Member => match member {
            Some(member) => formats.member_name(name, member),
            None => bail!("The member role needs a class name and a member name"),
        },
        Role::Get => formats.getter_name(name),
        Role::Set => formats.setter_name(name),
        Role::Construct if copy => formats.copy_constructor_name(name),
        Role::Construct => formats.constructor_name(name),
        Role::Destroy => formats.destructor_name(name),
        Role::Disown => formats.disown_name(name),
    };

    if format == OutputFormat::Text {
        println!("{}", symbol);
    } else {
        print_json(
            &serde_json::json!({
                "role": role.as_str(),
                "template": formats.template(role),
                "symbol": symbol,
            }),
            format,
        )?;
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_config(root: &Path) -> Result<u8> {
    let config = Config::load(root);
    let text = config
        .to_toml()
        .context("Failed to render configuration")?;
    print!("{}", text);
    Ok(exit_codes::SUCCESS)
}
